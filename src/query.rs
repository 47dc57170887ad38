//! Filtering, search, sorting, and pagination over a cache snapshot.

use serde::Deserialize;

use crate::rss::{Article, Severity};

pub const DEFAULT_PER_PAGE: usize = 12;
pub const PER_PAGE_CHOICES: [usize; 4] = [6, 12, 24, 48];

/// Query parameters for the article listing, with the defaults the HTTP
/// surface uses.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArticleQuery {
    pub source: String,
    pub severity: String,
    pub search: String,
    pub sort: String,
    pub page: usize,
    pub per_page: usize,
}

impl Default for ArticleQuery {
    fn default() -> Self {
        ArticleQuery {
            source: "all".to_string(),
            severity: "all".to_string(),
            search: String::new(),
            sort: "newest".to_string(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ArticleQuery {
    /// Coerce out-of-range values to their defaults: unknown per_page
    /// becomes 12, unknown sort becomes newest, unknown severity becomes
    /// all, page floors at 1.
    pub fn validated(mut self) -> Self {
        if self.per_page != 0 && !PER_PAGE_CHOICES.contains(&self.per_page) {
            self.per_page = DEFAULT_PER_PAGE;
        }
        if self.sort != "newest" && self.sort != "oldest" {
            self.sort = "newest".to_string();
        }
        let severity = self.severity.to_lowercase();
        self.severity = match severity.as_str() {
            "all" | "high" | "medium" | "low" => severity,
            _ => "all".to_string(),
        };
        if self.page < 1 {
            self.page = 1;
        }
        self
    }
}

/// One page of query results plus the metadata the view renders.
#[derive(Debug, Clone)]
pub struct QueryPage {
    pub articles: Vec<Article>,
    pub total: usize,
    pub total_pages: usize,
    pub page: usize,
    pub per_page: usize,
}

/// Apply source filter, severity filter, search, sort, and pagination, in
/// that order. `articles` is the snapshot's natural newest-first order.
pub fn run(articles: &[Article], query: &ArticleQuery) -> QueryPage {
    let query = query.clone().validated();

    let search_lower = query.search.trim().to_lowercase();
    let mut filtered: Vec<Article> = articles
        .iter()
        .filter(|a| query.source == "all" || a.source == query.source)
        .filter(|a| {
            if query.severity == "all" {
                return true;
            }
            // Unclassified articles count as medium for filtering.
            let severity = a.severity.unwrap_or(Severity::Medium);
            severity.as_str().to_lowercase() == query.severity
        })
        .filter(|a| {
            search_lower.is_empty()
                || a.title.to_lowercase().contains(&search_lower)
                || a.summary.to_lowercase().contains(&search_lower)
        })
        .cloned()
        .collect();

    if query.sort == "oldest" {
        filtered.reverse();
    }

    paginate(filtered, query.page, query.per_page)
}

/// Slice a filtered, sorted list into one page. `per_page == 0` means show
/// all; a page beyond the last valid page clamps to the last page, and an
/// empty result pins the page to 1 so the offset arithmetic cannot overflow.
fn paginate(filtered: Vec<Article>, requested_page: usize, per_page: usize) -> QueryPage {
    let total = filtered.len();

    if per_page == 0 {
        return QueryPage {
            articles: filtered,
            total,
            total_pages: 1,
            page: 1,
            per_page: 0,
        };
    }

    let total_pages = total.div_ceil(per_page);
    let page = if total_pages == 0 {
        1
    } else if requested_page > total_pages {
        total_pages
    } else {
        requested_page
    };

    let start = (page - 1) * per_page;
    let articles = filtered.into_iter().skip(start).take(per_page).collect();

    QueryPage {
        articles,
        total,
        total_pages,
        page,
        per_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn article(title: &str, hour: u32, source: &str, severity: Option<Severity>) -> Article {
        Article {
            title: title.to_string(),
            link: "#".to_string(),
            published: Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap(),
            summary: format!("{} summary", title),
            source: source.to_string(),
            author: "Unknown".to_string(),
            severity,
            severity_reasoning: severity.map(|_| "test".to_string()),
        }
    }

    /// Three articles newest-first: C(12:00), B(11:00), A(10:00).
    fn sample() -> Vec<Article> {
        vec![
            article("C", 12, "Dark Reading", Some(Severity::Low)),
            article("B", 11, "Krebs on Security", Some(Severity::High)),
            article("A", 10, "Dark Reading", None),
        ]
    }

    fn query() -> ArticleQuery {
        ArticleQuery::default()
    }

    #[test]
    fn severity_filter_returns_only_matches() {
        let mut q = query();
        q.severity = "HIGH".to_string();
        let page = run(&sample(), &q);
        assert_eq!(page.total, 1);
        assert_eq!(page.articles[0].title, "B");
    }

    #[test]
    fn unclassified_articles_filter_as_medium() {
        let mut q = query();
        q.severity = "medium".to_string();
        let page = run(&sample(), &q);
        assert_eq!(page.total, 1);
        assert_eq!(page.articles[0].title, "A");
    }

    #[test]
    fn source_filter_is_exact() {
        let mut q = query();
        q.source = "Dark Reading".to_string();
        let page = run(&sample(), &q);
        let titles: Vec<&str> = page.articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "A"]);
    }

    #[test]
    fn combined_filters_yield_satisfying_subset() {
        let mut q = query();
        q.source = "Dark Reading".to_string();
        q.severity = "low".to_string();
        q.search = "c".to_string();
        let page = run(&sample(), &q);
        assert!(page.articles.iter().all(|a| {
            a.source == "Dark Reading"
                && a.severity == Some(Severity::Low)
                && a.title.to_lowercase().contains('c')
        }));
        assert_eq!(page.total, 1);
    }

    #[test]
    fn search_matches_title_or_summary_case_insensitively() {
        let mut q = query();
        q.search = "B SUMMARY".to_string();
        let page = run(&sample(), &q);
        assert_eq!(page.total, 1);
        assert_eq!(page.articles[0].title, "B");
    }

    #[test]
    fn oldest_is_exact_reverse_of_newest() {
        let mut q = query();
        q.sort = "oldest".to_string();
        let page = run(&sample(), &q);
        let titles: Vec<&str> = page.articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);

        // Round-trip back to newest restores the original order.
        q.sort = "newest".to_string();
        let page = run(&sample(), &q);
        let titles: Vec<&str> = page.articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["C", "B", "A"]);
    }

    #[test]
    fn pagination_computes_ceiling_pages() {
        let mut q = query();
        q.per_page = 6;
        let articles: Vec<Article> = (0..13)
            .map(|i| article(&format!("t{}", i), 1 + (i % 20) as u32, "S", None))
            .collect();
        let page = run(&articles, &q);
        assert_eq!(page.total, 13);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.articles.len(), 6);
    }

    #[test]
    fn page_two_of_two_returns_the_remainder() {
        let page = paginate(sample(), 2, 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.articles.len(), 1);
        assert_eq!(page.articles[0].title, "A");
    }

    #[test]
    fn unknown_page_size_coerces_to_twelve() {
        let mut q = query();
        q.per_page = 2;
        let page = run(&sample(), &q);
        assert_eq!(page.per_page, DEFAULT_PER_PAGE);
    }

    #[test]
    fn out_of_range_page_clamps_to_last() {
        let mut q = query();
        q.per_page = 6;
        q.page = 99;
        let articles: Vec<Article> = (0..13)
            .map(|i| article(&format!("t{}", i), 1 + (i % 20) as u32, "S", None))
            .collect();
        let page = run(&articles, &q);
        assert_eq!(page.page, 3);
        assert_eq!(page.articles.len(), 1);
    }

    #[test]
    fn per_page_all_returns_everything_on_one_page() {
        let mut q = query();
        q.per_page = 0;
        let page = run(&sample(), &q);
        assert_eq!(page.articles.len(), 3);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 1);
    }

    #[test]
    fn huge_page_on_empty_result_stays_safe() {
        let mut q = query();
        q.search = "no such thing".to_string();
        q.page = usize::MAX;
        let page = run(&sample(), &q);
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.page, 1);
        assert!(page.articles.is_empty());
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let mut q = query();
        q.search = "no such thing".to_string();
        let page = run(&sample(), &q);
        assert_eq!(page.total, 0);
        assert_eq!(page.total_pages, 0);
        assert!(page.articles.is_empty());
    }

    #[test]
    fn invalid_sort_and_severity_coerce_to_defaults() {
        let q = ArticleQuery {
            sort: "sideways".to_string(),
            severity: "critical".to_string(),
            per_page: 7,
            page: 0,
            ..ArticleQuery::default()
        }
        .validated();
        assert_eq!(q.sort, "newest");
        assert_eq!(q.severity, "all");
        assert_eq!(q.per_page, DEFAULT_PER_PAGE);
        assert_eq!(q.page, 1);
    }
}
