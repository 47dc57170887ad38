//! Server-rendered HTML pages for the web interface.

use chrono::{DateTime, Utc};

use crate::query::{ArticleQuery, QueryPage, PER_PAGE_CHOICES};
use crate::rss::Article;

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:0;background:#0e1117;color:#e6e8eb}\
header{background:#161b26;padding:16px 24px;border-bottom:1px solid #252b38}\
h1{margin:0;font-size:1.3rem}a{color:#6ea8fe;text-decoration:none}\
main{max-width:1080px;margin:0 auto;padding:24px}\
form.filters{display:flex;gap:8px;flex-wrap:wrap;margin-bottom:20px}\
select,input[type=text]{background:#161b26;color:#e6e8eb;border:1px solid #313a4d;border-radius:6px;padding:6px 10px}\
button{background:#2457d6;color:#fff;border:0;border-radius:6px;padding:6px 14px;cursor:pointer}\
.card{background:#161b26;border:1px solid #252b38;border-radius:8px;padding:16px;margin-bottom:12px}\
.meta{color:#8b93a7;font-size:0.85rem;margin-top:6px}\
.badge{display:inline-block;border-radius:4px;padding:2px 8px;font-size:0.75rem;font-weight:600}\
.badge.high{background:#5c1a23;color:#ff8791}.badge.medium{background:#574411;color:#ffd167}\
.badge.low{background:#14452b;color:#6fdc9c}.badge.pending{background:#2a3040;color:#9aa3b8}\
.pager{display:flex;gap:6px;margin-top:18px}.pager a,.pager span{padding:4px 10px;border:1px solid #313a4d;border-radius:6px}\
.pager span.current{background:#2457d6;border-color:#2457d6}\
.notice{background:#1d2433;border:1px solid #313a4d;border-radius:6px;padding:8px 12px;margin-bottom:16px;color:#9aa3b8}";

/// Data the index page needs from a handler.
pub struct IndexView<'a> {
    pub page: &'a QueryPage,
    pub query: &'a ArticleQuery,
    pub sources: &'a [String],
    pub last_updated: Option<DateTime<Utc>>,
    pub classified: bool,
}

/// Escape text for safe embedding in HTML.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Human-readable "time ago" label, mirroring the listing's freshness stamp.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(then).num_seconds().max(0);
    if seconds < 60 {
        return "just now".to_string();
    }
    let (value, unit) = if seconds < 3600 {
        (seconds / 60, "minute")
    } else if seconds < 86400 {
        (seconds / 3600, "hour")
    } else {
        (seconds / 86400, "day")
    };
    let plural = if value == 1 { "" } else { "s" };
    format!("{} {}{} ago", value, unit, plural)
}

fn page_shell(title: &str, body: &str) -> String {
    format!(
        "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\
         <title>{}</title><style>{}</style></head><body>\
         <header><h1><a href=\"/\">threatwire</a> &mdash; cybersecurity news</h1></header>\
         <main>{}</main></body></html>",
        escape(title),
        STYLE,
        body
    )
}

fn severity_badge(article: &Article) -> String {
    match article.severity {
        Some(severity) => {
            let class = severity.as_str().to_lowercase();
            let reasoning = article
                .severity_reasoning
                .as_deref()
                .map(escape)
                .unwrap_or_default();
            format!(
                "<span class=\"badge {}\" title=\"{}\">{}</span>",
                class,
                reasoning,
                severity.as_str()
            )
        }
        None => "<span class=\"badge pending\">PENDING</span>".to_string(),
    }
}

fn query_string(query: &ArticleQuery, page: usize) -> String {
    format!(
        "?source={}&severity={}&search={}&sort={}&per_page={}&page={}",
        urlencode(&query.source),
        urlencode(&query.severity),
        urlencode(&query.search),
        urlencode(&query.sort),
        query.per_page,
        page
    )
}

/// Minimal percent-encoding for query-string values.
fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn filters_form(view: &IndexView) -> String {
    let mut source_options = String::from("<option value=\"all\">All sources</option>");
    for source in view.sources {
        let selected = if *source == view.query.source {
            " selected"
        } else {
            ""
        };
        source_options.push_str(&format!(
            "<option value=\"{0}\"{1}>{0}</option>",
            escape(source),
            selected
        ));
    }

    let mut severity_options = String::new();
    for (value, label) in [
        ("all", "All severities"),
        ("high", "High"),
        ("medium", "Medium"),
        ("low", "Low"),
    ] {
        let selected = if value == view.query.severity {
            " selected"
        } else {
            ""
        };
        severity_options.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>",
            value, selected, label
        ));
    }

    let mut per_page_options = String::new();
    for choice in PER_PAGE_CHOICES {
        let selected = if choice == view.query.per_page {
            " selected"
        } else {
            ""
        };
        per_page_options.push_str(&format!(
            "<option value=\"{0}\"{1}>{0} per page</option>",
            choice, selected
        ));
    }
    let all_selected = if view.query.per_page == 0 {
        " selected"
    } else {
        ""
    };
    per_page_options.push_str(&format!(
        "<option value=\"0\"{}>All</option>",
        all_selected
    ));

    let newest_selected = if view.query.sort == "newest" {
        " selected"
    } else {
        ""
    };
    let oldest_selected = if view.query.sort == "oldest" {
        " selected"
    } else {
        ""
    };

    format!(
        "<form class=\"filters\" method=\"get\" action=\"/\">\
         <select name=\"source\">{}</select>\
         <select name=\"severity\">{}</select>\
         <input type=\"text\" name=\"search\" placeholder=\"Search articles...\" value=\"{}\">\
         <select name=\"sort\">\
         <option value=\"newest\"{}>Newest first</option>\
         <option value=\"oldest\"{}>Oldest first</option></select>\
         <select name=\"per_page\">{}</select>\
         <button type=\"submit\">Apply</button></form>",
        source_options,
        severity_options,
        escape(&view.query.search),
        newest_selected,
        oldest_selected,
        per_page_options
    )
}

fn pager(view: &IndexView) -> String {
    if view.page.total_pages <= 1 {
        return String::new();
    }
    let mut links = String::from("<nav class=\"pager\">");
    for p in 1..=view.page.total_pages {
        if p == view.page.page {
            links.push_str(&format!("<span class=\"current\">{}</span>", p));
        } else {
            links.push_str(&format!(
                "<a href=\"/{}\">{}</a>",
                query_string(view.query, p),
                p
            ));
        }
    }
    links.push_str("</nav>");
    links
}

pub fn index_page(view: &IndexView) -> String {
    let mut body = String::new();

    let freshness = view
        .last_updated
        .map(|t| time_ago(t, Utc::now()))
        .unwrap_or_else(|| "never".to_string());
    let classification_note = if view.classified {
        String::new()
    } else {
        "<div class=\"notice\">Severity classification in progress&hellip; ratings will \
         appear as they complete.</div>"
            .to_string()
    };

    body.push_str(&classification_note);
    body.push_str(&filters_form(view));
    body.push_str(&format!(
        "<p class=\"meta\">{} articles &middot; updated {} &middot; <a href=\"/about\">about</a></p>",
        view.page.total, freshness
    ));

    if view.page.articles.is_empty() {
        body.push_str("<div class=\"card\">No articles match the current filters.</div>");
    }

    for article in &view.page.articles {
        body.push_str(&format!(
            "<div class=\"card\">{} <a href=\"{}\" target=\"_blank\" rel=\"noopener\">{}</a>\
             <p>{}</p>\
             <div class=\"meta\">{} &middot; {} &middot; {}</div></div>",
            severity_badge(article),
            escape(&article.link),
            escape(&article.title),
            escape(&article.summary),
            escape(&article.source),
            escape(&article.author),
            article.published.format("%Y-%m-%d %H:%M UTC"),
        ));
    }

    body.push_str(&pager(view));
    page_shell("threatwire — cybersecurity news", &body)
}

pub fn about_page(sources: &[String]) -> String {
    let mut items = String::new();
    for source in sources {
        items.push_str(&format!("<li>{}</li>", escape(source)));
    }
    let body = format!(
        "<div class=\"card\"><h2>About</h2>\
         <p>threatwire aggregates cybersecurity news from multiple RSS feeds and rates each \
         article's severity with an LLM. Ratings arrive asynchronously after each refresh.</p>\
         <h3>Sources</h3><ul>{}</ul>\
         <p class=\"meta\"><a href=\"/\">&larr; back to the news</a></p></div>",
        items
    );
    page_shell("About — threatwire", &body)
}

pub fn not_found_page() -> String {
    page_shell(
        "Not Found — threatwire",
        "<div class=\"card\"><h2>404</h2><p>That page does not exist.</p>\
         <p class=\"meta\"><a href=\"/\">&larr; back to the news</a></p></div>",
    )
}
