//! RSS feed client for threatwire.
//!
//! Fetches and normalizes articles from the configured cybersecurity
//! news feeds.

mod client;
mod fetcher;
mod types;

pub use self::types::*;

pub use self::fetcher::FeedClient;

pub use self::client::create_http_client;
