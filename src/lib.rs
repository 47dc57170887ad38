pub mod cache;
pub mod classifier;
pub mod config;
pub mod coordinator;
pub mod logging;
pub mod prompts;
pub mod query;
pub mod reader;
pub mod render;
pub mod rss;
pub mod web;

pub const TARGET_WEB_REQUEST: &str = "web_request";
pub const TARGET_LLM_REQUEST: &str = "llm_request";
