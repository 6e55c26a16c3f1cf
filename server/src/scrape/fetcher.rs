//! Fetcher (C2): retrieve rendered HTML for a URL and extract the `<main>`
//! subtree (spec §4.3).

use std::time::Duration;

use scraper::{Html, Selector};
use thiserror::Error;

const USER_AGENT: &str = concat!("crawlrag/", env!("CARGO_PKG_VERSION"));
const FETCH_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned {0}")]
    Status(reqwest::StatusCode),
}

pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .expect("reqwest client builds with static config");
        Self { client }
    }

    /// Fetch `url` and return the inner HTML of its first `<main>` element,
    /// or an empty string if the document has none (spec §4.3 step 3).
    pub async fn fetch_main_subtree(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        let body = response.text().await?;
        Ok(extract_main_subtree(&body))
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn extract_main_subtree(document_html: &str) -> String {
    let document = Html::parse_document(document_html);
    let main_selector = Selector::parse("main").expect("static selector is valid");
    document
        .select(&main_selector)
        .next()
        .map(|el| el.inner_html())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_main_subtree() {
        let html = "<html><body><main><h1>Hello, World!</h1></main></body></html>";
        assert_eq!(extract_main_subtree(html).trim(), "<h1>Hello, World!</h1>");
    }

    #[test]
    fn test_no_main_returns_empty() {
        let html = "<html><body><p>No main here</p></body></html>";
        assert_eq!(extract_main_subtree(html), "");
    }

    #[test]
    fn test_first_main_wins_when_multiple() {
        let html = "<html><body><main>first</main><main>second</main></body></html>";
        assert_eq!(extract_main_subtree(html), "first");
    }
}
