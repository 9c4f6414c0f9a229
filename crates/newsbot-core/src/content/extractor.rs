use std::io::Cursor;
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::AppConfig;
use crate::feed::Article;
use crate::http::build_page_client;
use crate::shutdown::or_cancelled;
use crate::{Error, Result};

/// Width used when flattening embedded HTML; large enough to avoid re-wrapping prose
const TEXT_WIDTH: usize = 1000;

const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

/// Produces plain text for an article, from its embedded summary or its page
pub struct ContentExtractor {
    client: Client,
}

impl ContentExtractor {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = build_page_client(
            Duration::from_secs(config.sync.content_timeout_secs),
            config.sync.proxy_url.as_deref(),
        )?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Extract readable text for summarization
    ///
    /// An embedded feed summary is used as-is without touching the network.
    /// Otherwise the article link is fetched once and run through readability.
    pub async fn extract(&self, article: &Article, cancel: &CancellationToken) -> Result<String> {
        if article.has_embedded_summary() {
            return Ok(clean_text(&html_to_text(&article.summary)));
        }

        let url = Url::parse(&article.link)?;

        let html = or_cancelled(cancel, self.fetch_page(&url)).await?;

        let text = tokio::task::spawn_blocking(move || readable_text(&html, &url))
            .await
            .map_err(|e| Error::Extract(format!("readability task failed: {}", e)))??;

        let text = clean_text(&text);
        if text.is_empty() {
            return Err(Error::Extract(format!("no readable content at {}", article.link)));
        }

        Ok(text)
    }

    async fn fetch_page(&self, url: &Url) -> Result<String> {
        tracing::debug!(%url, "Fetching article page");

        let mut response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let too_large = || Error::Extract(format!("Page larger than {} bytes: {}", MAX_PAGE_BYTES, url));

        if response.content_length().is_some_and(|len| len > MAX_PAGE_BYTES as u64) {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > MAX_PAGE_BYTES {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Strip page boilerplate and keep the main content as plain text
fn readable_text(html: &str, url: &Url) -> Result<String> {
    let mut reader = Cursor::new(html.as_bytes());
    let product = readability::extractor::extract(&mut reader, url)
        .map_err(|e| Error::Extract(format!("{:?}", e)))?;

    Ok(product.text)
}

/// Convert HTML content to plain text
fn html_to_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), TEXT_WIDTH)
        .unwrap_or_else(|_| html.to_string())
}

/// Trim and collapse runs of three or more newlines into one
pub fn clean_text(text: &str) -> String {
    static BLANK_RUNS: OnceLock<Regex> = OnceLock::new();
    let re = BLANK_RUNS.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"));

    re.replace_all(text.trim(), "\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARTICLE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Async Rust in practice</title></head>
<body>
  <nav><a href="/">Home</a> | <a href="/about">About</a></nav>
  <article>
    <h1>Async Rust in practice</h1>
    <p>Tokio is an asynchronous runtime for the Rust programming language. It provides the building blocks needed for writing network applications without compromising speed.</p>
    <p>Structured concurrency lets a caller race an operation against a cancellation signal and discard whichever result loses the race.</p>
    <p>Most production services combine these ideas with careful error propagation and structured logging so that failures stay visible.</p>
  </article>
  <footer>Copyright 2024</footer>
</body>
</html>"#;

    fn article(link: &str, summary: &str) -> Article {
        Article {
            id: 1,
            source_id: 1,
            title: "Test".to_string(),
            link: link.to_string(),
            summary: summary.to_string(),
            published_at: Utc::now(),
            posted_at: None,
            created_at: Utc::now(),
        }
    }

    fn extractor() -> ContentExtractor {
        ContentExtractor::with_client(build_page_client(Duration::from_secs(5), None).unwrap())
    }

    #[test]
    fn test_clean_text_collapses_blank_runs() {
        assert_eq!(clean_text("  a\n\n\nb\n\n\n\n\nc\n\nd  "), "a\nb\nc\n\nd");
        assert_eq!(clean_text("\n\n\n"), "");
    }

    #[tokio::test]
    async fn test_embedded_summary_skips_network() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let article = article(&format!("{}/post", mock_server.uri()), "<p>Embedded <b>summary</b></p>");
        let text = extractor().extract(&article, &CancellationToken::new()).await.unwrap();

        assert!(text.contains("Embedded"));
        assert!(text.contains("summary"));
        assert!(!text.contains("<p>"));
    }

    #[tokio::test]
    async fn test_fetches_and_extracts_page() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/post"))
            .and(header_regex("accept", "^text/html"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(ARTICLE_PAGE)
                    .insert_header("Content-Type", "text/html"),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let article = article(&format!("{}/post", mock_server.uri()), "");
        let text = extractor().extract(&article, &CancellationToken::new()).await.unwrap();

        assert!(text.contains("Tokio is an asynchronous runtime"));
        assert!(!text.contains("\n\n\n"));
        assert_eq!(text, text.trim());
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let article = article(&format!("{}/post", mock_server.uri()), "   ");
        let result = extractor().extract(&article, &CancellationToken::new()).await;

        assert!(matches!(result, Err(Error::HttpStatus { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_oversized_page_is_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("a".repeat(MAX_PAGE_BYTES + 1))
                    .insert_header("Content-Type", "text/html"),
            )
            .mount(&mock_server)
            .await;

        let article = article(&format!("{}/huge", mock_server.uri()), "");
        let result = extractor().extract(&article, &CancellationToken::new()).await;

        assert!(matches!(result, Err(Error::Extract(message)) if message.contains("larger than")));
    }

    #[tokio::test]
    async fn test_cancelled_before_fetch_completes() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(ARTICLE_PAGE)
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&mock_server)
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let article = article(&format!("{}/post", mock_server.uri()), "");
        let result = extractor().extract(&article, &cancel).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
