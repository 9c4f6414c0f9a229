use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, Proxy};

use crate::{Error, Result};

const USER_AGENT: &str = concat!("newsbot/", env!("CARGO_PKG_VERSION"));

const FEED_ACCEPT: &str =
    "application/rss+xml,application/atom+xml,application/xml;q=0.9,text/html;q=0.8,*/*;q=0.5";

const PAGE_ACCEPT: &str = "text/html,application/xhtml+xml;q=0.9,*/*;q=0.5";

/// Build an HTTP client for feed documents
pub fn build_client(timeout: Duration, proxy_url: Option<&str>) -> Result<Client> {
    build_with_accept(timeout, proxy_url, FEED_ACCEPT)
}

/// Build an HTTP client for article pages, asking for HTML first
pub fn build_page_client(timeout: Duration, proxy_url: Option<&str>) -> Result<Client> {
    build_with_accept(timeout, proxy_url, PAGE_ACCEPT)
}

fn build_with_accept(timeout: Duration, proxy_url: Option<&str>, accept: &'static str) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .default_headers(default_headers(accept))
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .redirect(reqwest::redirect::Policy::limited(10));

    if let Some(proxy) = proxy_url {
        let proxy = Proxy::all(proxy)
            .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
        builder = builder.proxy(proxy);
        tracing::info!("Using HTTP proxy for outbound requests");
    }

    builder.build().map_err(Error::Http)
}

fn default_headers(accept: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(accept));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers
}
