use reqwest::{header, StatusCode};
use url::Url;

use crate::config::Config;

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("{0}")]
    InvalidUrl(String),
    #[error("Upstream returned {0}")]
    Upstream(StatusCode),
    #[error("Upstream returned an empty page")]
    EmptyBody,
    #[error("{0}")]
    Request(String),
}

// ── URL validation ───────────────────────────────────────────────────────────

pub fn parse_listing_url(raw: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(raw.trim())
        .map_err(|_| FetchError::InvalidUrl("Invalid url parameter.".to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(
            "Only http and https listing URLs are supported.".to_string(),
        ));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(FetchError::InvalidUrl("Listing URL has no host.".to_string()));
    }
    Ok(parsed)
}

/// Lowercased host of a listing URL, as the extractor expects it.
pub fn listing_hostname(url: &Url) -> String {
    url.host_str().unwrap_or("").to_lowercase()
}

// ── HTTP fetch ───────────────────────────────────────────────────────────────

/// Pooled client for listing pages. Marketplaces serve bot user agents a
/// stripped page, so requests look like a desktop browser and skip caches.
#[derive(Clone)]
pub struct ListingFetcher {
    client: reqwest::Client,
}

impl ListingFetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            header::HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-cache"));
        headers.insert(header::PRAGMA, header::HeaderValue::from_static("no-cache"));

        let mut builder = reqwest::ClientBuilder::new()
            .connect_timeout(config.connect_timeout)
            .timeout(config.fetch_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers);

        if config.insecure_ssl {
            tracing::warn!("TLS certificate verification is disabled for listing fetches");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        let response = self.client.get(url.as_str()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Request(format!("TimeoutError: {}", e))
            } else if e.is_connect() {
                FetchError::Request(format!("ConnectError: {}", e))
            } else {
                FetchError::Request(format!("RequestError: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Upstream(status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        if body.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }
        tracing::debug!(url = %url, bytes = body.len(), "fetched listing page");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_http_and_https_listing_urls() {
        let url = parse_listing_url("https://www.redfin.com/CA/Home/123").unwrap();
        assert_eq!(listing_hostname(&url), "www.redfin.com");

        let url = parse_listing_url("  http://Homes.Example.com/listing?id=4 ").unwrap();
        assert_eq!(listing_hostname(&url), "homes.example.com");
    }

    #[test]
    fn rejects_unusable_listing_urls() {
        for raw in ["not a url", "/relative/path", "ftp://example.com/a", "mailto:a@b.c"] {
            assert!(
                matches!(parse_listing_url(raw), Err(FetchError::InvalidUrl(_))),
                "accepted {}",
                raw
            );
        }
    }

    #[test]
    fn fetcher_builds_from_default_config() {
        assert!(ListingFetcher::new(&Config::default()).is_ok());
    }
}
