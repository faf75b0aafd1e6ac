//! HTTP collaborators: URL probing and page fetching.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use circex_shared::{CircexError, Result};

/// User-Agent string for all requests.
const USER_AGENT: &str = concat!("circex/", env!("CARGO_PKG_VERSION"));

/// Network access needed by the resolver. Probing and fetching are
/// separated so tests can observe exactly which URLs get hit.
pub trait SiteClient {
    /// Try each URL in order with a GET and return the first that
    /// answers 200. `None` after exhausting the list. Must not
    /// reorder the input.
    async fn probe(&self, urls: &[String]) -> Option<String>;

    /// Fetch a page body. `None` on any transport or status failure;
    /// the resolver treats that as "no content", not a fatal error.
    async fn fetch(&self, url: &str) -> Option<String>;
}

/// Production [`SiteClient`] backed by reqwest.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(request_timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()
            .map_err(|e| CircexError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl SiteClient for HttpClient {
    async fn probe(&self, urls: &[String]) -> Option<String> {
        for url in urls {
            debug!(%url, "probing candidate");
            // GET, not HEAD: the origin server mishandles HEAD requests.
            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(%url, "candidate answered 200");
                    return Some(url.clone());
                }
                Ok(response) => {
                    debug!(%url, status = %response.status(), "candidate rejected");
                }
                Err(e) => {
                    debug!(%url, error = %e, "candidate probe failed");
                }
            }
        }
        None
    }

    async fn fetch(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(%url, error = %e, "fetch failed");
                return None;
            }
        };
        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(e) => {
                warn!(%url, error = %e, "fetch returned error status");
                return None;
            }
        };
        match response.text().await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(%url, error = %e, "failed to read response body");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn probe_returns_first_success_in_order() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/acd/2014/C01.htm"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/acd/2014/c01.htm"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/acd/2014/C1.htm"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = HttpClient::new(5).expect("client");
        let urls = vec![
            format!("{}/acd/2014/C01.htm", server.uri()),
            format!("{}/acd/2014/c01.htm", server.uri()),
            format!("{}/acd/2014/C1.htm", server.uri()),
        ];

        let hit = client.probe(&urls).await;
        assert_eq!(hit, Some(format!("{}/acd/2014/c01.htm", server.uri())));
    }

    #[tokio::test]
    async fn probe_exhausts_to_none() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = HttpClient::new(5).expect("client");
        let urls = vec![format!("{}/a.htm", server.uri())];
        assert_eq!(client.probe(&urls).await, None);
        assert_eq!(client.probe(&[]).await, None);
    }

    #[tokio::test]
    async fn fetch_returns_none_on_error_status() {
        let server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = HttpClient::new(5).expect("client");
        assert!(client.fetch(&format!("{}/x.htm", server.uri())).await.is_none());
    }
}
