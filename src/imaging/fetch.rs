//! Remote image fetching.
//!
//! The [`Fetcher`] trait is the network seam of an image session: the
//! production [`HttpFetcher`] uses `reqwest`, tests substitute in-memory
//! fetchers with controllable latency.
//!
//! Cross-origin mode decides whether credentials travel with the request:
//! [`CrossOrigin::UseCredentials`] attaches the fetcher's configured
//! `Authorization` header, anything else sends the request anonymously.

use super::backend::ImageError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Credential mode for cross-origin image requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossOrigin {
    #[default]
    Anonymous,
    UseCredentials,
}

impl FromStr for CrossOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "anonymous" | "" => Ok(Self::Anonymous),
            "use-credentials" => Ok(Self::UseCredentials),
            other => Err(format!("unknown cross-origin mode: {other}")),
        }
    }
}

/// Retrieves the encoded bytes behind a URL.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, cross_origin: Option<CrossOrigin>)
    -> Result<Vec<u8>, ImageError>;
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
    credentials: Option<String>,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for the `Authorization` header sent with
    /// [`CrossOrigin::UseCredentials`] requests.
    pub fn with_credentials(mut self, authorization: impl Into<String>) -> Self {
        self.credentials = Some(authorization.into());
        self
    }

    fn sends_credentials(&self, cross_origin: Option<CrossOrigin>) -> Option<&str> {
        match cross_origin {
            Some(CrossOrigin::UseCredentials) => self.credentials.as_deref(),
            _ => None,
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        cross_origin: Option<CrossOrigin>,
    ) -> Result<Vec<u8>, ImageError> {
        let fail = |reason: String| ImageError::Fetch {
            url: url.to_string(),
            reason,
        };

        let mut request = self.client.get(url);
        if let Some(auth) = self.sends_credentials(cross_origin) {
            request = request.header(reqwest::header::AUTHORIZATION, auth);
        }

        let response = request.send().await.map_err(|e| fail(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {status}")));
        }
        let bytes = response.bytes().await.map_err(|e| fail(e.to_string()))?;
        tracing::debug!(url, bytes = bytes.len(), "fetched image");
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_origin_parses() {
        assert_eq!("anonymous".parse(), Ok(CrossOrigin::Anonymous));
        assert_eq!("use-credentials".parse(), Ok(CrossOrigin::UseCredentials));
        assert!("include".parse::<CrossOrigin>().is_err());
    }

    #[test]
    fn credentials_only_sent_when_requested() {
        let fetcher = HttpFetcher::new().with_credentials("Bearer t0ken");
        assert_eq!(
            fetcher.sends_credentials(Some(CrossOrigin::UseCredentials)),
            Some("Bearer t0ken")
        );
        assert_eq!(fetcher.sends_credentials(Some(CrossOrigin::Anonymous)), None);
        assert_eq!(fetcher.sends_credentials(None), None);
    }

    #[test]
    fn no_credentials_configured_sends_none() {
        let fetcher = HttpFetcher::new();
        assert_eq!(fetcher.sends_credentials(Some(CrossOrigin::UseCredentials)), None);
    }

    #[tokio::test]
    async fn unreachable_host_is_fetch_error() {
        let err = HttpFetcher::new()
            .fetch("http://127.0.0.1:9/logo.png", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ImageError::Fetch { ref url, .. } if url == "http://127.0.0.1:9/logo.png"));
    }
}
