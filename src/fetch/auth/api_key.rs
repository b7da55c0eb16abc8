use crate::fetch::client::HttpClient;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// The header name and value are validated once at construction so that
/// `execute` never has to fail on a malformed key.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(header_name.as_bytes())
            .with_context(|| format!("invalid header name '{header_name}'"))?;
        let mut key = HeaderValue::from_str(key).context("API key is not a valid header value")?;
        key.set_sensitive(true);
        Ok(Self {
            inner,
            header_name,
            key,
        })
    }

    /// The CDO web service expects the access token in a `token` header.
    pub fn cdo_token(inner: C, token: &str) -> Result<Self> {
        Self::new(inner, "token", token)
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.key.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[async_trait]
    impl HttpClient for Noop {
        async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            unreachable!("not called in these tests")
        }
    }

    #[test]
    fn test_rejects_invalid_header_name() {
        assert!(ApiKey::new(Noop, "bad header", "abc").is_err());
    }

    #[test]
    fn test_rejects_key_with_newline() {
        assert!(ApiKey::cdo_token(Noop, "abc\ndef").is_err());
    }

    #[test]
    fn test_cdo_token_uses_token_header() {
        let client = ApiKey::cdo_token(Noop, "secret").unwrap();
        assert_eq!(client.header_name.as_str(), "token");
        assert!(client.key.is_sensitive());
    }
}
