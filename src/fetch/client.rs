use async_trait::async_trait;
use reqwest::{Request, Response};

/// The single seam every upstream call goes through.
///
/// Wrappers such as [`ApiKey`](super::auth::ApiKey) decorate a request before
/// handing it to an inner client, so tests can point the whole stack at a
/// local mock server.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
