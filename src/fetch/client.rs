use async_trait::async_trait;
use reqwest::{Request, Response};

/// Executes HTTP requests for the ingestion step.
///
/// Implemented by [`super::BasicClient`]; tests and callers with special
/// transport needs can supply their own.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
