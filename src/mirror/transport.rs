//! HTTP transport used by the mirror client.
//!
//! The client only needs "GET this URL, give me status and body", so that is
//! all the seam exposes. Production uses [`ReqwestTransport`]; tests script
//! responses per URL.

use std::time::Duration;

use async_trait::async_trait;

use super::domain::MirrorError;

/// User agent sent to mirrors
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }
}

/// Minimal async GET abstraction.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, MirrorError>;
}

/// reqwest-backed transport with a fixed per-request timeout.
pub struct ReqwestTransport {
    http_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport whose every request gives up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, MirrorError> {
        let http_client = reqwest::Client::builder()
            .gzip(true)
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, MirrorError> {
        let response = self.http_client.get(url).send().await?;
        let status = response.status().as_u16();

        // Error bodies are never inspected
        if status != 200 {
            return Ok(HttpResponse {
                status,
                body: Vec::new(),
            });
        }

        let body = response.bytes().await?.to_vec();
        Ok(HttpResponse { status, body })
    }
}
