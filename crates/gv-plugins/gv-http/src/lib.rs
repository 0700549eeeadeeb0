//! # gv-http
//!
//! `HttpTransport` backed by reqwest. Used for every outbound read
//! (GitHub REST, translation API). No retries or backoff are applied here.

use std::time::Duration;

use async_trait::async_trait;
use gv_core::traits::{HttpResponse, HttpTransport};

/// A real HTTP transport backed by reqwest.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// GitHub rejects requests without a User-Agent, so one is always set.
    pub fn with_timeout(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> anyhow::Result<HttpResponse> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status().as_u16();
        let body = resp.bytes().await?.to_vec();
        tracing::debug!(url, status, bytes = body.len(), "GET");

        Ok(HttpResponse { status, body })
    }
}
