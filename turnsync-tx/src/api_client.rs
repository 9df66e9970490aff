//! REST API client for the turn-ingest and resource endpoints
//!
//! Both endpoint families share one contract: GET returns the document or
//! an empty body when absent, and writes (POST) answer with an empty body.
//! A non-empty acknowledgement on a write means the call did not land as a
//! silent upsert; that is a contract violation and aborts the run rather
//! than being retried.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use turnsync_common::model::{ClassDoc, LessonDoc, StudentDoc, Turn};
use turnsync_common::{Error, Result};

use crate::pipeline::TurnSink;
use crate::seed::ResourceApi;

const USER_AGENT: &str = concat!("turnsync-tx/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT_SECS: u64 = 30;

/// Bounded exponential backoff applied to destination writes.
///
/// Only transport faults are retried; contract violations and validation
/// failures surface immediately.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
        }
    }
}

/// Retry an operation on transport faults, doubling the backoff between
/// attempts up to the policy cap. Every other error kind fails
/// immediately.
pub async fn retry_transport<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut backoff = policy.initial_backoff;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(Error::Transport(detail)) if attempt < policy.max_attempts => {
                warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %detail,
                    "transport fault, will retry after backoff"
                );
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(policy.max_backoff);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Client for the turn/resource REST API
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    retry: RetryPolicy,
}

impl ApiClient {
    /// Build a client for the given API base URL, e.g.
    /// `http://localhost:62702/api`
    pub fn new(base: impl Into<String>, retry: RetryPolicy) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        let base = base.into().trim_end_matches('/').to_string();
        Ok(ApiClient { http, base, retry })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    /// GET a resource document. An empty response body means absent.
    async fn fetch_doc<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let url = self.url(path);
        debug!(url = %url, "fetching resource");

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("GET {} returned {}", url, status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        let doc = serde_json::from_str(&body)
            .map_err(|e| Error::Validation(format!("GET {}: {}", url, e)))?;
        Ok(Some(doc))
    }

    /// POST to a bodyless upsert/ingest endpoint, retrying transport
    /// faults per the policy.
    async fn post_expect_empty<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        let payload = serde_json::to_value(body)
            .map_err(|e| Error::Validation(format!("serializing POST {} body: {}", url, e)))?;

        retry_transport(&self.retry, path, || {
            let http = self.http.clone();
            let url = url.clone();
            let payload = payload.clone();
            async move {
                debug!(url = %url, "posting");

                let response = http
                    .post(&url)
                    .json(&payload)
                    .send()
                    .await
                    .map_err(|e| Error::Transport(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(Error::Transport(format!(
                        "POST {} returned {}",
                        url, status
                    )));
                }

                let ack = response
                    .text()
                    .await
                    .map_err(|e| Error::Transport(e.to_string()))?;
                if !ack.trim().is_empty() {
                    return Err(Error::Contract(format!(
                        "POST {} answered with a body: {}",
                        url,
                        ack.trim()
                    )));
                }
                Ok(())
            }
        })
        .await
    }

    /// Post one turn to the turn-ingest endpoint
    pub async fn post_turn(&self, turn: &Turn) -> Result<()> {
        self.post_expect_empty("turn", turn).await
    }

    pub async fn fetch_class(&self, class_id: &str) -> Result<Option<ClassDoc>> {
        self.fetch_doc(&format!("classes/{}", class_id)).await
    }

    pub async fn store_class(&self, doc: &ClassDoc) -> Result<()> {
        self.post_expect_empty(&format!("classes/{}", doc.class_id), doc)
            .await
    }

    pub async fn fetch_lesson(&self, lesson_id: &str) -> Result<Option<LessonDoc>> {
        self.fetch_doc(&format!("lessons/{}", lesson_id)).await
    }

    pub async fn store_lesson(&self, doc: &LessonDoc) -> Result<()> {
        self.post_expect_empty(&format!("lessons/{}", doc.lesson_id), doc)
            .await
    }

    pub async fn fetch_student(&self, user_id: &str) -> Result<Option<StudentDoc>> {
        self.fetch_doc(&format!("students/{}", user_id)).await
    }

    pub async fn store_student(&self, doc: &StudentDoc) -> Result<()> {
        self.post_expect_empty(&format!("students/{}", doc.user_id), doc)
            .await
    }
}

impl TurnSink for ApiClient {
    async fn post_turn(&self, turn: &Turn) -> Result<()> {
        ApiClient::post_turn(self, turn).await
    }
}

impl ResourceApi for ApiClient {
    async fn fetch_class(&self, class_id: &str) -> Result<Option<ClassDoc>> {
        ApiClient::fetch_class(self, class_id).await
    }

    async fn store_class(&self, doc: &ClassDoc) -> Result<()> {
        ApiClient::store_class(self, doc).await
    }

    async fn fetch_lesson(&self, lesson_id: &str) -> Result<Option<LessonDoc>> {
        ApiClient::fetch_lesson(self, lesson_id).await
    }

    async fn store_lesson(&self, doc: &LessonDoc) -> Result<()> {
        ApiClient::store_lesson(self, doc).await
    }

    async fn fetch_student(&self, user_id: &str) -> Result<Option<StudentDoc>> {
        ApiClient::fetch_student(self, user_id).await
    }

    async fn store_student(&self, doc: &StudentDoc) -> Result<()> {
        ApiClient::store_student(self, doc).await
    }
}
