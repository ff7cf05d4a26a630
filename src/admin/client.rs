//! HTTP client for the Dgraph admin surface of one instance.
//!
//! API: POST /admin/schema (text/plain), POST /alter (JSON)

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde_json::json;

use crate::config::{DEFAULT_SCHEMA_SETTLE, SandboxConfig};
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};
use crate::sandbox::{InstanceHandle, local_http_client};

use super::error::AdminError;
use super::response::{AdminResponse, SchemaReply};

pub const SCHEMA_PATH: &str = "/admin/schema";
pub const ALTER_PATH: &str = "/alter";

/// Terminal state of a schema load that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaLoad {
    Succeeded { attempts: u32 },
    /// The instance kept answering "not ready" (or an unrecognized reply)
    /// until the retry budget ran out.
    Exhausted { attempts: u32 },
}

// ── Client ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AdminClient {
    base_url: String,
    client: reqwest::Client,
    schema_retry: RetryPolicy,
    schema_settle: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl AdminClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: local_http_client(),
            schema_retry: RetryPolicy::default(),
            schema_settle: DEFAULT_SCHEMA_SETTLE,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn for_instance(handle: &InstanceHandle) -> Self {
        Self::new(handle.base_url())
    }

    pub fn from_config(handle: &InstanceHandle, config: &SandboxConfig) -> Self {
        Self::for_instance(handle)
            .with_schema_retry(config.schema_retry.clone())
            .with_schema_settle(config.schema_settle)
    }

    pub fn with_schema_retry(mut self, policy: RetryPolicy) -> Self {
        self.schema_retry = policy;
        self
    }

    pub fn with_schema_settle(mut self, settle: Duration) -> Self {
        self.schema_settle = settle;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn schema_retry(&self) -> &RetryPolicy {
        &self.schema_retry
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a prepared POST and decode the admin reply. Anything but 200 is
    /// an error.
    async fn send(
        &self,
        path: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<AdminResponse, AdminError> {
        let resp = request
            .send()
            .await
            .map_err(|source| AdminError::Http { path, source })?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|source| AdminError::Http { path, source })?;

        if status != StatusCode::OK {
            return Err(AdminError::Status { path, status, body });
        }

        serde_json::from_str(&body).map_err(|source| AdminError::Decode { path, source })
    }

    /// Install a GraphQL schema.
    ///
    /// Retries while the instance reports "not ready" or sends a reply with
    /// neither a result code nor errors. Any other error is returned after
    /// the first attempt. Running out of attempts returns
    /// [`SchemaLoad::Exhausted`] rather than an error.
    pub async fn load_schema(&self, schema: &str) -> Result<SchemaLoad, AdminError> {
        tracing::info!(base_url = %self.base_url, "loading schema");

        let url = self.url(SCHEMA_PATH);
        let mut attempt = 1;

        loop {
            let request = self
                .client
                .post(&url)
                .header(CONTENT_TYPE, "text/plain")
                .body(schema.to_string());
            let reply = self.send(SCHEMA_PATH, request).await?;

            match reply.schema_reply() {
                SchemaReply::Success => {
                    self.sleeper.sleep(self.schema_settle).await;
                    tracing::info!(attempts = attempt, "schema loaded");
                    return Ok(SchemaLoad::Succeeded { attempts: attempt });
                }
                SchemaReply::NotReady(message) => {
                    tracing::debug!(attempt, message = %message, "instance not ready for schema");
                }
                SchemaReply::Rejected { message, messages } => {
                    tracing::error!(message = %message, "schema rejected");
                    return Err(AdminError::Rejected { message, messages });
                }
                SchemaReply::Unrecognized => {
                    tracing::warn!(attempt, response = ?reply, "unexpected schema response");
                }
            }

            match self.schema_retry.delay_after(attempt) {
                Some(delay) => {
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    tracing::warn!(attempts = attempt, "schema load retries exhausted");
                    return Ok(SchemaLoad::Exhausted { attempts: attempt });
                }
            }
        }
    }

    /// Delete all data, keeping the schema.
    pub async fn drop_data(&self) -> Result<(), AdminError> {
        tracing::info!(base_url = %self.base_url, "dropping data");
        self.alter(json!({ "drop_op": "DATA" })).await
    }

    /// Delete all data and the schema.
    pub async fn drop_all(&self) -> Result<(), AdminError> {
        tracing::info!(base_url = %self.base_url, "dropping data and schema");
        self.alter(json!({ "drop_all": true })).await
    }

    async fn alter(&self, op: serde_json::Value) -> Result<(), AdminError> {
        let request = self.client.post(self.url(ALTER_PATH)).json(&op);
        let reply = self.send(ALTER_PATH, request).await?;

        if !reply.is_success() {
            return Err(AdminError::Unsuccessful {
                path: ALTER_PATH,
                code: reply.result_code().map(String::from),
                errors: reply.error_messages(),
            });
        }
        Ok(())
    }
}

// ── Tests ───────────────────────────────────────────────────────────
