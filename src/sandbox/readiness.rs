use std::sync::Arc;

use crate::retry::{RetryPolicy, Sleeper, TokioSleeper};

use super::types::Readiness;

/// HTTP client for talking to a local instance.
///
/// Instances always listen on `localhost`, so proxy settings from the
/// environment (`HTTP_PROXY` and friends) are ignored.
pub fn local_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default http client");
            reqwest::Client::new()
        })
}

/// Polls an instance's base URL until it answers `200 OK`.
///
/// Connection errors and non-200 statuses are both "not ready yet". Running
/// out of attempts is reported as [`Readiness::NotReady`], never as an error.
#[derive(Clone)]
pub struct ReadinessPoller {
    client: reqwest::Client,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl ReadinessPoller {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            client: local_http_client(),
            policy,
            sleeper,
        }
    }

    pub async fn wait(&self, base_url: &str) -> Readiness {
        let url = format!("{}/", base_url.trim_end_matches('/'));
        let mut attempt = 1;

        loop {
            match self.client.get(&url).send().await {
                Ok(resp) if resp.status() == reqwest::StatusCode::OK => {
                    tracing::info!(url = %url, attempts = attempt, "instance is ready");
                    return Readiness::Ready { attempts: attempt };
                }
                Ok(resp) => {
                    tracing::debug!(url = %url, attempt, status = %resp.status(), "instance not ready");
                }
                Err(e) => {
                    tracing::debug!(url = %url, attempt, error = %e, "instance not reachable");
                }
            }

            match self.policy.delay_after(attempt) {
                Some(delay) => {
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    tracing::warn!(url = %url, attempts = attempt, "gave up waiting for instance");
                    return Readiness::NotReady { attempts: attempt };
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    /// Point every proxy variable at a closed port. Process-wide, so only
    /// safe because no client in this crate reads proxy settings.
    pub fn set_unreachable_proxy() {
        for var in ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"] {
            // SAFETY: tests never read these variables concurrently; the
            // clients under test are built with proxies disabled.
            unsafe { std::env::set_var(var, "http://127.0.0.1:9") };
        }
    }
}
