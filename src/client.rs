use std::fmt;
use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde_json::Value;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::models::{CheckType, JobHandle, RawResults};

/// Failures that abort a whole check. Per-node problems never surface here;
/// the normalizer folds them into the per-node records.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{check} submission failed after {attempts} attempts: {reason}")]
    Submission {
        check: CheckType,
        attempts: u32,
        reason: String,
    },

    #[error("timed out after {waited_ms}ms waiting for results: {cause}")]
    PollTimeout { waited_ms: u128, cause: TimeoutCause },
}

/// Why the poll loop gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeoutCause {
    /// The deadline passed while some nodes were still reporting.
    Incomplete,
    /// The last poll before the deadline failed at transport level.
    Transport(String),
}

impl fmt::Display for TimeoutCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutCause::Incomplete => f.write_str("not all nodes responded in time"),
            TimeoutCause::Transport(e) => write!(f, "transport failure near deadline: {e}"),
        }
    }
}

/// Protocol client for the measurement backend. One instance per invocation;
/// the underlying HTTP session is reused across submit and poll.
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl ApiClient {
    pub fn new(config: ClientConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("globeping/0.1"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self { http, config })
    }

    /// Submit a check and return the backend's job handle. The submission
    /// itself is retried on transport failure or a handle-less response,
    /// with a fixed backoff between attempts.
    pub async fn submit(
        &self,
        check: CheckType,
        target: &str,
        nodes: &[String],
    ) -> Result<JobHandle, ClientError> {
        let url = format!("{}/{}", self.config.base_url, check.endpoint());
        let mut last_failure = String::new();

        for attempt in 1..=self.config.submit_attempts {
            if attempt > 1 {
                sleep(self.config.submit_backoff()).await;
            }

            match self.request_handle(&url, target, nodes).await {
                Ok(Some(handle)) => {
                    debug!("{} check accepted, job handle {}", check, handle);
                    return Ok(handle);
                }
                Ok(None) => {
                    last_failure = "response carried no request id".to_string();
                    warn!(
                        "{} submission attempt {}/{} returned no request id",
                        check, attempt, self.config.submit_attempts
                    );
                }
                Err(e) => {
                    last_failure = e.to_string();
                    warn!(
                        "{} submission attempt {}/{} failed: {}",
                        check, attempt, self.config.submit_attempts, e
                    );
                }
            }
        }

        Err(ClientError::Submission {
            check,
            attempts: self.config.submit_attempts,
            reason: last_failure,
        })
    }

    async fn request_handle(
        &self,
        url: &str,
        target: &str,
        nodes: &[String],
    ) -> Result<Option<JobHandle>, reqwest::Error> {
        let mut query: Vec<(&str, &str)> = vec![("host", target)];
        query.extend(nodes.iter().map(|n| ("node", n.as_str())));

        let body: Value = self
            .http
            .get(url)
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(body
            .get("request_id")
            .and_then(Value::as_str)
            .map(|id| JobHandle(id.to_string())))
    }

    /// Poll for results until every node has reported or the wait ceiling
    /// passes. Sleeps the poll interval before each attempt; with the
    /// default 10s cadence against a 30s ceiling that is at most ~3 polls,
    /// which keeps pressure off the backend. A transport failure before the
    /// deadline is tolerated and polling continues.
    pub async fn wait_for_results(&self, handle: &JobHandle) -> Result<RawResults, ClientError> {
        let url = format!("{}/check-result/{}", self.config.base_url, handle);
        let started = Instant::now();
        let mut last_transport: Option<String> = None;

        loop {
            sleep(self.config.poll_interval()).await;

            match self.fetch_snapshot(&url).await {
                Ok(snapshot) => {
                    last_transport = None;
                    if all_reported(&snapshot) {
                        return Ok(snapshot);
                    }
                    debug!(
                        "{}/{} nodes reported for job {}",
                        snapshot.values().filter(|v| !v.is_null()).count(),
                        snapshot.len(),
                        handle
                    );
                }
                Err(e) => {
                    last_transport = Some(e.to_string());
                    warn!("result poll for job {} failed: {}", handle, e);
                }
            }

            if started.elapsed() >= self.config.max_wait() {
                let cause = match last_transport {
                    Some(e) => TimeoutCause::Transport(e),
                    None => TimeoutCause::Incomplete,
                };
                return Err(ClientError::PollTimeout {
                    waited_ms: started.elapsed().as_millis(),
                    cause,
                });
            }
        }
    }

    async fn fetch_snapshot(&self, url: &str) -> Result<RawResults, reqwest::Error> {
        self.http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}

/// A node counts as reported once its value is anything but null, including
/// backend-side error sentinels. An empty snapshot therefore counts as
/// complete.
fn all_reported(snapshot: &RawResults) -> bool {
    snapshot.values().all(|v| !v.is_null())
}
