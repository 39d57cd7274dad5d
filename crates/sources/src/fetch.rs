//! HTTP fetch session with per-request timeout and a single retry.
//!
//! A [`FetchSession`] owns the connection pool for one pipeline run. Clients
//! borrow it, so the pool is released when the session goes out of scope,
//! whichever path the run takes.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use seascape_common::{RemoteError, SeascapeError, SeascapeResult};

/// HTTP settings for remote data services.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout, applied to every attempt.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Pause before the single retry of a retryable failure.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    15
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_user_agent() -> String {
    concat!("seascape/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            retry_delay_ms: default_retry_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Bytes of an error page kept on [`RemoteError::Http`].
const ERROR_BODY_LIMIT: usize = 512;

/// Scoped HTTP client shared by all source clients of one run.
pub struct FetchSession {
    client: Client,
    timeout: Duration,
    retry_delay: Duration,
    requests: AtomicU32,
    opened_at: Instant,
}

impl FetchSession {
    /// Open a session with its own connection pool.
    pub fn open(config: &HttpConfig) -> SeascapeResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .pool_max_idle_per_host(2)
            .build()
            .map_err(|e| {
                SeascapeError::InvalidConfig(format!("failed to create HTTP client: {e}"))
            })?;

        debug!(timeout_secs = config.timeout_secs, "Opened fetch session");

        Ok(Self {
            client,
            timeout: config.timeout(),
            retry_delay: config.retry_delay(),
            requests: AtomicU32::new(0),
            opened_at: Instant::now(),
        })
    }

    /// Number of HTTP requests issued so far, retries included.
    pub fn request_count(&self) -> u32 {
        self.requests.load(Ordering::Relaxed)
    }

    /// GET `url` and return the body, retrying once on retryable failures.
    #[instrument(skip(self, query), fields(url = %url))]
    pub async fn get_text(&self, url: &str, query: &[(&str, String)]) -> Result<String, RemoteError> {
        match self.attempt(url, query).await {
            Ok(body) => Ok(body),
            Err(err) if err.is_retryable() => {
                warn!(
                    error = %err,
                    delay_ms = self.retry_delay.as_millis() as u64,
                    "Remote fetch failed, retrying once"
                );
                metrics::counter!("seascape_fetch_retries_total").increment(1);
                tokio::time::sleep(self.retry_delay).await;
                self.attempt(url, query).await.inspect_err(|err| {
                    warn!(error = %err, "Remote fetch failed after retry");
                    metrics::counter!("seascape_fetch_failures_total").increment(1);
                })
            }
            Err(err) => {
                warn!(error = %err, "Remote fetch failed, not retryable");
                metrics::counter!("seascape_fetch_failures_total").increment(1);
                Err(err)
            }
        }
    }

    /// GET `url` and decode the JSON body into `T`.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, RemoteError> {
        let body = self.get_text(url, query).await?;
        serde_json::from_str(&body).map_err(|e| RemoteError::MalformedPayload {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn attempt(&self, url: &str, query: &[(&str, String)]) -> Result<String, RemoteError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        let request = async {
            let mut request = self.client.get(url);
            if !query.is_empty() {
                request = request.query(query);
            }
            let response = request
                .send()
                .await
                .map_err(|e| classify(url, started, e))?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                return Err(RemoteError::RateLimited {
                    url: url.to_string(),
                });
            }
            if !status.is_success() {
                let mut body = response.text().await.unwrap_or_default();
                if body.len() > ERROR_BODY_LIMIT {
                    let mut end = ERROR_BODY_LIMIT;
                    while !body.is_char_boundary(end) {
                        end -= 1;
                    }
                    body.truncate(end);
                }
                return Err(RemoteError::Http {
                    url: url.to_string(),
                    status: status.as_u16(),
                    body,
                });
            }

            response.text().await.map_err(|e| classify(url, started, e))
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => {
                debug!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    ok = result.is_ok(),
                    "Request finished"
                );
                result
            }
            Err(_) => Err(RemoteError::Timeout {
                url: url.to_string(),
                elapsed: started.elapsed(),
            }),
        }
    }
}

impl Drop for FetchSession {
    fn drop(&mut self) {
        debug!(
            requests = self.request_count(),
            open_secs = self.opened_at.elapsed().as_secs_f64(),
            "Closing fetch session"
        );
    }
}

fn classify(url: &str, started: Instant, err: reqwest::Error) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout {
            url: url.to_string(),
            elapsed: started.elapsed(),
        }
    } else if err.is_decode() {
        RemoteError::MalformedPayload {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else {
        RemoteError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(config.retry_delay(), Duration::from_millis(2000));
        assert!(config.user_agent.starts_with("seascape/"));
    }

    #[test]
    fn test_config_from_yaml_uses_defaults() {
        let config: HttpConfig = serde_json::from_str(r#"{"timeout_secs": 5}"#).unwrap();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.retry_delay_ms, 2000);
    }

    #[tokio::test]
    async fn test_session_counts_nothing_before_use() {
        let session = FetchSession::open(&HttpConfig::default()).unwrap();
        assert_eq!(session.request_count(), 0);
    }
}
