//! Client configuration and defaults.

use std::time::Duration;

/// Request timeout used by most boxes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Request timeout used by the text and video boxes, whose calls are quick
/// or asynchronous on the server side.
pub const DEFAULT_TEXT_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between two `/info` calls while polling a box status.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// `Accept` header sent with every request.
pub const ACCEPT_JSON: &str = "application/json; charset=utf-8";

/// `Content-Type` of JSON request bodies.
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=utf-8";

const DEFAULT_USER_AGENT: &str = concat!("machinebox-sdk-rust/", env!("CARGO_PKG_VERSION"));

/// Options used to build the HTTP transport of a box client.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ClientOptions {
    /// Options with the default timeout and the crate user agent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total timeout of a single request, body included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the `User-Agent` header sent with every request.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub(crate) fn build_http_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()
    }
}
