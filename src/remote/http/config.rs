//! Connection settings for the HTTP session service.

/// Runtime configuration describing how to reach the session service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Root URL every request path is appended to.
    pub base_url: String,
    /// Bearer token sent on owner-only calls.
    pub token: Option<String>,
}

impl ApiConfig {
    /// Construct a configuration from an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
        }
    }

    /// Attach the bearer token used for authenticated calls.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}
