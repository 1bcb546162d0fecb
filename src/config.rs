//! Client configuration.

use std::time::Duration;

use crate::error::{EmsError, Result};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings used to open an [`EmsClient`](crate::EmsClient) session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, e.g. `https://ems.example.edu/EmsPlatform/api/v1`.
    pub base_url: String,
    /// Client ID and secret. When both are non-empty the session
    /// authenticates on construction.
    pub credentials: Option<(String, String)>,
    /// Page size sent when a call leaves `pageSize` empty.
    pub default_page_size: Option<u32>,
    /// Verbose transport logging and full request/response dumps in errors.
    pub debug: bool,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            credentials: None,
            default_page_size: None,
            debug: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Read settings from `EMS_BASE_URL`, `EMS_CLIENT_ID`, `EMS_SECRET`,
    /// `EMS_PAGE_SIZE` and `EMS_DEBUG`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup("EMS_BASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| EmsError::configuration("EMS_BASE_URL is not set"))?;
        let mut config = Self::new(base_url);

        if let (Some(id), Some(secret)) = (lookup("EMS_CLIENT_ID"), lookup("EMS_SECRET")) {
            config = config.with_credentials(id, secret);
        }
        if let Some(size) = lookup("EMS_PAGE_SIZE").filter(|v| !v.is_empty()) {
            let size = size.trim().parse::<u32>().map_err(|e| {
                EmsError::configuration(format!("EMS_PAGE_SIZE '{size}' is not a page size: {e}"))
            })?;
            config = config.with_default_page_size(size);
        }
        if let Some(debug) = lookup("EMS_DEBUG") {
            config.debug = matches!(
                debug.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        Ok(config)
    }

    #[must_use]
    pub fn with_credentials(mut self, client_id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.credentials = Some((client_id.into(), secret.into()));
        self
    }

    #[must_use]
    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = Some(page_size);
        self
    }

    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Credentials to authenticate with at construction, if both are set.
    pub(crate) fn login(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .filter(|(id, secret)| !id.is_empty() && !secret.is_empty())
            .map(|(id, secret)| (id.as_str(), secret.as_str()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(EmsError::configuration("base_url cannot be empty"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(EmsError::configuration(
                "base_url must start with http:// or https://",
            ));
        }
        Ok(())
    }
}
