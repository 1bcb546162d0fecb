use thiserror::Error;

/// Error type for EMS Platform API operations.
///
/// - `AuthenticationRequired` — a call other than `clientauthentication` was
///   attempted before a token was obtained
/// - `UnsupportedMethod` — an HTTP verb other than GET/POST was requested
/// - `RequestFailed` — the remote call failed; `message` is derived from the
///   failure body
/// - `Configuration` — unknown operation, argument/parameter mismatch or an
///   invalid client setting
/// - `InvalidResponse` — a successful response that could not be used
/// - `Client` — the underlying HTTP client could not be built
#[derive(Debug, Error)]
pub enum EmsError {
    #[error("[{resource}] clientauthentication must be called first and a valid token must be returned")]
    AuthenticationRequired { resource: String },

    #[error("[{method}] Invalid request method")]
    UnsupportedMethod { method: String },

    #[error("{message}")]
    RequestFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

impl EmsError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        EmsError::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EmsError>;
