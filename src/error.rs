use thiserror::Error;

/// Errors surfaced before a token stream is established.
///
/// Once a [`Session`](crate::Session) exists, failures are no longer reported as
/// values: the token stream simply ends.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or unreadable configuration.
    #[error("config: {0}")]
    Config(String),

    /// No response arrived within the header wait window.
    #[error("timeout")]
    Timeout,

    /// The call's lifetime ended before an outcome was observed.
    #[error("cancelled")]
    Cancelled,

    /// HTTP/network error (connect, DNS, TLS, body read).
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid or missing API key.
    #[error("unauthorized")]
    Unauthorized,

    /// Non-success status with the server's message.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The body ended before the metadata line.
    #[error("response body ended before the metadata line")]
    MissingHeader,
}

impl Error {
    /// Returns true if the request was abandoned because of the header deadline.
    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout)
    }

    /// Create an API error from status and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
