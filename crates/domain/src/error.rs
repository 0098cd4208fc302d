/// Shared error type used across all Ticketwise crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the engine's retry policy may re-attempt the failed call.
    ///
    /// Not-found and malformed-input failures are terminal, as are config,
    /// auth, and deserialization errors; HTTP/timeout failures are treated
    /// as transient.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            Error::NotFound(_)
                | Error::InvalidArgument(_)
                | Error::Json(_)
                | Error::Config(_)
                | Error::Auth(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
