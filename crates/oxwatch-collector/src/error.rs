/// Errors raised while building or capturing a metric source.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// An option value could not be used (e.g. a non-numeric port).
    #[error("Source: invalid configuration: {0}")]
    InvalidConfig(String),

    /// No builder is registered under this source type.
    #[error("Source: unknown source type '{0}'")]
    UnknownSource(String),

    /// The fetched payload did not have the expected shape.
    #[error("Source: parse error: {0}")]
    Parse(String),

    /// An HTTP request to the status endpoint failed.
    #[error("Source: HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Any other failure to obtain the raw payload.
    #[error("Source: transport error: {0}")]
    Transport(String),

    /// One-time setup did not complete.
    #[error("Source: prepare failed: {0}")]
    Prepare(String),
}
