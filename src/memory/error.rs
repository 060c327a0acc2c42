#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error("store error: {0}")]
    Store(String),
    #[error("embedding error: {0}")]
    Embedding(String),
    #[error("memory engine error: {0}")]
    Engine(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("{0} timed out")]
    Timeout(&'static str),
}

impl MemoryError {
    /// Classify an HTTP failure. A timeout is reported as `Timeout` whether
    /// it hit while sending or while reading the body.
    pub(crate) fn from_http(
        e: reqwest::Error,
        what: &'static str,
        other: impl FnOnce(reqwest::Error) -> Self,
    ) -> Self {
        if e.is_timeout() {
            MemoryError::Timeout(what)
        } else {
            other(e)
        }
    }
}
