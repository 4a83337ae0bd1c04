/// Result of a fallible compositor call.
pub type ChromaResult<T> = Result<T, ChromaError>;

/// Why a compositor call was refused.
///
/// Ticks do not fail because of what a frame looks like: a stalled or empty source skips the tick.
/// Errors come from the edges of the pipeline, i.e. buffers handed in by a caller, values passed
/// to the state setters, and configuration files.
#[derive(thiserror::Error, Debug)]
pub enum ChromaError {
    /// A buffer length did not match its dimensions, or a setter/config value was out of range
    /// (negative tolerance, non-finite offset, zero worker threads, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// A stage could not run, e.g. the worker pool failed to start or a scaled frame did not fit
    /// an image buffer.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// A configuration file was not valid JSON for [`CompositorConfig`](crate::CompositorConfig).
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything raised by a dependency that has no better home above.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ChromaError {
    /// Shorthand for [`ChromaError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Shorthand for [`ChromaError::Evaluation`].
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Shorthand for [`ChromaError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
