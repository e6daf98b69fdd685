use thiserror::Error;

/// Failure reported by a warning listener.
///
/// The monitor logs it and keeps notifying the remaining listeners.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ListenerError {
    #[error("listener failed: {0}")]
    Failed(String),
}

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}
