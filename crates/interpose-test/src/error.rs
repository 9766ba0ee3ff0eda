//! Test error types.

use thiserror::Error;

/// The failure raised by [`FailingInterceptor`](crate::FailingInterceptor)
/// and failing fixtures.
///
/// Tests downcast the `anyhow::Error` returned by a chain to this type to
/// check that a failure reached the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{source_name} failed: {message}")]
pub struct TestFailure {
    /// The interceptor or fixture that raised the failure.
    pub source_name: String,
    /// Failure message.
    pub message: String,
}

impl TestFailure {
    /// Creates a failure raised by `source_name`.
    pub fn new(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
