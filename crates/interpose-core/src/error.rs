//! Error types for invocation contexts.
//!
//! Failures raised by interceptors, business methods and constructor
//! forwarding calls travel through the chain as [`anyhow::Error`] and are
//! never wrapped by the context. [`ContextError`] only covers misuse of the
//! context protocol itself (calling `proceed()` twice, passing the wrong
//! number of parameters, and so on). It reaches callers through the same
//! `anyhow::Error` channel and can be recovered with `downcast_ref`.

use crate::interceptor::InterceptionType;
use thiserror::Error;

/// Result of driving a chain or any single link in it.
pub type InvocationResult<T = crate::Value> = anyhow::Result<T>;

/// Protocol violations detected by an invocation context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    /// The terminal action already ran; the context cannot advance again.
    #[error("invocation context already completed")]
    AlreadyCompleted,

    /// Lifecycle callbacks have no parameters.
    #[error("{kind} invocation context has no parameters")]
    ParametersUnavailable {
        /// The kind of context that was asked for parameters.
        kind: InterceptionType,
    },

    /// Replacement parameters do not match the handle's arity.
    #[error("wrong number of parameters: expected {expected}, got {actual}")]
    ParameterCount {
        /// Parameter count declared by the method or constructor handle.
        expected: usize,
        /// Number of parameters supplied.
        actual: usize,
    },

    /// The context has no target to invoke the business method on.
    #[error("{kind} invocation context has no target")]
    TargetUnavailable {
        /// The kind of context.
        kind: InterceptionType,
    },

    /// The target is not an instance of the method's declaring type.
    #[error("target type mismatch: expected {expected}, got {actual}")]
    TargetType {
        /// Declaring type of the method.
        expected: &'static str,
        /// Actual type of the target.
        actual: &'static str,
    },

    /// An argument is missing.
    #[error("missing argument at index {index}")]
    MissingArgument {
        /// Index of the missing argument.
        index: usize,
    },

    /// An argument has an unexpected type.
    #[error("argument {index} type mismatch: expected {expected}, got {actual}")]
    ArgumentType {
        /// Index of the argument.
        index: usize,
        /// Expected type name.
        expected: &'static str,
        /// Actual type name.
        actual: &'static str,
    },

    /// A value has an unexpected type.
    #[error("value type mismatch: expected {expected}, got {actual}")]
    ValueType {
        /// Expected type name.
        expected: &'static str,
        /// Actual type name.
        actual: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ContextError::AlreadyCompleted.to_string(),
            "invocation context already completed"
        );
        assert_eq!(
            ContextError::ParameterCount {
                expected: 2,
                actual: 3
            }
            .to_string(),
            "wrong number of parameters: expected 2, got 3"
        );
        assert_eq!(
            ContextError::ParametersUnavailable {
                kind: InterceptionType::PostConstruct
            }
            .to_string(),
            "post_construct invocation context has no parameters"
        );
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = ContextError::MissingArgument { index: 1 }.into();
        assert_eq!(
            err.downcast_ref::<ContextError>(),
            Some(&ContextError::MissingArgument { index: 1 })
        );
    }
}
