//! Container error types.

use thiserror::Error;

/// Registration and lookup failures raised by the container itself.
///
/// Failures raised by interceptors, business methods or constructors are
/// never wrapped in this type; they reach the caller as the original
/// `anyhow::Error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContainerError {
    /// The container settings were rejected.
    #[error("invalid container configuration: {reason}")]
    InvalidConfig {
        /// Validation message.
        reason: String,
    },

    /// A bean with this name is already registered.
    #[error("bean '{bean}' is already registered")]
    DuplicateBean {
        /// Bean name.
        bean: String,
    },

    /// No bean with this name is registered.
    #[error("no bean named '{bean}' is registered")]
    UnknownBean {
        /// Bean name.
        bean: String,
    },

    /// The bean has no intercepted method with this name.
    #[error("bean '{bean}' has no method '{method}'")]
    UnknownMethod {
        /// Bean name.
        bean: String,
        /// Method name.
        method: String,
    },

    /// A chain exceeds `container.max_chain_length`.
    #[error("chain '{chain}' of bean '{bean}' has {length} interceptors, limit is {max}")]
    ChainTooLong {
        /// Bean name.
        bean: String,
        /// Method name, or the lifecycle event name.
        chain: String,
        /// Number of interceptors in the chain.
        length: usize,
        /// Configured limit.
        max: usize,
    },

    /// The instance was already destroyed.
    #[error("instance of bean '{bean}' was destroyed")]
    Destroyed {
        /// Bean name.
        bean: String,
    },

    /// An around-construct interceptor returned without an instance being
    /// constructed.
    #[error("around-construct chain of bean '{bean}' returned without constructing an instance")]
    NotConstructed {
        /// Bean name.
        bean: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ContainerError::ChainTooLong {
            bean: "orders".to_string(),
            chain: "place".to_string(),
            length: 5,
            max: 4,
        };
        assert_eq!(
            err.to_string(),
            "chain 'place' of bean 'orders' has 5 interceptors, limit is 4"
        );

        let err = ContainerError::UnknownMethod {
            bean: "orders".to_string(),
            method: "cancel".to_string(),
        };
        assert_eq!(err.to_string(), "bean 'orders' has no method 'cancel'");
    }
}
