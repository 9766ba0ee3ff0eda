//! Type-erased values carried through invocation chains.
//!
//! Targets, arguments and results all travel through the chain as [`Value`]s.
//! A `Value` is a cheap-to-clone handle to an `Arc<dyn Any + Send + Sync>`
//! that remembers the concrete type name for diagnostics.
//!
//! # Example
//!
//! ```
//! use interpose_core::Value;
//!
//! let value = Value::new(42_i64);
//! assert!(value.is::<i64>());
//! assert_eq!(value.downcast_ref::<i64>(), Some(&42));
//! assert!(value.downcast_ref::<String>().is_none());
//! ```

use crate::error::ContextError;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;

/// A shared, type-erased value.
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    /// Wraps a value.
    #[must_use]
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Wraps an already shared value without reallocating.
    #[must_use]
    pub fn from_arc<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: type_name::<T>(),
        }
    }

    /// The value returned by lifecycle callbacks and methods without a result.
    #[must_use]
    pub fn unit() -> Self {
        Self::new(())
    }

    /// Returns `true` if this is the unit value.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.is::<()>()
    }

    /// Returns the name of the wrapped type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the wrapped value is a `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        (*self.inner).is::<T>()
    }

    /// Borrows the wrapped value as a `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        (*self.inner).downcast_ref::<T>()
    }

    /// Returns the wrapped value as a shared `Arc<T>`.
    #[must_use]
    pub fn downcast_arc<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    /// Borrows the wrapped value as a `T`, failing with [`ContextError::ValueType`].
    pub fn expect_ref<T: 'static>(&self) -> Result<&T, ContextError> {
        self.downcast_ref::<T>().ok_or(ContextError::ValueType {
            expected: type_name::<T>(),
            actual: self.type_name,
        })
    }

    /// Returns `true` if both values point at the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(&self.type_name).finish()
    }
}

/// Borrows the argument at `index` as a `T`.
///
/// Method and constructor handles use this to unpack their parameters.
///
/// # Example
///
/// ```
/// use interpose_core::{argument, Value};
///
/// let args = vec![Value::new(2_i32), Value::new("x".to_string())];
/// assert_eq!(*argument::<i32>(&args, 0).unwrap(), 2);
/// assert!(argument::<i32>(&args, 1).is_err());
/// assert!(argument::<i32>(&args, 2).is_err());
/// ```
pub fn argument<T: 'static>(args: &[Value], index: usize) -> Result<&T, ContextError> {
    let value = args
        .get(index)
        .ok_or(ContextError::MissingArgument { index })?;
    value.downcast_ref::<T>().ok_or(ContextError::ArgumentType {
        index,
        expected: type_name::<T>(),
        actual: value.type_name,
    })
}
