//! Business-method and constructor handles.
//!
//! Handles are resolved once when the container is assembled and stored in
//! the interception metadata. Invoking one is a plain indirect call; nothing
//! is looked up by name at invocation time.

use crate::error::{ContextError, InvocationResult};
use crate::value::Value;
use std::any::type_name;
use std::fmt;
use std::sync::Arc;

type MethodInvoker = dyn Fn(&Value, &[Value]) -> InvocationResult + Send + Sync;
type InstanceFactory = dyn Fn(&[Value]) -> InvocationResult + Send + Sync;

/// The final step of a constructor interception chain.
///
/// Receives the (possibly rewritten) constructor parameters and returns the
/// new instance.
pub type ConstructorForward<'a> = Box<dyn FnOnce(&[Value]) -> InvocationResult + Send + 'a>;

/// Handle to a business method.
///
/// # Example
///
/// ```
/// use interpose_core::{argument, MethodHandle, Value};
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// let greet = MethodHandle::typed::<Greeter, _>("greet", 1, |greeter, args| {
///     let name = argument::<String>(args, 0)?;
///     Ok(Value::new(format!("{}, {name}", greeter.greeting)))
/// });
///
/// let target = Value::new(Greeter { greeting: "Hello".to_string() });
/// let result = greet.invoke(&target, &[Value::new("Ada".to_string())]).unwrap();
/// assert_eq!(result.downcast_ref::<String>().unwrap(), "Hello, Ada");
/// ```
#[derive(Clone)]
pub struct MethodHandle {
    declaring_type: &'static str,
    name: String,
    parameter_count: usize,
    invoker: Arc<MethodInvoker>,
}

impl MethodHandle {
    /// Creates a handle from an untyped invoker.
    pub fn new<F>(
        declaring_type: &'static str,
        name: impl Into<String>,
        parameter_count: usize,
        invoker: F,
    ) -> Self
    where
        F: Fn(&Value, &[Value]) -> InvocationResult + Send + Sync + 'static,
    {
        Self {
            declaring_type,
            name: name.into(),
            parameter_count,
            invoker: Arc::new(invoker),
        }
    }

    /// Creates a handle for a method declared on `T`.
    ///
    /// Invoking it on a target that is not a `T` fails with
    /// [`ContextError::TargetType`].
    pub fn typed<T, F>(name: impl Into<String>, parameter_count: usize, method: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&T, &[Value]) -> InvocationResult + Send + Sync + 'static,
    {
        Self::new(
            type_name::<T>(),
            name,
            parameter_count,
            move |target, args| {
                let receiver = target
                    .downcast_ref::<T>()
                    .ok_or_else(|| ContextError::TargetType {
                        expected: type_name::<T>(),
                        actual: target.type_name(),
                    })?;
                method(receiver, args)
            },
        )
    }

    /// Invokes the method on `target`.
    pub fn invoke(&self, target: &Value, args: &[Value]) -> InvocationResult {
        (self.invoker)(target, args)
    }

    /// Returns the method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declaring type name.
    pub fn declaring_type(&self) -> &'static str {
        self.declaring_type
    }

    /// Returns the declared number of parameters.
    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }

    /// Returns `Type::method`, used as a diagnostic label.
    pub fn qualified_name(&self) -> String {
        let short = self
            .declaring_type
            .rsplit("::")
            .next()
            .unwrap_or(self.declaring_type);
        format!("{short}::{}", self.name)
    }
}

impl fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodHandle")
            .field("declaring_type", &self.declaring_type)
            .field("name", &self.name)
            .field("parameter_count", &self.parameter_count)
            .finish_non_exhaustive()
    }
}

/// Handle to a constructor.
#[derive(Clone)]
pub struct ConstructorHandle {
    declaring_type: &'static str,
    parameter_count: usize,
    factory: Arc<InstanceFactory>,
}

impl ConstructorHandle {
    /// Creates a handle for a constructor of `T`.
    ///
    /// # Example
    ///
    /// ```
    /// use interpose_core::{argument, ConstructorHandle, Value};
    ///
    /// struct Pool {
    ///     size: usize,
    /// }
    ///
    /// let ctor = ConstructorHandle::of::<Pool, _>(1, |params| {
    ///     Ok(Pool { size: *argument::<usize>(params, 0)? })
    /// });
    ///
    /// let pool = ctor.new_instance(&[Value::new(8_usize)]).unwrap();
    /// assert_eq!(pool.downcast_ref::<Pool>().unwrap().size, 8);
    /// ```
    pub fn of<T, F>(parameter_count: usize, constructor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&[Value]) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            declaring_type: type_name::<T>(),
            parameter_count,
            factory: Arc::new(move |params| constructor(params).map(Value::new)),
        }
    }

    /// Runs the constructor directly, bypassing interception.
    pub fn new_instance(&self, parameters: &[Value]) -> InvocationResult {
        (self.factory)(parameters)
    }

    /// Returns a forwarding call that runs this constructor.
    pub fn forward(&self) -> ConstructorForward<'static> {
        let handle = self.clone();
        Box::new(move |parameters| handle.new_instance(parameters))
    }

    /// Returns the declaring type name.
    pub fn declaring_type(&self) -> &'static str {
        self.declaring_type
    }

    /// Returns the declared number of parameters.
    pub fn parameter_count(&self) -> usize {
        self.parameter_count
    }
}

impl fmt::Debug for ConstructorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorHandle")
            .field("declaring_type", &self.declaring_type)
            .field("parameter_count", &self.parameter_count)
            .finish_non_exhaustive()
    }
}
