//! Precomputed interception metadata for a business method.

use crate::binding::InterceptorBindings;
use crate::handle::MethodHandle;
use crate::interceptor::{InterceptionType, InterceptorInvocation};
use std::sync::Arc;

/// Everything needed to intercept calls to one business method.
///
/// Built once when the container is assembled and shared read-only by every
/// call to the method. The chain is already ordered; the runtime never
/// reorders or filters it.
///
/// # Example
///
/// ```
/// use interpose_core::{
///     FnInterceptor, InterceptedMethodMetadata, InterceptorBindings, InterceptorInvocation,
///     MethodHandle, Value,
/// };
/// use std::sync::Arc;
///
/// let method = MethodHandle::new("Clock", "now", 0, |_, _| Ok(Value::new(1_u64)));
/// let chain = vec![InterceptorInvocation::around_invoke(Arc::new(FnInterceptor::new(
///     "passthrough",
///     |ctx| ctx.proceed(),
/// )))];
///
/// let metadata = InterceptedMethodMetadata::new(method, chain, InterceptorBindings::empty());
/// assert_eq!(metadata.len(), 1);
/// assert_eq!(metadata.interceptor_names(), vec!["passthrough"]);
/// ```
#[derive(Debug, Clone)]
pub struct InterceptedMethodMetadata {
    method: MethodHandle,
    chain: Arc<[InterceptorInvocation]>,
    bindings: InterceptorBindings,
}

impl InterceptedMethodMetadata {
    /// Creates metadata from an already ordered around-invoke chain.
    pub fn new(
        method: MethodHandle,
        chain: Vec<InterceptorInvocation>,
        bindings: InterceptorBindings,
    ) -> Self {
        debug_assert!(
            chain
                .iter()
                .all(|link| link.kind() == InterceptionType::AroundInvoke),
            "method chains may only contain around-invoke links"
        );
        Self {
            method,
            chain: chain.into(),
            bindings,
        }
    }

    /// Returns the business-method handle.
    pub fn method(&self) -> &MethodHandle {
        &self.method
    }

    /// Returns the ordered chain.
    pub fn chain(&self) -> &[InterceptorInvocation] {
        &self.chain
    }

    /// Returns the binding annotations the chain was resolved from.
    pub fn bindings(&self) -> &InterceptorBindings {
        &self.bindings
    }

    /// Iterates the chain in order.
    pub fn iter(&self) -> std::slice::Iter<'_, InterceptorInvocation> {
        self.chain.iter()
    }

    /// Returns the chain length.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Returns `true` if the method has no interceptors.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Returns the interceptor names in chain order.
    pub fn interceptor_names(&self) -> Vec<&'static str> {
        self.chain.iter().map(InterceptorInvocation::name).collect()
    }
}

impl<'a> IntoIterator for &'a InterceptedMethodMetadata {
    type Item = &'a InterceptorInvocation;
    type IntoIter = std::slice::Iter<'a, InterceptorInvocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.chain.iter()
    }
}
