//! Entry points for building invocation contexts.
//!
//! [`InvocationContexts`] is stateless. Each function builds the context
//! variant for one kind of call; only [`InvocationContexts::perform_around_invoke`]
//! also drives the chain, the others hand the context back so the caller
//! decides when to call `proceed()`.

use crate::binding::InterceptorBindings;
use crate::context::InvocationContext;
use crate::error::InvocationResult;
use crate::handle::{ConstructorForward, ConstructorHandle};
use crate::interceptor::{InterceptionType, InterceptorInvocation};
use crate::metadata::InterceptedMethodMetadata;
use crate::value::Value;

/// Factory for invocation contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvocationContexts;

impl InvocationContexts {
    /// Runs an intercepted business-method call to completion.
    ///
    /// Returns the business method's result, or the first failure raised by
    /// any link of the chain, exactly as it was raised.
    ///
    /// # Example
    ///
    /// ```
    /// use interpose_core::{
    ///     FnInterceptor, InterceptedMethodMetadata, InterceptorBindings, InterceptorInvocation,
    ///     InvocationContexts, MethodHandle, Value,
    /// };
    /// use std::sync::Arc;
    ///
    /// let answer = MethodHandle::new("Oracle", "answer", 0, |_, _| Ok(Value::new(42_i32)));
    /// let chain = vec![InterceptorInvocation::around_invoke(Arc::new(FnInterceptor::new(
    ///     "log",
    ///     |ctx| ctx.proceed(),
    /// )))];
    /// let metadata = InterceptedMethodMetadata::new(answer, chain, InterceptorBindings::empty());
    ///
    /// let result = InvocationContexts::perform_around_invoke(Value::unit(), Vec::new(), &metadata)
    ///     .unwrap();
    /// assert_eq!(result.downcast_ref::<i32>(), Some(&42));
    /// ```
    pub fn perform_around_invoke(
        target: Value,
        args: Vec<Value>,
        metadata: &InterceptedMethodMetadata,
    ) -> InvocationResult {
        InvocationContext::around_invoke(target, args, metadata).proceed()
    }

    /// Builds the context for post-construct callbacks of `target`.
    pub fn post_construct(
        target: Value,
        chain: &[InterceptorInvocation],
        bindings: InterceptorBindings,
    ) -> InvocationContext<'_> {
        InvocationContext::lifecycle(InterceptionType::PostConstruct, target, chain, bindings)
    }

    /// Builds the context for pre-destroy callbacks of `target`.
    pub fn pre_destroy(
        target: Value,
        chain: &[InterceptorInvocation],
        bindings: InterceptorBindings,
    ) -> InvocationContext<'_> {
        InvocationContext::lifecycle(InterceptionType::PreDestroy, target, chain, bindings)
    }

    /// Builds the context for constructor interception.
    ///
    /// When the chain is exhausted, `forward` receives the current
    /// parameters and its result becomes the context's target.
    ///
    /// # Example
    ///
    /// ```
    /// use interpose_core::{
    ///     argument, ConstructorHandle, FnInterceptor, InterceptorBindings, InterceptorInvocation,
    ///     InvocationContexts, Value,
    /// };
    /// use std::sync::Arc;
    ///
    /// struct Connection {
    ///     url: String,
    /// }
    ///
    /// let ctor = ConstructorHandle::of::<Connection, _>(1, |params| {
    ///     Ok(Connection { url: argument::<String>(params, 0)?.clone() })
    /// });
    /// let chain = vec![InterceptorInvocation::around_construct(Arc::new(FnInterceptor::new(
    ///     "default-url",
    ///     |ctx| {
    ///         ctx.set_parameters(vec![Value::new("postgres://localhost".to_string())])?;
    ///         ctx.proceed()
    ///     },
    /// )))];
    ///
    /// let mut ctx = InvocationContexts::around_construct(
    ///     ctor.clone(),
    ///     vec![Value::new(String::new())],
    ///     &chain,
    ///     ctor.forward(),
    ///     InterceptorBindings::empty(),
    /// );
    /// ctx.proceed().unwrap();
    ///
    /// let conn = ctx.target().unwrap().downcast_ref::<Connection>().unwrap();
    /// assert_eq!(conn.url, "postgres://localhost");
    /// ```
    pub fn around_construct<'a>(
        constructor: ConstructorHandle,
        parameters: Vec<Value>,
        chain: &'a [InterceptorInvocation],
        forward: ConstructorForward<'a>,
        bindings: InterceptorBindings,
    ) -> InvocationContext<'a> {
        InvocationContext::around_construct(constructor, parameters, chain, forward, bindings)
    }
}
