//! The interceptor trait and bound interceptor invocations.
//!
//! An [`Interceptor`] implements one or more interception hooks. Each hook
//! receives the live [`InvocationContext`] and decides whether to continue
//! the chain with [`InvocationContext::proceed`] or to return early.
//!
//! An [`InterceptorInvocation`] binds an interceptor instance to one hook.
//! The binding is fixed when the chain is assembled, so dispatching a link is
//! a single match on [`InterceptionType`].
//!
//! # Example
//!
//! ```
//! use interpose_core::{Interceptor, InvocationContext, InvocationResult};
//!
//! struct Audit;
//!
//! impl Interceptor for Audit {
//!     fn name(&self) -> &'static str {
//!         "audit"
//!     }
//!
//!     fn around_invoke(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
//!         let result = ctx.proceed();
//!         if result.is_err() {
//!             // record the failure, then hand it back unchanged
//!         }
//!         result
//!     }
//! }
//! ```

use crate::context::InvocationContext;
use crate::error::InvocationResult;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// The kind of event an interceptor hook is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterceptionType {
    /// Around a business-method call.
    AroundInvoke,
    /// Around instance construction.
    AroundConstruct,
    /// After an instance was constructed.
    PostConstruct,
    /// Before an instance is discarded.
    PreDestroy,
}

impl InterceptionType {
    /// Returns the snake_case name of this interception type.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AroundInvoke => "around_invoke",
            Self::AroundConstruct => "around_construct",
            Self::PostConstruct => "post_construct",
            Self::PreDestroy => "pre_destroy",
        }
    }

    /// Returns `true` for lifecycle callbacks, which carry no parameters.
    #[must_use]
    pub const fn is_lifecycle(self) -> bool {
        matches!(self, Self::PostConstruct | Self::PreDestroy)
    }
}

impl fmt::Display for InterceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A cross-cutting behavior that wraps method calls or lifecycle events.
///
/// Every hook defaults to continuing the chain, so an interceptor only
/// overrides the hooks it participates in.
///
/// # Protocol
///
/// - Call `ctx.proceed()` at most once to continue the chain
/// - Return without calling `proceed()` to short-circuit the remaining links
///   and the terminal action
/// - Failures returned by `proceed()` should be handed back unchanged unless
///   the interceptor deliberately recovers from them
pub trait Interceptor: Send + Sync + 'static {
    /// Returns the name of this interceptor, used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Ordering hint for assemblers; lower values run first.
    fn priority(&self) -> i32 {
        0
    }

    /// Wraps a business-method call.
    fn around_invoke(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        ctx.proceed()
    }

    /// Wraps instance construction.
    fn around_construct(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        ctx.proceed()
    }

    /// Runs after an instance was constructed.
    fn post_construct(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        ctx.proceed()
    }

    /// Runs before an instance is discarded.
    fn pre_destroy(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        ctx.proceed()
    }
}

/// An interceptor created from a closure.
///
/// The same closure serves every hook; which hook runs is decided by the
/// [`InterceptorInvocation`] it is bound through.
///
/// # Example
///
/// ```
/// use interpose_core::{FnInterceptor, Interceptor, InterceptorInvocation};
/// use std::sync::Arc;
///
/// let tagging = FnInterceptor::new("tagging", |ctx| {
///     ctx.context_data().insert("tagged".to_string(), interpose_core::Value::new(true));
///     ctx.proceed()
/// })
/// .with_priority(10);
///
/// assert_eq!(tagging.priority(), 10);
/// let link = InterceptorInvocation::around_invoke(Arc::new(tagging));
/// assert_eq!(link.name(), "tagging");
/// ```
pub struct FnInterceptor<F> {
    name: &'static str,
    priority: i32,
    func: F,
}

impl<F> FnInterceptor<F>
where
    F: Fn(&mut InvocationContext<'_>) -> InvocationResult + Send + Sync + 'static,
{
    /// Creates a new closure-based interceptor.
    pub fn new(name: &'static str, func: F) -> Self {
        Self {
            name,
            priority: 0,
            func,
        }
    }

    /// Sets the ordering hint.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl<F> Interceptor for FnInterceptor<F>
where
    F: Fn(&mut InvocationContext<'_>) -> InvocationResult + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn around_invoke(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        (self.func)(ctx)
    }

    fn around_construct(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        (self.func)(ctx)
    }

    fn post_construct(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        (self.func)(ctx)
    }

    fn pre_destroy(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        (self.func)(ctx)
    }
}

impl<F> fmt::Debug for FnInterceptor<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnInterceptor")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// One link of an interception chain: an interceptor bound to one hook.
#[derive(Clone)]
pub struct InterceptorInvocation {
    kind: InterceptionType,
    interceptor: Arc<dyn Interceptor>,
}

impl InterceptorInvocation {
    /// Binds `interceptor` to the hook for `kind`.
    pub fn new(kind: InterceptionType, interceptor: Arc<dyn Interceptor>) -> Self {
        Self { kind, interceptor }
    }

    /// Binds the around-invoke hook.
    pub fn around_invoke(interceptor: Arc<dyn Interceptor>) -> Self {
        Self::new(InterceptionType::AroundInvoke, interceptor)
    }

    /// Binds the around-construct hook.
    pub fn around_construct(interceptor: Arc<dyn Interceptor>) -> Self {
        Self::new(InterceptionType::AroundConstruct, interceptor)
    }

    /// Binds the post-construct hook.
    pub fn post_construct(interceptor: Arc<dyn Interceptor>) -> Self {
        Self::new(InterceptionType::PostConstruct, interceptor)
    }

    /// Binds the pre-destroy hook.
    pub fn pre_destroy(interceptor: Arc<dyn Interceptor>) -> Self {
        Self::new(InterceptionType::PreDestroy, interceptor)
    }

    /// Invokes the bound hook with the current context.
    pub fn invoke(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        match self.kind {
            InterceptionType::AroundInvoke => self.interceptor.around_invoke(ctx),
            InterceptionType::AroundConstruct => self.interceptor.around_construct(ctx),
            InterceptionType::PostConstruct => self.interceptor.post_construct(ctx),
            InterceptionType::PreDestroy => self.interceptor.pre_destroy(ctx),
        }
    }

    /// Returns the hook this link is bound to.
    pub fn kind(&self) -> InterceptionType {
        self.kind
    }

    /// Returns the interceptor instance.
    pub fn interceptor(&self) -> &Arc<dyn Interceptor> {
        &self.interceptor
    }

    /// Returns the interceptor's name.
    pub fn name(&self) -> &'static str {
        self.interceptor.name()
    }

    /// Returns the interceptor's ordering hint.
    pub fn priority(&self) -> i32 {
        self.interceptor.priority()
    }
}

impl fmt::Debug for InterceptorInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorInvocation")
            .field("kind", &self.kind)
            .field("interceptor", &self.interceptor.name())
            .finish()
    }
}
