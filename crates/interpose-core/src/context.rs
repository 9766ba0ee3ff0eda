//! The invocation context state machine.
//!
//! An [`InvocationContext`] is created for a single call, driven to
//! completion by [`InvocationContext::proceed`], and then dropped. The same
//! type serves all interception kinds; only the terminal action differs:
//!
//! | Kind | Terminal action | Result |
//! |------|-----------------|--------|
//! | around-invoke | business method on the target | method result |
//! | post-construct / pre-destroy | none | `Value::unit()` |
//! | around-construct | constructor forwarding call | new instance (also stored as the target) |
//!
//! # States
//!
//! ```text
//! NotStarted → RunningChain(0) → … → RunningChain(n-1) → TerminalInvoked → Completed
//!                                                                        ↘ Failed
//! ```
//!
//! The chain position only moves forward. Once the terminal action has run,
//! further calls to `proceed()` fail with [`ContextError::AlreadyCompleted`].

use crate::binding::{InterceptorBinding, InterceptorBindings};
use crate::error::{ContextError, InvocationResult};
use crate::handle::{ConstructorForward, ConstructorHandle, MethodHandle};
use crate::interceptor::{InterceptionType, InterceptorInvocation};
use crate::metadata::InterceptedMethodMetadata;
use crate::value::{argument, Value};
use indexmap::IndexMap;
use std::fmt;
use tracing::trace;

/// Context data key under which the interceptor bindings are exposed.
pub const INTERCEPTOR_BINDINGS_KEY: &str = "interpose.interceptor_bindings";

/// Where a context is in its chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// `proceed()` has not been called yet.
    NotStarted,
    /// The interceptor at this index was entered most recently.
    RunningChain(usize),
    /// The terminal action is executing.
    TerminalInvoked,
    /// The terminal action returned a value.
    Completed,
    /// The terminal action failed.
    Failed,
}

impl ContextState {
    /// Returns `true` once the terminal action has been started.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::TerminalInvoked | Self::Completed | Self::Failed)
    }
}

enum Terminal<'a> {
    Method(&'a MethodHandle),
    Lifecycle,
    Construct {
        constructor: ConstructorHandle,
        forward: Option<ConstructorForward<'a>>,
    },
}

/// Mutable, single-use state for one intercepted call.
///
/// Interceptors receive `&mut InvocationContext` and may read or replace the
/// parameters, share data with later links through [`context_data`], and
/// continue the chain with [`proceed`].
///
/// [`context_data`]: InvocationContext::context_data
/// [`proceed`]: InvocationContext::proceed
pub struct InvocationContext<'a> {
    kind: InterceptionType,
    target: Option<Value>,
    parameters: Vec<Value>,
    chain: &'a [InterceptorInvocation],
    position: usize,
    state: ContextState,
    bindings: InterceptorBindings,
    data: Option<IndexMap<String, Value>>,
    terminal: Terminal<'a>,
}

impl<'a> InvocationContext<'a> {
    pub(crate) fn around_invoke(
        target: Value,
        args: Vec<Value>,
        metadata: &'a InterceptedMethodMetadata,
    ) -> Self {
        Self::with_terminal(
            InterceptionType::AroundInvoke,
            Some(target),
            args,
            metadata.chain(),
            metadata.bindings().clone(),
            Terminal::Method(metadata.method()),
        )
    }

    pub(crate) fn lifecycle(
        kind: InterceptionType,
        target: Value,
        chain: &'a [InterceptorInvocation],
        bindings: InterceptorBindings,
    ) -> Self {
        debug_assert!(kind.is_lifecycle());
        Self::with_terminal(
            kind,
            Some(target),
            Vec::new(),
            chain,
            bindings,
            Terminal::Lifecycle,
        )
    }

    pub(crate) fn around_construct(
        constructor: ConstructorHandle,
        parameters: Vec<Value>,
        chain: &'a [InterceptorInvocation],
        forward: ConstructorForward<'a>,
        bindings: InterceptorBindings,
    ) -> Self {
        Self::with_terminal(
            InterceptionType::AroundConstruct,
            None,
            parameters,
            chain,
            bindings,
            Terminal::Construct {
                constructor,
                forward: Some(forward),
            },
        )
    }

    fn with_terminal(
        kind: InterceptionType,
        target: Option<Value>,
        parameters: Vec<Value>,
        chain: &'a [InterceptorInvocation],
        bindings: InterceptorBindings,
        terminal: Terminal<'a>,
    ) -> Self {
        Self {
            kind,
            target,
            parameters,
            chain,
            position: 0,
            state: ContextState::NotStarted,
            bindings,
            data: None,
            terminal,
        }
    }

    /// Continues the chain.
    ///
    /// Invokes the next interceptor and returns whatever it returns. When the
    /// chain is exhausted, runs the terminal action exactly once and returns
    /// its result. Failures from any link are returned unchanged.
    pub fn proceed(&mut self) -> InvocationResult {
        if self.state.is_terminal() {
            return Err(ContextError::AlreadyCompleted.into());
        }

        let chain = self.chain;
        if let Some(link) = chain.get(self.position) {
            let position = self.position;
            self.position += 1;
            self.state = ContextState::RunningChain(position);
            trace!(
                kind = %self.kind,
                interceptor = link.name(),
                position,
                "entering interceptor"
            );
            return link.invoke(self);
        }

        self.invoke_terminal()
    }

    fn invoke_terminal(&mut self) -> InvocationResult {
        self.state = ContextState::TerminalInvoked;
        trace!(kind = %self.kind, chain_len = self.chain.len(), "invoking terminal action");

        let outcome = match &mut self.terminal {
            Terminal::Method(method) => match &self.target {
                Some(target) => method.invoke(target, &self.parameters),
                None => Err(ContextError::TargetUnavailable { kind: self.kind }.into()),
            },
            Terminal::Lifecycle => Ok(Value::unit()),
            Terminal::Construct { forward, .. } => match forward.take() {
                Some(forward) => forward(&self.parameters).map(|instance| {
                    self.target = Some(instance.clone());
                    instance
                }),
                None => Err(ContextError::AlreadyCompleted.into()),
            },
        };

        self.state = if outcome.is_ok() {
            ContextState::Completed
        } else {
            ContextState::Failed
        };
        outcome
    }

    /// Returns the interception kind.
    pub fn kind(&self) -> InterceptionType {
        self.kind
    }

    /// Returns the current state.
    pub fn state(&self) -> ContextState {
        self.state
    }

    /// Returns the index of the next link to run.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Returns the chain length.
    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    /// Returns the target instance.
    ///
    /// For around-construct contexts this is `None` until the forwarding call
    /// has produced the instance.
    pub fn target(&self) -> Option<&Value> {
        self.target.as_ref()
    }

    /// Consumes the context and returns the target.
    pub fn into_target(self) -> Option<Value> {
        self.target
    }

    /// Returns the intercepted business method, for around-invoke contexts.
    pub fn method(&self) -> Option<&MethodHandle> {
        match &self.terminal {
            Terminal::Method(method) => Some(method),
            _ => None,
        }
    }

    /// Returns the intercepted constructor, for around-construct contexts.
    pub fn constructor(&self) -> Option<&ConstructorHandle> {
        match &self.terminal {
            Terminal::Construct { constructor, .. } => Some(constructor),
            _ => None,
        }
    }

    /// Returns the current method arguments or constructor parameters.
    pub fn parameters(&self) -> Result<&[Value], ContextError> {
        self.ensure_parameters()?;
        Ok(&self.parameters)
    }

    /// Returns the parameters for in-place replacement of single values.
    pub fn parameters_mut(&mut self) -> Result<&mut [Value], ContextError> {
        self.ensure_parameters()?;
        Ok(&mut self.parameters)
    }

    /// Replaces all parameters.
    ///
    /// Later links and the terminal action observe the replacement. The
    /// count must match the method or constructor handle; on mismatch the
    /// current parameters are kept.
    pub fn set_parameters(&mut self, parameters: Vec<Value>) -> Result<(), ContextError> {
        self.ensure_parameters()?;
        if let Some(expected) = self.expected_parameter_count() {
            if parameters.len() != expected {
                return Err(ContextError::ParameterCount {
                    expected,
                    actual: parameters.len(),
                });
            }
        }
        self.parameters = parameters;
        Ok(())
    }

    /// Borrows the parameter at `index` as a `T`.
    pub fn argument<T: 'static>(&self, index: usize) -> Result<&T, ContextError> {
        argument(self.parameters()?, index)
    }

    /// Returns the data shared by all links of this chain.
    ///
    /// The map is created on first access and seeded with the interceptor
    /// bindings under [`INTERCEPTOR_BINDINGS_KEY`].
    pub fn context_data(&mut self) -> &mut IndexMap<String, Value> {
        let bindings = &self.bindings;
        self.data.get_or_insert_with(|| {
            let mut data = IndexMap::new();
            data.insert(
                INTERCEPTOR_BINDINGS_KEY.to_string(),
                Value::new(bindings.clone()),
            );
            data
        })
    }

    /// Returns the shared data if it was ever accessed, without creating it.
    pub fn context_data_ref(&self) -> Option<&IndexMap<String, Value>> {
        self.data.as_ref()
    }

    /// Borrows a context data entry as a `T`.
    pub fn data<T: 'static>(&self, key: &str) -> Option<&T> {
        self.data
            .as_ref()
            .and_then(|data| data.get(key))
            .and_then(Value::downcast_ref)
    }

    /// Returns the interceptor bindings of the intercepted method or event.
    pub fn interceptor_bindings(&self) -> &InterceptorBindings {
        &self.bindings
    }

    /// Returns a binding by name.
    pub fn binding(&self, name: &str) -> Option<&InterceptorBinding> {
        self.bindings.get(name)
    }

    fn ensure_parameters(&self) -> Result<(), ContextError> {
        if self.kind.is_lifecycle() {
            return Err(ContextError::ParametersUnavailable { kind: self.kind });
        }
        Ok(())
    }

    fn expected_parameter_count(&self) -> Option<usize> {
        match &self.terminal {
            Terminal::Method(method) => Some(method.parameter_count()),
            Terminal::Construct { constructor, .. } => Some(constructor.parameter_count()),
            Terminal::Lifecycle => None,
        }
    }
}

impl fmt::Debug for InvocationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("kind", &self.kind)
            .field("state", &self.state)
            .field("position", &self.position)
            .field("chain_len", &self.chain.len())
            .field("target", &self.target)
            .field("parameters", &self.parameters.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::InterceptorBinding;
    use crate::contexts::InvocationContexts;
    use crate::interceptor::FnInterceptor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn around(
        name: &'static str,
        f: impl Fn(&mut InvocationContext<'_>) -> InvocationResult + Send + Sync + 'static,
    ) -> InterceptorInvocation {
        InterceptorInvocation::around_invoke(Arc::new(FnInterceptor::new(name, f)))
    }

    fn echo_method() -> MethodHandle {
        MethodHandle::new("Echo", "echo", 1, |_, args| Ok(args[0].clone()))
    }

    #[test]
    fn test_empty_chain_invokes_terminal() {
        let metadata =
            InterceptedMethodMetadata::new(echo_method(), Vec::new(), InterceptorBindings::empty());

        let mut ctx = InvocationContext::around_invoke(
            Value::unit(),
            vec![Value::new("hi")],
            &metadata,
        );
        assert_eq!(ctx.state(), ContextState::NotStarted);

        let result = ctx.proceed().unwrap();
        assert_eq!(result.downcast_ref::<&str>(), Some(&"hi"));
        assert_eq!(ctx.state(), ContextState::Completed);
    }

    #[test]
    fn test_proceed_after_completion_fails() {
        let metadata =
            InterceptedMethodMetadata::new(echo_method(), Vec::new(), InterceptorBindings::empty());
        let mut ctx =
            InvocationContext::around_invoke(Value::unit(), vec![Value::new(1_i32)], &metadata);

        ctx.proceed().unwrap();
        let err = ctx.proceed().unwrap_err();
        assert_eq!(
            err.downcast_ref::<ContextError>(),
            Some(&ContextError::AlreadyCompleted)
        );
    }

    #[test]
    fn test_terminal_runs_once_when_interceptor_proceeds_twice() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let method = MethodHandle::new("Svc", "work", 0, move |_, _| {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(Value::new(1_u8))
        });
        let chain = vec![around("retry", |ctx| {
            let _ = ctx.proceed();
            ctx.proceed()
        })];
        let metadata = InterceptedMethodMetadata::new(method, chain, InterceptorBindings::empty());

        let err = InvocationContexts::perform_around_invoke(Value::unit(), Vec::new(), &metadata)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<ContextError>(),
            Some(&ContextError::AlreadyCompleted)
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_terminal_marks_failed() {
        let method = MethodHandle::new("Svc", "boom", 0, |_, _| anyhow::bail!("boom"));
        let metadata = InterceptedMethodMetadata::new(method, Vec::new(), InterceptorBindings::empty());
        let mut ctx = InvocationContext::around_invoke(Value::unit(), Vec::new(), &metadata);

        assert_eq!(ctx.proceed().unwrap_err().to_string(), "boom");
        assert_eq!(ctx.state(), ContextState::Failed);
    }

    #[test]
    fn test_state_tracks_position() {
        let chain = vec![
            around("a", |ctx| {
                assert_eq!(ctx.state(), ContextState::RunningChain(0));
                assert_eq!(ctx.position(), 1);
                ctx.proceed()
            }),
            around("b", |ctx| {
                assert_eq!(ctx.state(), ContextState::RunningChain(1));
                assert_eq!(ctx.position(), 2);
                ctx.proceed()
            }),
        ];
        let metadata = InterceptedMethodMetadata::new(echo_method(), chain, InterceptorBindings::empty());
        let mut ctx =
            InvocationContext::around_invoke(Value::unit(), vec![Value::new(0_i32)], &metadata);

        ctx.proceed().unwrap();
        assert_eq!(ctx.state(), ContextState::Completed);
        assert_eq!(ctx.chain_len(), 2);
    }

    #[test]
    fn test_set_parameters_checks_arity() {
        let chain = vec![around("rewrite", |ctx| {
            let err = ctx
                .set_parameters(vec![Value::new(1_i32), Value::new(2_i32)])
                .unwrap_err();
            assert_eq!(
                err,
                ContextError::ParameterCount {
                    expected: 1,
                    actual: 2
                }
            );
            assert_eq!(*ctx.argument::<i32>(0)?, 10);

            ctx.set_parameters(vec![Value::new(11_i32)])?;
            ctx.proceed()
        })];
        let metadata = InterceptedMethodMetadata::new(echo_method(), chain, InterceptorBindings::empty());

        let result = InvocationContexts::perform_around_invoke(
            Value::unit(),
            vec![Value::new(10_i32)],
            &metadata,
        )
        .unwrap();
        assert_eq!(result.downcast_ref::<i32>(), Some(&11));
    }

    #[test]
    fn test_parameters_mut_replaces_in_place() {
        let chain = vec![around("double", |ctx| {
            let doubled = *ctx.argument::<i32>(0)? * 2;
            ctx.parameters_mut()?[0] = Value::new(doubled);
            ctx.proceed()
        })];
        let metadata = InterceptedMethodMetadata::new(echo_method(), chain, InterceptorBindings::empty());

        let result = InvocationContexts::perform_around_invoke(
            Value::unit(),
            vec![Value::new(21_i32)],
            &metadata,
        )
        .unwrap();
        assert_eq!(result.downcast_ref::<i32>(), Some(&42));
    }

    #[test]
    fn test_lifecycle_has_no_parameters() {
        let chain: Vec<InterceptorInvocation> = Vec::new();
        let mut ctx = InvocationContexts::post_construct(
            Value::new("bean"),
            &chain,
            InterceptorBindings::empty(),
        );

        assert_eq!(
            ctx.parameters().unwrap_err(),
            ContextError::ParametersUnavailable {
                kind: InterceptionType::PostConstruct
            }
        );
        assert!(ctx.set_parameters(Vec::new()).is_err());
        assert!(ctx.method().is_none());
        assert!(ctx.constructor().is_none());
        assert!(ctx.proceed().unwrap().is_unit());
    }

    #[test]
    fn test_context_data_is_lazy_and_seeded_with_bindings() {
        let bindings: InterceptorBindings = [InterceptorBinding::new("Logged")].into();
        let metadata = InterceptedMethodMetadata::new(echo_method(), Vec::new(), bindings);
        let mut ctx =
            InvocationContext::around_invoke(Value::unit(), vec![Value::new(0_i32)], &metadata);

        assert!(ctx.context_data_ref().is_none());
        assert!(ctx.data::<InterceptorBindings>(INTERCEPTOR_BINDINGS_KEY).is_none());

        ctx.context_data()
            .insert("tenant".to_string(), Value::new("acme".to_string()));

        let seeded = ctx
            .data::<InterceptorBindings>(INTERCEPTOR_BINDINGS_KEY)
            .unwrap();
        assert!(seeded.contains("Logged"));
        assert_eq!(ctx.data::<String>("tenant").map(String::as_str), Some("acme"));
        let keys: Vec<_> = ctx.context_data_ref().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec![INTERCEPTOR_BINDINGS_KEY.to_string(), "tenant".to_string()]);
        assert!(ctx.binding("Logged").is_some());
    }

    #[test]
    fn test_around_construct_stores_target() {
        let ctor = ConstructorHandle::of::<String, _>(1, |params| {
            Ok(format!("built:{}", argument::<i32>(params, 0)?))
        });
        let chain: Vec<InterceptorInvocation> = Vec::new();
        let mut ctx = InvocationContexts::around_construct(
            ctor.clone(),
            vec![Value::new(3_i32)],
            &chain,
            ctor.forward(),
            InterceptorBindings::empty(),
        );

        assert!(ctx.target().is_none());
        assert!(ctx.constructor().is_some());
        let instance = ctx.proceed().unwrap();
        assert!(instance.ptr_eq(ctx.target().unwrap()));
        assert_eq!(
            ctx.into_target().unwrap().downcast_ref::<String>().unwrap(),
            "built:3"
        );
    }

    #[test]
    fn test_debug_output() {
        let metadata =
            InterceptedMethodMetadata::new(echo_method(), Vec::new(), InterceptorBindings::empty());
        let ctx = InvocationContext::around_invoke(Value::unit(), Vec::new(), &metadata);
        let debug = format!("{ctx:?}");
        assert!(debug.contains("AroundInvoke"));
        assert!(debug.contains("NotStarted"));
    }
}
