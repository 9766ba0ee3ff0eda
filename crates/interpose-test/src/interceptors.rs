//! Ready-made interceptors for chain tests.
//!
//! All of them implement every hook the same way, so one instance can be
//! bound into around-invoke, around-construct and lifecycle chains alike.

use crate::error::TestFailure;
use crate::journal::CallJournal;
use interpose_core::{
    InterceptionType, Interceptor, InterceptorInvocation, InvocationContext, InvocationResult,
    Value,
};
use std::fmt;
use std::sync::Arc;

/// Shorthand for binding a test interceptor into a chain.
pub trait IntoLink: Interceptor + Sized {
    /// Binds `self` to the hook for `kind`.
    fn link(self, kind: InterceptionType) -> InterceptorInvocation {
        InterceptorInvocation::new(kind, Arc::new(self))
    }

    /// Binds `self` to the around-invoke hook.
    fn invoke_link(self) -> InterceptorInvocation {
        self.link(InterceptionType::AroundInvoke)
    }
}

impl<I: Interceptor> IntoLink for I {}

macro_rules! every_hook {
    ($method:ident) => {
        fn around_invoke(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
            self.$method(ctx)
        }

        fn around_construct(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
            self.$method(ctx)
        }

        fn post_construct(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
            self.$method(ctx)
        }

        fn pre_destroy(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
            self.$method(ctx)
        }
    };
}

/// Records `name:before`, proceeds, then records `name:after` or
/// `name:error`, returning the downstream outcome unchanged.
#[derive(Debug, Clone)]
pub struct RecordingInterceptor {
    name: &'static str,
    journal: CallJournal,
}

impl RecordingInterceptor {
    /// Creates a recording interceptor writing to `journal`.
    pub fn new(name: &'static str, journal: &CallJournal) -> Self {
        Self {
            name,
            journal: journal.clone(),
        }
    }

    fn record(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        self.journal.record(format!("{}:before", self.name));
        let outcome = ctx.proceed();
        let suffix = if outcome.is_ok() { "after" } else { "error" };
        self.journal.record(format!("{}:{suffix}", self.name));
        outcome
    }
}

impl Interceptor for RecordingInterceptor {
    fn name(&self) -> &'static str {
        self.name
    }

    every_hook!(record);
}

/// Returns a fixed value without calling `proceed()`.
#[derive(Clone)]
pub struct ShortCircuitInterceptor {
    name: &'static str,
    value: Value,
    journal: Option<CallJournal>,
}

impl ShortCircuitInterceptor {
    /// Creates an interceptor that always returns `value`.
    pub fn new(name: &'static str, value: Value) -> Self {
        Self {
            name,
            value,
            journal: None,
        }
    }

    /// Records `name:short_circuit` whenever it fires.
    #[must_use]
    pub fn with_journal(mut self, journal: &CallJournal) -> Self {
        self.journal = Some(journal.clone());
        self
    }

    fn short_circuit(&self, _ctx: &mut InvocationContext<'_>) -> InvocationResult {
        if let Some(journal) = &self.journal {
            journal.record(format!("{}:short_circuit", self.name));
        }
        Ok(self.value.clone())
    }
}

impl Interceptor for ShortCircuitInterceptor {
    fn name(&self) -> &'static str {
        self.name
    }

    every_hook!(short_circuit);
}

impl fmt::Debug for ShortCircuitInterceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortCircuitInterceptor")
            .field("name", &self.name)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

/// Fails with a [`TestFailure`] without calling `proceed()`.
#[derive(Debug, Clone)]
pub struct FailingInterceptor {
    name: &'static str,
    message: String,
}

impl FailingInterceptor {
    /// Creates an interceptor that always fails with `message`.
    pub fn new(name: &'static str, message: impl Into<String>) -> Self {
        Self {
            name,
            message: message.into(),
        }
    }

    /// The failure this interceptor raises.
    #[must_use]
    pub fn failure(&self) -> TestFailure {
        TestFailure::new(self.name, self.message.clone())
    }

    fn fail(&self, _ctx: &mut InvocationContext<'_>) -> InvocationResult {
        Err(self.failure().into())
    }
}

impl Interceptor for FailingInterceptor {
    fn name(&self) -> &'static str {
        self.name
    }

    every_hook!(fail);
}

type Rewrite = dyn Fn(&Value) -> anyhow::Result<Value> + Send + Sync;

/// Replaces one parameter before proceeding.
#[derive(Clone)]
pub struct ArgumentRewriter {
    name: &'static str,
    index: usize,
    rewrite: Arc<Rewrite>,
}

impl ArgumentRewriter {
    /// Rewrites parameter `index` with `rewrite(current)`.
    pub fn new<F>(name: &'static str, index: usize, rewrite: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name,
            index,
            rewrite: Arc::new(rewrite),
        }
    }

    /// Replaces parameter `index` with `value`.
    pub fn replace_with(name: &'static str, index: usize, value: Value) -> Self {
        Self::new(name, index, move |_| Ok(value.clone()))
    }

    fn rewrite(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        let index = self.index;
        let parameters = ctx.parameters_mut()?;
        let slot = parameters
            .get_mut(index)
            .ok_or(interpose_core::ContextError::MissingArgument { index })?;
        *slot = (self.rewrite)(slot)?;
        ctx.proceed()
    }
}

impl Interceptor for ArgumentRewriter {
    fn name(&self) -> &'static str {
        self.name
    }

    every_hook!(rewrite);
}

impl fmt::Debug for ArgumentRewriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgumentRewriter")
            .field("name", &self.name)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// Inserts one context data entry before proceeding.
#[derive(Debug, Clone)]
pub struct ContextDataWriter {
    name: &'static str,
    key: String,
    value: Value,
}

impl ContextDataWriter {
    /// Writes `key = value` into the context data.
    pub fn new(name: &'static str, key: impl Into<String>, value: Value) -> Self {
        Self {
            name,
            key: key.into(),
            value,
        }
    }

    fn write(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        ctx.context_data()
            .insert(self.key.clone(), self.value.clone());
        ctx.proceed()
    }
}

impl Interceptor for ContextDataWriter {
    fn name(&self) -> &'static str {
        self.name
    }

    every_hook!(write);
}

/// Records whether a context data key is visible, then proceeds.
///
/// Journal entries are `name:saw:key` or `name:missing:key`. The probe
/// never allocates the context data map itself.
#[derive(Debug, Clone)]
pub struct ContextDataProbe {
    name: &'static str,
    key: String,
    journal: CallJournal,
}

impl ContextDataProbe {
    /// Creates a probe for `key`.
    pub fn new(name: &'static str, key: impl Into<String>, journal: &CallJournal) -> Self {
        Self {
            name,
            key: key.into(),
            journal: journal.clone(),
        }
    }

    fn probe(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        let seen = ctx
            .context_data_ref()
            .is_some_and(|data| data.contains_key(&self.key));
        let verdict = if seen { "saw" } else { "missing" };
        self.journal
            .record(format!("{}:{verdict}:{}", self.name, self.key));
        ctx.proceed()
    }
}

impl Interceptor for ContextDataProbe {
    fn name(&self) -> &'static str {
        self.name
    }

    every_hook!(probe);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use interpose_core::{InterceptedMethodMetadata, InterceptorBindings, InvocationContexts};

    fn run(chain: Vec<InterceptorInvocation>, journal: &CallJournal, args: Vec<Value>) -> InvocationResult {
        let method = fixtures::journaled_echo(journal, "echo");
        let metadata = InterceptedMethodMetadata::new(method, chain, InterceptorBindings::empty());
        InvocationContexts::perform_around_invoke(Value::unit(), args, &metadata)
    }

    #[test]
    fn test_recording_marks_errors() {
        let journal = CallJournal::new();
        let chain = vec![
            RecordingInterceptor::new("outer", &journal).invoke_link(),
            FailingInterceptor::new("inner", "nope").invoke_link(),
        ];

        let err = run(chain, &journal, vec![Value::new(1_i32)]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<TestFailure>(),
            Some(&TestFailure::new("inner", "nope"))
        );
        journal.assert_entries(&["outer:before", "outer:error"]);
    }

    #[test]
    fn test_short_circuit_skips_terminal() {
        let journal = CallJournal::new();
        let chain = vec![ShortCircuitInterceptor::new("cache", Value::new(7_i32))
            .with_journal(&journal)
            .invoke_link()];

        let result = run(chain, &journal, vec![Value::new(1_i32)]).unwrap();
        assert_eq!(result.downcast_ref::<i32>(), Some(&7));
        journal.assert_entries(&["cache:short_circuit"]);
    }

    #[test]
    fn test_argument_rewriter() {
        let journal = CallJournal::new();
        let chain = vec![ArgumentRewriter::new("inc", 0, |v| {
            Ok(Value::new(v.expect_ref::<i32>()? + 1))
        })
        .invoke_link()];

        let result = run(chain, &journal, vec![Value::new(1_i32)]).unwrap();
        assert_eq!(result.downcast_ref::<i32>(), Some(&2));
    }

    #[test]
    fn test_argument_rewriter_missing_index() {
        let journal = CallJournal::new();
        let chain = vec![ArgumentRewriter::replace_with("bad", 3, Value::unit()).invoke_link()];

        let err = run(chain, &journal, vec![Value::new(1_i32)]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<interpose_core::ContextError>(),
            Some(&interpose_core::ContextError::MissingArgument { index: 3 })
        );
        assert!(journal.is_empty());
    }

    #[test]
    fn test_writer_then_probe() {
        let journal = CallJournal::new();
        let chain = vec![
            ContextDataProbe::new("first", "user", &journal).invoke_link(),
            ContextDataWriter::new("auth", "user", Value::new("ada".to_string())).invoke_link(),
            ContextDataProbe::new("second", "user", &journal).invoke_link(),
        ];

        run(chain, &journal, vec![Value::new(0_i32)]).unwrap();
        journal.assert_entries(&["first:missing:user", "second:saw:user", "method:echo"]);
    }
}
