//! Invocation metrics.

use super::outcome_label;
use interpose_core::{Interceptor, InvocationContext, InvocationResult, MethodHandle};
use interpose_telemetry::metrics::record_invocation;
use std::time::Instant;

/// Records `interpose_invocations_total` and
/// `interpose_invocation_duration_seconds` for business-method calls.
///
/// The measured duration covers the rest of the chain and the method itself.
/// Lifecycle and constructor hooks pass through unmeasured.
#[derive(Debug, Clone, Default)]
pub struct TimingInterceptor {
    priority: i32,
}

impl TimingInterceptor {
    /// Creates a timing interceptor with priority 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ordering hint.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl Interceptor for TimingInterceptor {
    fn name(&self) -> &'static str {
        "timing"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn around_invoke(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        let method = ctx
            .method()
            .map(MethodHandle::qualified_name)
            .unwrap_or_default();

        let start = Instant::now();
        let outcome = ctx.proceed();
        record_invocation(&method, outcome_label(&outcome), start.elapsed());

        outcome
    }
}
