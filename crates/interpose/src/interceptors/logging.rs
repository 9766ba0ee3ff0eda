//! Structured logging around chain progress.

use super::outcome_label;
use interpose_core::{Interceptor, InvocationContext, InvocationResult, MethodHandle};
use std::time::Instant;
use tracing::debug;

/// Emits `debug` events before and after the rest of the chain.
///
/// Events carry the `method` (or lifecycle `kind`), this link's `position`,
/// the `outcome` and `duration_ms`. Failures are logged with their message
/// and returned unchanged.
#[derive(Debug, Clone, Default)]
pub struct LoggingInterceptor {
    priority: i32,
}

impl LoggingInterceptor {
    /// Creates a logging interceptor with priority 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ordering hint. Use a low value to log the whole chain.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn log(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        let kind = ctx.kind();
        let position = ctx.position().saturating_sub(1);
        let subject = ctx
            .method()
            .map(MethodHandle::qualified_name)
            .or_else(|| ctx.constructor().map(|c| c.declaring_type().to_string()))
            .or_else(|| ctx.target().map(|t| t.type_name().to_string()))
            .unwrap_or_default();

        debug!(%kind, method = %subject, position, "interception started");

        let start = Instant::now();
        let outcome = ctx.proceed();
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        match &outcome {
            Ok(_) => debug!(
                %kind,
                method = %subject,
                position,
                outcome = outcome_label(&outcome),
                duration_ms,
                "interception completed"
            ),
            Err(error) => debug!(
                %kind,
                method = %subject,
                position,
                outcome = outcome_label(&outcome),
                duration_ms,
                error = %error,
                "interception failed"
            ),
        }

        outcome
    }
}

impl Interceptor for LoggingInterceptor {
    fn name(&self) -> &'static str {
        "logging"
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn around_invoke(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        self.log(ctx)
    }

    fn around_construct(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        self.log(ctx)
    }

    fn post_construct(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        self.log(ctx)
    }

    fn pre_destroy(&self, ctx: &mut InvocationContext<'_>) -> InvocationResult {
        self.log(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interpose_core::{
        InterceptedMethodMetadata, InterceptorBindings, InterceptorInvocation, InvocationContexts,
        Value,
    };
    use interpose_test::{fixtures, CallJournal, FailingInterceptor, IntoLink, TestFailure};
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, captured.text())
    }

    #[test]
    fn test_logs_successful_invocation() {
        let journal = CallJournal::new();
        let method = fixtures::journaled_method(&journal, "answer", 0, Value::new(42_i32));
        let chain = vec![LoggingInterceptor::new().invoke_link()];
        let metadata = InterceptedMethodMetadata::new(method, chain, InterceptorBindings::empty());

        let (result, logs) = with_captured_logs(|| {
            InvocationContexts::perform_around_invoke(Value::unit(), Vec::new(), &metadata)
        });

        assert_eq!(result.unwrap().downcast_ref::<i32>(), Some(&42));
        assert!(logs.contains("interception started"));
        assert!(logs.contains("interception completed"));
        assert!(logs.contains("Fixture::answer"));
        assert!(logs.contains("outcome=\"ok\"") || logs.contains("outcome=ok"));
    }

    #[test]
    fn test_failure_is_logged_and_returned_unchanged() {
        let journal = CallJournal::new();
        let method = fixtures::journaled_method(&journal, "answer", 0, Value::unit());
        let chain = vec![
            LoggingInterceptor::new().invoke_link(),
            FailingInterceptor::new("guard", "denied").invoke_link(),
        ];
        let metadata = InterceptedMethodMetadata::new(method, chain, InterceptorBindings::empty());

        let (result, logs) = with_captured_logs(|| {
            InvocationContexts::perform_around_invoke(Value::unit(), Vec::new(), &metadata)
        });

        let err = result.unwrap_err();
        assert_eq!(
            err.downcast_ref::<TestFailure>(),
            Some(&TestFailure::new("guard", "denied"))
        );
        assert!(logs.contains("interception failed"));
        assert!(logs.contains("guard failed: denied"));
        assert!(journal.is_empty());
    }

    #[test]
    fn test_lifecycle_hook_logs_target_type() {
        let chain = vec![InterceptorInvocation::post_construct(Arc::new(
            LoggingInterceptor::new(),
        ))];

        let (result, logs) = with_captured_logs(|| {
            InvocationContexts::post_construct(Value::new(7_u16), &chain, InterceptorBindings::empty())
                .proceed()
        });

        assert!(result.unwrap().is_unit());
        assert!(logs.contains("post_construct"));
        assert!(logs.contains("u16"));
    }

    #[test]
    fn test_priority() {
        assert_eq!(LoggingInterceptor::new().priority(), 0);
        assert_eq!(LoggingInterceptor::new().with_priority(-100).priority(), -100);
    }
}
