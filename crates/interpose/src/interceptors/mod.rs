//! Built-in interceptors.
//!
//! | Interceptor | Hooks | Effect |
//! |-------------|-------|--------|
//! | [`LoggingInterceptor`] | all | `tracing` events around `proceed()` |
//! | [`TimingInterceptor`] | around-invoke | invocation counter and latency histogram |
//!
//! Neither alters the value or failure returned by the rest of the chain.

mod logging;
mod timing;

pub use logging::LoggingInterceptor;
pub use timing::TimingInterceptor;

/// Outcome label for a result: `"ok"` or `"error"`.
pub(crate) fn outcome_label<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "ok"
    } else {
        "error"
    }
}
