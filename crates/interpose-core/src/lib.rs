//! # Interpose Core
//!
//! Invocation contexts and interceptor chaining for the Interpose runtime.
//!
//! This crate provides the per-call machinery that runs interceptors around
//! business methods, constructors and lifecycle events:
//!
//! - [`InvocationContext`] - Mutable, single-use state for one intercepted call
//! - [`InvocationContexts`] - Stateless factory for every context variant
//! - [`InterceptedMethodMetadata`] - Precomputed chain, bindings and method handle
//! - [`InterceptorInvocation`] - One interceptor bound to one hook
//! - [`Interceptor`] - The trait interceptor authors implement
//! - [`Value`] - Type-erased targets, arguments and results
//!
//! ## Call flow
//!
//! ```text
//! caller → InvocationContexts::perform_around_invoke(target, args, &metadata)
//!            │
//!            ▼
//!   interceptor[0] ─proceed()→ interceptor[1] ─proceed()→ … ─proceed()→ business method
//!            ▲                                                                │
//!            └────────────────────────── result / failure ◄───────────────────┘
//! ```
//!
//! Failures raised anywhere in the chain reach the caller unchanged; the
//! context never wraps, logs or suppresses them.

#![doc(html_root_url = "https://docs.rs/interpose-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod binding;
mod context;
mod contexts;
mod error;
mod handle;
mod interceptor;
mod metadata;
mod value;

pub use binding::{InterceptorBinding, InterceptorBindings};
pub use context::{ContextState, InvocationContext, INTERCEPTOR_BINDINGS_KEY};
pub use contexts::InvocationContexts;
pub use error::{ContextError, InvocationResult};
pub use handle::{ConstructorForward, ConstructorHandle, MethodHandle};
pub use interceptor::{FnInterceptor, InterceptionType, Interceptor, InterceptorInvocation};
pub use metadata::InterceptedMethodMetadata;
pub use value::{argument, Value};
