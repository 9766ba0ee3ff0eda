//! # Interpose
//!
//! **Interceptor chains and a lifecycle-aware bean container**
//!
//! Interpose runs cross-cutting behaviour around business methods,
//! constructors and lifecycle events:
//!
//! - **Ordered chains** – each interceptor decides whether and when the rest
//!   of the chain runs by calling `proceed()`
//! - **Exact failure propagation** – errors raised anywhere reach the caller
//!   unchanged and can be downcast to their original type
//! - **Managed instances** – [`container::Container`] drives construction,
//!   post-construct, intercepted dispatch and pre-destroy
//! - **Observability** – `tracing` events and `metrics` counters through
//!   [`interceptors`] and [`telemetry`]
//!
//! ## Quick Start
//!
//! ```
//! use interpose::prelude::*;
//!
//! let audit = FnInterceptor::new("audit", |ctx| ctx.proceed());
//! let answer = MethodHandle::new("Oracle", "answer", 0, |_, _| Ok(Value::new(42_i32)));
//! let metadata = InterceptedMethodMetadata::new(
//!     answer,
//!     vec![InterceptorInvocation::around_invoke(std::sync::Arc::new(audit))],
//!     InterceptorBindings::empty(),
//! );
//!
//! let result = InvocationContexts::perform_around_invoke(Value::unit(), Vec::new(), &metadata)
//!     .unwrap();
//! assert_eq!(result.downcast_ref::<i32>(), Some(&42));
//! ```
//!
//! ## Crates
//!
//! | Path | Crate | Contents |
//! |------|-------|----------|
//! | `interpose::*` | `interpose-core` | Contexts, chains, handles, values |
//! | [`container`] | this crate | Bean descriptors and managed instances |
//! | [`interceptors`] | this crate | Logging and timing interceptors |
//! | [`config`] | `interpose-config` | Layered configuration |
//! | [`telemetry`] | `interpose-telemetry` | Logging and metrics setup |

#![doc(html_root_url = "https://docs.rs/interpose/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod container;
mod error;
pub mod interceptors;

pub use error::ContainerError;

// Re-export the invocation machinery at the crate root
pub use interpose_core::{
    argument, ConstructorForward, ConstructorHandle, ContextError, ContextState, FnInterceptor,
    InterceptedMethodMetadata, InterceptionType, Interceptor, InterceptorBinding,
    InterceptorBindings, InterceptorInvocation, InvocationContext, InvocationContexts,
    InvocationResult, MethodHandle, Value, INTERCEPTOR_BINDINGS_KEY,
};

// Re-export configuration types
pub use interpose_config as config;

// Re-export telemetry types
pub use interpose_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```
/// use interpose::prelude::*;
///
/// let container = Container::with_config(ContainerConfig::default()).unwrap();
/// assert!(container.is_empty());
/// ```
pub mod prelude {
    pub use interpose_core::{
        argument, ConstructorHandle, ContextError, FnInterceptor, InterceptedMethodMetadata,
        InterceptionType, Interceptor, InterceptorBinding, InterceptorBindings,
        InterceptorInvocation, InvocationContext, InvocationContexts, InvocationResult,
        MethodHandle, Value,
    };

    // Container
    pub use crate::container::{BeanDescriptor, Container, ManagedInstance};
    pub use crate::error::ContainerError;

    // Built-in interceptors
    pub use crate::interceptors::{LoggingInterceptor, TimingInterceptor};

    // Configuration and telemetry entry points
    pub use interpose_config::{ConfigLoader, ContainerConfig, InterposeConfig};
    pub use interpose_telemetry::{init_telemetry, TelemetryConfig};
}
