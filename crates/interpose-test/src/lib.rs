//! # Interpose Test
//!
//! Test utilities for chains built on `interpose-core`.
//!
//! ## Key Features
//!
//! - **Call journal**: a shared, ordered log of what ran
//! - **Ready-made interceptors**: recording, short-circuiting, failing,
//!   argument-rewriting and context-data interceptors
//! - **Fixtures**: journaled business methods and constructor forwards
//!
//! ## Example
//!
//! ```
//! use interpose_core::{InterceptedMethodMetadata, InterceptorBindings, InvocationContexts, Value};
//! use interpose_test::{fixtures, CallJournal, IntoLink, RecordingInterceptor};
//!
//! let journal = CallJournal::new();
//! let method = fixtures::journaled_method(&journal, "answer", 0, Value::new(42_i32));
//! let chain = vec![
//!     RecordingInterceptor::new("log", &journal).invoke_link(),
//!     RecordingInterceptor::new("auth", &journal).invoke_link(),
//! ];
//! let metadata = InterceptedMethodMetadata::new(method, chain, InterceptorBindings::empty());
//!
//! let result = InvocationContexts::perform_around_invoke(Value::unit(), Vec::new(), &metadata)
//!     .unwrap();
//!
//! assert_eq!(result.downcast_ref::<i32>(), Some(&42));
//! journal.assert_entries(&[
//!     "log:before",
//!     "auth:before",
//!     "method:answer",
//!     "auth:after",
//!     "log:after",
//! ]);
//! ```

#![doc(html_root_url = "https://docs.rs/interpose-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod fixtures;
mod interceptors;
mod journal;

pub use error::TestFailure;
pub use interceptors::{
    ArgumentRewriter, ContextDataProbe, ContextDataWriter, FailingInterceptor, IntoLink,
    RecordingInterceptor, ShortCircuitInterceptor,
};
pub use journal::CallJournal;
