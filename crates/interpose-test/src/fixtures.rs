//! Journaled business methods and constructor forwards.
//!
//! Terminal actions record `method:<name>` or `construct:<type>` in the
//! journal, so tests can check that the terminal ran exactly once and after
//! every interceptor's `before` entry.

use crate::error::TestFailure;
use crate::journal::CallJournal;
use interpose_core::{ConstructorForward, MethodHandle, Value};

/// Declaring type reported by fixture method handles.
pub const FIXTURE_TYPE: &str = "Fixture";

/// A method with `parameter_count` parameters that returns `result`.
pub fn journaled_method(
    journal: &CallJournal,
    name: &'static str,
    parameter_count: usize,
    result: Value,
) -> MethodHandle {
    let journal = journal.clone();
    MethodHandle::new(FIXTURE_TYPE, name, parameter_count, move |_, _| {
        journal.record(format!("method:{name}"));
        Ok(result.clone())
    })
}

/// A one-parameter method that returns its argument.
pub fn journaled_echo(journal: &CallJournal, name: &'static str) -> MethodHandle {
    let journal = journal.clone();
    MethodHandle::new(FIXTURE_TYPE, name, 1, move |_, args| {
        journal.record(format!("method:{name}"));
        Ok(args.first().cloned().unwrap_or_else(Value::unit))
    })
}

/// A method that always fails with a [`TestFailure`] sourced from `name`.
pub fn failing_method(name: &'static str, message: &'static str) -> MethodHandle {
    MethodHandle::new(FIXTURE_TYPE, name, 0, move |_, _| {
        Err(TestFailure::new(name, message).into())
    })
}

/// A constructor forward that records `construct:<label>` and returns
/// `instance`, ignoring the parameters.
pub fn journaled_forward(
    journal: &CallJournal,
    label: &'static str,
    instance: Value,
) -> ConstructorForward<'static> {
    let journal = journal.clone();
    Box::new(move |_| {
        journal.record(format!("construct:{label}"));
        Ok(instance)
    })
}
