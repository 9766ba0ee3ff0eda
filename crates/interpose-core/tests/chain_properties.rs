//! Property tests for chain driving.
//!
//! These tests build chains of arbitrary length and check the ordering,
//! short-circuit and failure-propagation guarantees of `proceed()`.

use interpose_core::{
    FnInterceptor, InterceptedMethodMetadata, InterceptorBindings, InterceptorInvocation,
    InvocationContexts, InvocationResult, MethodHandle, Value,
};
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("link {0} refused")]
struct Refused(usize);

#[derive(Clone, Copy, Debug)]
enum Behavior {
    Proceed,
    ShortCircuit,
    Fail,
}

struct Harness {
    metadata: InterceptedMethodMetadata,
    entered: Arc<Mutex<Vec<(usize, usize)>>>,
    terminal_calls: Arc<AtomicUsize>,
}

/// Builds a chain where link `k` behaves as `behavior` and every other link proceeds.
fn harness(len: usize, special: Option<(usize, Behavior)>) -> Harness {
    let entered = Arc::new(Mutex::new(Vec::new()));
    let terminal_calls = Arc::new(AtomicUsize::new(0));

    let chain = (0..len)
        .map(|index| {
            let entered = entered.clone();
            let behavior = match special {
                Some((k, behavior)) if k == index => behavior,
                _ => Behavior::Proceed,
            };
            InterceptorInvocation::around_invoke(Arc::new(FnInterceptor::new(
                "probe",
                move |ctx| -> InvocationResult {
                    entered.lock().unwrap().push((index, ctx.position()));
                    match behavior {
                        Behavior::Proceed => ctx.proceed(),
                        Behavior::ShortCircuit => Ok(Value::new(format!("short:{index}"))),
                        Behavior::Fail => Err(Refused(index).into()),
                    }
                },
            )))
        })
        .collect();

    let calls = terminal_calls.clone();
    let method = MethodHandle::new("Answer", "get", 0, move |_, _| {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Value::new(42_i64))
    });

    Harness {
        metadata: InterceptedMethodMetadata::new(method, chain, InterceptorBindings::empty()),
        entered,
        terminal_calls,
    }
}

proptest! {
    #[test]
    fn full_chain_reaches_terminal_once(len in 0usize..24) {
        let h = harness(len, None);

        let result = InvocationContexts::perform_around_invoke(Value::unit(), Vec::new(), &h.metadata)
            .unwrap();

        prop_assert_eq!(result.downcast_ref::<i64>(), Some(&42));
        prop_assert_eq!(h.terminal_calls.load(Ordering::SeqCst), 1);

        let entered = h.entered.lock().unwrap().clone();
        let expected: Vec<(usize, usize)> = (0..len).map(|i| (i, i + 1)).collect();
        prop_assert_eq!(entered, expected);
    }

    #[test]
    fn short_circuit_stops_the_chain((len, k) in (1usize..24).prop_flat_map(|len| (Just(len), 0..len))) {
        let h = harness(len, Some((k, Behavior::ShortCircuit)));

        let result = InvocationContexts::perform_around_invoke(Value::unit(), Vec::new(), &h.metadata)
            .unwrap();

        prop_assert_eq!(result.downcast_ref::<String>().cloned(), Some(format!("short:{k}")));
        prop_assert_eq!(h.terminal_calls.load(Ordering::SeqCst), 0);
        prop_assert_eq!(h.entered.lock().unwrap().len(), k + 1);
    }

    #[test]
    fn failure_propagates_unchanged((len, k) in (1usize..24).prop_flat_map(|len| (Just(len), 0..len))) {
        let h = harness(len, Some((k, Behavior::Fail)));

        let err = InvocationContexts::perform_around_invoke(Value::unit(), Vec::new(), &h.metadata)
            .unwrap_err();

        prop_assert_eq!(err.downcast_ref::<Refused>(), Some(&Refused(k)));
        prop_assert_eq!(err.to_string(), format!("link {k} refused"));
        prop_assert_eq!(h.terminal_calls.load(Ordering::SeqCst), 0);
        prop_assert_eq!(h.entered.lock().unwrap().len(), k + 1);
    }
}
