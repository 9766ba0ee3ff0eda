//! Bean lifecycle through the container.

use interpose::prelude::*;
use interpose_test::{
    CallJournal, FailingInterceptor, RecordingInterceptor, ShortCircuitInterceptor, TestFailure,
};
use metrics_exporter_prometheus::PrometheusBuilder;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};

struct Counter {
    start: usize,
    hits: AtomicUsize,
}

fn counter_ctor() -> ConstructorHandle {
    ConstructorHandle::of::<Counter, _>(1, |params| {
        Ok(Counter {
            start: *argument::<usize>(params, 0)?,
            hits: AtomicUsize::new(0),
        })
    })
}

fn hit() -> MethodHandle {
    MethodHandle::typed::<Counter, _>("hit", 0, |counter, _| {
        let hits = counter.hits.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Value::new(counter.start + hits))
    })
}

fn journaled_container(journal: &CallJournal) -> Container {
    let descriptor = BeanDescriptor::builder("counter", counter_ctor())
        .around_construct(RecordingInterceptor::new("construct", journal))
        .post_construct(RecordingInterceptor::new("init", journal))
        .pre_destroy(RecordingInterceptor::new("close", journal))
        .method(hit())
        .method_interceptor("hit", RecordingInterceptor::new("audit", journal))
        .build()
        .unwrap();

    let mut container = Container::new();
    container.register(descriptor).unwrap();
    container
}

#[test]
fn create_runs_construct_then_init() {
    let journal = CallJournal::new();
    let container = journaled_container(&journal);

    let instance = container.create("counter", vec![Value::new(10_usize)]).unwrap();

    assert_eq!(instance.get::<Counter>().map(|c| c.start), Some(10));
    assert!(!instance.is_destroyed());
    journal.assert_entries(&["construct:before", "construct:after", "init:before", "init:after"]);
}

#[test]
fn invoke_runs_method_chain() {
    let journal = CallJournal::new();
    let container = journaled_container(&journal);
    let instance = container.create("counter", vec![Value::new(10_usize)]).unwrap();
    journal.clear();

    let first = instance.invoke("hit", Vec::new()).unwrap();
    let second = instance.invoke("hit", Vec::new()).unwrap();

    assert_eq!(first.downcast_ref::<usize>(), Some(&11));
    assert_eq!(second.downcast_ref::<usize>(), Some(&12));
    journal.assert_entries(&["audit:before", "audit:after", "audit:before", "audit:after"]);
}

#[test]
fn destroy_runs_once_and_blocks_further_use() {
    let journal = CallJournal::new();
    let container = journaled_container(&journal);
    let instance = container.create("counter", vec![Value::new(0_usize)]).unwrap();
    journal.clear();

    instance.destroy().unwrap();
    assert!(instance.is_destroyed());
    journal.assert_entries(&["close:before", "close:after"]);

    let err = instance.destroy().unwrap_err();
    assert_eq!(
        err.downcast_ref::<ContainerError>(),
        Some(&ContainerError::Destroyed {
            bean: "counter".to_string()
        })
    );

    let err = instance.invoke("hit", Vec::new()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ContainerError>(),
        Some(ContainerError::Destroyed { .. })
    ));
    assert_eq!(journal.count("close:before"), 1);
}

#[test]
fn failed_pre_destroy_still_marks_destroyed() {
    let descriptor = BeanDescriptor::builder("counter", counter_ctor())
        .pre_destroy(FailingInterceptor::new("close", "socket stuck"))
        .build()
        .unwrap();
    let mut container = Container::new();
    container.register(descriptor).unwrap();

    let instance = container.create("counter", vec![Value::new(0_usize)]).unwrap();
    let err = instance.destroy().unwrap_err();

    assert_eq!(
        err.downcast_ref::<TestFailure>(),
        Some(&TestFailure::new("close", "socket stuck"))
    );
    assert!(instance.is_destroyed());
}

#[test]
fn unknown_method_is_rejected() {
    let journal = CallJournal::new();
    let container = journaled_container(&journal);
    let instance = container.create("counter", vec![Value::new(0_usize)]).unwrap();

    let err = instance.invoke("reset", Vec::new()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<ContainerError>(),
        Some(&ContainerError::UnknownMethod {
            bean: "counter".to_string(),
            method: "reset".to_string(),
        })
    );
}

#[test]
fn short_circuited_construction_is_reported() {
    let journal = CallJournal::new();
    let descriptor = BeanDescriptor::builder("counter", counter_ctor())
        .around_construct(ShortCircuitInterceptor::new("veto", Value::unit()).with_journal(&journal))
        .post_construct(RecordingInterceptor::new("init", &journal))
        .build()
        .unwrap();
    let mut container = Container::new();
    container.register(descriptor).unwrap();

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    let err = metrics::with_local_recorder(&recorder, || {
        container.create("counter", vec![Value::new(0_usize)])
    })
    .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ContainerError>(),
        Some(&ContainerError::NotConstructed {
            bean: "counter".to_string()
        })
    );
    journal.assert_entries(&["veto:short_circuit"]);
    assert!(!handle.render().contains("interpose_lifecycle_events_total"));
}

#[test]
fn lifecycle_events_are_counted_once_each() {
    let journal = CallJournal::new();
    let container = journaled_container(&journal);

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    metrics::with_local_recorder(&recorder, || {
        let instance = container.create("counter", vec![Value::new(0_usize)]).unwrap();
        instance.destroy().unwrap();
    });

    let rendered = handle.render();
    for kind in ["around_construct", "post_construct", "pre_destroy"] {
        let line = format!(r#"interpose_lifecycle_events_total{{bean="counter",kind="{kind}"}} 1"#);
        assert!(rendered.contains(&line), "missing {line} in:\n{rendered}");
    }
}

#[test]
fn constructor_failure_skips_post_construct() {
    let journal = CallJournal::new();
    let descriptor = BeanDescriptor::builder(
        "broken",
        ConstructorHandle::of::<Counter, _>(0, |_| Err(TestFailure::new("ctor", "no config").into())),
    )
    .post_construct(RecordingInterceptor::new("init", &journal))
    .build()
    .unwrap();
    let mut container = Container::new();
    container.register(descriptor).unwrap();

    let err = container.create("broken", Vec::new()).unwrap_err();

    assert_eq!(
        err.downcast_ref::<TestFailure>(),
        Some(&TestFailure::new("ctor", "no config"))
    );
    assert!(journal.is_empty());
}

#[test]
fn concurrent_invocations_on_one_instance() {
    let journal = CallJournal::new();
    let container = journaled_container(&journal);
    let instance = container.create("counter", vec![Value::new(0_usize)]).unwrap();
    journal.clear();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..25 {
                    instance.invoke("hit", Vec::new()).unwrap();
                }
            });
        }
    });

    assert_eq!(instance.get::<Counter>().unwrap().hits.load(Ordering::SeqCst), 100);
    assert_eq!(journal.count("audit:after"), 100);
}

#[test]
fn container_from_loaded_config() {
    let config = ConfigLoader::new()
        .with_string("[container]\nmax_chain_length = 1\n", "toml")
        .unwrap()
        .load()
        .unwrap();
    let mut container = Container::with_config(config.container).unwrap();

    let journal = CallJournal::new();
    let descriptor = BeanDescriptor::builder("counter", counter_ctor())
        .method(hit())
        .method_interceptor("hit", RecordingInterceptor::new("a", &journal))
        .method_interceptor("hit", RecordingInterceptor::new("b", &journal))
        .build()
        .unwrap();

    let err = container.register(descriptor).unwrap_err();
    assert_eq!(
        err,
        ContainerError::ChainTooLong {
            bean: "counter".to_string(),
            chain: "hit".to_string(),
            length: 2,
            max: 1,
        }
    );
}

proptest! {
    #[test]
    fn chain_length_limit_is_enforced(limit in 1_usize..8, length in 0_usize..12) {
        let journal = CallJournal::new();
        let mut builder = BeanDescriptor::builder("counter", counter_ctor()).method(hit());
        for _ in 0..length {
            builder = builder.method_interceptor("hit", RecordingInterceptor::new("link", &journal));
        }

        let mut container = Container::with_config(ContainerConfig {
            max_chain_length: limit,
            ..ContainerConfig::default()
        })
        .unwrap();
        let registered = container.register(builder.build().unwrap());

        if length <= limit {
            prop_assert!(registered.is_ok());
            let instance = container.create("counter", vec![Value::new(0_usize)]).unwrap();
            instance.invoke("hit", Vec::new()).unwrap();
            prop_assert_eq!(journal.count("link:before"), length);
        } else {
            let is_too_long = matches!(registered, Err(ContainerError::ChainTooLong { .. }));
            prop_assert!(is_too_long);
        }
    }
}
