//! Integration Tests for the Reactive System
//!
//! These tests verify that reactive objects, refs and effects work together
//! correctly through the public API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tether_core::{
    NotifyPolicy, Object, ReactiveEffect, Runtime, RuntimeConfig, UpdateQueue, Value,
};

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

fn count(c: &Arc<AtomicUsize>) -> usize {
    c.load(Ordering::SeqCst)
}

/// Reading inside an effect and writing a different value outside re-runs
/// the effect exactly once.
#[test]
fn read_then_write_reruns_once() {
    let rt = Runtime::new();
    let state = rt.reactive_object(Object::from_iter([("name", "a")]));
    let runs = counter();

    let state_clone = state.clone();
    let runs_clone = runs.clone();
    let _runner = rt.effect(move || {
        state_clone.get("name");
        runs_clone.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(count(&runs), 1);

    state.set("name", "b");
    assert_eq!(count(&runs), 2);
}

/// A location the effect never read never re-runs it.
#[test]
fn unread_keys_do_not_notify() {
    let rt = Runtime::new();
    let state = rt.reactive_object(Object::from_iter([("name", "a"), ("age", "1")]));
    let runs = counter();

    let state_clone = state.clone();
    let runs_clone = runs.clone();
    let _runner = rt.effect(move || {
        state_clone.get("name");
        runs_clone.fetch_add(1, Ordering::SeqCst);
    });

    state.set("age", 2);
    state.set("address", "here");
    assert_eq!(count(&runs), 1);
}

/// Writing the stored value never notifies, even after earlier changes.
#[test]
fn equal_value_writes_are_suppressed() {
    let rt = Runtime::new();
    let state = rt.reactive_object(Object::from_iter([("n", 1)]));
    let runs = counter();

    let state_clone = state.clone();
    let runs_clone = runs.clone();
    let _runner = rt.effect(move || {
        state_clone.get("n");
        runs_clone.fetch_add(1, Ordering::SeqCst);
    });

    state.set("n", 2);
    assert_eq!(count(&runs), 2);

    state.set("n", 2);
    state.set("n", 2);
    assert_eq!(count(&runs), 2);
}

#[test]
fn wrapper_identity_is_stable() {
    let rt = Runtime::new();
    let object = Object::new();

    let wrappers: Vec<_> = (0..5).map(|_| rt.reactive_object(object.clone())).collect();
    assert!(wrappers.iter().all(|w| w.ptr_eq(&wrappers[0])));

    let value = rt.reactive(Value::from(object));
    assert_eq!(value, Value::from(wrappers[0].clone()));
}

/// Reads before and after a nested computation belong to the outer one;
/// reads inside it belong to the inner one only.
#[test]
fn nested_effects_attribute_reads_correctly() {
    let rt = Runtime::new();
    let state = rt.reactive_object(Object::from_iter([("x", 0), ("y", 0), ("z", 0)]));
    let outer_runs = counter();
    let inner_runs = counter();

    let state_b = state.clone();
    let inner_runs_clone = inner_runs.clone();
    let inner = ReactiveEffect::new(&rt, move || {
        state_b.get("z");
        inner_runs_clone.fetch_add(1, Ordering::SeqCst);
    });

    let state_a = state.clone();
    let inner_clone = inner.clone();
    let outer_runs_clone = outer_runs.clone();
    let outer = rt.effect(move || {
        state_a.get("x");
        inner_clone.run();
        state_a.get("y");
        outer_runs_clone.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(outer.effect().dependency_count(), 2);
    assert_eq!(inner.dependency_count(), 1);
    assert_eq!((count(&outer_runs), count(&inner_runs)), (1, 1));

    // The outer re-run runs the inner one inline, but z's readers are not
    // notified by writes to x or y.
    state.set("x", 1);
    assert_eq!((count(&outer_runs), count(&inner_runs)), (2, 2));
    state.set("y", 1);
    assert_eq!((count(&outer_runs), count(&inner_runs)), (3, 3));

    state.set("z", 1);
    assert_eq!((count(&outer_runs), count(&inner_runs)), (3, 4));
}

/// After deactivation writes never re-run the effect; the runner still
/// executes the work function once per call, untracked.
#[test]
fn deactivated_effects_become_plain_calls() {
    let rt = Runtime::new();
    let state = rt.reactive_object(Object::from_iter([("n", 0)]));
    let runs = counter();

    let state_clone = state.clone();
    let runs_clone = runs.clone();
    let runner = rt.effect(move || {
        state_clone.get("n");
        runs_clone.fetch_add(1, Ordering::SeqCst);
    });

    runner.effect().deactivate();
    state.set("n", 1);
    state.set("n", 2);
    assert_eq!(count(&runs), 1);

    runner.run();
    runner.run();
    assert_eq!(count(&runs), 3);

    state.set("n", 3);
    assert_eq!(count(&runs), 3);
}

/// An effect that writes what it reads completes in one invocation.
#[test]
fn self_writes_do_not_loop() {
    let rt = Runtime::new();
    let state = rt.reactive_object(Object::from_iter([("n", 0)]));
    let runs = counter();

    let state_clone = state.clone();
    let runs_clone = runs.clone();
    let _runner = rt.effect(move || {
        let n = state_clone.get("n").and_then(|v| v.as_int()).unwrap_or_default();
        state_clone.set("n", n + 1);
        runs_clone.fetch_add(1, Ordering::SeqCst);
    });

    assert_eq!(count(&runs), 1);
    assert_eq!(state.to_raw().get("n"), Some(Value::Int(1)));

    state.set("n", 10);
    assert_eq!(count(&runs), 2);
    assert_eq!(state.to_raw().get("n"), Some(Value::Int(11)));
}

#[test]
fn boxed_value_notifies_on_distinct_values_only() {
    let rt = Runtime::new();
    let b = rt.ref_value(1);
    let runs = counter();

    let b_clone = b.clone();
    let runs_clone = runs.clone();
    let _runner = rt.effect(move || {
        b_clone.get();
        runs_clone.fetch_add(1, Ordering::SeqCst);
    });

    b.set(2);
    assert_eq!(count(&runs), 2);
    b.set(2);
    assert_eq!(count(&runs), 2);
    b.set(3);
    assert_eq!(count(&runs), 3);
}

/// A panicking work function leaves the execution stack balanced.
#[test]
fn panicking_work_restores_context() {
    let rt = Runtime::new();
    let fail = Arc::new(AtomicUsize::new(1));

    let fail_clone = fail.clone();
    let effect = ReactiveEffect::new(&rt, move || {
        if fail_clone.load(Ordering::SeqCst) == 1 {
            panic!("work failed");
        }
    });

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| effect.run()));
    assert!(result.is_err());
    assert!(!rt.is_tracking());
    assert!(rt.active_subscriber().is_none());

    fail.store(0, Ordering::SeqCst);
    assert_eq!(effect.run(), Some(()));
}

/// A subscriber that deactivates another one mid-batch cannot make the
/// batch skip or repeat anyone else. The deactivated one still gets its
/// call from that batch, as a plain untracked run, and is gone afterwards.
#[test]
fn batch_is_snapshotted_before_running() {
    let rt = Runtime::new();
    let b = rt.ref_value(0);
    let order = Arc::new(Mutex::new(Vec::new()));

    let victim_slot: Arc<Mutex<Option<ReactiveEffect<()>>>> = Arc::new(Mutex::new(None));

    let b1 = b.clone();
    let order1 = order.clone();
    let slot1 = victim_slot.clone();
    let _first = rt.effect(move || {
        b1.get();
        order1.lock().push("first");
        let victim = slot1.lock().clone();
        if let Some(victim) = victim {
            victim.deactivate();
        }
    });

    let b2 = b.clone();
    let order2 = order.clone();
    let victim = rt.effect(move || {
        b2.get();
        order2.lock().push("victim");
    });

    let b3 = b.clone();
    let order3 = order.clone();
    let _third = rt.effect(move || {
        b3.get();
        order3.lock().push("third");
    });

    *victim_slot.lock() = Some(victim.effect().clone());
    order.lock().clear();

    b.set(1);
    assert_eq!(*order.lock(), vec!["first", "victim", "third"]);
    assert!(!victim.effect().is_active());

    order.lock().clear();
    b.set(2);
    assert_eq!(*order.lock(), vec!["first", "third"]);

    victim_slot.lock().take();
}

/// A subscriber that deactivates itself while being notified does not
/// disturb the rest of the batch.
#[test]
fn self_deactivation_mid_batch() {
    let rt = Runtime::new();
    let b = rt.ref_value(0);
    let order = Arc::new(Mutex::new(Vec::new()));
    let self_slot: Arc<Mutex<Option<ReactiveEffect<()>>>> = Arc::new(Mutex::new(None));

    let b1 = b.clone();
    let order1 = order.clone();
    let slot1 = self_slot.clone();
    let quitter = rt.effect(move || {
        b1.get();
        order1.lock().push("quitter");
        let me = slot1.lock().clone();
        if let Some(me) = me {
            me.deactivate();
        }
    });

    let b2 = b.clone();
    let order2 = order.clone();
    let _second = rt.effect(move || {
        b2.get();
        order2.lock().push("second");
    });

    let b3 = b.clone();
    let order3 = order.clone();
    let _third = rt.effect(move || {
        b3.get();
        order3.lock().push("third");
    });

    *self_slot.lock() = Some(quitter.effect().clone());
    order.lock().clear();

    b.set(1);
    assert_eq!(*order.lock(), vec!["quitter", "second", "third"]);
    assert!(!quitter.effect().is_active());
    assert_eq!(b.subscriber_count(), 2);

    order.lock().clear();
    b.set(2);
    assert_eq!(*order.lock(), vec!["second", "third"]);

    self_slot.lock().take();
}

/// A computation that is on the stack but not on top of it cannot be
/// re-entered by a write made from the computation nested inside it.
#[test]
fn nested_writes_cannot_reenter_outer_computation() {
    let rt = Runtime::new();
    let q = rt.ref_value(0);
    let ticks = Arc::new(AtomicUsize::new(0));
    let outer_runs = counter();

    let q_inner = q.clone();
    let ticks_clone = ticks.clone();
    let writer = ReactiveEffect::new(&rt, move || {
        let tick = ticks_clone.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        q_inner.set(tick);
    });

    let q_outer = q.clone();
    let outer_runs_clone = outer_runs.clone();
    let outer = rt.effect(move || {
        q_outer.get();
        writer.run();
        outer_runs_clone.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(count(&outer_runs), 1);
    assert_eq!(q.get_untracked(), Value::Int(1));

    q.set(100);
    assert_eq!(count(&outer_runs), 2);
    assert_eq!(outer.effect().run_count(), 2);
    assert_eq!(q.get_untracked(), Value::Int(2));
    assert!(!rt.is_tracking());
}

/// An effect whose runner is discarded keeps reacting.
#[test]
fn discarded_runner_keeps_effect_alive() {
    let rt = Runtime::new();
    let state = rt.reactive_object(Object::from_iter([("n", 0)]));
    let runs = counter();

    let state_clone = state.clone();
    let runs_clone = runs.clone();
    rt.effect(move || {
        state_clone.get("n");
        runs_clone.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(count(&runs), 1);

    state.set("n", 1);
    assert_eq!(count(&runs), 2);
}

/// An effect registered inline inside another effect belongs to itself:
/// writing what it read re-runs it and leaves the outer effect alone.
#[test]
fn effect_created_inside_effect_keeps_reacting() {
    let rt = Runtime::new();
    let state = rt.reactive_object(Object::from_iter([("x", 0), ("z", 0)]));
    let outer_runs = counter();
    let inner_runs = counter();

    let rt_clone = rt.clone();
    let state_clone = state.clone();
    let outer_runs_clone = outer_runs.clone();
    let inner_runs_clone = inner_runs.clone();
    let _outer = rt.effect(move || {
        state_clone.get("x");

        let inner_state = state_clone.clone();
        let inner_runs = inner_runs_clone.clone();
        rt_clone.effect(move || {
            inner_state.get("z");
            inner_runs.fetch_add(1, Ordering::SeqCst);
        });

        outer_runs_clone.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!((count(&outer_runs), count(&inner_runs)), (1, 1));

    state.set("z", 1);
    assert_eq!((count(&outer_runs), count(&inner_runs)), (1, 2));
}

/// Conditional reads: with cleanup, branches no longer read stop notifying.
#[test]
fn stale_branches_are_dropped_by_default() {
    let rt = Runtime::new();
    let state = rt.reactive_object(Object::from_iter([
        ("flag", Value::Bool(true)),
        ("a", Value::Int(0)),
        ("b", Value::Int(0)),
    ]));
    let runs = counter();

    let state_clone = state.clone();
    let runs_clone = runs.clone();
    let runner = rt.effect(move || {
        if state_clone.get("flag").and_then(|v| v.as_bool()).unwrap_or(false) {
            state_clone.get("a");
        } else {
            state_clone.get("b");
        }
        runs_clone.fetch_add(1, Ordering::SeqCst);
    });

    state.set("flag", false);
    assert_eq!(count(&runs), 2);
    assert_eq!(runner.effect().dependency_count(), 2);

    state.set("a", 1);
    assert_eq!(count(&runs), 2);
}

/// Without cleanup, edges accumulate across runs.
#[test]
fn stale_branches_accumulate_without_cleanup() {
    let rt = Runtime::with_config(RuntimeConfig::new().with_cleanup_before_run(false));
    let state = rt.reactive_object(Object::from_iter([
        ("flag", Value::Bool(true)),
        ("a", Value::Int(0)),
        ("b", Value::Int(0)),
    ]));
    let runs = counter();

    let state_clone = state.clone();
    let runs_clone = runs.clone();
    let runner = rt.effect(move || {
        if state_clone.get("flag").and_then(|v| v.as_bool()).unwrap_or(false) {
            state_clone.get("a");
        } else {
            state_clone.get("b");
        }
        runs_clone.fetch_add(1, Ordering::SeqCst);
    });

    state.set("flag", false);
    assert_eq!(runner.effect().dependency_count(), 3);

    state.set("a", 1);
    assert_eq!(count(&runs), 3);
}

/// A render loop: one tracked computation per component, re-execution
/// deferred to an update queue flushed by the host.
#[test]
fn render_loop_with_update_queue() {
    let rt = Runtime::new();
    let queue = UpdateQueue::new();
    let state = rt.reactive_object(Object::from_iter([("title", "hello"), ("count", "0")]));
    let frames = Arc::new(Mutex::new(Vec::<String>::new()));

    let state_clone = state.clone();
    let frames_clone = frames.clone();
    let _update = rt.effect_with_scheduler(
        move || {
            let title = state_clone.get("title").unwrap_or_default();
            let count = state_clone.get("count").unwrap_or_default();
            frames_clone.lock().push(format!(
                "{}:{}",
                title.as_str().unwrap_or_default(),
                count.as_str().unwrap_or_default()
            ));
        },
        queue.scheduler(),
    );
    assert_eq!(*frames.lock(), vec!["hello:0"]);

    state.set("title", "hi");
    state.set("count", "1");
    assert_eq!(frames.lock().len(), 1);

    assert_eq!(queue.flush(), 1);
    assert_eq!(*frames.lock(), vec!["hello:0", "hi:1"]);
}

/// The observed short-circuit policy stops the batch at the first
/// scheduled subscriber.
#[test]
fn short_circuit_policy_is_configurable() {
    let rt = Runtime::with_config(
        RuntimeConfig::new().with_notify_policy(NotifyPolicy::StopAtFirstScheduled),
    );
    let queue = UpdateQueue::new();
    let b = rt.ref_value(0);
    let plain_runs = counter();

    let b1 = b.clone();
    let _scheduled = rt.effect_with_scheduler(
        move || {
            b1.get();
        },
        queue.scheduler(),
    );

    let b2 = b.clone();
    let plain_clone = plain_runs.clone();
    let _plain = rt.effect(move || {
        b2.get();
        plain_clone.fetch_add(1, Ordering::SeqCst);
    });

    b.set(1);
    assert_eq!(queue.len(), 1);
    assert_eq!(count(&plain_runs), 1);
}

/// Refs holding objects hand out tracked views of them.
#[test]
fn ref_of_object_tracks_nested_reads() {
    let rt = Runtime::new();
    let profile = rt.ref_value(Object::from_json_str(r#"{"name": "ada"}"#).unwrap());
    let seen = Arc::new(Mutex::new(Vec::new()));

    let profile_clone = profile.clone();
    let seen_clone = seen.clone();
    let _runner = rt.effect(move || {
        let name = profile_clone
            .get()
            .as_reactive()
            .and_then(|p| p.get("name"))
            .unwrap_or_default();
        seen_clone.lock().push(name);
    });

    let current = profile.get_untracked();
    current.as_reactive().unwrap().set("name", "grace");
    profile.set(Object::from_iter([("name", "linus")]));

    assert_eq!(
        *seen.lock(),
        vec![Value::from("ada"), Value::from("grace"), Value::from("linus")]
    );
}
