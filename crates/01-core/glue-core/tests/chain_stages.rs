//! Thenable chain composition against the in-memory host.

use std::cell::RefCell;
use std::rc::Rc;

use glue_core::{AsyncChain, HostError};
use mock_host::{MockHost, MockValue, PromiseState};

type Log = Rc<RefCell<Vec<String>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn push(log: &Log, entry: impl Into<String>) {
    log.borrow_mut().push(entry.into());
}

#[test]
fn success_only_resolves_to_continuation_result() {
    let host = MockHost::new();
    let source = host.resolved(MockValue::Number(21.0));

    let out = AsyncChain::new(source.clone())
        .then(|v| Some(MockValue::Number(v.as_number().unwrap_or(0.0) * 2.0)))
        .attach(&host)
        .unwrap();

    assert_ne!(out, source, "source thenable must never be returned");
    host.run_until_idle();
    assert_eq!(host.state(&out), PromiseState::Fulfilled(MockValue::Number(42.0)));
}

#[test]
fn success_continuation_returning_nothing_resolves_undefined() {
    let host = MockHost::new();
    let source = host.resolved(MockValue::Null);
    let out = AsyncChain::new(source).then(|_| None).attach(&host).unwrap();
    host.run_until_idle();
    assert_eq!(host.state(&out), PromiseState::Fulfilled(MockValue::Undefined));
}

#[test]
fn returned_thenable_is_flattened() {
    let host = MockHost::new();
    let inner = host.pending();
    let source = host.resolved(MockValue::Null);

    let handoff = inner.clone();
    let out = AsyncChain::new(source)
        .then(move |_| Some(handoff))
        .attach(&host)
        .unwrap();
    host.run_until_idle();
    assert_eq!(host.state(&out), PromiseState::Pending);

    host.resolve(&inner, MockValue::str("inner"));
    host.run_until_idle();
    assert_eq!(host.state(&out), PromiseState::Fulfilled(MockValue::str("inner")));
}

#[test]
fn error_rejection_reaches_failure_handler_once() {
    let host = MockHost::new();
    let source = host.pending();
    let events = log();

    let on_ok = Rc::clone(&events);
    let on_err = Rc::clone(&events);
    let out = AsyncChain::new(source.clone())
        .then(move |_| {
            push(&on_ok, "success");
            None
        })
        .catch(move |err| push(&on_err, format!("failure:{err:?}")))
        .attach(&host)
        .unwrap();

    host.reject(&source, MockValue::error("boom"));
    host.run_until_idle();

    assert_eq!(*events.borrow(), vec![r#"failure:Error("boom")"#.to_string()]);
    assert_eq!(host.state(&out), PromiseState::Fulfilled(MockValue::Undefined));
}

#[test]
fn success_skips_failure_handler() {
    let host = MockHost::new();
    let source = host.resolved(MockValue::Number(1.0));
    let events = log();

    let on_err = Rc::clone(&events);
    let out = AsyncChain::new(source)
        .then(|v| Some(v))
        .catch(move |_| push(&on_err, "failure"))
        .attach(&host)
        .unwrap();
    host.run_until_idle();

    assert!(events.borrow().is_empty());
    assert_eq!(host.state(&out), PromiseState::Fulfilled(MockValue::Number(1.0)));
}

#[test]
fn non_error_rejection_skips_failure_handler_and_stays_rejected() {
    let host = MockHost::new();
    let source = host.pending();
    let events = log();

    let on_err = Rc::clone(&events);
    let out = AsyncChain::new(source.clone())
        .then(|v| Some(v))
        .catch(move |_| push(&on_err, "failure"))
        .attach(&host)
        .unwrap();

    host.reject(&source, MockValue::Number(7.0));
    host.run_until_idle();

    assert!(events.borrow().is_empty());
    assert_eq!(host.state(&out), PromiseState::Rejected(MockValue::Number(7.0)));
}

#[test]
fn finally_runs_once_after_success() {
    let host = MockHost::new();
    let source = host.pending();
    let events = log();

    let (a, b, c) = (Rc::clone(&events), Rc::clone(&events), Rc::clone(&events));
    let out = AsyncChain::new(source.clone())
        .then(move |v| {
            push(&a, "success");
            Some(v)
        })
        .catch(move |_| push(&b, "failure"))
        .finally(move || push(&c, "finally"))
        .attach(&host)
        .unwrap();

    host.resolve(&source, MockValue::Bool(true));
    host.run_until_idle();

    assert_eq!(*events.borrow(), vec!["success", "finally"]);
    assert_eq!(host.state(&out), PromiseState::Fulfilled(MockValue::Bool(true)));
}

#[test]
fn finally_runs_once_after_failure() {
    let host = MockHost::new();
    let source = host.pending();
    let events = log();

    let (a, b, c) = (Rc::clone(&events), Rc::clone(&events), Rc::clone(&events));
    AsyncChain::new(source.clone())
        .then(move |v| {
            push(&a, "success");
            Some(v)
        })
        .catch(move |_| push(&b, "failure"))
        .finally(move || push(&c, "finally"))
        .attach(&host)
        .unwrap();

    host.reject(&source, MockValue::error("nope"));
    host.run_until_idle();

    assert_eq!(*events.borrow(), vec!["failure", "finally"]);
}

#[test]
fn finally_still_runs_for_non_error_rejection() {
    let host = MockHost::new();
    let source = host.pending();
    let events = log();

    let (b, c) = (Rc::clone(&events), Rc::clone(&events));
    let out = AsyncChain::new(source.clone())
        .then(|v| Some(v))
        .catch(move |_| push(&b, "failure"))
        .finally(move || push(&c, "finally"))
        .attach(&host)
        .unwrap();

    host.reject(&source, MockValue::str("plain"));
    host.run_until_idle();

    assert_eq!(*events.borrow(), vec!["finally"]);
    assert_eq!(host.state(&out), PromiseState::Rejected(MockValue::str("plain")));
}

#[test]
fn each_stage_registers_one_callback() {
    let host = MockHost::new();
    let source = host.pending();
    AsyncChain::new(source)
        .then(|v| Some(v))
        .catch(|_| {})
        .finally(|| {})
        .attach(&host)
        .unwrap();
    assert_eq!(host.wrapped_count(), 3);
}

#[test]
fn nothing_runs_before_the_host_turn() {
    let host = MockHost::new();
    let source = host.resolved(MockValue::Null);
    let events = log();
    let a = Rc::clone(&events);
    AsyncChain::new(source)
        .then(move |v| {
            push(&a, "success");
            Some(v)
        })
        .attach(&host)
        .unwrap();
    assert!(events.borrow().is_empty());
    host.run_until_idle();
    assert_eq!(events.borrow().len(), 1);
}

#[test]
fn attaching_to_a_non_thenable_is_a_host_error() {
    let host = MockHost::new();
    let err = AsyncChain::new(MockValue::Number(1.0))
        .then(|v| Some(v))
        .attach(&host)
        .unwrap_err();
    assert!(matches!(err, HostError::Type { expected: "thenable", .. }));
}
