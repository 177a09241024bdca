//! The four callback shapes behave the same through the host as when called
//! directly, and global registration is last-writer-wins.

use std::cell::Cell;
use std::rc::Rc;

use glue_core::{
    func_of, proc_of, set_func, set_proc, set_simple_func, set_simple_proc, simple_func_of,
    simple_proc_of, Host, HostFunc,
};
use mock_host::{MockHost, MockValue};
use proptest::prelude::*;

fn numbers(args: &[f64]) -> Vec<MockValue> {
    args.iter().copied().map(MockValue::Number).collect()
}

fn sum(args: &[MockValue]) -> f64 {
    args.iter().filter_map(MockValue::as_number).sum()
}

proptest! {
    #[test]
    fn value_with_args_matches_direct_call(args in proptest::collection::vec(-1e6f64..1e6, 0..8)) {
        let host = MockHost::new();
        let args = numbers(&args);
        let cb = func_of(|a: &[MockValue]| Some(MockValue::Number(sum(a))));
        let direct = cb.invoke(&args).unwrap_or(MockValue::Undefined);
        let func = host.wrap(cb);
        let via_host = host.call(&func.as_value(), &args).unwrap();
        prop_assert_eq!(via_host, direct);
    }

    #[test]
    fn value_without_args_matches_direct_call(args in proptest::collection::vec(-1e6f64..1e6, 0..8)) {
        let host = MockHost::new();
        let args = numbers(&args);
        let cb = simple_func_of(|| Some(MockValue::str("fixed")));
        let direct = cb.invoke(&[]).unwrap_or(MockValue::Undefined);
        let func = host.wrap(cb);
        let via_host = host.call(&func.as_value(), &args).unwrap();
        prop_assert_eq!(via_host, direct);
    }

    #[test]
    fn procs_match_direct_call(args in proptest::collection::vec(-1e6f64..1e6, 0..8)) {
        let host = MockHost::new();
        let args = numbers(&args);

        let seen = Rc::new(Cell::new(0.0));
        let sink = Rc::clone(&seen);
        let cb = proc_of(move |a: &[MockValue]| sink.set(sum(a)));
        cb.invoke(&args);
        let direct = seen.replace(f64::NAN);
        let func = host.wrap(cb);
        prop_assert_eq!(host.call(&func.as_value(), &args).unwrap(), MockValue::Undefined);
        prop_assert_eq!(seen.get(), direct);

        let hits = Rc::new(Cell::new(0u32));
        let counter = Rc::clone(&hits);
        let simple = host.wrap(simple_proc_of(move || counter.set(counter.get() + 1)));
        prop_assert_eq!(host.call(&simple.as_value(), &args).unwrap(), MockValue::Undefined);
        prop_assert_eq!(hits.get(), 1);
    }
}

#[test]
#[should_panic]
fn host_calling_with_too_few_arguments_is_fatal() {
    let host = MockHost::new();
    set_proc(&host, "needsTwo", |args: &[MockValue]| {
        let _ = &args[1];
    })
    .unwrap();
    let _ = host.call_global("needsTwo", &[MockValue::Null]);
}

#[test]
fn last_registration_wins() {
    let host = MockHost::new();
    set_simple_func(&host, "entry", || Some(MockValue::str("first"))).unwrap();
    set_simple_func(&host, "entry", || Some(MockValue::str("second"))).unwrap();
    assert_eq!(
        host.call_global("entry", &[]).unwrap(),
        MockValue::str("second")
    );
}

#[test]
fn registration_replaces_non_function_globals() {
    let host = MockHost::new();
    host.set("entry", &MockValue::Number(3.0)).unwrap();
    set_func(&host, "entry", |args: &[MockValue]| args.first().cloned()).unwrap();
    assert_eq!(
        host.call_global("entry", &[MockValue::Bool(true)]).unwrap(),
        MockValue::Bool(true)
    );
}

#[test]
fn exposed_handle_is_the_installed_global() {
    let host = MockHost::new();
    let hits = Rc::new(Cell::new(0));
    let counter = Rc::clone(&hits);
    let func = set_simple_proc(&host, "tick", move || counter.set(counter.get() + 1)).unwrap();
    assert_eq!(host.global("tick"), Some(func.as_value()));
    host.call_global("tick", &[]).unwrap();
    host.call(&func.as_value(), &[]).unwrap();
    assert_eq!(hits.get(), 2);
}

#[test]
fn exposed_function_can_recurse_through_the_host() {
    let host = MockHost::new();
    let inner = host.clone();
    set_func(&host, "countdown", move |args: &[MockValue]| {
        let n = args[0].as_number().unwrap_or(0.0);
        if n <= 0.0 {
            return Some(MockValue::Number(0.0));
        }
        let rest = inner
            .call_global("countdown", &[MockValue::Number(n - 1.0)])
            .ok()?;
        Some(MockValue::Number(n + rest.as_number().unwrap_or(0.0)))
    })
    .unwrap();

    let direct = host
        .call_global("countdown", &[MockValue::Number(3.0)])
        .unwrap();
    assert_eq!(direct, MockValue::Number(6.0));
}
