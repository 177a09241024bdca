//! In-memory host with standard promise semantics and a microtask queue.
//!
//! Nothing runs until [`MockHost::run_until_idle`] is called, so tests can
//! observe every intermediate state of a chain.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use glue_core::{ForeignCallback, Host, HostError, HostFunc, HostResult};
use log::trace;

/// Dynamic value as seen by the mock host.
#[derive(Clone, Debug, PartialEq)]
pub enum MockValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    /// A genuine error object carrying its message.
    Error(String),
    Array(Vec<MockValue>),
    Func(usize),
    Promise(usize),
}

impl MockValue {
    pub fn str(s: impl Into<String>) -> Self {
        MockValue::Str(s.into())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        MockValue::Error(msg.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            MockValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<f64> for MockValue {
    fn from(n: f64) -> Self {
        MockValue::Number(n)
    }
}

impl From<&str> for MockValue {
    fn from(s: &str) -> Self {
        MockValue::Str(s.to_owned())
    }
}

/// Settlement state of a mock promise.
#[derive(Clone, Debug, PartialEq)]
pub enum PromiseState {
    Pending,
    Fulfilled(MockValue),
    Rejected(MockValue),
}

#[derive(Clone, Copy, Debug)]
enum ReactionKind {
    Then(usize),
    Catch(usize),
    Finally(usize),
    Adopt,
}

#[derive(Clone, Copy, Debug)]
struct Reaction {
    kind: ReactionKind,
    derived: usize,
}

struct PromiseSlot {
    state: PromiseState,
    /// Set once the promise has been resolved with another promise; only
    /// the adopted outcome may settle it from then on.
    locked: bool,
    reactions: Vec<Reaction>,
}

struct Job {
    reaction: Reaction,
    outcome: PromiseState,
}

#[derive(Default)]
struct State {
    globals: HashMap<String, MockValue>,
    funcs: Vec<ForeignCallback<MockValue>>,
    promises: Vec<PromiseSlot>,
    queue: VecDeque<Job>,
}

/// Cheaply cloneable handle to a shared mock host.
#[derive(Clone, Default)]
pub struct MockHost {
    state: Rc<RefCell<State>>,
}

/// A function registered with the mock host. The host keeps every callback
/// for its own lifetime, so forgetting is a no-op.
#[derive(Clone, Debug)]
pub struct MockFunc {
    id: usize,
}

impl HostFunc<MockValue> for MockFunc {
    fn as_value(&self) -> MockValue {
        MockValue::Func(self.id)
    }

    fn forget(self) {}
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh pending promise.
    pub fn pending(&self) -> MockValue {
        MockValue::Promise(self.new_promise(PromiseState::Pending))
    }

    /// A promise already fulfilled with `value`.
    pub fn resolved(&self, value: MockValue) -> MockValue {
        MockValue::Promise(self.new_promise(PromiseState::Fulfilled(value)))
    }

    /// Resolves a pending promise. Resolving with another promise adopts it.
    /// Ignored once the promise is settled or already following another.
    pub fn resolve(&self, promise: &MockValue, value: MockValue) {
        let id = promise_id(promise);
        if self.is_resolved(id) {
            return;
        }
        self.resolve_with(id, value);
    }

    /// Rejects a pending promise. Ignored once the promise is settled or
    /// already following another.
    pub fn reject(&self, promise: &MockValue, reason: MockValue) {
        let id = promise_id(promise);
        if self.is_resolved(id) {
            return;
        }
        self.settle(id, PromiseState::Rejected(reason));
    }

    pub fn state(&self, promise: &MockValue) -> PromiseState {
        let id = promise_id(promise);
        self.state.borrow().promises[id].state.clone()
    }

    /// Reads a global without going through [`Host::get`].
    pub fn global(&self, name: &str) -> Option<MockValue> {
        self.state.borrow().globals.get(name).cloned()
    }

    /// Calls a global function the way outside host code would.
    pub fn call_global(&self, name: &str, args: &[MockValue]) -> HostResult<MockValue> {
        let func = self
            .global(name)
            .ok_or_else(|| HostError::missing(name))?;
        self.call(&func, args)
    }

    /// Number of functions the host has been asked to wrap.
    pub fn wrapped_count(&self) -> usize {
        self.state.borrow().funcs.len()
    }

    /// Drains the microtask queue, including jobs queued while draining.
    /// Returns how many jobs ran.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            let job = self.state.borrow_mut().queue.pop_front();
            let Some(job) = job else { break };
            self.run_job(job);
            ran += 1;
        }
        trace!("mock host idle after {ran} jobs");
        ran
    }

    fn new_promise(&self, state: PromiseState) -> usize {
        let mut st = self.state.borrow_mut();
        st.promises.push(PromiseSlot {
            state,
            locked: false,
            reactions: Vec::new(),
        });
        st.promises.len() - 1
    }

    fn is_resolved(&self, id: usize) -> bool {
        let st = self.state.borrow();
        let slot = &st.promises[id];
        slot.locked || slot.state != PromiseState::Pending
    }

    fn resolve_with(&self, id: usize, value: MockValue) {
        match value {
            MockValue::Promise(source) => {
                self.state.borrow_mut().promises[id].locked = true;
                self.react(
                    source,
                    Reaction {
                        kind: ReactionKind::Adopt,
                        derived: id,
                    },
                )
            }
            other => self.settle(id, PromiseState::Fulfilled(other)),
        }
    }

    fn settle(&self, id: usize, outcome: PromiseState) {
        let mut st = self.state.borrow_mut();
        let slot = &mut st.promises[id];
        if slot.state != PromiseState::Pending {
            return;
        }
        slot.state = outcome.clone();
        let reactions = std::mem::take(&mut slot.reactions);
        for reaction in reactions {
            st.queue.push_back(Job {
                reaction,
                outcome: outcome.clone(),
            });
        }
    }

    fn react(&self, source: usize, reaction: Reaction) {
        let mut st = self.state.borrow_mut();
        let current = st.promises[source].state.clone();
        match current {
            PromiseState::Pending => st.promises[source].reactions.push(reaction),
            outcome => st.queue.push_back(Job { reaction, outcome }),
        }
    }

    fn derive(&self, thenable: &MockValue, kind: ReactionKind) -> HostResult<MockValue> {
        let MockValue::Promise(source) = thenable else {
            return Err(HostError::type_mismatch(format!("{thenable:?}"), "thenable"));
        };
        let derived = self.new_promise(PromiseState::Pending);
        self.react(*source, Reaction { kind, derived });
        Ok(MockValue::Promise(derived))
    }

    fn invoke(&self, func: usize, args: &[MockValue]) -> MockValue {
        let callback = self.state.borrow().funcs[func].clone();
        callback.invoke(args).unwrap_or(MockValue::Undefined)
    }

    fn run_job(&self, job: Job) {
        let Job { reaction, outcome } = job;
        let derived = reaction.derived;
        match (reaction.kind, outcome) {
            (ReactionKind::Then(f), PromiseState::Fulfilled(v)) => {
                let result = self.invoke(f, &[v]);
                self.resolve_with(derived, result);
            }
            (ReactionKind::Catch(f), PromiseState::Rejected(e)) => {
                let result = self.invoke(f, &[e]);
                self.resolve_with(derived, result);
            }
            (ReactionKind::Finally(f), outcome) => {
                self.invoke(f, &[]);
                self.settle(derived, outcome);
            }
            (_, outcome) => self.settle(derived, outcome),
        }
    }
}

impl Host for MockHost {
    type Value = MockValue;
    type Func = MockFunc;

    fn get(&self, name: &str) -> HostResult<MockValue> {
        Ok(self.global(name).unwrap_or(MockValue::Undefined))
    }

    fn set(&self, name: &str, value: &MockValue) -> HostResult<()> {
        self.state
            .borrow_mut()
            .globals
            .insert(name.to_owned(), value.clone());
        Ok(())
    }

    fn wrap(&self, callback: ForeignCallback<MockValue>) -> MockFunc {
        let mut st = self.state.borrow_mut();
        st.funcs.push(callback);
        MockFunc {
            id: st.funcs.len() - 1,
        }
    }

    fn call(&self, func: &MockValue, args: &[MockValue]) -> HostResult<MockValue> {
        match *func {
            MockValue::Func(id) => Ok(self.invoke(id, args)),
            ref other => Err(HostError::type_mismatch(format!("{other:?}"), "function")),
        }
    }

    fn undefined(&self) -> MockValue {
        MockValue::Undefined
    }

    fn is_error(&self, value: &MockValue) -> bool {
        matches!(value, MockValue::Error(_))
    }

    fn rejected(&self, reason: MockValue) -> MockValue {
        MockValue::Promise(self.new_promise(PromiseState::Rejected(reason)))
    }

    fn then(&self, thenable: &MockValue, on_success: MockFunc) -> HostResult<MockValue> {
        self.derive(thenable, ReactionKind::Then(on_success.id))
    }

    fn catch(&self, thenable: &MockValue, on_failure: MockFunc) -> HostResult<MockValue> {
        self.derive(thenable, ReactionKind::Catch(on_failure.id))
    }

    fn finally(&self, thenable: &MockValue, on_finally: MockFunc) -> HostResult<MockValue> {
        self.derive(thenable, ReactionKind::Finally(on_finally.id))
    }
}

fn promise_id(value: &MockValue) -> usize {
    match value {
        MockValue::Promise(id) => *id,
        other => panic!("not a mock promise: {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glue_core::func_of;

    #[test]
    fn then_runs_on_microtask_turn() {
        let host = MockHost::new();
        let p = host.resolved(MockValue::Number(2.0));
        let f = host.wrap(func_of(|args: &[MockValue]| {
            Some(MockValue::Number(args[0].as_number().unwrap_or(0.0) * 10.0))
        }));
        let derived = host.then(&p, f).unwrap();
        assert_eq!(host.state(&derived), PromiseState::Pending);
        host.run_until_idle();
        assert_eq!(host.state(&derived), PromiseState::Fulfilled(MockValue::Number(20.0)));
    }

    #[test]
    fn then_forwards_rejection_and_catch_forwards_fulfilment() {
        let host = MockHost::new();
        let p = host.pending();
        let never = host.wrap(func_of(|_: &[MockValue]| panic!("then on rejected")));
        let t1 = host.then(&p, never).unwrap();
        host.reject(&p, MockValue::error("boom"));
        host.run_until_idle();
        assert_eq!(host.state(&t1), PromiseState::Rejected(MockValue::error("boom")));

        let ok = host.resolved(MockValue::Bool(true));
        let never = host.wrap(func_of(|_: &[MockValue]| panic!("catch on fulfilled")));
        let t2 = host.catch(&ok, never).unwrap();
        host.run_until_idle();
        assert_eq!(host.state(&t2), PromiseState::Fulfilled(MockValue::Bool(true)));
    }

    #[test]
    fn returning_a_promise_adopts_its_state() {
        let host = MockHost::new();
        let inner = host.pending();
        let inner_for_cb = inner.clone();
        let p = host.resolved(MockValue::Null);
        let f = host.wrap(func_of(move |_: &[MockValue]| Some(inner_for_cb.clone())));
        let derived = host.then(&p, f).unwrap();
        host.run_until_idle();
        assert_eq!(host.state(&derived), PromiseState::Pending);
        host.resolve(&inner, MockValue::str("late"));
        host.run_until_idle();
        assert_eq!(host.state(&derived), PromiseState::Fulfilled(MockValue::str("late")));
    }

    #[test]
    fn settling_twice_is_ignored() {
        let host = MockHost::new();
        let p = host.pending();
        host.resolve(&p, MockValue::Number(1.0));
        host.reject(&p, MockValue::error("late"));
        assert_eq!(host.state(&p), PromiseState::Fulfilled(MockValue::Number(1.0)));
    }

    #[test]
    fn adopting_a_promise_locks_in_the_resolution() {
        let host = MockHost::new();
        let outer = host.pending();
        let inner = host.pending();
        host.resolve(&outer, inner.clone());
        host.reject(&outer, MockValue::error("too late"));
        host.resolve(&outer, MockValue::Number(9.0));
        assert_eq!(host.state(&outer), PromiseState::Pending);

        host.resolve(&inner, MockValue::str("adopted"));
        host.run_until_idle();
        assert_eq!(host.state(&outer), PromiseState::Fulfilled(MockValue::str("adopted")));
    }

    #[test]
    fn calling_a_non_function_is_a_type_error() {
        let host = MockHost::new();
        let err = host.call(&MockValue::Number(1.0), &[]).unwrap_err();
        assert!(matches!(err, HostError::Type { expected: "function", .. }));
        assert!(matches!(
            host.call_global("absent", &[]),
            Err(HostError::Missing(_))
        ));
    }
}
