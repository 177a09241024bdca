//! Composing success, failure, and finally continuations onto one thenable.
//!
//! The stages are typestates: [`AsyncChain::then`] yields a [`Chain`], which
//! may gain a failure handler ([`Chain::catch`] -> [`Caught`]), which may gain
//! a finally handler ([`Caught::finally`] -> [`Settled`]). Each stage's
//! `attach` wires everything up and returns the thenable produced by the last
//! attached continuation; the source thenable is never handed back.
//!
//! Each stage hands one callback to the host, which keeps it until the
//! thenable that stage derives has settled. A source that never settles
//! keeps its continuations alive for as long as the host keeps the source.

use std::cell::Cell;

use log::trace;

use crate::callback::{func_of, simple_proc_of, ForeignCallback};
use crate::error::HostResult;
use crate::host::Host;

type OnSuccess<V> = Box<dyn FnOnce(V) -> Option<V>>;
type OnFailure<V> = Box<dyn FnOnce(V)>;
type OnFinally = Box<dyn FnOnce()>;

/// Entry point for building a chain on `source`.
pub struct AsyncChain<V> {
    source: V,
}

impl<V: Clone + 'static> AsyncChain<V> {
    pub fn new(source: V) -> Self {
        Self { source }
    }

    /// Sets the success continuation. Its return value resolves the derived
    /// thenable; returning another thenable flattens per host semantics, and
    /// `None` resolves to the host's "no value".
    pub fn then<F>(self, on_success: F) -> Chain<V>
    where
        F: FnOnce(V) -> Option<V> + 'static,
    {
        Chain {
            source: self.source,
            on_success: Box::new(on_success),
        }
    }
}

/// A chain with only its success continuation.
pub struct Chain<V> {
    source: V,
    on_success: OnSuccess<V>,
}

impl<V: Clone + 'static> Chain<V> {
    /// Adds a failure continuation. It only sees rejection values the host
    /// classifies as errors; any other rejection value passes through
    /// untouched and leaves the derived thenable rejected.
    pub fn catch<F>(self, on_failure: F) -> Caught<V>
    where
        F: FnOnce(V) + 'static,
    {
        Caught {
            chain: self,
            on_failure: Box::new(on_failure),
        }
    }

    /// Attaches the success continuation and returns `source.then(..)`.
    pub fn attach<H>(self, host: &H) -> HostResult<V>
    where
        H: Host<Value = V>,
    {
        trace!("chain: attaching success stage");
        host.then(&self.source, host.wrap(success_callback(self.on_success)))
    }
}

/// A chain with success and failure continuations.
pub struct Caught<V> {
    chain: Chain<V>,
    on_failure: OnFailure<V>,
}

impl<V: Clone + 'static> Caught<V> {
    /// Adds a continuation that runs once the chain settles either way. It
    /// learns nothing about the outcome.
    pub fn finally<F>(self, on_finally: F) -> Settled<V>
    where
        F: FnOnce() + 'static,
    {
        Settled {
            caught: self,
            on_finally: Box::new(on_finally),
        }
    }

    /// Attaches success then failure and returns `source.then(..).catch(..)`.
    pub fn attach<H>(self, host: &H) -> HostResult<V>
    where
        H: Host<Value = V> + Clone + 'static,
    {
        let succeeded = self.chain.attach(host)?;
        trace!("chain: attaching failure stage");
        host.catch(
            &succeeded,
            host.wrap(failure_callback(host.clone(), self.on_failure)),
        )
    }
}

/// A chain with all three continuations.
pub struct Settled<V> {
    caught: Caught<V>,
    on_finally: OnFinally,
}

impl<V: Clone + 'static> Settled<V> {
    /// Attaches all three stages in order and returns the thenable produced
    /// by `finally`.
    pub fn attach<H>(self, host: &H) -> HostResult<V>
    where
        H: Host<Value = V> + Clone + 'static,
    {
        let caught = self.caught.attach(host)?;
        trace!("chain: attaching finally stage");
        host.finally(&caught, host.wrap(finally_callback(self.on_finally)))
    }
}

fn success_callback<V: Clone + 'static>(on_success: OnSuccess<V>) -> ForeignCallback<V> {
    let slot = Cell::new(Some(on_success));
    func_of(move |args: &[V]| {
        let value = args[0].clone();
        slot.take().and_then(|f| f(value))
    })
}

fn failure_callback<H>(host: H, on_failure: OnFailure<H::Value>) -> ForeignCallback<H::Value>
where
    H: Host + 'static,
{
    let slot = Cell::new(Some(on_failure));
    func_of(move |args: &[H::Value]| {
        let reason = args[0].clone();
        if !host.is_error(&reason) {
            trace!("chain: rejection value is not an error, skipping failure handler");
            return Some(host.rejected(reason));
        }
        if let Some(f) = slot.take() {
            f(reason);
        }
        None
    })
}

fn finally_callback<V: 'static>(on_finally: OnFinally) -> ForeignCallback<V> {
    let slot = Cell::new(Some(on_finally));
    simple_proc_of(move || {
        if let Some(f) = slot.take() {
            f();
        }
    })
}
