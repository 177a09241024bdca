//! Guest closures presented to the host as callable values.
//!
//! Every shape funnels through [`func_of`]: a closure that receives the
//! host's argument list and may hand a value back. The other constructors
//! are projections over it, so a host only ever has to wrap one closure type.

use std::fmt;
use std::rc::Rc;

/// The single capability a host needs from a guest callback.
///
/// `invoke` takes `&self` so the host may call back in while a previous
/// invocation is still on the stack; callbacks keep their own state in
/// `Cell`/`RefCell`.
pub trait HostCallable<V> {
    /// Runs the callback with the host-provided argument list. `None` is
    /// reported to the host as "no value" (`undefined` in a browser).
    fn invoke(&self, args: &[V]) -> Option<V>;
}

impl<V, F> HostCallable<V> for F
where
    F: Fn(&[V]) -> Option<V>,
{
    fn invoke(&self, args: &[V]) -> Option<V> {
        self(args)
    }
}

/// Whether the guest function looks at the host's arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Arity {
    None,
    Args,
}

/// Whether the guest function produces a host-visible value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnMode {
    Value,
    Void,
}

/// Cloneable handle to a guest callback.
///
/// Clones share the same closure, so a host may hold one clone while the
/// installer keeps another. The closure lives until the last clone drops.
pub struct ForeignCallback<V> {
    inner: Rc<dyn HostCallable<V>>,
    arity: Arity,
    mode: ReturnMode,
}

impl<V> ForeignCallback<V> {
    /// Invokes the guest closure exactly as the host would. Nested calls,
    /// including the callback reaching itself through the host, are allowed.
    ///
    /// # Panics
    ///
    /// Panics if the guest closure panics, for example by indexing past the
    /// end of `args`.
    pub fn invoke(&self, args: &[V]) -> Option<V> {
        self.inner.invoke(args)
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn mode(&self) -> ReturnMode {
        self.mode
    }

    fn with_shape(mut self, arity: Arity, mode: ReturnMode) -> Self {
        self.arity = arity;
        self.mode = mode;
        self
    }
}

impl<V> Clone for ForeignCallback<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
            arity: self.arity,
            mode: self.mode,
        }
    }
}

impl<V> fmt::Debug for ForeignCallback<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignCallback")
            .field("arity", &self.arity)
            .field("mode", &self.mode)
            .field("refs", &Rc::strong_count(&self.inner))
            .finish()
    }
}

/// Wraps a value-producing guest function that takes the host argument list.
///
/// No padding is applied: a closure that reads `args[n]` when the host
/// supplied fewer arguments panics.
pub fn func_of<V, F>(f: F) -> ForeignCallback<V>
where
    V: 'static,
    F: Fn(&[V]) -> Option<V> + 'static,
{
    ForeignCallback {
        inner: Rc::new(f),
        arity: Arity::Args,
        mode: ReturnMode::Value,
    }
}

/// Wraps a value-producing guest function that ignores host arguments.
pub fn simple_func_of<V, F>(f: F) -> ForeignCallback<V>
where
    V: 'static,
    F: Fn() -> Option<V> + 'static,
{
    func_of(move |_: &[V]| f()).with_shape(Arity::None, ReturnMode::Value)
}

/// Wraps a side-effect-only guest function that takes the host argument list.
pub fn proc_of<V, F>(f: F) -> ForeignCallback<V>
where
    V: 'static,
    F: Fn(&[V]) + 'static,
{
    func_of(move |args: &[V]| {
        f(args);
        None
    })
    .with_shape(Arity::Args, ReturnMode::Void)
}

/// Wraps a side-effect-only guest function that ignores host arguments.
pub fn simple_proc_of<V, F>(f: F) -> ForeignCallback<V>
where
    V: 'static,
    F: Fn() + 'static,
{
    proc_of(move |_: &[V]| f()).with_shape(Arity::None, ReturnMode::Void)
}
