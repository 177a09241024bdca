//! The narrow surface a host runtime exposes to guest code.

use std::fmt;

use crate::callback::ForeignCallback;
use crate::error::HostResult;

/// A host-owned function value built from a [`ForeignCallback`].
pub trait HostFunc<V> {
    /// The value the host sees when this function is stored or passed.
    fn as_value(&self) -> V;

    /// Gives up the guest-side handle and lets the host keep the function
    /// alive for as long as it is referenced there.
    fn forget(self);
}

/// Host runtime access: global namespace, callback wrapping, and thenables.
///
/// Implementations are single-threaded; nothing here is expected to be `Send`.
pub trait Host {
    type Value: Clone + fmt::Debug + 'static;
    type Func: HostFunc<Self::Value>;

    /// Reads `name` from the host global namespace.
    fn get(&self, name: &str) -> HostResult<Self::Value>;

    /// Writes `name` into the host global namespace. Last write wins.
    fn set(&self, name: &str, value: &Self::Value) -> HostResult<()>;

    /// Turns a guest callback into a host-callable function value.
    fn wrap(&self, callback: ForeignCallback<Self::Value>) -> Self::Func;

    /// Calls a host function value with `args`.
    fn call(&self, func: &Self::Value, args: &[Self::Value]) -> HostResult<Self::Value>;

    /// The host's "no value".
    fn undefined(&self) -> Self::Value;

    /// Error-classification predicate applied to rejection values.
    fn is_error(&self, value: &Self::Value) -> bool;

    /// A thenable already rejected with `reason`.
    fn rejected(&self, reason: Self::Value) -> Self::Value;

    /// Attaches a success continuation and returns the derived thenable.
    fn then(&self, thenable: &Self::Value, on_success: Self::Func) -> HostResult<Self::Value>;

    /// Attaches a failure continuation and returns the derived thenable.
    fn catch(&self, thenable: &Self::Value, on_failure: Self::Func) -> HostResult<Self::Value>;

    /// Attaches a settle continuation and returns the derived thenable.
    fn finally(&self, thenable: &Self::Value, on_finally: Self::Func)
        -> HostResult<Self::Value>;
}
