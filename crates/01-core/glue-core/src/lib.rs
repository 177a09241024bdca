//! Host-agnostic glue between guest closures and a callback-driven host
//! runtime: the callback adapter, the thenable chain composer, global
//! function registration, and FNV-1a hashing.

#![allow(missing_docs)]

pub mod callback;
pub mod chain;
mod error;
pub mod global;
pub mod hash;
pub mod host;

pub use callback::{
    func_of, proc_of, simple_func_of, simple_proc_of, Arity, ForeignCallback, HostCallable,
    ReturnMode,
};
pub use chain::{AsyncChain, Caught, Chain, Settled};
pub use error::{HostError, HostResult};
pub use global::{expose, set_func, set_proc, set_simple_func, set_simple_proc};
pub use hash::{fnv1a32, fnv1a64, Fnv1a32, Fnv1a64};
pub use host::{Host, HostFunc};
