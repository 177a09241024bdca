//! Browser bindings for guest Rust compiled to wasm32.
//!
//! This crate provides:
//! - [`WebHost`], the `glue_core::Host` implementation over the JS realm
//! - [`HostBindings`], cached constructors, DOM roots, namespaces and methods
//! - widget helpers, the streaming module loader and SHA digests
//!
//! Everything here is wasm32-only; on other targets the crate is empty.

#![allow(missing_docs)]

pub use glue_core;

#[cfg(target_arch = "wasm32")]
mod bindings;
#[cfg(target_arch = "wasm32")]
mod digest;
#[cfg(target_arch = "wasm32")]
mod exports;
#[cfg(target_arch = "wasm32")]
mod host;
#[cfg(target_arch = "wasm32")]
mod loader;
#[cfg(target_arch = "wasm32")]
mod widgets;

#[cfg(target_arch = "wasm32")]
pub use bindings::{Constructors, HostBindings, Timer, TimerKind};
#[cfg(target_arch = "wasm32")]
pub use digest::{digest, digest_bytes, DigestAlgorithm};
#[cfg(target_arch = "wasm32")]
pub use exports::{fnv1a32_bytes, fnv1a64_bytes, init};
#[cfg(target_arch = "wasm32")]
pub use host::{WebFunc, WebHost};
#[cfg(target_arch = "wasm32")]
pub use loader::{load_wasm, Imports, LoadOptions};
#[cfg(target_arch = "wasm32")]
pub use widgets::{create_button, load_js, Widget};
