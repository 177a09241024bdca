//! Functions exported to JavaScript.

use glue_core::{Fnv1a32, Fnv1a64};
use wasm_bindgen::prelude::*;

/// Installs the panic hook and routes `log` records to the console.
/// Safe to call more than once.
#[wasm_bindgen(js_name = glueInit)]
pub fn init() {
    console_error_panic_hook::set_once();
    // A second call finds the logger already set; that is fine.
    let _ = console_log::init_with_level(log::Level::Debug);
}

/// 32-bit FNV-1a of `data` as four big-endian bytes.
#[wasm_bindgen(js_name = fnv1a32)]
pub fn fnv1a32_bytes(data: &[u8]) -> Vec<u8> {
    let mut hasher = Fnv1a32::default();
    hasher.update(data);
    hasher.digest().to_vec()
}

/// 64-bit FNV-1a of `data` as eight big-endian bytes.
#[wasm_bindgen(js_name = fnv1a64)]
pub fn fnv1a64_bytes(data: &[u8]) -> Vec<u8> {
    let mut hasher = Fnv1a64::default();
    hasher.update(data);
    hasher.digest().to_vec()
}
