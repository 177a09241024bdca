//! SHA digests through `crypto.subtle.digest`.

use glue_core::{AsyncChain, HostError, HostResult};
use js_sys::{Function, Promise, Reflect, Uint8Array};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::bindings::HostBindings;
use crate::host::js_err;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// Algorithm identifier understood by `SubtleCrypto`.
    pub fn name(self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "SHA-1",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha384 => "SHA-384",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }

    pub fn output_len(self) -> usize {
        match self {
            DigestAlgorithm::Sha1 => 20,
            DigestAlgorithm::Sha256 => 32,
            DigestAlgorithm::Sha384 => 48,
            DigestAlgorithm::Sha512 => 64,
        }
    }
}

fn start_digest(
    b: &HostBindings,
    algorithm: DigestAlgorithm,
    data: &[u8],
) -> HostResult<Promise> {
    let digest = Reflect::get(&b.subtle, &"digest".into())
        .map_err(js_err)?
        .dyn_into::<Function>()
        .map_err(|_| HostError::type_mismatch("crypto.subtle.digest", "function"))?;
    let bytes = Uint8Array::from(data);
    digest
        .call2(&b.subtle, &algorithm.name().into(), &bytes)
        .map_err(js_err)?
        .dyn_into::<Promise>()
        .map_err(|_| HostError::type_mismatch("digest result", "Promise"))
}

/// Hashes `data` and hands the digest bytes to `on_digest`. Rejections the
/// host classifies as errors go to `on_error`.
pub fn digest<F, E>(
    b: &HostBindings,
    algorithm: DigestAlgorithm,
    data: &[u8],
    on_digest: F,
    on_error: E,
) -> HostResult<JsValue>
where
    F: FnOnce(Vec<u8>) + 'static,
    E: FnOnce(JsValue) + 'static,
{
    let pending = start_digest(b, algorithm, data)?;
    AsyncChain::new(pending.into())
        .then(move |buffer: JsValue| {
            on_digest(Uint8Array::new(&buffer).to_vec());
            None
        })
        .catch(on_error)
        .attach(&b.host)
}

/// Awaitable form of [`digest`].
pub async fn digest_bytes(
    b: &HostBindings,
    algorithm: DigestAlgorithm,
    data: &[u8],
) -> Result<Vec<u8>, JsValue> {
    let pending =
        start_digest(b, algorithm, data).map_err(|err| JsValue::from_str(&err.to_string()))?;
    let buffer = JsFuture::from(pending).await?;
    Ok(Uint8Array::new(&buffer).to_vec())
}
