//! Streaming WebAssembly instantiation with completion callbacks.

use glue_core::{AsyncChain, HostError, HostResult};
use js_sys::{Array, Function, Object, Promise, Reflect, WebAssembly};
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::bindings::HostBindings;
use crate::host::js_err;

/// Where a module's import object comes from.
#[derive(Clone, Debug)]
pub enum Imports {
    /// A plain import object.
    Object(Object),
    /// A global runtime constructor, e.g. a language's wasm glue class. An
    /// instance is created, its `importObject` is used for instantiation, and
    /// its `run(instance)` method starts the module.
    Runtime(String),
}

/// Configuration for [`load_wasm`].
#[derive(Clone, Debug)]
pub struct LoadOptions {
    pub imports: Imports,
    /// Export invoked after instantiation when no runtime drives the module.
    /// A missing export is skipped.
    pub entry: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            imports: Imports::Object(Object::new()),
            entry: Some("_start".to_string()),
        }
    }
}

impl LoadOptions {
    pub fn runtime(ctor: impl Into<String>) -> Self {
        Self {
            imports: Imports::Runtime(ctor.into()),
            entry: None,
        }
    }
}

fn construct_runtime(b: &HostBindings, ctor: &str) -> HostResult<Object> {
    let ctor = Reflect::get(b.host.global(), &JsValue::from_str(ctor))
        .map_err(js_err)?
        .dyn_into::<Function>()
        .map_err(|_| HostError::type_mismatch(ctor, "constructor"))?;
    Reflect::construct(&ctor, &Array::new())
        .map_err(js_err)?
        .dyn_into::<Object>()
        .map_err(|_| HostError::type_mismatch("runtime instance", "object"))
}

/// Passes `Error` values through and wraps anything else thrown (a string, a
/// number, `undefined`) in an `Error` so that `on_error` sees it.
fn as_error(value: JsValue, context: &str) -> JsValue {
    if value.is_instance_of::<js_sys::Error>() {
        value
    } else {
        js_sys::Error::new(&format!("{context}: {value:?}")).into()
    }
}

fn start(
    instance: &JsValue,
    runtime: Option<&Object>,
    entry: Option<&str>,
) -> Result<(), JsValue> {
    if let Some(runtime) = runtime {
        let run = Reflect::get(runtime, &"run".into())
            .map_err(|err| as_error(err, "reading runtime.run"))?
            .dyn_into::<Function>()
            .map_err(|_| JsValue::from(js_sys::Error::new("runtime has no run method")))?;
        // `run` usually returns a promise that settles when the program exits.
        run.call1(runtime, instance)
            .map_err(|err| as_error(err, "runtime.run threw"))?;
        return Ok(());
    }
    let Some(entry) = entry else { return Ok(()) };
    let exports = Reflect::get(instance, &"exports".into())
        .map_err(|err| as_error(err, "reading instance exports"))?;
    let export = Reflect::get(&exports, &entry.into())
        .map_err(|err| as_error(err, "reading entry export"))?;
    match export.dyn_into::<Function>() {
        Ok(f) => {
            f.call0(&JsValue::UNDEFINED)
                .map_err(|err| as_error(err, &format!("`{entry}` threw")))?;
        }
        Err(_) => debug!("module has no `{entry}` export, not starting it"),
    }
    Ok(())
}

/// Fetches and instantiates the module at `url`, starts it, then calls
/// `then`. Start-up failures always reach `on_error` as `Error` values;
/// instantiation failures reach it when the host classifies them as errors.
///
/// Returns the tail of the continuation chain.
pub fn load_wasm<T, E>(
    b: &HostBindings,
    url: &str,
    options: LoadOptions,
    then: T,
    on_error: E,
) -> HostResult<JsValue>
where
    T: FnOnce() + 'static,
    E: FnOnce(JsValue) + 'static,
{
    let (import_object, runtime) = match &options.imports {
        Imports::Object(object) => (object.clone(), None),
        Imports::Runtime(ctor) => {
            let runtime = construct_runtime(b, ctor)?;
            let imports = Reflect::get(&runtime, &"importObject".into())
                .map_err(js_err)?
                .dyn_into::<Object>()
                .map_err(|_| HostError::type_mismatch("importObject", "object"))?;
            (imports, Some(runtime))
        }
    };

    let response: Promise = b.fetch(url)?;
    let instantiated = WebAssembly::instantiate_streaming(&response, &import_object);
    debug!("instantiating {url}");

    let entry = options.entry;
    let source = url.to_string();
    AsyncChain::new(instantiated.into())
        .then(move |result: JsValue| {
            let started = Reflect::get(&result, &"instance".into())
                .map_err(|err| as_error(err, "reading instantiated module"))
                .and_then(|instance| start(&instance, runtime.as_ref(), entry.as_deref()));
            match started {
                Ok(()) => {
                    then();
                    None
                }
                Err(err) => {
                    warn!("starting {source} failed");
                    Some(Promise::reject(&err).into())
                }
            }
        })
        .catch(on_error)
        .attach(&b.host)
}
