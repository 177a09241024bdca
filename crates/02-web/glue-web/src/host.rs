//! [`Host`] over the browser's JavaScript realm.

use std::cell::Cell;

use glue_core::{ForeignCallback, Host, HostError, HostFunc, HostResult};
use js_sys::{Array, Function, Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen(inline_js = "export function variadic(f) { return function (...args) { return f(args); }; }")]
extern "C" {
    /// Spreads a JS call's arguments into one array for a single-argument closure.
    fn variadic(f: &Function) -> Function;
}

#[wasm_bindgen]
extern "C" {
    /// Anything with promise-style continuation methods.
    type Thenable;

    #[wasm_bindgen(method, catch, js_name = then)]
    fn attach_then(this: &Thenable, on_success: &Function) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = then)]
    fn attach_settled(
        this: &Thenable,
        on_fulfilled: &Function,
        on_rejected: &Function,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = catch)]
    fn attach_catch(this: &Thenable, on_failure: &Function) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = finally)]
    fn attach_finally(this: &Thenable, on_finally: &Function) -> Result<JsValue, JsValue>;
}

/// Converts a thrown JS value into a [`HostError`].
pub(crate) fn js_err(err: JsValue) -> HostError {
    let msg = err
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{err:?}"));
    HostError::host(msg)
}

thread_local! {
    static LIVE: Cell<usize> = const { Cell::new(0) };
}

/// A guest callback as a JS function.
///
/// The closure is freed when this handle drops; a host that calls the
/// function afterwards gets a JS exception. Hand the handle to an owner that
/// lives as long as the host may call it, or [`HostFunc::forget`] it.
pub struct WebFunc {
    // `Fn` so JS may call back in while the closure is already running.
    closure: Option<Closure<dyn Fn(Array) -> JsValue>>,
    function: Function,
}

impl WebFunc {
    pub fn new(callback: ForeignCallback<JsValue>) -> Self {
        let closure = Closure::wrap(Box::new(move |args: Array| {
            let args: Vec<JsValue> = args.iter().collect();
            callback.invoke(&args).unwrap_or(JsValue::UNDEFINED)
        }) as Box<dyn Fn(Array) -> JsValue>);
        let function = variadic(closure.as_ref().unchecked_ref());
        LIVE.with(|live| live.set(live.get() + 1));
        Self {
            closure: Some(closure),
            function,
        }
    }

    pub fn function(&self) -> &Function {
        &self.function
    }

    /// Closures currently owned by `WebFunc` handles on this thread, i.e.
    /// neither dropped nor forgotten.
    pub fn live() -> usize {
        LIVE.with(Cell::get)
    }

    fn release(&mut self) -> Option<Closure<dyn Fn(Array) -> JsValue>> {
        let closure = self.closure.take();
        if closure.is_some() {
            LIVE.with(|live| live.set(live.get() - 1));
        }
        closure
    }
}

impl Drop for WebFunc {
    fn drop(&mut self) {
        drop(self.release());
    }
}

impl HostFunc<JsValue> for WebFunc {
    fn as_value(&self) -> JsValue {
        self.function.clone().into()
    }

    fn forget(mut self) {
        if let Some(closure) = self.release() {
            closure.forget();
        }
    }
}

/// The current JS realm seen through its global object.
#[derive(Clone)]
pub struct WebHost {
    global: Object,
    is_error: Option<Function>,
}

impl WebHost {
    pub fn new() -> Self {
        let global = js_sys::global();
        // `Error.isError` is recent; fall back to `instanceof Error` without it.
        let is_error = Reflect::get(&global, &"Error".into())
            .and_then(|ctor| Reflect::get(&ctor, &"isError".into()))
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok());
        Self { global, is_error }
    }

    pub fn global(&self) -> &Object {
        &self.global
    }

    fn thenable(value: &JsValue) -> HostResult<&Thenable> {
        if value.is_object() {
            Ok(value.unchecked_ref::<Thenable>())
        } else {
            Err(HostError::type_mismatch(format!("{value:?}"), "thenable"))
        }
    }

    /// Keeps `stage` alive until `derived` settles, then frees it. By then
    /// the stage has either run or can no longer run.
    fn release_on_settle(derived: &JsValue, stage: WebFunc) -> HostResult<()> {
        let cleanup = Closure::once_into_js(move |_: JsValue| drop(stage));
        let cleanup: &Function = cleanup.unchecked_ref();
        // Both arms handle the outcome, so this side chain never rejects.
        Self::thenable(derived)?
            .attach_settled(cleanup, cleanup)
            .map_err(js_err)?;
        Ok(())
    }
}

impl Default for WebHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for WebHost {
    type Value = JsValue;
    type Func = WebFunc;

    fn get(&self, name: &str) -> HostResult<JsValue> {
        Reflect::get(&self.global, &JsValue::from_str(name)).map_err(js_err)
    }

    fn set(&self, name: &str, value: &JsValue) -> HostResult<()> {
        Reflect::set(&self.global, &JsValue::from_str(name), value).map_err(js_err)?;
        Ok(())
    }

    fn wrap(&self, callback: ForeignCallback<JsValue>) -> WebFunc {
        WebFunc::new(callback)
    }

    fn call(&self, func: &JsValue, args: &[JsValue]) -> HostResult<JsValue> {
        let func = func
            .dyn_ref::<Function>()
            .ok_or_else(|| HostError::type_mismatch(format!("{func:?}"), "function"))?;
        let args: Array = args.iter().collect();
        func.apply(&JsValue::UNDEFINED, &args).map_err(js_err)
    }

    fn undefined(&self) -> JsValue {
        JsValue::UNDEFINED
    }

    fn is_error(&self, value: &JsValue) -> bool {
        match &self.is_error {
            Some(predicate) => predicate
                .call1(&JsValue::UNDEFINED, value)
                .map(|v| v.is_truthy())
                .unwrap_or(false),
            None => value.is_instance_of::<js_sys::Error>(),
        }
    }

    fn rejected(&self, reason: JsValue) -> JsValue {
        Promise::reject(&reason).into()
    }

    fn then(&self, thenable: &JsValue, on_success: WebFunc) -> HostResult<JsValue> {
        let next = Self::thenable(thenable)?
            .attach_then(on_success.function())
            .map_err(js_err)?;
        Self::release_on_settle(&next, on_success)?;
        Ok(next)
    }

    fn catch(&self, thenable: &JsValue, on_failure: WebFunc) -> HostResult<JsValue> {
        let next = Self::thenable(thenable)?
            .attach_catch(on_failure.function())
            .map_err(js_err)?;
        Self::release_on_settle(&next, on_failure)?;
        Ok(next)
    }

    fn finally(&self, thenable: &JsValue, on_finally: WebFunc) -> HostResult<JsValue> {
        let next = Self::thenable(thenable)?
            .attach_finally(on_finally.function())
            .map_err(js_err)?;
        Self::release_on_settle(&next, on_finally)?;
        Ok(next)
    }
}
