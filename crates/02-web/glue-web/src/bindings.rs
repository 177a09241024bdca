//! Cached references into the host realm.
//!
//! Everything is looked up once in [`HostBindings::from_global`] and then
//! passed to whatever needs host access, so each call site names its
//! dependency on the host instead of reaching for ambient globals.

use glue_core::{ForeignCallback, Host, HostError, HostFunc, HostResult};
use js_sys::{Array, Function, Object, Promise, Reflect, Uint8Array};
use log::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, Location, UrlSearchParams};

use crate::host::{js_err, WebFunc, WebHost};

fn lookup<T: JsCast>(target: &JsValue, name: &str, expected: &'static str) -> HostResult<T> {
    let value = Reflect::get(target, &JsValue::from_str(name)).map_err(js_err)?;
    if value.is_undefined() || value.is_null() {
        return Err(HostError::missing(name));
    }
    value
        .dyn_into::<T>()
        .map_err(|_| HostError::type_mismatch(name, expected))
}

fn function(target: &JsValue, name: &str) -> HostResult<Function> {
    lookup(target, name, "function")
}

/// Global constructors.
#[derive(Clone)]
pub struct Constructors {
    pub array: Function,
    pub error: Function,
    pub object: Function,
    pub string: Function,
    pub text_decoder: Function,
    pub text_encoder: Function,
    pub uint8_array: Function,
    pub url_search_params: Function,
}

/// Free functions and methods, each with the receiver it is called on.
#[derive(Clone)]
struct Methods {
    atob: Function,
    btoa: Function,
    set_interval: Function,
    clear_interval: Function,
    set_timeout: Function,
    clear_timeout: Function,
    fetch: Function,
    parse_int: Function,
    now: (Function, JsValue),
    log: (Function, JsValue),
    get_random_values: (Function, JsValue),
    has_own: (Function, JsValue),
}

/// Which timer queue a [`Timer`] lives on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    Interval,
    Timeout,
}

/// A scheduled timer together with the callback it fires.
///
/// The callback is freed when the timer is cleared or dropped; dropping a
/// live timer without clearing it first makes the next tick throw on the
/// host side, so call [`Timer::forget`] to leave it running indefinitely.
pub struct Timer {
    id: JsValue,
    kind: TimerKind,
    func: WebFunc,
}

impl Timer {
    pub fn id(&self) -> &JsValue {
        &self.id
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    /// Leaves the timer scheduled and hands the callback to the host.
    pub fn forget(self) {
        self.func.forget();
    }
}

/// Explicitly initialised view of the host realm.
#[derive(Clone)]
pub struct HostBindings {
    pub host: WebHost,
    pub ctors: Constructors,
    pub document: Document,
    pub head: HtmlElement,
    pub body: HtmlElement,
    pub location: Location,
    pub crypto: Object,
    pub subtle: Object,
    pub math: Object,
    pub web_assembly: Object,
    pub console: Object,
    /// Query parameters parsed from `location.search`.
    pub params: UrlSearchParams,
    methods: Methods,
}

impl HostBindings {
    /// Resolves every binding against the current global object.
    pub fn from_global() -> HostResult<Self> {
        let host = WebHost::new();
        let global: JsValue = host.global().clone().into();

        let ctors = Constructors {
            array: function(&global, "Array")?,
            error: function(&global, "Error")?,
            object: function(&global, "Object")?,
            string: function(&global, "String")?,
            text_decoder: function(&global, "TextDecoder")?,
            text_encoder: function(&global, "TextEncoder")?,
            uint8_array: function(&global, "Uint8Array")?,
            url_search_params: function(&global, "URLSearchParams")?,
        };

        let document: Document = lookup(&global, "document", "Document")?;
        let head = document.head().ok_or_else(|| HostError::missing("document.head"))?;
        let body = document.body().ok_or_else(|| HostError::missing("document.body"))?;
        let location: Location = lookup(&global, "location", "Location")?;

        let crypto: Object = lookup(&global, "crypto", "object")?;
        let subtle: Object = lookup(&crypto, "subtle", "object")?;
        let math: Object = lookup(&global, "Math", "object")?;
        let web_assembly: Object = lookup(&global, "WebAssembly", "object")?;
        let console: Object = lookup(&global, "console", "object")?;
        let date: JsValue = function(&global, "Date")?.into();

        let search = location.search().map_err(js_err)?;
        let params = UrlSearchParams::new_with_str(&search).map_err(js_err)?;

        let methods = Methods {
            atob: function(&global, "atob")?,
            btoa: function(&global, "btoa")?,
            set_interval: function(&global, "setInterval")?,
            clear_interval: function(&global, "clearInterval")?,
            set_timeout: function(&global, "setTimeout")?,
            clear_timeout: function(&global, "clearTimeout")?,
            fetch: function(&global, "fetch")?,
            parse_int: function(&global, "parseInt")?,
            now: (function(&date, "now")?, date),
            log: (function(&console, "log")?, console.clone().into()),
            get_random_values: (function(&crypto, "getRandomValues")?, crypto.clone().into()),
            has_own: (
                function(&ctors.object, "hasOwn")?,
                ctors.object.clone().into(),
            ),
        };

        debug!("host bindings resolved");
        Ok(Self {
            host,
            ctors,
            document,
            head: head.into(),
            body,
            location,
            crypto,
            subtle,
            math,
            web_assembly,
            console,
            params,
            methods,
        })
    }

    fn global(&self) -> JsValue {
        self.host.global().clone().into()
    }

    pub fn atob(&self, encoded: &str) -> HostResult<String> {
        let out = self
            .methods
            .atob
            .call1(&self.global(), &encoded.into())
            .map_err(js_err)?;
        out.as_string()
            .ok_or_else(|| HostError::type_mismatch("atob result", "string"))
    }

    pub fn btoa(&self, binary: &str) -> HostResult<String> {
        let out = self
            .methods
            .btoa
            .call1(&self.global(), &binary.into())
            .map_err(js_err)?;
        out.as_string()
            .ok_or_else(|| HostError::type_mismatch("btoa result", "string"))
    }

    pub fn set_interval(&self, callback: ForeignCallback<JsValue>, ms: i32) -> HostResult<Timer> {
        self.schedule(TimerKind::Interval, callback, ms)
    }

    pub fn set_timeout(&self, callback: ForeignCallback<JsValue>, ms: i32) -> HostResult<Timer> {
        self.schedule(TimerKind::Timeout, callback, ms)
    }

    /// Cancels a timer of either kind and frees its callback.
    pub fn clear(&self, timer: Timer) -> HostResult<()> {
        match timer.kind {
            TimerKind::Interval => self.clear_interval(&timer.id),
            TimerKind::Timeout => self.clear_timeout(&timer.id),
        }
    }

    pub fn clear_interval(&self, id: &JsValue) -> HostResult<()> {
        self.methods
            .clear_interval
            .call1(&self.global(), id)
            .map_err(js_err)?;
        Ok(())
    }

    pub fn clear_timeout(&self, id: &JsValue) -> HostResult<()> {
        self.methods
            .clear_timeout
            .call1(&self.global(), id)
            .map_err(js_err)?;
        Ok(())
    }

    fn schedule(
        &self,
        kind: TimerKind,
        callback: ForeignCallback<JsValue>,
        ms: i32,
    ) -> HostResult<Timer> {
        let func = self.host.wrap(callback);
        let start = match kind {
            TimerKind::Interval => &self.methods.set_interval,
            TimerKind::Timeout => &self.methods.set_timeout,
        };
        let id = start
            .call2(&self.global(), &func.as_value(), &JsValue::from(ms))
            .map_err(js_err)?;
        Ok(Timer { id, kind, func })
    }

    /// `fetch(input)`; the returned promise resolves to a `Response`.
    pub fn fetch(&self, input: &str) -> HostResult<Promise> {
        self.methods
            .fetch
            .call1(&self.global(), &input.into())
            .map_err(js_err)?
            .dyn_into::<Promise>()
            .map_err(|_| HostError::type_mismatch("fetch result", "Promise"))
    }

    /// Fills `buf` with cryptographically strong random bytes.
    pub fn get_random_values(&self, buf: &mut [u8]) -> HostResult<()> {
        let (f, this) = &self.methods.get_random_values;
        let array = Uint8Array::new_with_length(buf.len() as u32);
        f.call1(this, &array).map_err(js_err)?;
        array.copy_to(buf);
        Ok(())
    }

    /// `console.log(...args)`.
    pub fn log(&self, args: &[JsValue]) -> HostResult<()> {
        let (f, this) = &self.methods.log;
        let args: Array = args.iter().collect();
        f.apply(this, &args).map_err(js_err)?;
        Ok(())
    }

    /// `Date.now()` in milliseconds.
    pub fn now(&self) -> HostResult<f64> {
        let (f, this) = &self.methods.now;
        let out = f.call0(this).map_err(js_err)?;
        out.as_f64()
            .ok_or_else(|| HostError::type_mismatch("Date.now result", "number"))
    }

    /// `parseInt(text, radix)`; `NaN` when the text has no leading digits.
    pub fn parse_int(&self, text: &str, radix: u32) -> HostResult<f64> {
        let out = self
            .methods
            .parse_int
            .call2(&self.global(), &text.into(), &JsValue::from(radix))
            .map_err(js_err)?;
        out.as_f64()
            .ok_or_else(|| HostError::type_mismatch("parseInt result", "number"))
    }

    pub fn is_error(&self, value: &JsValue) -> bool {
        self.host.is_error(value)
    }

    /// `Object.hasOwn(object, key)`.
    pub fn has_own(&self, object: &JsValue, key: &str) -> HostResult<bool> {
        let (f, this) = &self.methods.has_own;
        let out = f.call2(this, object, &key.into()).map_err(js_err)?;
        Ok(out.is_truthy())
    }

    pub fn create_element(&self, tag: &str) -> HostResult<Element> {
        self.document.create_element(tag).map_err(js_err)
    }

    pub fn create_element_ns(&self, namespace: &str, tag: &str) -> HostResult<Element> {
        self.document
            .create_element_ns(Some(namespace), tag)
            .map_err(js_err)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }

    /// Appends `child` as the last child of `<body>`.
    pub fn append_child(&self, child: &Element) -> HostResult<()> {
        self.body.append_child(child).map_err(js_err)?;
        Ok(())
    }

    /// `body.append(child)`; strings are appended as text nodes.
    pub fn append(&self, child: &JsValue) -> HostResult<()> {
        match child.as_string() {
            Some(text) => self.body.append_with_str_1(&text),
            None => self.body.append_with_node_1(child.unchecked_ref()),
        }
        .map_err(js_err)
    }

    /// `body.prepend(child)`; strings are prepended as text nodes.
    pub fn prepend(&self, child: &JsValue) -> HostResult<()> {
        match child.as_string() {
            Some(text) => self.body.prepend_with_str_1(&text),
            None => self.body.prepend_with_node_1(child.unchecked_ref()),
        }
        .map_err(js_err)
    }
}
