//! Small DOM constructors that come with an event callback attached.

use glue_core::{proc_of, simple_proc_of, Host, HostError, HostFunc, HostResult};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Event, HtmlElement, HtmlScriptElement};

use crate::bindings::HostBindings;
use crate::host::{js_err, WebFunc};

/// An element plus the handler installed on it.
///
/// The handler stays callable while this value is alive. Use
/// [`Widget::into_element`] once the element should own the handler for the
/// rest of the page's life.
pub struct Widget<E> {
    element: E,
    handler: WebFunc,
}

impl<E> Widget<E> {
    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn into_element(self) -> E {
        self.handler.forget();
        self.element
    }
}

/// Appends `<script src async>` to `<head>` and runs `onload` once the
/// script has loaded.
pub fn load_js<F>(b: &HostBindings, src: &str, onload: F) -> HostResult<Widget<HtmlScriptElement>>
where
    F: Fn() + 'static,
{
    let script: HtmlScriptElement = b
        .create_element("script")?
        .dyn_into()
        .map_err(|_| HostError::type_mismatch("script", "HtmlScriptElement"))?;
    let handler = b.host.wrap(simple_proc_of(onload));
    script.set_src(src);
    script.set_onload(Some(handler.function()));
    script.set_async(true);
    b.head.append_child(&script).map_err(js_err)?;
    log::debug!("loading script {src}");
    Ok(Widget {
        element: script,
        handler,
    })
}

/// A `<button>` labelled `label`. Clicking it suppresses the default action
/// and runs `onclick`.
///
/// The button is not inserted anywhere; see [`HostBindings::append_child`].
pub fn create_button<F>(b: &HostBindings, label: &str, onclick: F) -> HostResult<Widget<HtmlElement>>
where
    F: Fn() + 'static,
{
    let button: HtmlElement = b
        .create_element("button")?
        .dyn_into()
        .map_err(|_| HostError::type_mismatch("button", "HtmlElement"))?;
    button.set_text_content(Some(label));
    let handler = b.host.wrap(proc_of(move |args: &[JsValue]| {
        if let Some(event) = args[0].dyn_ref::<Event>() {
            event.prevent_default();
        }
        onclick();
    }));
    button.set_onclick(Some(handler.function()));
    Ok(Widget {
        element: button,
        handler,
    })
}

impl<E: AsRef<web_sys::Element>> Widget<E> {
    /// Appends the element to `<body>` and hands it its handler.
    pub fn mount(self, b: &HostBindings) -> HostResult<E> {
        b.append_child(self.element.as_ref())?;
        Ok(self.into_element())
    }
}
