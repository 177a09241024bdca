//! Installing guest callbacks under names in the host global namespace.

use log::debug;

use crate::callback::{func_of, proc_of, simple_func_of, simple_proc_of, ForeignCallback};
use crate::error::HostResult;
use crate::host::{Host, HostFunc};

/// Installs `callback` as the global `name`, replacing whatever was there.
///
/// The returned function is the caller's handle; dropping it is host
/// specific (see [`HostFunc::forget`]).
pub fn expose<H: Host>(
    host: &H,
    name: &str,
    callback: ForeignCallback<H::Value>,
) -> HostResult<H::Func> {
    let func = host.wrap(callback);
    host.set(name, &func.as_value())?;
    debug!("exposed global function `{name}`");
    Ok(func)
}

pub fn set_func<H, F>(host: &H, name: &str, f: F) -> HostResult<H::Func>
where
    H: Host,
    F: Fn(&[H::Value]) -> Option<H::Value> + 'static,
{
    expose(host, name, func_of(f))
}

pub fn set_simple_func<H, F>(host: &H, name: &str, f: F) -> HostResult<H::Func>
where
    H: Host,
    F: Fn() -> Option<H::Value> + 'static,
{
    expose(host, name, simple_func_of(f))
}

pub fn set_proc<H, F>(host: &H, name: &str, f: F) -> HostResult<H::Func>
where
    H: Host,
    F: Fn(&[H::Value]) + 'static,
{
    expose(host, name, proc_of(f))
}

pub fn set_simple_proc<H, F>(host: &H, name: &str, f: F) -> HostResult<H::Func>
where
    H: Host,
    F: Fn() + 'static,
{
    expose(host, name, simple_proc_of(f))
}
