//! The loadable-module ABI.
//!
//! A component module is a `cdylib` exporting one factory function that
//! returns a freshly boxed component. The host looks for `build_<type>`
//! first and falls back to a generic `build`.
//!
//! Host and module exchange `Box<dyn Component>` values, so both must be
//! built by the same compiler against the same version of this crate.

use crate::component::Component;

/// Signature of a module's factory function.
///
/// The returned pointer owns a `Box<dyn Component>` and is reclaimed with
/// [`Box::from_raw`]. Null means the module declined to build.
pub type EntryPoint = unsafe extern "C" fn() -> *mut Box<dyn Component>;

/// Name of the generic factory symbol.
pub const GENERIC_ENTRY: &str = "build";

/// Name of the type-specific factory symbol for `kind`.
#[must_use]
pub fn entry_symbol(kind: &str) -> String {
    format!("{GENERIC_ENTRY}_{kind}")
}

/// Hands a component across the module boundary.
#[must_use]
pub fn into_raw(component: Box<dyn Component>) -> *mut Box<dyn Component> {
    Box::into_raw(Box::new(component))
}

/// Calls a factory and takes ownership of its result.
///
/// # Safety
///
/// `entry` must come from a module built against this crate that is still
/// loaded, and must follow the [`EntryPoint`] contract.
pub unsafe fn build_from(entry: EntryPoint) -> Option<Box<dyn Component>> {
    // SAFETY: guaranteed by the caller.
    let raw = unsafe { entry() };
    if raw.is_null() {
        return None;
    }
    // SAFETY: non-null results were produced by `into_raw`.
    Some(*unsafe { Box::from_raw(raw) })
}

/// Exports a component factory from a module.
///
/// ```rust,ignore
/// // exports `build_helloperson`
/// engine_component::export_component!(build_helloperson = HelloPerson::default);
///
/// // exports the generic `build`
/// engine_component::export_component!(HelloPerson::default);
/// ```
#[macro_export]
macro_rules! export_component {
    ($symbol:ident = $ctor:expr) => {
        #[unsafe(no_mangle)]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn $symbol() -> *mut ::std::boxed::Box<dyn $crate::Component> {
            $crate::plugin::into_raw(::std::boxed::Box::new($ctor()))
        }
    };
    ($ctor:expr) => {
        $crate::export_component!(build = $ctor);
    };
}
