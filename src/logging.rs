//! Console logging.
//!
//! Routed to the browser console on wasm32; silent on native targets so the
//! engine can be tested without a JS host.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

/// Debug-level message, e.g. `debug("[ScanScheduler] burst scheduled")`
pub fn debug(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::debug_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

/// Warning-level message for recoverable oddities (bad snapshot data etc.)
pub fn warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}
