//! calcboard - live task board for a distributed expression calculator
//!
//! Runs in the browser as WASM. Polls the backend for the task list, keeps
//! the rendered list in line with it, and submits new expressions.
//!
//! - `reconcile`: the diff engine between fetched tasks and the page
//! - `poller`: one fetch-and-reconcile cycle per timer tick
//! - `submit`: the expression form
//! - `view`: the page boundary (DOM in the browser, in-memory elsewhere)
//!
//! Everything except the DOM view and the runtime wiring also builds
//! natively, which is how the test suite runs.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

pub mod api;
pub mod config;
pub mod error;
pub mod net;
pub mod poller;
pub mod reconcile;
pub mod session;
pub mod submit;
pub mod task;
pub mod view;

#[cfg(target_arch = "wasm32")]
mod boot;

#[cfg(target_arch = "wasm32")]
pub mod runtime;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use reconcile::{ApplyOutcome, ReconcileStats, Reconciler};
pub use task::{Task, TaskId, TaskStatus};

/// Initialize panic hook for better error messages in browser console
#[cfg(target_arch = "wasm32")]
fn init_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WASM entry point. Boots with the page's embedded config, if any.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn main() {
    init_panic_hook();
    boot::boot(boot::page_config());
}

/// Stop polling and detach the form handler
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn stop() {
    runtime::stop();
}

/// Start the board with a JSON config (any subset of `ClientConfig`),
/// replacing a running one
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start_with_config(json: &str) -> Result<(), JsValue> {
    let config = ClientConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    runtime::stop();
    boot::boot(config);
    Ok(())
}

#[doc(hidden)]
#[cfg(target_arch = "wasm32")]
pub fn __log(s: &str) {
    web_sys::console::log_1(&s.into());
}

#[doc(hidden)]
#[cfg(target_arch = "wasm32")]
pub fn __error(s: &str) {
    web_sys::console::error_1(&s.into());
}

#[doc(hidden)]
#[cfg(not(target_arch = "wasm32"))]
pub fn __log(s: &str) {
    eprintln!("{}", s);
}

#[doc(hidden)]
#[cfg(not(target_arch = "wasm32"))]
pub fn __error(s: &str) {
    eprintln!("{}", s);
}

/// Log to the browser console (stderr when native)
#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => {
        $crate::__log(&format!($($t)*))
    };
}

/// Log an error to the browser console (stderr when native)
#[macro_export]
macro_rules! console_error {
    ($($t:tt)*) => {
        $crate::__error(&format!($($t)*))
    };
}
