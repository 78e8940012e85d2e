//! Browser runtime integration
//!
//! Bridges the poller and submitter to the browser's event loop:
//! - `setInterval` starts one poll cycle per tick
//! - the form's `submit` event drives the submitter
//!
//! Every cycle and submission runs as its own `spawn_local` future. A slow
//! request never holds up the timer; overlapping cycles are sorted out by
//! the reconciler's snapshot numbering.

use crate::api::HttpBackend;
use crate::error::{ClientError, ClientResult};
use crate::poller::Poller;
use crate::reconcile::Reconciler;
use crate::submit::Submitter;
use crate::view::DomView;
use crate::console_log;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlFormElement;

pub type BrowserPoller = Poller<HttpBackend, DomView>;
pub type BrowserSubmitter = Submitter<HttpBackend, DomView>;

/// Callbacks handed to the browser, kept alive while the runtime runs
struct RuntimeState {
    /// `setInterval` handle and its callback
    interval: Option<(i32, Closure<dyn FnMut()>)>,
    /// Form and its submit listener
    submit: Option<(HtmlFormElement, Closure<dyn FnMut(web_sys::Event)>)>,
    /// Owner of the task elements, detached on stop
    reconciler: Option<Rc<RefCell<Reconciler<DomView>>>>,
    running: bool,
}

thread_local! {
    static STATE: RefCell<RuntimeState> = RefCell::new(RuntimeState {
        interval: None,
        submit: None,
        reconciler: None,
        running: false,
    });
}

/// Start polling and listening for submissions
pub fn start(
    poller: BrowserPoller,
    submitter: BrowserSubmitter,
    form: HtmlFormElement,
    interval_ms: u32,
) -> ClientResult<()> {
    let already_running = STATE.with(|state| state.borrow().running);
    if already_running {
        console_log!("[runtime] Already running");
        return Ok(());
    }

    let window = web_sys::window().ok_or_else(|| ClientError::Unavailable("window".into()))?;

    console_log!("[runtime] Polling every {} ms", interval_ms);

    // Initial cycle, so the list shows before the first tick
    spawn_cycle(&poller);

    let tick = {
        let poller = poller.clone();
        Closure::wrap(Box::new(move || spawn_cycle(&poller)) as Box<dyn FnMut()>)
    };
    let timeout = i32::try_from(interval_ms).unwrap_or(i32::MAX);
    let handle = window
        .set_interval_with_callback_and_timeout_and_arguments_0(
            tick.as_ref().unchecked_ref(),
            timeout,
        )
        .map_err(|e| ClientError::Unavailable(format!("setInterval: {:?}", e)))?;

    let on_submit = Closure::wrap(Box::new(move |event: web_sys::Event| {
        event.prevent_default();
        let submitter = submitter.clone();
        spawn_local(async move {
            submitter.submit().await;
        });
    }) as Box<dyn FnMut(_)>);

    if let Err(e) =
        form.add_event_listener_with_callback("submit", on_submit.as_ref().unchecked_ref())
    {
        window.clear_interval_with_handle(handle);
        return Err(ClientError::Unavailable(format!(
            "submit listener: {:?}",
            e
        )));
    }

    STATE.with(|state| {
        let mut state = state.borrow_mut();
        state.interval = Some((handle, tick));
        state.submit = Some((form, on_submit));
        state.reconciler = Some(Rc::clone(poller.reconciler()));
        state.running = true;
    });

    Ok(())
}

/// Stop the timer, detach the form listener and take the task elements off
/// the page. In-flight requests are left to finish; their snapshots are
/// ignored.
pub fn stop() {
    let (interval, submit, reconciler) = STATE.with(|state| {
        let mut state = state.borrow_mut();
        state.running = false;
        (
            state.interval.take(),
            state.submit.take(),
            state.reconciler.take(),
        )
    });

    if let (Some(window), Some((handle, _tick))) = (web_sys::window(), interval) {
        window.clear_interval_with_handle(handle);
    }
    if let Some((form, on_submit)) = submit {
        let _ = form
            .remove_event_listener_with_callback("submit", on_submit.as_ref().unchecked_ref());
    }

    if let Some(reconciler) = reconciler {
        let removed = reconciler.borrow_mut().detach();
        console_log!("[runtime] Stopped, cleared {} elements", removed);
    } else {
        console_log!("[runtime] Stopped");
    }
}

fn spawn_cycle(poller: &BrowserPoller) {
    let poller = poller.clone();
    spawn_local(async move {
        poller.poll_once().await;
    });
}
