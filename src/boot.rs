//! Boot sequence
//!
//! Finds the page elements, builds the component graph, and hands it to the
//! runtime. Components receive explicit handles; nothing below this module
//! looks anything up in the document.

use crate::api::HttpBackend;
use crate::config::{CONFIG_ELEMENT_ID, ClientConfig};
use crate::error::{ClientError, ClientResult};
use crate::poller::Poller;
use crate::reconcile::Reconciler;
use crate::runtime;
use crate::session;
use crate::submit::{RandomIds, Submitter};
use crate::view::{DomView, LocationNavigator};
use crate::{console_error, console_log};
use std::cell::RefCell;
use std::rc::Rc;

/// Config embedded in the page, or defaults
pub fn page_config() -> ClientConfig {
    let embedded = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id(CONFIG_ELEMENT_ID))
        .and_then(|el| el.text_content());

    match embedded {
        None => ClientConfig::default(),
        Some(json) => ClientConfig::from_json(&json).unwrap_or_else(|e| {
            console_error!("[boot] Ignoring page config: {}", e);
            ClientConfig::default()
        }),
    }
}

/// Boot the board
pub fn boot(config: ClientConfig) {
    if let Err(e) = try_boot(config) {
        console_error!("[boot] Failed: {}", e);
    }
}

fn try_boot(config: ClientConfig) -> ClientResult<()> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| ClientError::Unavailable("document".into()))?;

    let view = DomView::from_document(document, &config)?;
    let form = view
        .input()
        .form()
        .ok_or_else(|| ClientError::Unavailable(format!("form around #{}", config.input_id)))?;

    let backend = Rc::new(HttpBackend::new(&config));
    let reconciler = Rc::new(RefCell::new(Reconciler::new(
        view.clone(),
        config.labels.clone(),
        config.tentative_ttl_cycles,
    )));
    let poller = Poller::new(
        Rc::clone(&backend),
        reconciler,
        Rc::new(LocationNavigator),
        &config.auth_url,
    );
    let submitter = Submitter::new(
        Rc::clone(&backend),
        poller.clone(),
        Rc::new(view.clone()),
        Rc::new(view.clone()),
        Rc::new(RandomIds),
        config.max_client_id,
    );

    if config.show_user_banner {
        let notices = view.clone();
        wasm_bindgen_futures::spawn_local(async move {
            session::show_current_user(backend.as_ref(), &notices).await;
        });
    }

    console_log!("[boot] Task board on #{}", config.container_id);
    runtime::start(poller, submitter, form, config.poll_interval_ms)
}
