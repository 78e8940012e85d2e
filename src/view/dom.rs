//! Browser DOM view
//!
//! Task markup:
//!
//! ```html
//! <div class="task" data-id="7">
//!   <p class="task-id">ID: 7</p>
//!   <p class="status finished">Status: Finished</p>
//!   <p class="expression">Expression: 2+2</p>
//!   <p class="result">Result: 4</p>
//! </div>
//! ```
//!
//! Placeholders carry `data-tentative` instead of `data-id` until adopted.

use super::{ElementTag, ErrorNotice, ExpressionInput, Navigator, Notices, TaskList};
use crate::config::{ClientConfig, Labels};
use crate::error::{ClientError, ViewError};
use crate::task::{TaskFields, TaskId};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlInputElement};

const FINISHED_CLASS: &str = "finished";

/// A rendered task element with direct handles to its sub-regions
#[derive(Debug, Clone)]
pub struct DomTask {
    root: Element,
    id_line: Element,
    status: Element,
    expression: Element,
    result: Element,
}

impl DomTask {
    pub fn root(&self) -> &Element {
        &self.root
    }
}

/// View over a task container and an expression input
#[derive(Debug, Clone)]
pub struct DomView {
    document: Document,
    container: Element,
    input: HtmlInputElement,
    labels: Labels,
}

impl DomView {
    pub fn new(
        document: Document,
        container: Element,
        input: HtmlInputElement,
        labels: Labels,
    ) -> Self {
        Self {
            document,
            container,
            input,
            labels,
        }
    }

    /// Look up the container and input by the ids in `config`
    pub fn from_document(document: Document, config: &ClientConfig) -> Result<Self, ClientError> {
        let container = document
            .get_element_by_id(&config.container_id)
            .ok_or_else(|| ClientError::Unavailable(format!("#{}", config.container_id)))?;
        let input = document
            .get_element_by_id(&config.input_id)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .ok_or_else(|| ClientError::Unavailable(format!("input#{}", config.input_id)))?;
        Ok(Self::new(document, container, input, config.labels.clone()))
    }

    pub fn input(&self) -> &HtmlInputElement {
        &self.input
    }

    fn paragraph(&self, class: &str, text: &str) -> Result<Element, ViewError> {
        let p = self
            .document
            .create_element("p")
            .map_err(|e| ViewError(format!("create <p>: {:?}", e)))?;
        p.set_class_name(class);
        p.set_text_content(Some(text));
        Ok(p)
    }

    fn append(parent: &Element, child: &Element) -> Result<(), ViewError> {
        parent
            .append_child(child)
            .map(|_| ())
            .map_err(|e| ViewError(format!("append: {:?}", e)))
    }
}

impl TaskList for DomView {
    type Element = DomTask;

    fn create(&self, tag: ElementTag, fields: &TaskFields) -> Result<DomTask, ViewError> {
        let root = self
            .document
            .create_element("div")
            .map_err(|e| ViewError(format!("create <div>: {:?}", e)))?;
        root.set_class_name("task");

        let shown_id = match tag {
            ElementTag::Task(id) => {
                let _ = root.set_attribute("data-id", &id.to_string());
                id
            }
            ElementTag::Tentative { key, client_id } => {
                let _ = root.set_attribute("data-tentative", &key.0.to_string());
                client_id
            }
        };

        let status_class = if fields.finished {
            "status finished"
        } else {
            "status"
        };
        let task = DomTask {
            id_line: self.paragraph("task-id", &format!("{}{}", self.labels.id, shown_id))?,
            status: self.paragraph(status_class, &fields.status)?,
            expression: self.paragraph("expression", &fields.expression)?,
            result: self.paragraph("result", &fields.result)?,
            root,
        };
        for child in [&task.id_line, &task.status, &task.expression, &task.result] {
            Self::append(&task.root, child)?;
        }
        Ok(task)
    }

    fn prepend(&self, element: &DomTask) {
        let _ = self.container.prepend_with_node_1(&element.root);
    }

    fn retag(&self, element: &DomTask, id: TaskId) {
        let _ = element.root.remove_attribute("data-tentative");
        let _ = element.root.set_attribute("data-id", &id.to_string());
        element
            .id_line
            .set_text_content(Some(&format!("{}{}", self.labels.id, id)));
    }

    fn set_status(&self, element: &DomTask, text: &str, finished: bool) {
        element.status.set_text_content(Some(text));
        let _ = element
            .status
            .class_list()
            .toggle_with_force(FINISHED_CLASS, finished);
    }

    fn set_expression(&self, element: &DomTask, text: &str) {
        element.expression.set_text_content(Some(text));
    }

    fn set_result(&self, element: &DomTask, text: &str) {
        element.result.set_text_content(Some(text));
    }

    fn remove(&self, element: &DomTask) {
        element.root.remove();
    }
}

impl Notices for DomView {
    fn show_error(&self, notice: ErrorNotice) {
        let banner = match self.document.create_element("div") {
            Ok(el) => el,
            Err(e) => {
                crate::console_error!("[view] Could not create banner: {:?}", e);
                return;
            }
        };
        banner.set_class_name(notice.class_name());
        banner.set_text_content(Some(&notice.message()));

        // Click to dismiss
        let target = banner.clone();
        let dismiss = Closure::once_into_js(move || target.remove());
        let _ = banner.add_event_listener_with_callback("click", dismiss.unchecked_ref());

        let _ = self.container.prepend_with_node_1(&banner);
    }

    fn show_user(&self, username: &str) {
        let Some(body) = self.document.body() else {
            return;
        };
        let banner = match self.document.create_element("div") {
            Ok(el) => el,
            Err(e) => {
                crate::console_error!("[view] Could not create user banner: {:?}", e);
                return;
            }
        };
        banner.set_id("username-display");
        banner.set_text_content(Some(&format!("Logged in as: {}", username)));
        let _ = body.prepend_with_node_1(&banner);
    }
}

impl ExpressionInput for DomView {
    fn value(&self) -> String {
        self.input.value()
    }

    fn clear(&self) {
        self.input.set_value("");
    }
}

/// Navigates through `window.location`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocationNavigator;

impl Navigator for LocationNavigator {
    fn redirect(&self, url: &str) {
        let Some(window) = web_sys::window() else {
            crate::console_error!("[view] No window object, cannot redirect to {}", url);
            return;
        };
        if let Err(e) = window.location().set_href(url) {
            crate::console_error!("[view] Redirect to {} failed: {:?}", url, e);
        }
    }
}
