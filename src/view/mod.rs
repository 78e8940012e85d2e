//! View boundary
//!
//! The client never reads state back out of the page. Everything it needs
//! to know about what is rendered lives in the reconciler's own model; the
//! page is a projection driven through the traits below.
//!
//! - `TaskList`: the task container. Only the reconciler mutates it.
//! - `Notices`: error and session banners.
//! - `ExpressionInput`: the submission form's text field.
//! - `Navigator`: whole-page navigation (the 401 redirect).
//!
//! Handles are shared the way DOM nodes are: every method takes `&self`
//! and implementations are cheap to clone.

pub mod memory;

#[cfg(target_arch = "wasm32")]
pub mod dom;

pub use memory::{MemoryElement, MemoryView, Mutation};

#[cfg(target_arch = "wasm32")]
pub use dom::{DomTask, DomView, LocationNavigator};

use crate::error::ViewError;
use crate::task::{TaskFields, TaskId};

/// Local key of a submission the server has not listed yet.
///
/// Lives in its own namespace and is never compared with server ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TentativeKey(pub u64);

/// What a task element is tagged with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementTag {
    /// A task the server has listed
    Task(TaskId),
    /// A placeholder for a just-submitted expression
    Tentative {
        key: TentativeKey,
        /// The id posted with the submission, shown until adoption
        client_id: TaskId,
    },
}

/// The container of task elements
pub trait TaskList {
    /// Handle to one rendered task element
    type Element: Clone;

    /// Build a detached element with all sub-regions filled in
    fn create(&self, tag: ElementTag, fields: &TaskFields) -> Result<Self::Element, ViewError>;

    /// Insert as the first child of the container
    fn prepend(&self, element: &Self::Element);

    /// Re-tag a placeholder as the server task `id`
    fn retag(&self, element: &Self::Element, id: TaskId);

    /// Rewrite the status sub-region and its finished marker
    fn set_status(&self, element: &Self::Element, text: &str, finished: bool);

    fn set_expression(&self, element: &Self::Element, text: &str);

    fn set_result(&self, element: &Self::Element, text: &str);

    /// Detach the element from the container
    fn remove(&self, element: &Self::Element);
}

/// Inline error banners shown above the task list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorNotice {
    /// The backend answered the submission with a non-2xx status
    Rejected { status: u16 },
    /// The submission never reached the backend
    Network,
}

impl ErrorNotice {
    pub fn message(&self) -> String {
        match self {
            ErrorNotice::Rejected { status } => {
                format!("Error: could not add expression (status: {}).", status)
            }
            ErrorNotice::Network => "Error: could not add expression (network error).".to_string(),
        }
    }

    /// CSS classes of the banner element
    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorNotice::Rejected { .. } => "error",
            ErrorNotice::Network => "task error",
        }
    }
}

pub trait Notices {
    /// Show a dismissable banner at the top of the task list
    fn show_error(&self, notice: ErrorNotice);

    /// Show the "logged in as" banner
    fn show_user(&self, username: &str);
}

pub trait ExpressionInput {
    fn value(&self) -> String;

    fn clear(&self);
}

pub trait Navigator {
    /// Navigate the whole page away
    fn redirect(&self, url: &str);
}
