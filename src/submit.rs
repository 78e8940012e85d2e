//! Expression submission
//!
//! Posts the form's expression under a client-drawn id. On success the input
//! is cleared, a placeholder goes up, and a poll cycle runs immediately so
//! the new task shows without waiting for the next tick. On failure a banner
//! explains why and the input keeps its text for another try.

use crate::api::{Backend, SubmitResponse};
use crate::error::ClientError;
use crate::poller::Poller;
use crate::task::{Submission, TaskId};
use crate::view::{ErrorNotice, ExpressionInput, Notices, TaskList};
use crate::{console_error, console_log};
use std::rc::Rc;

/// Source of client-side task ids
pub trait IdSource {
    /// An id in `[0, bound)`
    fn next_id(&self, bound: u32) -> i64;
}

impl<F: Fn(u32) -> i64> IdSource for F {
    fn next_id(&self, bound: u32) -> i64 {
        self(bound)
    }
}

/// Ids from `Math.random()`
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

#[cfg(target_arch = "wasm32")]
impl IdSource for RandomIds {
    fn next_id(&self, bound: u32) -> i64 {
        (js_sys::Math::random() * f64::from(bound)).floor() as i64
    }
}

/// How a submission ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted(TaskId),
    Rejected { status: u16 },
    NetworkError(ClientError),
}

pub struct Submitter<B: Backend, V: TaskList> {
    backend: Rc<B>,
    poller: Poller<B, V>,
    input: Rc<dyn ExpressionInput>,
    notices: Rc<dyn Notices>,
    ids: Rc<dyn IdSource>,
    max_client_id: u32,
}

impl<B: Backend, V: TaskList> Clone for Submitter<B, V> {
    fn clone(&self) -> Self {
        Self {
            backend: Rc::clone(&self.backend),
            poller: self.poller.clone(),
            input: Rc::clone(&self.input),
            notices: Rc::clone(&self.notices),
            ids: Rc::clone(&self.ids),
            max_client_id: self.max_client_id,
        }
    }
}

impl<B: Backend, V: TaskList> Submitter<B, V> {
    pub fn new(
        backend: Rc<B>,
        poller: Poller<B, V>,
        input: Rc<dyn ExpressionInput>,
        notices: Rc<dyn Notices>,
        ids: Rc<dyn IdSource>,
        max_client_id: u32,
    ) -> Self {
        Self {
            backend,
            poller,
            input,
            notices,
            ids,
            max_client_id,
        }
    }

    /// Submit whatever is in the input field
    pub async fn submit(&self) -> SubmitOutcome {
        let expression = self.input.value();
        self.submit_expression(expression).await
    }

    pub async fn submit_expression(&self, expression: String) -> SubmitOutcome {
        let id = self.ids.next_id(self.max_client_id);
        let submission = Submission { id, expression };
        let since = self.poller.reconciler().borrow().passes();

        match self.backend.submit(&submission).await {
            Ok(SubmitResponse::Accepted) => {
                console_log!("[submit] Accepted {:?} as {}", submission.expression, id);
                self.input.clear();
                self.poller
                    .reconciler()
                    .borrow_mut()
                    .add_tentative(TaskId(id), &submission.expression, since);
                // Out of band, not waiting for the next tick
                self.poller.poll_once().await;
                SubmitOutcome::Accepted(TaskId(id))
            }
            Ok(SubmitResponse::Rejected { status }) => {
                self.notices.show_error(ErrorNotice::Rejected { status });
                SubmitOutcome::Rejected { status }
            }
            Err(e) => {
                console_error!("[submit] Error submitting expression: {}", e);
                self.notices.show_error(ErrorNotice::Network);
                SubmitOutcome::NetworkError(e)
            }
        }
    }
}
