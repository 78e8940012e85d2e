//! Poll cycles
//!
//! A cycle fetches the task list and hands it to the reconciler. The runtime
//! starts one per timer tick without waiting for the previous one, so cycles
//! can overlap; each is numbered when it is issued and the reconciler drops
//! any snapshot that arrives after a newer one was applied.
//!
//! A failed cycle leaves the view as it was. The next tick is the retry.

use crate::api::{Backend, TaskListing};
use crate::error::ClientError;
use crate::reconcile::{ApplyOutcome, ReconcileStats, Reconciler};
use crate::view::{Navigator, TaskList};
use crate::{console_error, console_log};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// What one poll cycle did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Applied(ReconcileStats),
    /// A newer snapshot had already been applied
    Stale,
    /// The board was stopped while the request was in flight
    Detached,
    /// Backend said 401; the page was sent to the auth entry point
    Redirected,
    /// Nothing applied; the view keeps its last state
    Failed(ClientError),
}

pub struct Poller<B: Backend, V: TaskList> {
    backend: Rc<B>,
    reconciler: Rc<RefCell<Reconciler<V>>>,
    navigator: Rc<dyn Navigator>,
    auth_url: Rc<str>,
    next_seq: Rc<Cell<u64>>,
}

impl<B: Backend, V: TaskList> Clone for Poller<B, V> {
    fn clone(&self) -> Self {
        Self {
            backend: Rc::clone(&self.backend),
            reconciler: Rc::clone(&self.reconciler),
            navigator: Rc::clone(&self.navigator),
            auth_url: Rc::clone(&self.auth_url),
            next_seq: Rc::clone(&self.next_seq),
        }
    }
}

impl<B: Backend, V: TaskList> Poller<B, V> {
    pub fn new(
        backend: Rc<B>,
        reconciler: Rc<RefCell<Reconciler<V>>>,
        navigator: Rc<dyn Navigator>,
        auth_url: &str,
    ) -> Self {
        Self {
            backend,
            reconciler,
            navigator,
            auth_url: Rc::from(auth_url),
            next_seq: Rc::new(Cell::new(1)),
        }
    }

    pub fn reconciler(&self) -> &Rc<RefCell<Reconciler<V>>> {
        &self.reconciler
    }

    /// Number the next cycle. Called before the request goes out, so the
    /// number reflects issue order, not arrival order.
    fn issue_seq(&self) -> u64 {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        seq
    }

    /// Run one fetch-and-reconcile cycle
    pub async fn poll_once(&self) -> CycleOutcome {
        let seq = self.issue_seq();

        match self.backend.list_tasks().await {
            Ok(TaskListing::Tasks(tasks)) => {
                let outcome = self.reconciler.borrow_mut().apply(seq, tasks);
                match outcome {
                    ApplyOutcome::Applied(stats) => CycleOutcome::Applied(stats),
                    ApplyOutcome::Stale { last_applied, .. } => {
                        console_log!(
                            "[poller] Dropped snapshot {} (already applied {})",
                            seq,
                            last_applied
                        );
                        CycleOutcome::Stale
                    }
                    ApplyOutcome::Detached => CycleOutcome::Detached,
                }
            }
            Ok(TaskListing::Unauthorized) => {
                console_log!("[poller] Not logged in, redirecting to {}", self.auth_url);
                self.navigator.redirect(&self.auth_url);
                CycleOutcome::Redirected
            }
            Err(e) => {
                console_error!("[poller] Error fetching tasks: {}", e);
                CycleOutcome::Failed(e)
            }
        }
    }
}
