//! Integration tests for the task board
//!
//! Drives poller, submitter and reconciler together against an in-memory
//! page and a scripted backend, the same component graph the browser boot
//! builds, minus the DOM.

use calcboard::api::{Backend, SubmitResponse, TaskListing, UserLookup};
use calcboard::config::Labels;
use calcboard::error::{ClientError, ClientResult};
use calcboard::poller::{CycleOutcome, Poller};
use calcboard::reconcile::Reconciler;
use calcboard::submit::{SubmitOutcome, Submitter};
use calcboard::task::{Submission, Task, TaskId, TaskResult};
use calcboard::view::{ErrorNotice, ExpressionInput, MemoryView, Mutation};
use futures::channel::oneshot;
use futures::executor::{LocalPool, block_on};
use futures::task::LocalSpawnExt;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

/// Backend double. Lists whatever `tasks` holds unless a deferred answer is
/// queued, in which case the listing waits for the test to release it.
#[derive(Default)]
struct ScriptedServer {
    tasks: RefCell<Vec<Task>>,
    /// `None`: the submission never reaches the server
    submit_status: Cell<Option<u16>>,
    /// Ignore the client id and assign from this counter
    server_ids: Cell<Option<i64>>,
    unauthorized: Cell<bool>,
    deferred: RefCell<VecDeque<oneshot::Receiver<Vec<Task>>>>,
    /// If set, an accepted submission is stored at once but answered only
    /// when the test releases it
    held_answer: RefCell<Option<oneshot::Receiver<()>>>,
    list_calls: Cell<usize>,
}

impl ScriptedServer {
    fn set_tasks(&self, tasks: Vec<Task>) {
        *self.tasks.borrow_mut() = tasks;
    }
}

impl Backend for ScriptedServer {
    async fn list_tasks(&self) -> ClientResult<TaskListing> {
        self.list_calls.set(self.list_calls.get() + 1);
        if self.unauthorized.get() {
            return Ok(TaskListing::Unauthorized);
        }
        let deferred = self.deferred.borrow_mut().pop_front();
        if let Some(answer) = deferred {
            return answer
                .await
                .map(TaskListing::Tasks)
                .map_err(|_| ClientError::Transport("dropped".into()));
        }
        Ok(TaskListing::Tasks(self.tasks.borrow().clone()))
    }

    async fn submit(&self, submission: &Submission) -> ClientResult<SubmitResponse> {
        match self.submit_status.get() {
            None => Err(ClientError::Transport("connection refused".into())),
            Some(status) if (200..300).contains(&status) => {
                let id = match self.server_ids.get() {
                    Some(next) => {
                        self.server_ids.set(Some(next + 1));
                        next
                    }
                    None => submission.id,
                };
                self.tasks
                    .borrow_mut()
                    .push(Task::new(id, "In Process", &submission.expression, None));
                let held = self.held_answer.borrow_mut().take();
                if let Some(release) = held {
                    let _ = release.await;
                }
                Ok(SubmitResponse::Accepted)
            }
            Some(status) => Ok(SubmitResponse::Rejected { status }),
        }
    }

    async fn current_user(&self) -> ClientResult<UserLookup> {
        Ok(UserLookup::User("ada".into()))
    }
}

struct Board {
    view: MemoryView,
    server: Rc<ScriptedServer>,
    poller: Poller<ScriptedServer, MemoryView>,
    submitter: Submitter<ScriptedServer, MemoryView>,
}

fn board() -> Board {
    let server = Rc::new(ScriptedServer::default());
    server.submit_status.set(Some(202));
    board_on(MemoryView::new(), server)
}

/// A fresh component graph over an existing page and server
fn board_on(view: MemoryView, server: Rc<ScriptedServer>) -> Board {
    let reconciler = Rc::new(RefCell::new(Reconciler::new(
        view.clone(),
        Labels::default(),
        10,
    )));
    let poller = Poller::new(
        Rc::clone(&server),
        reconciler,
        Rc::new(view.clone()),
        "/auth",
    );

    let next_id = Cell::new(100);
    let submitter = Submitter::new(
        Rc::clone(&server),
        poller.clone(),
        Rc::new(view.clone()),
        Rc::new(view.clone()),
        Rc::new(move |_bound: u32| -> i64 {
            let id = next_id.get();
            next_id.set(id + 1);
            id
        }),
        1_000_000,
    );

    Board {
        view,
        server,
        poller,
        submitter,
    }
}

fn task(id: i64, status: &str, expression: &str, result: &str) -> Task {
    Task::new(id, status, expression, Some(TaskResult::Text(result.into())))
}

// ============================================================================
// Reconciliation through poll cycles
// ============================================================================

#[test]
fn test_running_task_finishes_in_place() {
    let b = board();

    b.server.set_tasks(vec![task(7, "Running", "2+2", "")]);
    block_on(b.poller.poll_once());
    let element = b.view.element(TaskId(7)).unwrap();

    b.server.set_tasks(vec![task(7, "Finished", "2+2", "4")]);
    block_on(b.poller.poll_once());

    assert_eq!(b.view.task_ids(), vec![TaskId(7)]);
    assert_eq!(b.view.element(TaskId(7)), Some(element));
    let fields = b.view.fields(TaskId(7)).unwrap();
    assert_eq!(fields.status, "Status: Finished");
    assert_eq!(fields.result, "Result: 4");
    assert!(fields.finished);
}

#[test]
fn test_task_gone_from_server_is_removed() {
    let b = board();

    b.server.set_tasks(vec![task(3, "Running", "9-1", "")]);
    block_on(b.poller.poll_once());
    assert_eq!(b.view.task_ids(), vec![TaskId(3)]);

    b.server.set_tasks(Vec::new());
    block_on(b.poller.poll_once());
    assert!(b.view.task_ids().is_empty());
}

#[test]
fn test_repeated_snapshot_touches_nothing() {
    let b = board();
    b.server.set_tasks(vec![
        task(1, "Running", "1+1", ""),
        task(2, "Finished", "2*2", "4"),
    ]);
    block_on(b.poller.poll_once());
    b.view.clear_journal();

    let outcome = block_on(b.poller.poll_once());
    assert!(matches!(outcome, CycleOutcome::Applied(stats) if stats.is_noop()));
    assert!(b.view.journal().is_empty());
}

#[test]
fn test_unchanged_status_is_not_rewritten() {
    let b = board();
    b.server.set_tasks(vec![task(1, "Running", "5*5", "")]);
    block_on(b.poller.poll_once());
    let element = b.view.element(TaskId(1)).unwrap();
    b.view.clear_journal();

    b.server.set_tasks(vec![task(1, "Running", "5*5", "25")]);
    block_on(b.poller.poll_once());
    assert_eq!(b.view.journal(), vec![Mutation::SetResult(element)]);
}

#[test]
fn test_rendered_ids_track_server_exactly() {
    let b = board();
    let cycles: [&[i64]; 5] = [&[1, 2, 3], &[2, 3, 4], &[], &[10, 5], &[5, 10, 11]];

    for ids in cycles {
        b.server.set_tasks(
            ids.iter()
                .map(|id| task(*id, "In Process", "1+2", ""))
                .collect(),
        );
        block_on(b.poller.poll_once());

        let mut rendered = b.view.task_ids();
        rendered.sort();
        let mut expected: Vec<TaskId> = ids.iter().map(|id| TaskId(*id)).collect();
        expected.sort();
        assert_eq!(rendered, expected);
    }
}

#[test]
fn test_finished_marker_only_on_finished() {
    let b = board();
    b.server.set_tasks(vec![
        task(1, "Finished", "1+1", "2"),
        task(2, "In Process", "2+2", ""),
        task(3, "finished", "3+3", ""),
        task(4, "Error", "1/0", ""),
    ]);
    block_on(b.poller.poll_once());

    assert!(b.view.fields(TaskId(1)).unwrap().finished);
    for id in [2, 3, 4] {
        assert!(!b.view.fields(TaskId(id)).unwrap().finished);
    }
}

#[test]
fn test_late_response_does_not_roll_back() {
    let b = board();
    let (first_tx, first_rx) = oneshot::channel();
    let (second_tx, second_rx) = oneshot::channel();
    b.server
        .deferred
        .borrow_mut()
        .extend([first_rx, second_rx]);

    let outcomes = Rc::new(RefCell::new(Vec::new()));
    let mut pool = LocalPool::new();
    for _ in 0..2 {
        let poller = b.poller.clone();
        let outcomes = Rc::clone(&outcomes);
        pool.spawner()
            .spawn_local(async move {
                let outcome = poller.poll_once().await;
                outcomes.borrow_mut().push(outcome);
            })
            .unwrap();
    }
    // Both requests in flight
    pool.run_until_stalled();
    assert_eq!(b.server.list_calls.get(), 2);

    second_tx.send(vec![task(7, "Finished", "2+2", "4")]).unwrap();
    pool.run_until_stalled();
    first_tx.send(vec![task(7, "Running", "2+2", "")]).unwrap();
    pool.run_until_stalled();

    assert!(b.view.fields(TaskId(7)).unwrap().finished);
    let outcomes = outcomes.borrow();
    assert!(matches!(outcomes[0], CycleOutcome::Applied(_)));
    assert_eq!(outcomes[1], CycleOutcome::Stale);
}

#[test]
fn test_unauthorized_redirects_to_auth() {
    let b = board();
    b.server.set_tasks(vec![task(1, "Running", "1+1", "")]);
    block_on(b.poller.poll_once());

    b.server.unauthorized.set(true);
    assert_eq!(block_on(b.poller.poll_once()), CycleOutcome::Redirected);
    assert_eq!(b.view.redirects(), vec!["/auth".to_string()]);
    assert_eq!(b.view.task_ids(), vec![TaskId(1)]);
}

// ============================================================================
// Submission
// ============================================================================

#[test]
fn test_accepted_submission_clears_input_and_fetches() {
    let b = board();
    b.view.set_input("1/0");
    let calls_before = b.server.list_calls.get();

    let outcome = block_on(b.submitter.submit());

    assert_eq!(outcome, SubmitOutcome::Accepted(TaskId(100)));
    assert_eq!(b.view.value(), "");
    assert_eq!(b.server.list_calls.get(), calls_before + 1);
    assert_eq!(b.view.task_ids(), vec![TaskId(100)]);
    assert_eq!(
        b.view.fields(TaskId(100)).unwrap().expression,
        "Expression: 1/0"
    );
}

#[test]
fn test_rejected_submission_keeps_input() {
    let b = board();
    b.server.submit_status.set(Some(500));
    b.view.set_input("1/0");

    let outcome = block_on(b.submitter.submit());

    assert_eq!(outcome, SubmitOutcome::Rejected { status: 500 });
    assert_eq!(b.view.value(), "1/0");
    assert_eq!(b.view.banners(), vec![ErrorNotice::Rejected { status: 500 }]);
    assert!(b.view.task_ids().is_empty());
}

#[test]
fn test_unreachable_server_shows_network_banner() {
    let b = board();
    b.server.submit_status.set(None);
    b.view.set_input("3*3");

    let outcome = block_on(b.submitter.submit());

    assert!(matches!(outcome, SubmitOutcome::NetworkError(_)));
    assert_eq!(b.view.value(), "3*3");
    assert_eq!(b.view.banners(), vec![ErrorNotice::Network]);
}

#[test]
fn test_banners_survive_reconcile() {
    let b = board();
    b.server.submit_status.set(Some(422));
    b.view.set_input("42");
    block_on(b.submitter.submit());

    b.server.set_tasks(vec![task(1, "Running", "1+1", "")]);
    block_on(b.poller.poll_once());
    b.server.set_tasks(Vec::new());
    block_on(b.poller.poll_once());

    assert_eq!(b.view.banners(), vec![ErrorNotice::Rejected { status: 422 }]);
    assert!(b.view.dismiss_banner(0));
    assert!(b.view.banners().is_empty());
}

#[test]
fn test_server_assigned_id_adopts_placeholder() {
    let b = board();
    b.server.server_ids.set(Some(5000));
    b.view.set_input("6*7");

    block_on(b.submitter.submit());

    // One element, now tagged with the server's id
    assert_eq!(b.view.task_ids(), vec![TaskId(5000)]);
    assert_eq!(b.view.placeholder_count(), 0);
    let adopted = b
        .view
        .journal()
        .iter()
        .any(|m| matches!(m, Mutation::Retag(_, TaskId(5000))));
    assert!(adopted);
}

#[test]
fn test_placeholder_visible_while_server_lags() {
    let b = board();
    b.view.set_input("2^10");

    // The listing the out-of-band poll gets predates the submission
    let (tx, rx) = oneshot::channel();
    b.server.deferred.borrow_mut().push_back(rx);
    let mut pool = LocalPool::new();
    let submitter = b.submitter.clone();
    pool.spawner()
        .spawn_local(async move {
            submitter.submit().await;
        })
        .unwrap();
    pool.run_until_stalled();
    tx.send(Vec::new()).unwrap();
    pool.run_until_stalled();

    assert!(b.view.task_ids().is_empty());
    assert_eq!(b.view.placeholder_count(), 1);

    // Next tick lists it
    block_on(b.poller.poll_once());
    assert_eq!(b.view.task_ids(), vec![TaskId(100)]);
    assert_eq!(b.view.placeholder_count(), 0);
}

#[test]
fn test_tick_during_submission_shows_task_once() {
    let b = board();
    b.server.server_ids.set(Some(5000));
    let (release, held) = oneshot::channel();
    *b.server.held_answer.borrow_mut() = Some(held);
    b.view.set_input("6*7");

    let mut pool = LocalPool::new();
    let submitter = b.submitter.clone();
    pool.spawner()
        .spawn_local(async move {
            submitter.submit().await;
        })
        .unwrap();
    // Stored server-side, answer not back yet
    pool.run_until_stalled();

    // A timer tick lists it under the server's id
    block_on(b.poller.poll_once());
    assert_eq!(b.view.task_ids(), vec![TaskId(5000)]);

    release.send(()).unwrap();
    pool.run_until_stalled();

    assert_eq!(b.view.value(), "");
    assert_eq!(b.view.task_ids(), vec![TaskId(5000)]);
    assert_eq!(b.view.placeholder_count(), 0);
}

// ============================================================================
// Restart
// ============================================================================

#[test]
fn test_restart_on_same_page_shows_each_task_once() {
    let first = board();
    first
        .server
        .set_tasks(vec![task(7, "Running", "2+2", ""), task(8, "Running", "3+3", "")]);
    block_on(first.poller.poll_once());
    first.view.set_input("1/0");
    block_on(first.submitter.submit());

    // Stopping the board takes its elements down
    let removed = first.poller.reconciler().borrow_mut().detach();
    assert_eq!(removed, 3);
    assert!(first.view.task_ids().is_empty());

    let second = board_on(first.view.clone(), Rc::clone(&first.server));
    block_on(second.poller.poll_once());
    let mut ids = second.view.task_ids();
    ids.sort();
    assert_eq!(ids, vec![TaskId(7), TaskId(8), TaskId(100)]);

    // A cycle of the old board that was still in flight changes nothing
    assert_eq!(block_on(first.poller.poll_once()), CycleOutcome::Detached);
    assert_eq!(second.view.task_ids().len(), 3);
    assert_eq!(second.view.placeholder_count(), 0);
}

