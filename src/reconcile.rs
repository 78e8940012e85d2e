//! Reconciliation engine
//!
//! Takes a freshly fetched task collection and brings the task list in line
//! with it using the fewest view writes:
//!
//! 1. Incoming tasks are sorted by ascending id (duplicate ids: last wins).
//! 2. Tasks already rendered get only their changed sub-regions rewritten.
//! 3. Unknown tasks either adopt a matching placeholder or get a new
//!    element, prepended to the container.
//! 4. Rendered tasks absent from the collection are removed.
//!
//! The previous state is the reconciler's own model, never the page.
//!
//! Display order is arrival order, newest first: an element is placed once,
//! when its task is first seen, and never moves afterwards. Tasks first seen
//! in the same snapshot are prepended in ascending id order, so the highest
//! id of that batch ends up on top.
//!
//! Snapshots carry the sequence number of the poll that fetched them. Poll
//! cycles are not serialized, so responses can land out of order; a snapshot
//! not newer than the last applied one is dropped instead of rolling the
//! view back.
//!
//! A detached reconciler has taken its elements off the page and ignores
//! everything that still arrives for it, so a new board can take over the
//! same container.

use crate::config::Labels;
use crate::{console_error, console_log};
use crate::task::{Task, TaskFields, TaskId};
use crate::view::{ElementTag, TaskList, TentativeKey};
use std::collections::BTreeMap;

/// Counts of view work done by one reconcile pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Elements created for tasks seen for the first time
    pub created: usize,
    /// Placeholders taken over by a server task
    pub adopted: usize,
    /// Existing elements that had at least one sub-region rewritten
    pub updated: usize,
    /// Elements removed because their task disappeared
    pub removed: usize,
    /// Placeholders removed without ever being matched
    pub expired: usize,
    /// Individual sub-region writes
    pub fields_written: usize,
}

impl ReconcileStats {
    /// True if the pass did not touch the view at all
    pub fn is_noop(&self) -> bool {
        *self == ReconcileStats::default()
    }
}

/// Result of offering a snapshot to the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied(ReconcileStats),
    /// An equal or newer snapshot was already applied
    Stale { seq: u64, last_applied: u64 },
    /// The reconciler no longer owns the page
    Detached,
}

struct Rendered<E> {
    element: E,
    fields: TaskFields,
    /// Pass in which the task was first listed
    first_seen: u64,
    /// Already accounted for a submission, by adoption or suppression
    claimed: bool,
}

struct Placeholder<E> {
    key: TentativeKey,
    client_id: TaskId,
    expression: String,
    rendered: Rendered<E>,
    cycles_left: u32,
}

pub struct Reconciler<V: TaskList> {
    view: V,
    labels: Labels,
    rendered: BTreeMap<TaskId, Rendered<V::Element>>,
    /// Oldest first
    placeholders: Vec<Placeholder<V::Element>>,
    next_tentative: u64,
    tentative_ttl: u32,
    last_applied: Option<u64>,
    passes: u64,
    detached: bool,
}

impl<V: TaskList> Reconciler<V> {
    pub fn new(view: V, labels: Labels, tentative_ttl: u32) -> Self {
        Self {
            view,
            labels,
            rendered: BTreeMap::new(),
            placeholders: Vec::new(),
            next_tentative: 0,
            tentative_ttl,
            last_applied: None,
            passes: 0,
            detached: false,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Ids of rendered server tasks, ascending
    pub fn rendered_ids(&self) -> Vec<TaskId> {
        self.rendered.keys().copied().collect()
    }

    pub fn placeholder_count(&self) -> usize {
        self.placeholders.len()
    }

    pub fn last_applied(&self) -> Option<u64> {
        self.last_applied
    }

    /// Reconcile passes run so far. A submission notes this before posting
    /// so `add_tentative` knows which tasks showed up while it was in flight.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Take every task element and placeholder off the page and stop
    /// applying snapshots. Returns the number of elements removed.
    pub fn detach(&mut self) -> usize {
        let mut removed = 0;
        for (_, rendered) in std::mem::take(&mut self.rendered) {
            self.view.remove(&rendered.element);
            removed += 1;
        }
        for placeholder in std::mem::take(&mut self.placeholders) {
            self.view.remove(&placeholder.rendered.element);
            removed += 1;
        }
        self.detached = true;
        removed
    }

    /// Apply the snapshot fetched by poll cycle `seq`
    pub fn apply(&mut self, seq: u64, tasks: Vec<Task>) -> ApplyOutcome {
        if self.detached {
            return ApplyOutcome::Detached;
        }
        if let Some(last_applied) = self.last_applied {
            if seq <= last_applied {
                return ApplyOutcome::Stale { seq, last_applied };
            }
        }
        self.last_applied = Some(seq);
        ApplyOutcome::Applied(self.reconcile(tasks))
    }

    /// Bring the view in line with `tasks`, ignoring snapshot ordering
    pub fn reconcile(&mut self, tasks: Vec<Task>) -> ReconcileStats {
        let mut stats = ReconcileStats::default();
        if self.detached {
            return stats;
        }
        self.passes += 1;

        let incoming: BTreeMap<TaskId, Task> = tasks.into_iter().map(|t| (t.id, t)).collect();

        // Posted ids are matched before any expression fallback, so a lower
        // id with the same text cannot take another task's placeholder
        let mut by_posted_id = BTreeMap::new();
        for id in incoming.keys() {
            if self.rendered.contains_key(id) {
                continue;
            }
            if let Some(pos) = self.placeholders.iter().position(|p| p.client_id == *id) {
                by_posted_id.insert(*id, self.placeholders.remove(pos));
            }
        }

        for (id, task) in &incoming {
            let fields = TaskFields::derive(task, &self.labels);

            if let Some(rendered) = self.rendered.get_mut(id) {
                let written = write_changes(&self.view, rendered, fields);
                if written > 0 {
                    stats.updated += 1;
                    stats.fields_written += written;
                }
                continue;
            }

            let placeholder = by_posted_id
                .remove(id)
                .or_else(|| self.take_by_expression(task));
            if let Some(placeholder) = placeholder {
                let mut rendered = placeholder.rendered;
                rendered.first_seen = self.passes;
                rendered.claimed = true;
                self.view.retag(&rendered.element, *id);
                stats.fields_written += write_changes(&self.view, &mut rendered, fields);
                stats.adopted += 1;
                self.rendered.insert(*id, rendered);
                continue;
            }

            match self.view.create(ElementTag::Task(*id), &fields) {
                Ok(element) => {
                    self.view.prepend(&element);
                    stats.created += 1;
                    self.rendered.insert(
                        *id,
                        Rendered {
                            element,
                            fields,
                            first_seen: self.passes,
                            claimed: false,
                        },
                    );
                }
                // Left out of the model, so the next snapshot retries it
                Err(e) => console_error!("[reconcile] Could not render task {}: {}", id, e),
            }
        }

        let gone: Vec<TaskId> = self
            .rendered
            .keys()
            .filter(|id| !incoming.contains_key(id))
            .copied()
            .collect();
        for id in gone {
            if let Some(rendered) = self.rendered.remove(&id) {
                self.view.remove(&rendered.element);
                stats.removed += 1;
            }
        }

        stats.expired = self.age_placeholders();
        stats
    }

    /// Show a placeholder for an accepted submission until the server lists
    /// it. `since` is `passes()` as read before the submission was posted.
    ///
    /// Returns `None` if the task is already on the page: rendered under the
    /// posted id, or listed under a server-assigned id with the same
    /// expression by a pass that ran after `since`.
    pub fn add_tentative(
        &mut self,
        client_id: TaskId,
        expression: &str,
        since: u64,
    ) -> Option<TentativeKey> {
        if self.detached {
            return None;
        }
        if let Some(rendered) = self.rendered.get_mut(&client_id) {
            rendered.claimed = true;
            return None;
        }

        let fields = TaskFields::placeholder(expression, &self.labels);
        let listed = self.rendered.iter_mut().find(|(_, r)| {
            !r.claimed && r.first_seen > since && r.fields.expression == fields.expression
        });
        if let Some((id, rendered)) = listed {
            console_log!("[reconcile] {:?} already listed as {}", expression, id);
            rendered.claimed = true;
            return None;
        }

        let key = TentativeKey(self.next_tentative);
        self.next_tentative += 1;

        let element = match self
            .view
            .create(ElementTag::Tentative { key, client_id }, &fields)
        {
            Ok(element) => element,
            Err(e) => {
                console_error!("[reconcile] Could not render placeholder: {}", e);
                return None;
            }
        };
        self.view.prepend(&element);
        self.placeholders.push(Placeholder {
            key,
            client_id,
            expression: expression.to_string(),
            rendered: Rendered {
                element,
                fields,
                first_seen: self.passes,
                claimed: true,
            },
            cycles_left: self.tentative_ttl,
        });
        Some(key)
    }

    /// The oldest placeholder with the task's expression
    fn take_by_expression(&mut self, task: &Task) -> Option<Placeholder<V::Element>> {
        let position = self
            .placeholders
            .iter()
            .position(|p| p.expression == task.original_expression)?;
        Some(self.placeholders.remove(position))
    }

    fn age_placeholders(&mut self) -> usize {
        let mut expired = 0;
        let view = &self.view;
        self.placeholders.retain_mut(|p| {
            p.cycles_left = p.cycles_left.saturating_sub(1);
            if p.cycles_left == 0 {
                console_log!(
                    "[reconcile] Placeholder {} for {:?} expired unmatched",
                    p.key.0,
                    p.expression
                );
                view.remove(&p.rendered.element);
                expired += 1;
                false
            } else {
                true
            }
        });
        expired
    }

    #[cfg(test)]
    fn placeholder_keys(&self) -> Vec<TentativeKey> {
        self.placeholders.iter().map(|p| p.key).collect()
    }
}

/// Rewrite the sub-regions of `rendered` that differ from `next`; returns
/// the number of writes.
fn write_changes<V: TaskList>(
    view: &V,
    rendered: &mut Rendered<V::Element>,
    next: TaskFields,
) -> usize {
    let mut written = 0;
    if rendered.fields.status != next.status || rendered.fields.finished != next.finished {
        view.set_status(&rendered.element, &next.status, next.finished);
        written += 1;
    }
    if rendered.fields.expression != next.expression {
        view.set_expression(&rendered.element, &next.expression);
        written += 1;
    }
    if rendered.fields.result != next.result {
        view.set_result(&rendered.element, &next.result);
        written += 1;
    }
    rendered.fields = next;
    written
}
