//! In-memory page
//!
//! Implements every view trait without a browser. Elements live in a slab
//! arena and every mutation is journaled, so tests can assert not only on
//! the final page but on exactly which writes produced it.

use super::{ElementTag, ErrorNotice, ExpressionInput, Navigator, Notices, TaskList};
use crate::error::ViewError;
use crate::task::{TaskFields, TaskId};
use slab::Slab;
use std::cell::RefCell;
use std::rc::Rc;

/// Handle to an element in a `MemoryView`.
///
/// The serial makes handles to removed elements stay invalid even after
/// the arena reuses their slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryElement {
    key: usize,
    serial: u64,
}

/// One journaled write to the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create(ElementTag),
    Prepend(MemoryElement),
    Retag(MemoryElement, TaskId),
    SetStatus(MemoryElement),
    SetExpression(MemoryElement),
    SetResult(MemoryElement),
    Remove(MemoryElement),
}

#[derive(Debug)]
struct TaskNode {
    serial: u64,
    tag: ElementTag,
    fields: TaskFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Child {
    Task(MemoryElement),
    Banner(ErrorNotice),
}

#[derive(Debug, Default)]
struct MemoryPage {
    nodes: Slab<TaskNode>,
    next_serial: u64,
    /// Container children, top first
    children: Vec<Child>,
    input: String,
    user: Option<String>,
    redirects: Vec<String>,
    journal: Vec<Mutation>,
}

impl MemoryPage {
    fn node(&self, element: &MemoryElement) -> Option<&TaskNode> {
        self.nodes
            .get(element.key)
            .filter(|node| node.serial == element.serial)
    }

    fn node_mut(&mut self, element: &MemoryElement) -> Option<&mut TaskNode> {
        self.nodes
            .get_mut(element.key)
            .filter(|node| node.serial == element.serial)
    }
}

/// Shared handle to an in-memory page
#[derive(Debug, Clone, Default)]
pub struct MemoryView {
    page: Rc<RefCell<MemoryPage>>,
}

impl MemoryView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of attached server-task elements, top first
    pub fn task_ids(&self) -> Vec<TaskId> {
        let page = self.page.borrow();
        page.children
            .iter()
            .filter_map(|child| match child {
                Child::Task(el) => page.node(el),
                Child::Banner(_) => None,
            })
            .filter_map(|node| match node.tag {
                ElementTag::Task(id) => Some(id),
                ElementTag::Tentative { .. } => None,
            })
            .collect()
    }

    /// Number of attached placeholder elements
    pub fn placeholder_count(&self) -> usize {
        let page = self.page.borrow();
        page.children
            .iter()
            .filter_map(|child| match child {
                Child::Task(el) => page.node(el),
                Child::Banner(_) => None,
            })
            .filter(|node| matches!(node.tag, ElementTag::Tentative { .. }))
            .count()
    }

    /// The attached element tagged with `id`
    pub fn element(&self, id: TaskId) -> Option<MemoryElement> {
        let page = self.page.borrow();
        page.children.iter().find_map(|child| match child {
            Child::Task(el) => page
                .node(el)
                .filter(|node| node.tag == ElementTag::Task(id))
                .map(|_| *el),
            Child::Banner(_) => None,
        })
    }

    pub fn fields(&self, id: TaskId) -> Option<TaskFields> {
        self.element(id).and_then(|el| self.fields_of(&el))
    }

    pub fn fields_of(&self, element: &MemoryElement) -> Option<TaskFields> {
        self.page.borrow().node(element).map(|node| node.fields.clone())
    }

    pub fn is_attached(&self, element: &MemoryElement) -> bool {
        self.page
            .borrow()
            .children
            .contains(&Child::Task(*element))
    }

    /// Every write since creation or the last `clear_journal`
    pub fn journal(&self) -> Vec<Mutation> {
        self.page.borrow().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.page.borrow_mut().journal.clear();
    }

    /// Error banners, top first
    pub fn banners(&self) -> Vec<ErrorNotice> {
        self.page
            .borrow()
            .children
            .iter()
            .filter_map(|child| match child {
                Child::Banner(notice) => Some(*notice),
                Child::Task(_) => None,
            })
            .collect()
    }

    /// Click away the `index`-th banner from the top
    pub fn dismiss_banner(&self, index: usize) -> bool {
        let mut page = self.page.borrow_mut();
        let position = page
            .children
            .iter()
            .enumerate()
            .filter(|(_, child)| matches!(child, Child::Banner(_)))
            .nth(index)
            .map(|(pos, _)| pos);
        match position {
            Some(pos) => {
                page.children.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Type into the expression field
    pub fn set_input(&self, text: &str) {
        self.page.borrow_mut().input = text.to_string();
    }

    pub fn user_banner(&self) -> Option<String> {
        self.page.borrow().user.clone()
    }

    pub fn redirects(&self) -> Vec<String> {
        self.page.borrow().redirects.clone()
    }
}

impl TaskList for MemoryView {
    type Element = MemoryElement;

    fn create(&self, tag: ElementTag, fields: &TaskFields) -> Result<MemoryElement, ViewError> {
        let mut page = self.page.borrow_mut();
        let serial = page.next_serial;
        page.next_serial += 1;
        let key = page.nodes.insert(TaskNode {
            serial,
            tag,
            fields: fields.clone(),
        });
        page.journal.push(Mutation::Create(tag));
        Ok(MemoryElement { key, serial })
    }

    fn prepend(&self, element: &MemoryElement) {
        let mut page = self.page.borrow_mut();
        if page.node(element).is_none() {
            return;
        }
        page.children.retain(|child| *child != Child::Task(*element));
        page.children.insert(0, Child::Task(*element));
        page.journal.push(Mutation::Prepend(*element));
    }

    fn retag(&self, element: &MemoryElement, id: TaskId) {
        let mut page = self.page.borrow_mut();
        if let Some(node) = page.node_mut(element) {
            node.tag = ElementTag::Task(id);
            page.journal.push(Mutation::Retag(*element, id));
        }
    }

    fn set_status(&self, element: &MemoryElement, text: &str, finished: bool) {
        let mut page = self.page.borrow_mut();
        if let Some(node) = page.node_mut(element) {
            node.fields.status = text.to_string();
            node.fields.finished = finished;
            page.journal.push(Mutation::SetStatus(*element));
        }
    }

    fn set_expression(&self, element: &MemoryElement, text: &str) {
        let mut page = self.page.borrow_mut();
        if let Some(node) = page.node_mut(element) {
            node.fields.expression = text.to_string();
            page.journal.push(Mutation::SetExpression(*element));
        }
    }

    fn set_result(&self, element: &MemoryElement, text: &str) {
        let mut page = self.page.borrow_mut();
        if let Some(node) = page.node_mut(element) {
            node.fields.result = text.to_string();
            page.journal.push(Mutation::SetResult(*element));
        }
    }

    fn remove(&self, element: &MemoryElement) {
        let mut page = self.page.borrow_mut();
        if page.node(element).is_none() {
            return;
        }
        page.nodes.remove(element.key);
        page.children.retain(|child| *child != Child::Task(*element));
        page.journal.push(Mutation::Remove(*element));
    }
}

impl Notices for MemoryView {
    fn show_error(&self, notice: ErrorNotice) {
        self.page.borrow_mut().children.insert(0, Child::Banner(notice));
    }

    fn show_user(&self, username: &str) {
        self.page.borrow_mut().user = Some(username.to_string());
    }
}

impl ExpressionInput for MemoryView {
    fn value(&self) -> String {
        self.page.borrow().input.clone()
    }

    fn clear(&self) {
        self.page.borrow_mut().input.clear();
    }
}

impl Navigator for MemoryView {
    fn redirect(&self, url: &str) {
        self.page.borrow_mut().redirects.push(url.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Labels;
    use crate::task::Task;

    fn fields(status: &str) -> TaskFields {
        TaskFields::derive(&Task::new(1, status, "1+1", None), &Labels::default())
    }

    #[test]
    fn test_prepend_puts_element_on_top() {
        let view = MemoryView::new();
        let a = view.create(ElementTag::Task(TaskId(1)), &fields("Running")).unwrap();
        let b = view.create(ElementTag::Task(TaskId(2)), &fields("Running")).unwrap();
        view.prepend(&a);
        view.prepend(&b);
        assert_eq!(view.task_ids(), vec![TaskId(2), TaskId(1)]);
    }

    #[test]
    fn test_removed_handle_stays_dead() {
        let view = MemoryView::new();
        let a = view.create(ElementTag::Task(TaskId(1)), &fields("Running")).unwrap();
        view.prepend(&a);
        view.remove(&a);
        let b = view.create(ElementTag::Task(TaskId(2)), &fields("Running")).unwrap();
        view.prepend(&b);

        assert_ne!(a, b);
        assert!(!view.is_attached(&a));
        assert!(view.fields_of(&a).is_none());

        // Writes through the stale handle must not land on the new node
        view.set_status(&a, "Status: Finished", true);
        assert_eq!(view.fields_of(&b).unwrap().status, "Status: Running");
    }

    #[test]
    fn test_banners_sit_above_tasks_and_dismiss() {
        let view = MemoryView::new();
        let a = view.create(ElementTag::Task(TaskId(1)), &fields("Running")).unwrap();
        view.prepend(&a);
        view.show_error(ErrorNotice::Network);
        view.show_error(ErrorNotice::Rejected { status: 422 });

        assert_eq!(
            view.banners(),
            vec![ErrorNotice::Rejected { status: 422 }, ErrorNotice::Network]
        );
        assert!(view.dismiss_banner(0));
        assert_eq!(view.banners(), vec![ErrorNotice::Network]);
        assert!(!view.dismiss_banner(5));
        assert_eq!(view.task_ids(), vec![TaskId(1)]);
    }

    #[test]
    fn test_journal_records_writes() {
        let view = MemoryView::new();
        let a = view.create(ElementTag::Task(TaskId(1)), &fields("Running")).unwrap();
        view.prepend(&a);
        view.set_result(&a, "Result: 2");
        assert_eq!(
            view.journal(),
            vec![
                Mutation::Create(ElementTag::Task(TaskId(1))),
                Mutation::Prepend(a),
                Mutation::SetResult(a),
            ]
        );
        view.clear_journal();
        assert!(view.journal().is_empty());
    }

    #[test]
    fn test_input_and_navigation() {
        let view = MemoryView::new();
        view.set_input("2*3");
        assert_eq!(view.value(), "2*3");
        view.clear();
        assert_eq!(view.value(), "");

        view.redirect("/auth");
        assert_eq!(view.redirects(), vec!["/auth".to_string()]);
    }
}
