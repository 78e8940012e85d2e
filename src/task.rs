//! Task records as served by the backend
//!
//! A task is one submitted expression plus its evaluation state. The
//! backend owns these; the client only ever reads them and projects them
//! into the view.

use crate::config::Labels;
use serde::{Deserialize, Serialize};

/// Status string with special meaning to the view
pub const FINISHED: &str = "Finished";

/// Task identifier, the sole key between server records and view elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub i64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task status. Anything other than "Finished" is treated as in progress
/// and shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Finished,
    Other(String),
}

impl TaskStatus {
    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Finished => FINISHED,
            TaskStatus::Other(s) => s,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, TaskStatus::Finished)
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        if s == FINISHED {
            TaskStatus::Finished
        } else {
            TaskStatus::Other(s)
        }
    }
}

impl From<&str> for TaskStatus {
    fn from(s: &str) -> Self {
        TaskStatus::from(s.to_string())
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Finished => FINISHED.to_string(),
            TaskStatus::Other(s) => s,
        }
    }
}

/// Computed value. The backend sends a number once finished and may send
/// a string or null while the task is still running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskResult {
    Number(serde_json::Number),
    Text(String),
}

impl TaskResult {
    pub fn text(&self) -> String {
        match self {
            TaskResult::Number(n) => n.to_string(),
            TaskResult::Text(s) => s.clone(),
        }
    }
}

/// One task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub status: TaskStatus,
    #[serde(default)]
    pub original_expression: String,
    #[serde(default)]
    pub result: Option<TaskResult>,
}

impl Task {
    pub fn new(id: i64, status: &str, expression: &str, result: Option<TaskResult>) -> Self {
        Self {
            id: TaskId(id),
            status: TaskStatus::from(status),
            original_expression: expression.to_string(),
            result,
        }
    }

    pub fn result_text(&self) -> String {
        self.result.as_ref().map(TaskResult::text).unwrap_or_default()
    }
}

/// Display text of the three comparable sub-regions of a task element.
///
/// Two `TaskFields` compare equal exactly when rendering one over the other
/// is a no-op, which is what the reconciler diffs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFields {
    pub status: String,
    pub expression: String,
    pub result: String,
    pub finished: bool,
}

impl TaskFields {
    pub fn derive(task: &Task, labels: &Labels) -> Self {
        Self {
            status: format!("{}{}", labels.status, task.status.as_str()),
            expression: format!("{}{}", labels.expression, task.original_expression),
            result: format!("{}{}", labels.result, task.result_text()),
            finished: task.status.is_finished(),
        }
    }

    /// Fields for a submission the server has not listed yet
    pub fn placeholder(expression: &str, labels: &Labels) -> Self {
        Self {
            status: format!("{}{}", labels.status, labels.submitted),
            expression: format!("{}{}", labels.expression, expression),
            result: labels.result.clone(),
            finished: false,
        }
    }
}

/// Body of `POST /api/v1/calculate`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub expression: String,
}
