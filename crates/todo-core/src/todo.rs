use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::datetime::format_date;
use crate::error::TodoError;

/// Server-assigned identifier. Numbers and strings are both accepted and
/// echoed back in the form the server used.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TodoId {
    Number(u64),
    Text(String),
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TodoId::Number(n) => write!(f, "{n}"),
            TodoId::Text(s) => f.write_str(s),
        }
    }
}

// Ids typed on the command line are always parsed as numbers first, so
// `Number(7)` and `Text("7")` must name the same todo.
impl PartialEq for TodoId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (TodoId::Number(a), TodoId::Number(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl Eq for TodoId {}

impl Hash for TodoId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl FromStr for TodoId {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(TodoError::InvalidSelector {
                value: s.to_string(),
                expected: "a todo id",
            });
        }
        Ok(trimmed
            .parse::<u64>()
            .map(TodoId::Number)
            .unwrap_or_else(|_| TodoId::Text(trimmed.to_string())))
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Urgent,
    #[default]
    Normal,
    Later,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Urgent, Priority::Normal, Priority::Later];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Urgent => "URGENT",
            Priority::Normal => "NORMAL",
            Priority::Later => "LATER",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    #[default]
    NotStarted,
    InProgress,
    Done,
    Missed,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::NotStarted,
        Status::InProgress,
        Status::Done,
        Status::Missed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::NotStarted => "NOT_STARTED",
            Status::InProgress => "IN_PROGRESS",
            Status::Done => "DONE",
            Status::Missed => "MISSED",
        }
    }

    /// DONE and MISSED are never rewritten by reconciliation.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Done | Status::Missed)
    }

    pub fn is_pending(self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_wire_name(s);
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str() == wanted)
            .ok_or_else(|| TodoError::InvalidSelector {
                value: s.to_string(),
                expected: "URGENT, NORMAL, LATER",
            })
    }
}

impl FromStr for Status {
    type Err = TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_wire_name(s);
        Status::ALL
            .into_iter()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| TodoError::InvalidSelector {
                value: s.to_string(),
                expected: "NOT_STARTED, IN_PROGRESS, DONE, MISSED",
            })
    }
}

pub(crate) fn normalize_wire_name(s: &str) -> String {
    s.trim().to_ascii_uppercase().replace('-', "_")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Todo {
    pub id: TodoId,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    /// ISO `YYYY-MM-DD`, kept as the server sent it.
    #[serde(default)]
    pub deadline: Option<String>,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub status: Status,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Todo {
    /// Deadlines compare as ISO strings against today's ISO date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        let today = format_date(today);
        self.deadline
            .as_deref()
            .map(str::trim)
            .is_some_and(|deadline| !deadline.is_empty() && deadline < today.as_str())
    }

    pub fn needs_missed_mark(&self, today: NaiveDate) -> bool {
        self.status.is_pending() && self.is_overdue(today)
    }
}

/// Body of `POST /todos`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub description: String,
    pub deadline: String,
    pub priority: Priority,
    pub status: Status,
}

/// Field replacements for a quick update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<String>,
    pub status: Option<Status>,
    pub priority: Option<Priority>,
}

impl TodoUpdate {
    pub fn status(status: Status) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges onto a full record, producing the body of a full-replacement PUT.
    pub fn apply_to(&self, mut todo: Todo) -> Todo {
        if let Some(title) = &self.title {
            todo.title = title.clone();
        }
        if let Some(description) = &self.description {
            todo.description = description.clone();
        }
        if let Some(deadline) = &self.deadline {
            todo.deadline = Some(deadline.clone());
        }
        if let Some(status) = self.status {
            todo.status = status;
        }
        if let Some(priority) = self.priority {
            todo.priority = priority;
        }
        todo
    }
}
