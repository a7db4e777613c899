//! Auto-miss reconciliation.
//!
//! Every todo whose deadline is before today and whose status is not terminal
//! is moved to MISSED with one full-replacement update. Updates run strictly
//! one after another. A failed item is logged and skipped; the pass never
//! aborts. The input list is not patched: callers reload from the service.

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::datetime::format_date;
use crate::service::TodoService;
use crate::todo::{Status, Todo, TodoId};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub today: Option<NaiveDate>,
    pub attempted: usize,
    pub missed: Vec<TodoId>,
    pub failed: Vec<(TodoId, String)>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.attempted == 0
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// One-line aggregate for a user-facing warning.
    pub fn failure_summary(&self) -> Option<String> {
        if self.failed.is_empty() {
            return None;
        }
        let ids = self
            .failed
            .iter()
            .map(|(id, _)| id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!(
            "could not mark {} of {} overdue todo(s) as MISSED: {ids}",
            self.failed.len(),
            self.attempted
        ))
    }
}

/// Todos the pass would touch, in list order.
pub fn overdue(todos: &[Todo], today: NaiveDate) -> impl Iterator<Item = &Todo> {
    todos.iter().filter(move |todo| todo.needs_missed_mark(today))
}

#[tracing::instrument(skip(service, todos), fields(today = %format_date(today), total = todos.len()))]
pub async fn reconcile<S: TodoService>(
    service: &S,
    todos: &[Todo],
    today: NaiveDate,
) -> ReconcileReport {
    let mut report = ReconcileReport {
        today: Some(today),
        ..ReconcileReport::default()
    };

    for todo in overdue(todos, today) {
        report.attempted += 1;
        let mut next = todo.clone();
        next.status = Status::Missed;

        match service.update(&next).await {
            Ok(_) => {
                info!(
                    id = %todo.id,
                    deadline = todo.deadline.as_deref().unwrap_or_default(),
                    from = %todo.status,
                    "marked overdue todo as missed"
                );
                report.missed.push(todo.id.clone());
            }
            Err(error) => {
                warn!(id = %todo.id, %error, "failed to mark overdue todo as missed; continuing");
                report.failed.push((todo.id.clone(), error.to_string()));
            }
        }
    }

    debug!(
        attempted = report.attempted,
        missed = report.missed.len(),
        failed = report.failed.len(),
        "reconciliation pass finished"
    );
    report
}
