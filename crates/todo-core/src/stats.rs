use crate::todo::{Status, Todo};

/// Counters shown on the stats cards. Always computed over the unfiltered list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub done: usize,
    pub pending: usize,
    pub missed: usize,
    pub total: usize,
}

impl Stats {
    pub fn from_todos(todos: &[Todo]) -> Self {
        todos.iter().fold(
            Stats {
                total: todos.len(),
                ..Stats::default()
            },
            |mut acc, todo| {
                match todo.status {
                    Status::Done => acc.done += 1,
                    Status::Missed => acc.missed += 1,
                    Status::NotStarted | Status::InProgress => acc.pending += 1,
                }
                acc
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::Stats;
    use crate::todo::Todo;

    #[test]
    fn counts_every_status_once() {
        let todos: Vec<Todo> = serde_json::from_value(json!([
            {"id": 1, "status": "NOT_STARTED"},
            {"id": 2, "status": "IN_PROGRESS"},
            {"id": 3, "status": "DONE"},
            {"id": 4, "status": "MISSED"},
            {"id": 5, "status": "DONE"}
        ]))
        .expect("decode todos");

        let stats = Stats::from_todos(&todos);
        assert_eq!(
            stats,
            Stats {
                done: 2,
                pending: 2,
                missed: 1,
                total: 5,
            }
        );
        assert_eq!(stats.done + stats.pending + stats.missed, stats.total);
    }

    #[test]
    fn empty_list_is_all_zero() {
        assert_eq!(Stats::from_todos(&[]), Stats::default());
    }
}
