use chrono::NaiveDate;
use proptest::prelude::*;
use todo_core::filter::{Selector, TodoFilter};
use todo_core::reconcile::reconcile;
use todo_core::service::memory::MemoryTodoService;
use todo_core::stats::Stats;
use todo_core::todo::{Priority, Status, Todo, TodoId};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid date")
}

fn arb_status() -> impl Strategy<Value = Status> {
    prop_oneof![
        Just(Status::NotStarted),
        Just(Status::InProgress),
        Just(Status::Done),
        Just(Status::Missed),
    ]
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::Urgent), Just(Priority::Normal), Just(Priority::Later)]
}

fn arb_deadline() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        1 => Just(None),
        8 => (2024i32..2027, 1u32..13, 1u32..29)
            .prop_map(|(y, m, d)| Some(format!("{y:04}-{m:02}-{d:02}"))),
    ]
}

fn arb_todos() -> impl Strategy<Value = Vec<Todo>> {
    prop::collection::vec((arb_status(), arb_priority(), arb_deadline()), 0..24).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(idx, (status, priority, deadline))| Todo {
                id: TodoId::Number(idx as u64 + 1),
                title: format!("todo {idx}"),
                description: String::new(),
                deadline,
                priority,
                status,
                extra: Default::default(),
            })
            .collect()
    })
}

fn run_reconcile(service: &MemoryTodoService) -> usize {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime");
    runtime.block_on(async {
        let list = service.snapshot();
        reconcile(service, &list, today()).await.attempted
    })
}

proptest! {
    #[test]
    fn all_all_filter_is_identity(todos in arb_todos()) {
        let kept: Vec<Todo> = TodoFilter::default().apply(&todos).into_iter().cloned().collect();
        prop_assert_eq!(kept, todos);
    }

    #[test]
    fn status_filter_and_complement_partition(todos in arb_todos(), status in arb_status()) {
        let selected = TodoFilter::new(Selector::Only(status), Selector::All).apply(&todos).len();
        let rest = todos.iter().filter(|t| t.status != status).count();
        prop_assert_eq!(selected + rest, todos.len());
    }

    #[test]
    fn stats_cover_every_todo(todos in arb_todos()) {
        let stats = Stats::from_todos(&todos);
        prop_assert_eq!(stats.done + stats.pending + stats.missed, stats.total);
        prop_assert_eq!(stats.total, todos.len());
    }

    #[test]
    fn reconcile_marks_exactly_overdue_pending(todos in arb_todos()) {
        let service = MemoryTodoService::new(todos.clone());
        run_reconcile(&service);

        for (before, after) in todos.iter().zip(service.snapshot()) {
            if before.needs_missed_mark(today()) {
                prop_assert_eq!(after.status, Status::Missed);
            } else {
                prop_assert_eq!(after.status, before.status);
            }
            prop_assert_eq!(&after.title, &before.title);
            prop_assert_eq!(&after.deadline, &before.deadline);
        }
    }

    #[test]
    fn reconcile_is_idempotent(todos in arb_todos()) {
        let service = MemoryTodoService::new(todos);
        run_reconcile(&service);
        let once = service.snapshot();

        let second_pass = run_reconcile(&service);

        prop_assert_eq!(second_pass, 0);
        prop_assert_eq!(service.snapshot(), once);
    }
}
