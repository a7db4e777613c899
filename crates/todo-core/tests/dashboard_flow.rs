use chrono::NaiveDate;
use serde_json::json;
use todo_core::dashboard::{Dashboard, InitialStatus, InteractionMode, NoticeLevel};
use todo_core::datetime::FixedClock;
use todo_core::error::{MissingField, TodoError};
use todo_core::filter::Selector;
use todo_core::service::memory::{Call, MemoryTodoService};
use todo_core::stats::Stats;
use todo_core::todo::{Priority, Status, Todo, TodoId, TodoUpdate};

fn clock() -> FixedClock {
    FixedClock(NaiveDate::from_ymd_opt(2025, 1, 1).expect("valid date"))
}

fn todo(id: u64, deadline: &str, status: &str, priority: &str) -> Todo {
    serde_json::from_value(json!({
        "id": id,
        "title": format!("todo {id}"),
        "description": format!("about {id}"),
        "deadline": deadline,
        "priority": priority,
        "status": status
    }))
    .expect("decode todo")
}

fn seeded() -> MemoryTodoService {
    MemoryTodoService::new(vec![
        todo(1, "2020-01-01", "NOT_STARTED", "URGENT"),
        todo(2, "2099-01-01", "IN_PROGRESS", "NORMAL"),
        todo(3, "2020-06-01", "DONE", "LATER"),
        todo(4, "2099-02-01", "NOT_STARTED", "LATER"),
    ])
}

#[tokio::test]
async fn mount_loads_reconciles_and_reloads() {
    let service = seeded();
    let mut dashboard = Dashboard::new(&service, clock());

    dashboard.mount().await.expect("mount");

    let calls = service.calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0], Call::List);
    assert!(matches!(&calls[1], Call::Update(t) if t.id == TodoId::Number(1) && t.status == Status::Missed));
    assert_eq!(calls[2], Call::List);

    let first = dashboard.todo(&TodoId::Number(1)).expect("listed");
    assert_eq!(first.status, Status::Missed);
    assert_eq!(
        dashboard.todo(&TodoId::Number(3)).expect("listed").status,
        Status::Done
    );
    assert_eq!(
        dashboard.stats(),
        Stats {
            done: 1,
            pending: 2,
            missed: 1,
            total: 4,
        }
    );
}

#[tokio::test]
async fn second_refresh_sends_no_updates() {
    let service = seeded();
    let mut dashboard = Dashboard::new(&service, clock());
    dashboard.mount().await.expect("mount");
    let after_first = dashboard.todos().to_vec();
    service.clear_calls();

    let report = dashboard.refresh().await.expect("refresh");

    assert!(report.is_noop());
    assert_eq!(service.calls(), vec![Call::List, Call::List]);
    assert_eq!(dashboard.todos(), after_first.as_slice());
}

#[tokio::test]
async fn add_with_blank_fields_sends_nothing() {
    let service = seeded();
    let mut dashboard = Dashboard::new(&service, clock());
    dashboard.form_mut().title = "Write report".to_string();
    dashboard.form_mut().deadline = "2025-02-01".to_string();

    let err = dashboard.add_todo().await.expect_err("blank description");

    assert!(matches!(err, TodoError::Validation(ref m) if m == &vec![MissingField::Description]));
    assert!(service.calls().is_empty());
    assert_eq!(dashboard.form().title, "Write report");
    let notices = dashboard.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Blocking);
}

#[tokio::test]
async fn add_posts_defaults_and_resets_form() {
    let service = MemoryTodoService::new(vec![]);
    let mut dashboard = Dashboard::new(&service, clock());
    {
        let form = dashboard.form_mut();
        form.title = "Renew passport".to_string();
        form.description = "book appointment".to_string();
        form.deadline = "2025-03-01".to_string();
    }

    let created = dashboard.add_todo().await.expect("add");

    let calls = service.calls();
    let Call::Create(body) = &calls[0] else {
        panic!("expected create first");
    };
    assert_eq!(body.priority, Priority::Normal);
    assert_eq!(body.status, Status::NotStarted);
    assert_eq!(created.title, "Renew passport");
    assert_eq!(dashboard.todos().len(), 1);
    assert_eq!(dashboard.form().title, "");
    assert_eq!(dashboard.form().status, InitialStatus::NotStarted);
}

#[tokio::test]
async fn quick_update_submits_full_record_and_closes_menu() {
    let service = seeded();
    let mut dashboard = Dashboard::new(&service, clock());
    dashboard.mount().await.expect("mount");
    service.clear_calls();

    let id = TodoId::Number(2);
    dashboard.toggle_menu(&id);
    assert_eq!(dashboard.mode().menu_target(), Some(&id));

    dashboard
        .quick_update(&id, TodoUpdate::priority(Priority::Urgent))
        .await
        .expect("update");

    let updates = service.update_calls();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].priority, Priority::Urgent);
    assert_eq!(updates[0].status, Status::InProgress);
    assert_eq!(updates[0].title, "todo 2");
    assert_eq!(updates[0].deadline.as_deref(), Some("2099-01-01"));
    assert_eq!(dashboard.mode(), &InteractionMode::Browsing);
}

#[tokio::test]
async fn missed_todo_cannot_be_moved_back() {
    let service = seeded();
    let mut dashboard = Dashboard::new(&service, clock());
    dashboard.mount().await.expect("mount");
    service.clear_calls();

    let err = dashboard
        .mark_done(&TodoId::Number(1))
        .await
        .expect_err("missed is final");

    assert!(matches!(err, TodoError::IllegalTransition { from: Status::Missed, .. }));
    assert!(service.calls().is_empty());

    dashboard
        .quick_update(&TodoId::Number(1), TodoUpdate::priority(Priority::Later))
        .await
        .expect("priority change is fine");
}

#[tokio::test]
async fn edit_then_save_merges_draft() {
    let service = seeded();
    let mut dashboard = Dashboard::new(&service, clock());
    dashboard.mount().await.expect("mount");

    let id = TodoId::Number(4);
    dashboard.toggle_menu(&id);
    dashboard.start_edit(&id).expect("start edit");
    assert_eq!(dashboard.mode().edit_target(), Some(&id));
    assert!(dashboard.mode().menu_target().is_none());

    {
        let draft = dashboard.draft_mut().expect("draft");
        draft.title = "Clean garage".to_string();
        draft.status = Status::Done;
    }
    assert_eq!(
        dashboard.todo(&id).expect("listed").title,
        "todo 4",
        "draft must not touch the listed record"
    );

    dashboard.save_edit().await.expect("save");

    let saved = service.get(&id).expect("stored");
    assert_eq!(saved.title, "Clean garage");
    assert_eq!(saved.status, Status::Done);
    assert_eq!(saved.description, "about 4");
    assert_eq!(dashboard.mode(), &InteractionMode::Browsing);
    assert_eq!(dashboard.stats().done, 2);
}

#[tokio::test]
async fn starting_another_edit_replaces_draft() {
    let service = seeded();
    let mut dashboard = Dashboard::new(&service, clock());
    dashboard.mount().await.expect("mount");

    dashboard.start_edit(&TodoId::Number(2)).expect("edit 2");
    if let Some(draft) = dashboard.draft_mut() {
        draft.title = "discarded".to_string();
    }
    dashboard.start_edit(&TodoId::Number(4)).expect("edit 4");

    let InteractionMode::Editing { id, draft } = dashboard.mode() else {
        panic!("expected editing");
    };
    assert_eq!(id, &TodoId::Number(4));
    assert_eq!(draft.title, "todo 4");

    dashboard.cancel_edit();
    assert!(matches!(
        dashboard.save_edit().await,
        Err(TodoError::NoActiveEdit)
    ));
}

#[tokio::test]
async fn failed_save_keeps_draft_for_retry() {
    let service = seeded();
    let mut dashboard = Dashboard::new(&service, clock());
    dashboard.mount().await.expect("mount");
    let id = TodoId::Number(2);
    service.fail_updates_for(id.clone());

    dashboard.start_edit(&id).expect("edit");
    let err = dashboard.save_edit().await.expect_err("server error");

    assert!(err.is_remote());
    assert_eq!(dashboard.mode().edit_target(), Some(&id));
    let notices = dashboard.take_notices();
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn reconcile_failures_surface_one_warning() {
    let service = MemoryTodoService::new(vec![
        todo(1, "2020-01-01", "NOT_STARTED", "NORMAL"),
        todo(2, "2020-01-02", "NOT_STARTED", "NORMAL"),
        todo(3, "2020-01-03", "IN_PROGRESS", "NORMAL"),
    ]);
    service.fail_updates_for(TodoId::Number(1));
    service.fail_updates_for(TodoId::Number(3));
    let mut dashboard = Dashboard::new(&service, clock());

    let report = dashboard.refresh().await.expect("refresh still succeeds");

    assert_eq!(report.missed, vec![TodoId::Number(2)]);
    assert_eq!(report.failed.len(), 2);
    let notices = dashboard.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Warning);
    assert!(notices[0].message.contains("2 of 3"));
}

#[tokio::test]
async fn failed_load_keeps_previous_list() {
    let service = seeded();
    let mut dashboard = Dashboard::new(&service, clock());
    dashboard.mount().await.expect("mount");
    service.set_offline(true);

    dashboard.refresh().await.expect_err("offline");

    assert_eq!(dashboard.todos().len(), 4);
    assert_eq!(dashboard.take_notices()[0].level, NoticeLevel::Error);

    service.set_offline(false);
    dashboard.refresh().await.expect("recovered");
}

#[tokio::test]
async fn filters_narrow_view_but_not_stats() {
    let service = seeded();
    let mut dashboard = Dashboard::new(&service, clock());
    dashboard.mount().await.expect("mount");

    dashboard.set_status_filter(Selector::Only(Status::Done));
    let visible: Vec<TodoId> = dashboard.visible().iter().map(|t| t.id.clone()).collect();
    assert_eq!(visible, vec![TodoId::Number(3)]);
    assert_eq!(dashboard.stats().total, 4);

    dashboard.set_status_filter(Selector::All);
    dashboard.set_priority_filter(Selector::Only(Priority::Later));
    assert_eq!(dashboard.visible().len(), 2);
}

#[tokio::test]
async fn delete_removes_todo_and_closes_its_menu() {
    let service = seeded();
    let mut dashboard = Dashboard::new(&service, clock());
    dashboard.mount().await.expect("mount");

    let id = TodoId::Number(4);
    dashboard.toggle_menu(&id);
    dashboard.delete_todo(&id).await.expect("delete");

    assert!(dashboard.todo(&id).is_none());
    assert_eq!(dashboard.mode(), &InteractionMode::Browsing);
    assert!(service.get(&id).is_none());
}

#[test]
fn menu_toggle_closes_on_second_press() {
    let service = MemoryTodoService::new(vec![]);
    let mut dashboard = Dashboard::new(&service, clock());
    let id = TodoId::Number(9);

    dashboard.toggle_menu(&id);
    dashboard.toggle_menu(&id);
    assert_eq!(dashboard.mode(), &InteractionMode::Browsing);

    dashboard.toggle_menu(&id);
    dashboard.close_menu();
    assert_eq!(dashboard.mode(), &InteractionMode::Browsing);
}
