//! Dashboard view model.
//!
//! Holds the last authoritative list plus local UI state (filters, the
//! new-todo form, the interaction mode and pending notices). Every mutation
//! is followed by a full reload through [`Dashboard::refresh`], which first
//! runs the auto-miss pass. Reloading is O(n) per mutation and assumes small
//! personal lists.

use tracing::{debug, info, instrument, warn};

use crate::datetime::{Clock, SystemClock, parse_deadline};
use crate::error::{MissingField, TodoError};
use crate::filter::{PriorityFilter, StatusFilter, TodoFilter};
use crate::reconcile::{ReconcileReport, reconcile};
use crate::service::TodoService;
use crate::stats::Stats;
use crate::todo::{NewTodo, Priority, Status, Todo, TodoId, TodoUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Stops the action; nothing was sent.
    Blocking,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Statuses a todo may be created with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InitialStatus {
    #[default]
    NotStarted,
    InProgress,
}

impl From<InitialStatus> for Status {
    fn from(value: InitialStatus) -> Self {
        match value {
            InitialStatus::NotStarted => Status::NotStarted,
            InitialStatus::InProgress => Status::InProgress,
        }
    }
}

impl TryFrom<Status> for InitialStatus {
    type Error = TodoError;

    fn try_from(value: Status) -> Result<Self, Self::Error> {
        match value {
            Status::NotStarted => Ok(InitialStatus::NotStarted),
            Status::InProgress => Ok(InitialStatus::InProgress),
            other => Err(TodoError::InvalidSelector {
                value: other.to_string(),
                expected: "NOT_STARTED, IN_PROGRESS",
            }),
        }
    }
}

/// The add-task form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTodoForm {
    pub title: String,
    pub description: String,
    pub deadline: String,
    pub priority: Priority,
    pub status: InitialStatus,
}

impl NewTodoForm {
    /// Blank required fields are reported together; a present deadline must
    /// also be a real `YYYY-MM-DD` date.
    pub fn validate(&self) -> Result<NewTodo, TodoError> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push(MissingField::Title);
        }
        if self.description.trim().is_empty() {
            missing.push(MissingField::Description);
        }
        if self.deadline.trim().is_empty() {
            missing.push(MissingField::Deadline);
        }
        if !missing.is_empty() {
            return Err(TodoError::Validation(missing));
        }

        parse_deadline(&self.deadline)?;
        Ok(NewTodo {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            deadline: self.deadline.trim().to_string(),
            priority: self.priority,
            status: self.status.into(),
        })
    }
}

/// Local copy of the editable fields of one todo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub title: String,
    pub description: String,
    pub deadline: Option<String>,
    pub status: Status,
    pub priority: Priority,
}

impl From<&Todo> for EditDraft {
    fn from(todo: &Todo) -> Self {
        Self {
            title: todo.title.clone(),
            description: todo.description.clone(),
            deadline: todo.deadline.clone(),
            status: todo.status,
            priority: todo.priority,
        }
    }
}

impl EditDraft {
    pub fn apply_to(&self, mut todo: Todo) -> Todo {
        todo.title = self.title.clone();
        todo.description = self.description.clone();
        todo.deadline = self.deadline.clone();
        todo.status = self.status;
        todo.priority = self.priority;
        todo
    }
}

/// At most one todo is being edited or has its quick-action menu open, never
/// both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InteractionMode {
    #[default]
    Browsing,
    Menu {
        id: TodoId,
    },
    Editing {
        id: TodoId,
        draft: EditDraft,
    },
}

impl InteractionMode {
    pub fn menu_target(&self) -> Option<&TodoId> {
        match self {
            InteractionMode::Menu { id } => Some(id),
            _ => None,
        }
    }

    pub fn edit_target(&self) -> Option<&TodoId> {
        match self {
            InteractionMode::Editing { id, .. } => Some(id),
            _ => None,
        }
    }
}

pub struct Dashboard<S, C = SystemClock> {
    service: S,
    clock: C,
    todos: Vec<Todo>,
    filter: TodoFilter,
    form: NewTodoForm,
    mode: InteractionMode,
    notices: Vec<Notice>,
    last_report: Option<ReconcileReport>,
}

impl<S: TodoService, C: Clock> Dashboard<S, C> {
    pub fn new(service: S, clock: C) -> Self {
        Self {
            service,
            clock,
            todos: Vec::new(),
            filter: TodoFilter::default(),
            form: NewTodoForm::default(),
            mode: InteractionMode::Browsing,
            notices: Vec::new(),
            last_report: None,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn todo(&self, id: &TodoId) -> Option<&Todo> {
        self.todos.iter().find(|t| &t.id == id)
    }

    pub fn filter(&self) -> TodoFilter {
        self.filter
    }

    pub fn set_status_filter(&mut self, status: StatusFilter) {
        self.filter.status = status;
    }

    pub fn set_priority_filter(&mut self, priority: PriorityFilter) {
        self.filter.priority = priority;
    }

    pub fn visible(&self) -> Vec<&Todo> {
        self.filter.apply(&self.todos)
    }

    pub fn stats(&self) -> Stats {
        Stats::from_todos(&self.todos)
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn form(&self) -> &NewTodoForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut NewTodoForm {
        &mut self.form
    }

    pub fn last_report(&self) -> Option<&ReconcileReport> {
        self.last_report.as_ref()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        let message = message.into();
        debug!(?level, %message, "notice");
        self.notices.push(Notice { level, message });
    }

    /// Surfaces a failed remote call without dropping local state.
    fn report_failure(&mut self, action: &str, error: TodoError) -> TodoError {
        warn!(action, %error, "operation failed");
        self.notify(NoticeLevel::Error, format!("{action} failed: {error}"));
        error
    }

    pub async fn mount(&mut self) -> Result<(), TodoError> {
        self.refresh().await.map(|_| ())
    }

    /// Load, auto-miss overdue todos, then load again.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<ReconcileReport, TodoError> {
        let fetched = match self.service.list().await {
            Ok(todos) => todos,
            Err(error) => return Err(self.report_failure("loading todos", error)),
        };

        let today = self.clock.today();
        let report = reconcile(&self.service, &fetched, today).await;
        if let Some(summary) = report.failure_summary() {
            self.notify(NoticeLevel::Warning, summary);
        }

        let updated = match self.service.list().await {
            Ok(todos) => todos,
            Err(error) => return Err(self.report_failure("loading todos", error)),
        };

        info!(
            count = updated.len(),
            auto_missed = report.missed.len(),
            "todo list refreshed"
        );
        self.todos = updated;
        self.drop_stale_mode();
        self.last_report = Some(report.clone());
        Ok(report)
    }

    // A menu or draft for a todo that vanished server-side is meaningless.
    fn drop_stale_mode(&mut self) {
        let target = match &self.mode {
            InteractionMode::Browsing => return,
            InteractionMode::Menu { id } | InteractionMode::Editing { id, .. } => id,
        };
        if !self.todos.iter().any(|t| &t.id == target) {
            debug!(id = %target, "target no longer listed; leaving mode");
            self.mode = InteractionMode::Browsing;
        }
    }

    /// Submits the add form. Validation failures send nothing and leave the
    /// form as typed.
    #[instrument(skip(self))]
    pub async fn add_todo(&mut self) -> Result<Todo, TodoError> {
        let new_todo = match self.form.validate() {
            Ok(new_todo) => new_todo,
            Err(error) => {
                self.notify(NoticeLevel::Blocking, error.to_string());
                return Err(error);
            }
        };

        let created = match self.service.create(&new_todo).await {
            Ok(created) => created,
            Err(error) => return Err(self.report_failure("creating todo", error)),
        };
        info!(id = %created.id, "created todo");

        self.form = NewTodoForm::default();
        self.refresh().await?;
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn delete_todo(&mut self, id: &TodoId) -> Result<(), TodoError> {
        if let Err(error) = self.service.delete(id).await {
            return Err(self.report_failure("deleting todo", error));
        }
        info!(%id, "deleted todo");
        self.refresh().await?;
        Ok(())
    }

    /// Merges `update` onto the current record and submits the full result.
    #[instrument(skip(self))]
    pub async fn quick_update(&mut self, id: &TodoId, update: TodoUpdate) -> Result<(), TodoError> {
        let current = self
            .todo(id)
            .cloned()
            .ok_or_else(|| TodoError::NotFound(id.clone()))?;
        if let Some(status) = update.status {
            check_transition(&current, status)?;
        }
        let merged = update.apply_to(current);

        if let Err(error) = self.service.update(&merged).await {
            return Err(self.report_failure("updating todo", error));
        }
        info!(%id, "updated todo");
        if self.mode.menu_target().is_some() {
            self.mode = InteractionMode::Browsing;
        }
        self.refresh().await?;
        Ok(())
    }

    pub async fn mark_done(&mut self, id: &TodoId) -> Result<(), TodoError> {
        self.quick_update(id, TodoUpdate::status(Status::Done)).await
    }

    /// Opens the quick-action menu for `id`, or closes it if it is already
    /// open. Leaves edit mode.
    pub fn toggle_menu(&mut self, id: &TodoId) {
        self.mode = match &self.mode {
            InteractionMode::Menu { id: open } if open == id => InteractionMode::Browsing,
            _ => InteractionMode::Menu { id: id.clone() },
        };
    }

    pub fn close_menu(&mut self) {
        if self.mode.menu_target().is_some() {
            self.mode = InteractionMode::Browsing;
        }
    }

    /// Captures a draft of `id`, replacing any other draft.
    pub fn start_edit(&mut self, id: &TodoId) -> Result<(), TodoError> {
        let todo = self.todo(id).ok_or_else(|| TodoError::NotFound(id.clone()))?;
        let draft = EditDraft::from(todo);
        self.mode = InteractionMode::Editing {
            id: id.clone(),
            draft,
        };
        Ok(())
    }

    pub fn draft_mut(&mut self) -> Option<&mut EditDraft> {
        match &mut self.mode {
            InteractionMode::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    pub fn cancel_edit(&mut self) {
        if self.mode.edit_target().is_some() {
            self.mode = InteractionMode::Browsing;
        }
    }

    /// Merges the draft onto the listed record and submits it. On failure
    /// the draft is kept so the save can be retried.
    #[instrument(skip(self))]
    pub async fn save_edit(&mut self) -> Result<(), TodoError> {
        let InteractionMode::Editing { id, draft } = &self.mode else {
            return Err(TodoError::NoActiveEdit);
        };
        let original = self
            .todo(id)
            .cloned()
            .ok_or_else(|| TodoError::NotFound(id.clone()))?;
        if let Some(deadline) = draft.deadline.as_deref()
            && !deadline.trim().is_empty()
        {
            parse_deadline(deadline)?;
        }
        check_transition(&original, draft.status)?;
        let merged = draft.apply_to(original);

        if let Err(error) = self.service.update(&merged).await {
            return Err(self.report_failure("saving todo", error));
        }
        info!(id = %merged.id, "saved edit");
        self.mode = InteractionMode::Browsing;
        self.refresh().await?;
        Ok(())
    }
}

/// MISSED is never reversed by the user.
fn check_transition(todo: &Todo, to: Status) -> Result<(), TodoError> {
    if todo.status == Status::Missed && to != Status::Missed {
        return Err(TodoError::IllegalTransition {
            id: todo.id.clone(),
            from: todo.status,
            to,
        });
    }
    Ok(())
}
