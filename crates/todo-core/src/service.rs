//! The todo service capability: list, create, full-replacement update and
//! delete against whatever holds the authoritative list.

use std::future::Future;

use crate::error::TodoError;
use crate::todo::{NewTodo, Todo, TodoId};

pub trait TodoService {
    fn list(&self) -> impl Future<Output = Result<Vec<Todo>, TodoError>>;

    fn create(&self, todo: &NewTodo) -> impl Future<Output = Result<Todo, TodoError>>;

    /// Replaces the whole record identified by `todo.id`.
    fn update(&self, todo: &Todo) -> impl Future<Output = Result<Todo, TodoError>>;

    fn delete(&self, id: &TodoId) -> impl Future<Output = Result<(), TodoError>>;
}

impl<S: TodoService> TodoService for &S {
    fn list(&self) -> impl Future<Output = Result<Vec<Todo>, TodoError>> {
        (**self).list()
    }

    fn create(&self, todo: &NewTodo) -> impl Future<Output = Result<Todo, TodoError>> {
        (**self).create(todo)
    }

    fn update(&self, todo: &Todo) -> impl Future<Output = Result<Todo, TodoError>> {
        (**self).update(todo)
    }

    fn delete(&self, id: &TodoId) -> impl Future<Output = Result<(), TodoError>> {
        (**self).delete(id)
    }
}

pub mod memory {
    //! In-process service used by tests and offline embedding.

    use std::cell::RefCell;
    use std::collections::{BTreeMap, HashSet};

    use tracing::debug;

    use super::TodoService;
    use crate::error::TodoError;
    use crate::todo::{NewTodo, Todo, TodoId};

    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        List,
        Create(NewTodo),
        Update(Todo),
        Delete(TodoId),
    }

    #[derive(Debug, Default)]
    pub struct MemoryTodoService {
        todos: RefCell<Vec<Todo>>,
        next_id: RefCell<u64>,
        calls: RefCell<Vec<Call>>,
        failing_updates: RefCell<HashSet<TodoId>>,
        offline: RefCell<bool>,
    }

    impl MemoryTodoService {
        pub fn new(todos: Vec<Todo>) -> Self {
            let next_id = todos
                .iter()
                .filter_map(|t| match t.id {
                    TodoId::Number(n) => Some(n),
                    TodoId::Text(_) => None,
                })
                .max()
                .unwrap_or(0)
                + 1;
            Self {
                todos: RefCell::new(todos),
                next_id: RefCell::new(next_id),
                ..Self::default()
            }
        }

        pub fn snapshot(&self) -> Vec<Todo> {
            self.todos.borrow().clone()
        }

        pub fn get(&self, id: &TodoId) -> Option<Todo> {
            self.todos.borrow().iter().find(|t| &t.id == id).cloned()
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        pub fn clear_calls(&self) {
            self.calls.borrow_mut().clear();
        }

        pub fn update_calls(&self) -> Vec<Todo> {
            self.calls
                .borrow()
                .iter()
                .filter_map(|call| match call {
                    Call::Update(todo) => Some(todo.clone()),
                    _ => None,
                })
                .collect()
        }

        /// Every later `update` of `id` answers HTTP 500.
        pub fn fail_updates_for(&self, id: TodoId) {
            self.failing_updates.borrow_mut().insert(id);
        }

        /// Every later call answers HTTP 503.
        pub fn set_offline(&self, offline: bool) {
            *self.offline.borrow_mut() = offline;
        }

        fn record(&self, call: Call) -> Result<(), TodoError> {
            debug!(?call, "memory service call");
            self.calls.borrow_mut().push(call);
            if *self.offline.borrow() {
                return Err(TodoError::Http {
                    status: 503,
                    method: "ANY",
                    path: "/todos".to_string(),
                    body: "service offline".to_string(),
                });
            }
            Ok(())
        }
    }

    impl TodoService for MemoryTodoService {
        async fn list(&self) -> Result<Vec<Todo>, TodoError> {
            self.record(Call::List)?;
            Ok(self.snapshot())
        }

        async fn create(&self, todo: &NewTodo) -> Result<Todo, TodoError> {
            self.record(Call::Create(todo.clone()))?;
            let id = {
                let mut next = self.next_id.borrow_mut();
                let id = *next;
                *next += 1;
                id
            };
            let created = Todo {
                id: TodoId::Number(id),
                title: todo.title.clone(),
                description: todo.description.clone(),
                deadline: Some(todo.deadline.clone()),
                priority: todo.priority,
                status: todo.status,
                extra: BTreeMap::new(),
            };
            self.todos.borrow_mut().push(created.clone());
            Ok(created)
        }

        async fn update(&self, todo: &Todo) -> Result<Todo, TodoError> {
            self.record(Call::Update(todo.clone()))?;
            if self.failing_updates.borrow().contains(&todo.id) {
                return Err(TodoError::Http {
                    status: 500,
                    method: "PUT",
                    path: format!("/todos/{}", todo.id),
                    body: "internal error".to_string(),
                });
            }
            let mut todos = self.todos.borrow_mut();
            let slot = todos
                .iter_mut()
                .find(|t| t.id == todo.id)
                .ok_or_else(|| TodoError::NotFound(todo.id.clone()))?;
            *slot = todo.clone();
            Ok(slot.clone())
        }

        async fn delete(&self, id: &TodoId) -> Result<(), TodoError> {
            self.record(Call::Delete(id.clone()))?;
            let mut todos = self.todos.borrow_mut();
            let before = todos.len();
            todos.retain(|t| &t.id != id);
            if todos.len() == before {
                return Err(TodoError::NotFound(id.clone()));
            }
            Ok(())
        }
    }
}
