//! REST implementation of [`TodoService`].
//!
//! `GET /todos`, `POST /todos`, `PUT /todos/{id}` (full body) and
//! `DELETE /todos/{id}`, each carrying only `Authorization: Bearer`.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::TodoError;
use crate::service::TodoService;
use crate::session::Session;
use crate::todo::{NewTodo, Todo, TodoId};

#[derive(Debug, Clone)]
pub struct HttpTodoService {
    client: reqwest::Client,
    base_url: String,
    session: Session,
}

impl HttpTodoService {
    pub fn new(base_url: &str, session: Session, timeout: Duration) -> Result<Self, TodoError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(self.session.token())
    }

    async fn send(
        &self,
        request: RequestBuilder,
        method: &'static str,
        path: &str,
    ) -> Result<Response, TodoError> {
        debug!(method, path, "sending request");
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!(method, path, status = status.as_u16(), "request rejected");
        if status == StatusCode::UNAUTHORIZED {
            return Err(TodoError::NotAuthenticated);
        }
        Err(TodoError::Http {
            status: status.as_u16(),
            method,
            path: path.to_string(),
            body,
        })
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, TodoError> {
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

fn todo_path(id: &TodoId) -> String {
    format!("/todos/{id}")
}

impl TodoService for HttpTodoService {
    #[tracing::instrument(skip(self))]
    async fn list(&self) -> Result<Vec<Todo>, TodoError> {
        let path = "/todos";
        let response = self.send(self.request(Method::GET, path), "GET", path).await?;
        let todos: Vec<Todo> = Self::decode(response).await?;
        debug!(count = todos.len(), "fetched todos");
        Ok(todos)
    }

    #[tracing::instrument(skip(self, todo), fields(title = %todo.title))]
    async fn create(&self, todo: &NewTodo) -> Result<Todo, TodoError> {
        let path = "/todos";
        let request = self.request(Method::POST, path).json(todo);
        let response = self.send(request, "POST", path).await?;
        Self::decode(response).await
    }

    #[tracing::instrument(skip(self, todo), fields(id = %todo.id))]
    async fn update(&self, todo: &Todo) -> Result<Todo, TodoError> {
        let path = todo_path(&todo.id);
        let request = self.request(Method::PUT, &path).json(todo);
        let response = self.send(request, "PUT", &path).await?;
        Self::decode(response).await
    }

    #[tracing::instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: &TodoId) -> Result<(), TodoError> {
        let path = todo_path(id);
        self.send(self.request(Method::DELETE, &path), "DELETE", &path)
            .await?;
        Ok(())
    }
}
