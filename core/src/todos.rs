//! Todo manager: owns the in-memory todo collection and its CRUD operations.
//!
//! # Design
//! The cache is a mirror of server state, never the source of truth:
//! `refresh` replaces it wholesale, `add` appends the server-returned item,
//! `update` replaces the matching cached item by id (an id the cache does not
//! hold is left alone — no insert), `remove` drops by id. Insertion order is
//! fetch/append order; nothing is re-sorted.
//!
//! Every operation requires a credential and fails with `Unauthenticated`
//! when none is stored. Failures are recorded in `last_error` and published
//! as `TodoEvent::Error` in addition to being returned, so observers and
//! direct callers see the same outcome.

use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};

use chrono::{SecondsFormat, Utc};
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::Transport;
use crate::session::SessionStore;
use crate::types::{CreateTodo, TodoItem, UpdateTodo};

/// State-change notifications published by the todo manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoEvent {
    Refreshed,
    Added(i64),
    Updated(i64),
    Removed(i64),
    Error(String),
}

#[derive(Default)]
struct TodoInner {
    todos: Vec<TodoItem>,
    last_error: Option<String>,
    subscribers: Vec<mpsc::Sender<TodoEvent>>,
}

/// Owns the ordered todo cache and mutates it against the backend.
#[derive(Clone)]
pub struct TodoManager {
    api: ApiClient,
    transport: Arc<dyn Transport>,
    session: SessionStore,
    inner: Arc<Mutex<TodoInner>>,
}

impl TodoManager {
    pub fn new(api: ApiClient, transport: Arc<dyn Transport>, session: SessionStore) -> Self {
        Self {
            api,
            transport,
            session,
            inner: Arc::new(Mutex::new(TodoInner::default())),
        }
    }

    /// Fetch all todos and replace the cache wholesale.
    pub fn refresh(&self) -> Result<Vec<TodoItem>, ApiError> {
        let result = self.require_credential().and_then(|token| {
            let req = self.api.build_list_todos(&token);
            self.transport
                .send(req)
                .and_then(|resp| self.api.parse_list_todos(resp))
        });
        match result {
            Ok(todos) => {
                debug!(count = todos.len(), "todo cache replaced");
                let mut inner = self.locked();
                inner.todos = todos.clone();
                inner.last_error = None;
                emit(&mut inner, TodoEvent::Refreshed);
                Ok(todos)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Create a todo stamped with the current time.
    pub fn add(&self, title: &str) -> Result<TodoItem, ApiError> {
        self.add_at(title, &Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    /// Create a todo with an explicit ISO-8601 timestamp; the server-returned
    /// item is appended to the cache tail.
    pub fn add_at(&self, title: &str, timestamp: &str) -> Result<TodoItem, ApiError> {
        let input = CreateTodo {
            title: title.to_string(),
            completed: false,
            timestamp: timestamp.to_string(),
        };
        let result = self.require_credential().and_then(|token| {
            let req = self.api.build_create_todo(&token, &input)?;
            self.transport
                .send(req)
                .and_then(|resp| self.api.parse_create_todo(resp))
        });
        match result {
            Ok(todo) => {
                debug!(id = todo.id, "todo created");
                let mut inner = self.locked();
                inner.todos.push(todo.clone());
                inner.last_error = None;
                emit(&mut inner, TodoEvent::Added(todo.id));
                Ok(todo)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Partially update a todo; only the fields set in `changes` are sent.
    /// The server's confirmed item replaces the cached one by id.
    pub fn update(&self, id: i64, changes: &UpdateTodo) -> Result<TodoItem, ApiError> {
        let result = self.require_credential().and_then(|token| {
            let req = self.api.build_update_todo(&token, id, changes)?;
            self.transport
                .send(req)
                .and_then(|resp| self.api.parse_update_todo(resp))
        });
        match result {
            Ok(updated) => {
                let mut inner = self.locked();
                match inner.todos.iter_mut().find(|t| t.id == id) {
                    Some(slot) => *slot = updated.clone(),
                    None => debug!(id, "updated todo not in cache"),
                }
                inner.last_error = None;
                emit(&mut inner, TodoEvent::Updated(id));
                Ok(updated)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Delete a todo; the cache drops the id only after the server's 204.
    pub fn remove(&self, id: i64) -> Result<(), ApiError> {
        let result = self.require_credential().and_then(|token| {
            let req = self.api.build_delete_todo(&token, id);
            self.transport
                .send(req)
                .and_then(|resp| self.api.parse_delete_todo(resp))
        });
        match result {
            Ok(()) => {
                debug!(id, "todo deleted");
                let mut inner = self.locked();
                inner.todos.retain(|t| t.id != id);
                inner.last_error = None;
                emit(&mut inner, TodoEvent::Removed(id));
                Ok(())
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Snapshot of the cached collection, in fetch/append order.
    pub fn todos(&self) -> Vec<TodoItem> {
        self.locked().todos.clone()
    }

    /// Message of the most recent failed operation, cleared on success.
    pub fn last_error(&self) -> Option<String> {
        self.locked().last_error.clone()
    }

    /// Receive a `TodoEvent` for every cache change from now on.
    pub fn subscribe(&self) -> mpsc::Receiver<TodoEvent> {
        let (tx, rx) = mpsc::channel();
        self.locked().subscribers.push(tx);
        rx
    }

    fn require_credential(&self) -> Result<String, ApiError> {
        self.session.credential().ok_or(ApiError::Unauthenticated)
    }

    fn fail(&self, err: ApiError) -> ApiError {
        warn!(error = %err, "todo operation failed");
        let mut inner = self.locked();
        inner.last_error = Some(err.to_string());
        emit(&mut inner, TodoEvent::Error(err.to_string()));
        err
    }

    fn locked(&self) -> MutexGuard<'_, TodoInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn emit(inner: &mut TodoInner, event: TodoEvent) {
    inner.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{detail, json, no_content, FakeTransport};

    const TOKEN_BODY: &str = r#"{"access_token":"tok-123","token_type":"bearer"}"#;
    const USER_BODY: &str = r#"{"id":1,"email":"ana@example.com"}"#;

    fn todo_body(id: i64, title: &str, completed: bool) -> String {
        format!(
            r#"{{"id":{id},"title":"{title}","completed":{completed},"timestamp":"2025-07-16T09:00:00Z"}}"#
        )
    }

    /// Manager wired to an authenticated session; the first two scripted
    /// responses are consumed by the login flow.
    fn manager(mut responses: Vec<Result<crate::http::HttpResponse, ApiError>>) -> (TodoManager, Arc<FakeTransport>) {
        let mut script = vec![Ok(json(200, TOKEN_BODY)), Ok(json(200, USER_BODY))];
        script.append(&mut responses);
        let transport = FakeTransport::sequence(script);
        let api = ApiClient::new("http://localhost:8000");
        let session = SessionStore::new(api.clone(), transport.clone());
        session.login("ana@example.com", "hunter2").unwrap();
        (TodoManager::new(api, transport.clone(), session), transport)
    }

    #[test]
    fn refresh_replaces_cache_wholesale() {
        let (manager, _) = manager(vec![
            Ok(json(200, &format!("[{}]", todo_body(1, "Old", false)))),
            Ok(json(200, &format!("[{},{}]", todo_body(2, "A", false), todo_body(3, "B", true)))),
        ]);
        manager.refresh().unwrap();
        assert_eq!(manager.todos().len(), 1);

        manager.refresh().unwrap();
        let todos = manager.todos();
        assert_eq!(todos.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn add_appends_server_item_to_tail() {
        let (manager, _) = manager(vec![
            Ok(json(200, &format!("[{}]", todo_body(1, "First", false)))),
            Ok(json(201, &todo_body(2, "Second", false))),
        ]);
        let events = manager.subscribe();
        manager.refresh().unwrap();

        let created = manager.add_at("Second", "2025-07-16T09:00:00Z").unwrap();
        assert_eq!(created.id, 2);
        let todos = manager.todos();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos.last().unwrap().id, 2, "appended at the tail");
        assert_eq!(events.try_recv().unwrap(), TodoEvent::Refreshed);
        assert_eq!(events.try_recv().unwrap(), TodoEvent::Added(2));
    }

    #[test]
    fn update_replaces_matching_cached_item() {
        let (manager, _) = manager(vec![
            Ok(json(200, &format!("[{}]", todo_body(1, "Walk dog", false)))),
            Ok(json(200, &todo_body(1, "Walk dog", true))),
        ]);
        manager.refresh().unwrap();

        let changes = UpdateTodo {
            completed: Some(true),
            ..Default::default()
        };
        let updated = manager.update(1, &changes).unwrap();
        assert!(updated.completed);
        assert_eq!(updated.title, "Walk dog", "other fields unchanged");
        assert!(manager.todos()[0].completed);
    }

    #[test]
    fn update_of_uncached_id_does_not_insert() {
        let (manager, _) = manager(vec![Ok(json(200, &todo_body(9, "Elsewhere", true)))]);

        let changes = UpdateTodo {
            completed: Some(true),
            ..Default::default()
        };
        manager.update(9, &changes).unwrap();
        assert!(manager.todos().is_empty());
    }

    #[test]
    fn remove_drops_exactly_that_id() {
        let (manager, _) = manager(vec![
            Ok(json(200, &format!("[{},{}]", todo_body(1, "A", false), todo_body(2, "B", false)))),
            Ok(no_content()),
        ]);
        manager.refresh().unwrap();

        manager.remove(1).unwrap();
        let todos = manager.todos();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].id, 2);
    }

    #[test]
    fn remove_nonexistent_id_surfaces_error() {
        let (manager, _) = manager(vec![Ok(detail(404, "Todo not found"))]);

        let err = manager.remove(42).unwrap_err();
        assert_eq!(err, ApiError::NotFound);
        assert!(manager.last_error().is_some());
    }

    #[test]
    fn operations_without_credential_fail_without_sending() {
        let transport = FakeTransport::sequence(vec![]);
        let api = ApiClient::new("http://localhost:8000");
        let session = SessionStore::new(api.clone(), transport.clone());
        let manager = TodoManager::new(api, transport.clone(), session);

        assert_eq!(manager.refresh().unwrap_err(), ApiError::Unauthenticated);
        assert_eq!(manager.add("x").unwrap_err(), ApiError::Unauthenticated);
        assert_eq!(manager.remove(1).unwrap_err(), ApiError::Unauthenticated);
        assert_eq!(transport.request_count(), 0);
        assert_eq!(manager.last_error().as_deref(), Some("not authenticated"));
    }

    #[test]
    fn failed_operation_records_error_and_emits_event() {
        let (manager, _) = manager(vec![Ok(detail(500, "database exploded"))]);
        let events = manager.subscribe();

        let err = manager.refresh().unwrap_err();
        assert_eq!(err, ApiError::Api("database exploded".to_string()));
        assert_eq!(manager.last_error().as_deref(), Some("database exploded"));
        assert_eq!(
            events.try_recv().unwrap(),
            TodoEvent::Error("database exploded".to_string())
        );
    }
}
