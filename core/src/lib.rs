//! API client and session/state synchronization core for the todo-mood app.
//!
//! # Overview
//! Everything a front-end needs to talk to the todo + mood-tracker backend:
//! a stateless `ApiClient` (request building + response parsing), a
//! `Transport` seam that executes the actual HTTP round-trip, a
//! `SessionStore` owning the bearer credential and user profile, and two
//! resource managers (`TodoManager`, `MoodManager`) that mirror server
//! collections into in-memory caches. The server is authoritative; the
//! caches exist so a UI can observe state without re-fetching.
//!
//! # Design
//! - `ApiClient` is stateless — it holds only `base_url`. Each endpoint is a
//!   `build_*`/`parse_*` pair, so the I/O boundary is explicit and every
//!   operation is testable without a network.
//! - The transport is injected (`Arc<dyn Transport>`), never a process-wide
//!   singleton. `UreqTransport` is the production implementation.
//! - Managers publish state changes over `std::sync::mpsc` subscriptions and
//!   keep the latest failure message in an observable `last_error` field.
//! - Operations that need a credential fail with `ApiError::Unauthenticated`
//!   instead of silently doing nothing.
//!
//! ```no_run
//! use std::sync::Arc;
//! use todo_mood_core::{ApiClient, MoodManager, SessionStore, TodoManager, UreqTransport};
//!
//! let api = ApiClient::new("http://localhost:8000");
//! let transport = Arc::new(UreqTransport::new());
//! let session = SessionStore::new(api.clone(), transport.clone());
//! let todos = TodoManager::new(api.clone(), transport.clone(), session.clone());
//! let moods = MoodManager::new(api, transport, session.clone());
//!
//! session.login("ana@example.com", "hunter2")?;
//! todos.refresh()?;
//! let grid = moods.month_grid(2025, 7)?;
//! # Ok::<(), todo_mood_core::ApiError>(())
//! ```

pub mod client;
pub mod error;
pub mod http;
pub mod moods;
pub mod session;
pub mod todos;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::ApiClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use moods::{MoodEvent, MoodManager};
pub use session::{SessionEvent, SessionStore};
pub use todos::{TodoEvent, TodoManager};
pub use types::{
    CreateTodo, Mood, MoodEntry, RegisterUser, SetMood, Token, TodoItem, UpdateTodo, UserProfile,
};
