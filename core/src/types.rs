//! Domain DTOs for the todo-mood API.
//!
//! # Design
//! These types mirror the backend's schema but are defined independently of
//! the mock-server crate; the integration tests catch schema drift between
//! the two. Ids are server-assigned integers and immutable. Todo timestamps
//! travel as ISO-8601 strings exactly as the server stores them; mood dates
//! are proper `NaiveDate`s since the wire format is a plain `yyyy-MM-dd`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The authenticated user, as returned by `/register` and `/me`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
}

/// Request payload for `/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
}

/// Bearer token envelope returned by `/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

/// A single todo item returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoItem {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    pub timestamp: String,
}

/// Request payload for creating a new todo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub timestamp: String,
}

/// Request payload for partially updating a todo. Only the fields present in
/// the JSON are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

/// The five moods a day can be tagged with, serialized lowercase.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Terrible,
    Bad,
    Ok,
    Good,
    Excellent,
}

/// A mood entry for one calendar day. The server enforces at most one entry
/// per user per date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MoodEntry {
    pub id: i64,
    pub mood: Mood,
    pub date: NaiveDate,
}

/// Request payload for `/moods/today`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetMood {
    pub mood: Mood,
}

/// The server's error envelope on 4xx/5xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
}
