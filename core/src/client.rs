//! Stateless HTTP request builder and response parser for the todo-mood API.
//!
//! # Design
//! `ApiClient` holds only a `base_url` and carries no mutable state between
//! calls. Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`; the
//! session store and resource managers run a `Transport` between the two.
//! Authenticated builders take the bearer token explicitly — the credential
//! lives in the session store, never here.

use chrono::NaiveDate;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    CreateTodo, ErrorDetail, Mood, MoodEntry, RegisterUser, SetMood, Token, TodoItem, UpdateTodo,
    UserProfile,
};

/// Characters escaped in application/x-www-form-urlencoded values.
/// Unreserved characters (RFC 3986) pass through untouched.
const FORM: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Stateless client for the todo-mood API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network. The caller is responsible for executing the HTTP
/// round-trip between `build_*` and `parse_*`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    // --- auth ---

    pub fn build_register(&self, input: &RegisterUser) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Encode(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/register", self.base_url),
            headers: vec![json_content()],
            body: Some(body),
        })
    }

    pub fn parse_register(&self, response: HttpResponse) -> Result<UserProfile, ApiError> {
        check_status(&response, 201)?;
        decode(&response)
    }

    /// The login endpoint is the one form-encoded request in the API; the
    /// backend's OAuth2 password flow expects `username`/`password` fields.
    pub fn build_login(&self, email: &str, password: &str) -> HttpRequest {
        let body = format!(
            "username={}&password={}",
            utf8_percent_encode(email, FORM),
            utf8_percent_encode(password, FORM)
        );
        HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/login", self.base_url),
            headers: vec![(
                "content-type".to_string(),
                "application/x-www-form-urlencoded".to_string(),
            )],
            body: Some(body),
        }
    }

    pub fn parse_login(&self, response: HttpResponse) -> Result<Token, ApiError> {
        check_status(&response, 200)?;
        decode(&response)
    }

    pub fn build_me(&self, token: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/me", self.base_url),
            headers: vec![bearer(token)],
            body: None,
        }
    }

    pub fn parse_me(&self, response: HttpResponse) -> Result<UserProfile, ApiError> {
        check_status(&response, 200)?;
        decode(&response)
    }

    // --- todos ---

    pub fn build_list_todos(&self, token: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/todos", self.base_url),
            headers: vec![bearer(token)],
            body: None,
        }
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<TodoItem>, ApiError> {
        check_status(&response, 200)?;
        decode(&response)
    }

    pub fn build_create_todo(
        &self,
        token: &str,
        input: &CreateTodo,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Encode(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/todos", self.base_url),
            headers: vec![json_content(), bearer(token)],
            body: Some(body),
        })
    }

    pub fn parse_create_todo(&self, response: HttpResponse) -> Result<TodoItem, ApiError> {
        check_status(&response, 201)?;
        decode(&response)
    }

    pub fn build_update_todo(
        &self,
        token: &str,
        id: i64,
        input: &UpdateTodo,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Encode(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Patch,
            path: format!("{}/todos/{id}", self.base_url),
            headers: vec![json_content(), bearer(token)],
            body: Some(body),
        })
    }

    pub fn parse_update_todo(&self, response: HttpResponse) -> Result<TodoItem, ApiError> {
        check_status(&response, 200)?;
        decode(&response)
    }

    pub fn build_delete_todo(&self, token: &str, id: i64) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: format!("{}/todos/{id}", self.base_url),
            headers: vec![bearer(token)],
            body: None,
        }
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response, 204)?;
        Ok(())
    }

    // --- moods ---

    pub fn build_today_mood(&self, token: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/moods/today", self.base_url),
            headers: vec![bearer(token)],
            body: None,
        }
    }

    pub fn build_mood_for(&self, token: &str, date: NaiveDate) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/moods/{}", self.base_url, date.format("%Y-%m-%d")),
            headers: vec![bearer(token)],
            body: None,
        }
    }

    pub fn build_set_today_mood(
        &self,
        token: &str,
        input: &SetMood,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(input).map_err(|e| ApiError::Encode(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            path: format!("{}/moods/today", self.base_url),
            headers: vec![json_content(), bearer(token)],
            body: Some(body),
        })
    }

    /// Parses any endpoint returning a single `MoodEntry` with 200: today's
    /// mood, a by-date lookup, or the set-today confirmation.
    pub fn parse_mood_entry(&self, response: HttpResponse) -> Result<MoodEntry, ApiError> {
        check_status(&response, 200)?;
        decode(&response)
    }

    pub fn build_mood_options(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: format!("{}/moods/options", self.base_url),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_mood_options(&self, response: HttpResponse) -> Result<Vec<Mood>, ApiError> {
        check_status(&response, 200)?;
        decode(&response)
    }
}

fn bearer(token: &str) -> (String, String) {
    ("authorization".to_string(), format!("Bearer {token}"))
}

fn json_content() -> (String, String) {
    ("content-type".to_string(), "application/json".to_string())
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Map non-success status codes to the appropriate `ApiError` variant.
///
/// 404 keeps its dedicated variant; any other 4xx/5xx is first tried as the
/// server's `{"detail"}` envelope and falls back to the raw status code.
fn check_status(response: &HttpResponse, expected: u16) -> Result<(), ApiError> {
    if response.status == expected {
        return Ok(());
    }
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    match serde_json::from_str::<ErrorDetail>(&response.body) {
        Ok(envelope) => Err(ApiError::Api(envelope.detail)),
        Err(_) => Err(ApiError::Http(response.status)),
    }
}
