//! In-memory mock of the todo-mood backend, for tests and local development.
//!
//! Reproduces the REST surface the core client consumes: registration, form
//! login with bearer tokens, per-user todos, and one-mood-per-day entries.
//! Error bodies use the backend's `{"detail": string}` envelope. Nothing is
//! persisted; each `app()` starts empty.

use std::collections::{BTreeMap, HashMap};
use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use axum::{
    extract::{Form, Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, patch},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
}

#[derive(Deserialize)]
pub struct RegisterUser {
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    pub timestamp: String,
}

#[derive(Deserialize)]
pub struct CreateTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    pub timestamp: String,
}

#[derive(Deserialize)]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub timestamp: Option<String>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Terrible,
    Bad,
    Ok,
    Good,
    Excellent,
}

pub const MOOD_OPTIONS: [Mood; 5] = [
    Mood::Terrible,
    Mood::Bad,
    Mood::Ok,
    Mood::Good,
    Mood::Excellent,
];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoodEntry {
    pub id: i64,
    pub mood: Mood,
    pub date: NaiveDate,
}

#[derive(Deserialize)]
pub struct SetMood {
    pub mood: Mood,
}

#[derive(Serialize, Deserialize)]
pub struct Detail {
    pub detail: String,
}

struct UserRecord {
    user: User,
    password: String,
}

pub struct AppState {
    users: RwLock<Vec<UserRecord>>,
    tokens: RwLock<HashMap<String, i64>>,
    // BTreeMap keyed by id keeps listing in creation order.
    todos: RwLock<BTreeMap<i64, (i64, Todo)>>,
    moods: RwLock<HashMap<(i64, NaiveDate), MoodEntry>>,
    next_id: AtomicI64,
}

pub type Db = Arc<AppState>;

type Rejection = (StatusCode, Json<Detail>);
type ApiResult<T> = Result<T, Rejection>;

pub fn app() -> Router {
    let db: Db = Arc::new(AppState {
        users: RwLock::new(Vec::new()),
        tokens: RwLock::new(HashMap::new()),
        todos: RwLock::new(BTreeMap::new()),
        moods: RwLock::new(HashMap::new()),
        next_id: AtomicI64::new(1),
    });
    Router::new()
        .route("/", get(health))
        .route("/register", axum::routing::post(register))
        .route("/login", axum::routing::post(login))
        .route("/me", get(me))
        .route("/todos", get(list_todos).post(create_todo))
        .route("/todos/{id}", patch(update_todo).delete(delete_todo))
        .route("/moods/options", get(mood_options))
        .route("/moods/today", get(today_mood).post(set_today_mood))
        .route("/moods/{day}", get(mood_by_day))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn reject(status: StatusCode, message: &str) -> Rejection {
    (
        status,
        Json(Detail {
            detail: message.to_string(),
        }),
    )
}

/// Resolve the bearer token in the Authorization header to a user id.
async fn authorize(db: &Db, headers: &HeaderMap) -> ApiResult<i64> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Not authenticated"))?;
    db.tokens
        .read()
        .await
        .get(token)
        .copied()
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Not authenticated"))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy"}))
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<RegisterUser>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let mut users = db.users.write().await;
    if users.iter().any(|record| record.user.email == input.email) {
        return Err(reject(StatusCode::BAD_REQUEST, "Email already registered"));
    }
    let user = User {
        id: db.next_id.fetch_add(1, Ordering::Relaxed),
        email: input.email,
    };
    users.push(UserRecord {
        user: user.clone(),
        password: input.password,
    });
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(State(db): State<Db>, Form(form): Form<LoginForm>) -> ApiResult<Json<Token>> {
    let users = db.users.read().await;
    let record = users
        .iter()
        .find(|record| record.user.email == form.username && record.password == form.password)
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Bad credentials"))?;
    let token = Uuid::new_v4().to_string();
    db.tokens.write().await.insert(token.clone(), record.user.id);
    Ok(Json(Token {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}

async fn me(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<User>> {
    let user_id = authorize(&db, &headers).await?;
    db.users
        .read()
        .await
        .iter()
        .find(|record| record.user.id == user_id)
        .map(|record| Json(record.user.clone()))
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Not authenticated"))
}

async fn list_todos(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Vec<Todo>>> {
    let user_id = authorize(&db, &headers).await?;
    let todos = db.todos.read().await;
    Ok(Json(
        todos
            .values()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, todo)| todo.clone())
            .collect(),
    ))
}

async fn create_todo(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateTodo>,
) -> ApiResult<(StatusCode, Json<Todo>)> {
    let user_id = authorize(&db, &headers).await?;
    let todo = Todo {
        id: db.next_id.fetch_add(1, Ordering::Relaxed),
        title: input.title,
        completed: input.completed,
        timestamp: input.timestamp,
    };
    db.todos
        .write()
        .await
        .insert(todo.id, (user_id, todo.clone()));
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(db): State<Db>,
    Path(id): Path<i64>,
    headers: HeaderMap,
    Json(input): Json<UpdateTodo>,
) -> ApiResult<Json<Todo>> {
    let user_id = authorize(&db, &headers).await?;
    let mut todos = db.todos.write().await;
    let (_, todo) = todos
        .get_mut(&id)
        .filter(|(owner, _)| *owner == user_id)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Todo not found"))?;
    if let Some(title) = input.title {
        todo.title = title;
    }
    if let Some(completed) = input.completed {
        todo.completed = completed;
    }
    if let Some(timestamp) = input.timestamp {
        todo.timestamp = timestamp;
    }
    Ok(Json(todo.clone()))
}

async fn delete_todo(
    State(db): State<Db>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let user_id = authorize(&db, &headers).await?;
    let mut todos = db.todos.write().await;
    match todos.get(&id) {
        Some((owner, _)) if *owner == user_id => {
            todos.remove(&id);
            Ok(StatusCode::NO_CONTENT)
        }
        _ => Err(reject(StatusCode::NOT_FOUND, "Todo not found")),
    }
}

async fn mood_options() -> Json<[Mood; 5]> {
    Json(MOOD_OPTIONS)
}

async fn today_mood(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<MoodEntry>> {
    let user_id = authorize(&db, &headers).await?;
    let today = Utc::now().date_naive();
    db.moods
        .read()
        .await
        .get(&(user_id, today))
        .cloned()
        .map(Json)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Mood not found"))
}

async fn set_today_mood(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<SetMood>,
) -> ApiResult<Json<MoodEntry>> {
    let user_id = authorize(&db, &headers).await?;
    let today = Utc::now().date_naive();
    let mut moods = db.moods.write().await;
    let entry = match moods.get_mut(&(user_id, today)) {
        // Overwriting keeps the entry's id: one entry per user per day.
        Some(entry) => {
            entry.mood = input.mood;
            entry.clone()
        }
        None => {
            let entry = MoodEntry {
                id: db.next_id.fetch_add(1, Ordering::Relaxed),
                mood: input.mood,
                date: today,
            };
            moods.insert((user_id, today), entry.clone());
            entry
        }
    };
    Ok(Json(entry))
}

async fn mood_by_day(
    State(db): State<Db>,
    Path(day): Path<NaiveDate>,
    headers: HeaderMap,
) -> ApiResult<Json<MoodEntry>> {
    let user_id = authorize(&db, &headers).await?;
    db.moods
        .read()
        .await
        .get(&(user_id, day))
        .cloned()
        .map(Json)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Mood not found"))
}
