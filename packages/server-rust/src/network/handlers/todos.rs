//! Todo CRUD handlers under `/api/v1/todos`.
//!
//! Each handler parses its JSON body into typed values, issues exactly one
//! [`RecordStore`](crate::storage::RecordStore) operation, and renders the
//! outcome as a status code plus a plain-text or JSON body.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures_util::TryStreamExt;
use serde_json::{json, Map, Value};
use todo_core::{TodoField, TodoPatch, TodoRecord};
use tracing::{debug, error, warn};

use super::AppState;
use crate::storage::StoreError;

const ADDED: &str = "Todo Added Successfully!!";
const UPDATED: &str = "Todo Updated Successfully!!";
const DELETED: &str = "Todo Deleted Successfully!!";

/// Error response: a status code and a plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn missing_key(key: &str) -> Self {
        Self::bad_request(format!("Required key '{key}' missing in request body"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AlreadyExists { .. } => {
                Self::bad_request("ID already present in the database")
            }
            StoreError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, "Todo not found"),
            StoreError::NotModified { .. } => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Failed to update Todo")
            }
            StoreError::Unavailable { reason } => {
                warn!(%reason, "Store unavailable");
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "Store unavailable")
            }
            StoreError::Decode(err) => {
                error!(%err, "Stored todo could not be decoded");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Stored todo could not be decoded",
                )
            }
        }
    }
}

fn parse_object(body: &[u8]) -> Result<Map<String, Value>, ApiError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::bad_request("Request body must be a JSON object")),
        Err(err) => {
            debug!(%err, "Malformed request body");
            Err(ApiError::bad_request("Malformed JSON in request body"))
        }
    }
}

fn required_str<'a>(body: &'a Map<String, Value>, field: TodoField) -> Result<&'a str, ApiError> {
    let key = field.as_str();
    match body.get(key) {
        None => Err(ApiError::missing_key(key)),
        Some(Value::String(value)) => Ok(value.as_str()),
        Some(_) => Err(ApiError::bad_request(format!(
            "Value of key '{key}' must be a string"
        ))),
    }
}

fn required_id(body: &Map<String, Value>) -> Result<&str, ApiError> {
    let id = required_str(body, TodoField::Id)?;
    if id.is_empty() {
        return Err(ApiError::bad_request("Key 'Id' must not be empty"));
    }
    Ok(id)
}

/// `GET /api/v1/todos`: every stored todo.
pub async fn list_todos(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let todos: Vec<TodoRecord> = state.store.find_all().await?.try_collect().await?;
    debug!(count = todos.len(), "Listed todos");
    Ok(Json(json!({ "todos": todos })))
}

/// `GET /api/v1/todos/{id}`: a single todo.
pub async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    match state.store.find_one(&id).await? {
        Some(todo) => Ok(Json(json!({ "todo": todo }))),
        None => Err(ApiError::new(StatusCode::NOT_FOUND, "Todo not found")),
    }
}

/// `POST /api/v1/todos`: insert a todo carrying all five fields.
///
/// Keys other than the five todo fields are ignored.
pub async fn create_todo(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), ApiError> {
    let body = parse_object(&body)?;
    for field in TodoField::ALL {
        required_str(&body, field)?;
    }

    let todo = TodoRecord {
        id: required_id(&body)?.to_owned(),
        first_name: required_str(&body, TodoField::FirstName)?.to_owned(),
        last_name: required_str(&body, TodoField::LastName)?.to_owned(),
        email_id: required_str(&body, TodoField::EmailId)?.to_owned(),
        location: required_str(&body, TodoField::Location)?.to_owned(),
    };

    state.store.insert(&todo).await?;
    Ok((StatusCode::OK, ADDED))
}

/// `PUT /api/v1/todos`: merge the given fields into the todo named by `Id`.
///
/// Non-string values of todo fields are skipped. Unknown keys are rejected.
pub async fn update_todo(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), ApiError> {
    let body = parse_object(&body)?;
    let id = required_id(&body)?;

    let mut patch = TodoPatch::default();
    for (key, value) in &body {
        let Some(field) = TodoField::parse(key) else {
            return Err(ApiError::bad_request(format!(
                "Unknown key '{key}' in request body"
            )));
        };
        match value {
            Value::String(value) if field != TodoField::Id => patch.set(field, value.as_str()),
            Value::String(_) => {}
            _ => debug!(key = %key, "Ignoring non-string value"),
        }
    }

    match state.store.update(id, &patch).await {
        Ok(()) => Ok((StatusCode::OK, UPDATED)),
        Err(StoreError::NotFound { .. }) => {
            Err(ApiError::bad_request("ID not found in the database"))
        }
        Err(err) => Err(err.into()),
    }
}

/// `DELETE /api/v1/todos`: remove the todo named by `Id`.
pub async fn delete_todo(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, &'static str), ApiError> {
    let body = parse_object(&body)?;
    let id = required_id(&body)?;

    match state.store.delete(id).await {
        Ok(()) => Ok((StatusCode::OK, DELETED)),
        Err(StoreError::NotFound { .. }) => {
            Err(ApiError::bad_request("Failed to delete Todo with given ID"))
        }
        Err(err) => Err(err.into()),
    }
}
