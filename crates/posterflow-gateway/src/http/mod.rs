use axum::{http::StatusCode, Json};
use serde::Serialize;

use posterflow_store::StoreError;

pub mod customers;
pub mod health;
pub mod posters;
pub mod schedules;

/// The `{message}` body every non-2xx response (and simple 2xx ack) carries.
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

pub type ApiError = (StatusCode, Json<MessageBody>);

pub fn message(msg: impl Into<String>) -> Json<MessageBody> {
    Json(MessageBody {
        message: msg.into(),
    })
}

pub fn bad_request(msg: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, message(msg))
}

pub fn not_found(msg: impl Into<String>) -> ApiError {
    (StatusCode::NOT_FOUND, message(msg))
}

pub fn internal(msg: impl Into<String>) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, message(msg))
}

/// Map a store failure to a response. Database details are logged, not leaked.
pub fn store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::NotFound { id } => not_found(format!("Record not found: {id}")),
        StoreError::InvalidRecord(msg) => bad_request(msg),
        StoreError::Database(err) => {
            tracing::error!("store error: {err}");
            internal("database error")
        }
    }
}
