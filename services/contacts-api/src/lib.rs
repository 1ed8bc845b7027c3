//! Contacts API
//!
//! Reference server for the contract harness: contact records kept in
//! memory, served over plain HTTP.

mod store;

pub use store::ContactStore;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use contract_core::{endpoints, ContactPatch, ContactQuery, NewContact, ResourceId, VERSION};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{info, instrument, warn};

/// Error body and status of a rejected request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    InvalidJson,
    NotFound,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::InvalidJson => (StatusCode::BAD_REQUEST, "Invalid JSON").into_response(),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Record not found").into_response(),
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Routes of the contacts API bound to `store`
pub fn router(store: ContactStore) -> Router {
    Router::new()
        .route(endpoints::HEALTH, get(health_check))
        .route(endpoints::RECORDS, get(list_contacts).post(create_contact))
        .route(
            "/records/{id}",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
        .route(endpoints::RESET, delete(reset))
        .with_state(store)
}

/// Serve the API on an already bound listener until the task is dropped
pub async fn serve(listener: TcpListener, store: ContactStore) -> std::io::Result<()> {
    info!("Contacts API listening on {}", listener.local_addr()?);
    axum::serve(listener, router(store)).await
}

/// Request bodies must be JSON objects; arrays and scalars are rejected
/// even where the target type could be read from them.
fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> ApiResult<T> {
    let value: Value = serde_json::from_str(body).map_err(|err| {
        warn!(error = %err, "Rejected request body");
        ApiError::InvalidJson
    })?;
    if !value.is_object() {
        warn!("Rejected non-object request body");
        return Err(ApiError::InvalidJson);
    }
    serde_json::from_value(value).map_err(|err| {
        warn!(error = %err, "Rejected request body");
        ApiError::InvalidJson
    })
}

#[instrument]
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "contacts-api",
        "version": VERSION
    }))
}

#[instrument(skip(store))]
async fn list_contacts(
    State(store): State<ContactStore>,
    Query(query): Query<ContactQuery>,
) -> Json<Value> {
    Json(json!(store.list(&query)))
}

#[instrument(skip(store, body))]
async fn create_contact(
    State(store): State<ContactStore>,
    body: String,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let draft: NewContact = parse_body(&body)?;
    let contact = store.create(draft);
    info!(id = contact.id, "Contact created");
    Ok((StatusCode::CREATED, Json(json!(contact))))
}

#[instrument(skip(store))]
async fn get_contact(
    State(store): State<ContactStore>,
    Path(id): Path<ResourceId>,
) -> ApiResult<Json<Value>> {
    let contact = store.get(id).ok_or(ApiError::NotFound)?;
    Ok(Json(json!(contact)))
}

#[instrument(skip(store, body))]
async fn update_contact(
    State(store): State<ContactStore>,
    Path(id): Path<ResourceId>,
    body: String,
) -> ApiResult<Json<Value>> {
    let patch: ContactPatch = parse_body(&body)?;
    let contact = store.update(id, patch).ok_or(ApiError::NotFound)?;
    info!(id, "Contact updated");
    Ok(Json(json!(contact)))
}

#[instrument(skip(store))]
async fn delete_contact(
    State(store): State<ContactStore>,
    Path(id): Path<ResourceId>,
) -> ApiResult<StatusCode> {
    if !store.delete(id) {
        return Err(ApiError::NotFound);
    }
    info!(id, "Contact deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(store))]
async fn reset(State(store): State<ContactStore>) -> StatusCode {
    store.reset();
    StatusCode::NO_CONTENT
}
