//! Register / login / save handlers.
//!
//! Bodies are free-form JSON documents. The reserved identity and credential
//! field names come from the store, so these handlers work unchanged with the
//! legacy `user_name` / `user_password` clients.

use std::sync::Arc;

use axum::{extract::{rejection::JsonRejection, State}, Json};
use common::types::SaveResponse;
use serde_json::Value;
use service::{RecordStore, StoreError};
use tracing::info;

use crate::{errors::ApiError, metrics};

#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<dyn RecordStore>,
    /// Payload fields a registration must carry besides username and credential.
    pub register_required_fields: Arc<[String]>,
}

impl ServerState {
    pub fn new(store: Arc<dyn RecordStore>, register_required_fields: Vec<String>) -> Self {
        Self { store, register_required_fields: register_required_fields.into() }
    }
}

fn malformed(e: JsonRejection) -> StoreError {
    StoreError::invalid(format!("malformed request body: {}", e.body_text()))
}

fn check_required(required: &[String], doc: &Value) -> Result<(), StoreError> {
    for field in required {
        match doc.get(field) {
            None | Some(Value::Null) => return Err(StoreError::invalid(format!("missing {field}"))),
            Some(Value::String(s)) if s.is_empty() => {
                return Err(StoreError::invalid(format!("{field} must not be empty")))
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn respond(action: &str, message: &'static str, outcome: Result<Value, StoreError>) -> Result<Json<SaveResponse>, ApiError> {
    match outcome {
        Ok(data) => {
            metrics::record(action, "ok");
            Ok(Json(SaveResponse { message, data }))
        }
        Err(e) => {
            metrics::record(action, e.kind());
            Err(ApiError(e))
        }
    }
}

pub async fn register(
    State(state): State<ServerState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let outcome = async {
        let Json(doc) = body.map_err(malformed)?;
        let username = state.store.fields().username_of(&doc)?.to_owned();
        check_required(&state.register_required_fields, &doc)?;
        let stored = state.store.create(&username, doc).await?;
        info!(player = %username, "player registered");
        Ok::<_, StoreError>(stored)
    }
    .await;
    respond("register", "registered", outcome)
}

pub async fn login(
    State(state): State<ServerState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let outcome = async {
        let Json(req) = body.map_err(malformed)?;
        let fields = state.store.fields();
        let username = fields.username_of(&req)?;
        let credential = fields.required_str(&req, &fields.credential)?;
        let doc = state.store.authenticate(username, credential).await?;
        info!(player = %username, "player logged in");
        Ok::<_, StoreError>(doc)
    }
    .await;
    respond("login", "logged in", outcome)
}

/// Replaces the whole record. The credential is not re-checked: whatever the
/// client sends becomes the stored document.
pub async fn save(
    State(state): State<ServerState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SaveResponse>, ApiError> {
    let outcome = async {
        let Json(doc) = body.map_err(malformed)?;
        let username = state.store.fields().username_of(&doc)?.to_owned();
        let stored = state.store.upsert(&username, doc).await?;
        let stat = |name: &str| stored.get(name).cloned().unwrap_or(Value::Null);
        info!(
            player = %username,
            money = %stat("money"),
            level = %stat("level"),
            experience = %stat("experience"),
            "game saved"
        );
        Ok::<_, StoreError>(stored)
    }
    .await;
    respond("save", "saved", outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_fields_must_be_present_and_non_empty() {
        let required = vec!["farm_name".to_string()];
        assert!(check_required(&required, &json!({"farm_name": "Green"})).is_ok());
        assert!(check_required(&required, &json!({"farm_name": ""})).is_err());
        assert!(check_required(&required, &json!({"farm_name": null})).is_err());
        assert!(check_required(&required, &json!({"money": 1})).is_err());
        assert!(check_required(&[], &json!({})).is_ok());
    }
}
