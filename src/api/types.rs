//! Shared types for the HTTP layer.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde_json::{Map, Value};

use crate::api::error::ApiError;
use crate::core_state::CoreState;

/// Session key holding the logged-in username.
pub const SESSION_USER_KEY: &str = "username";

// ═══════════════════════════════════════════════════════════
// API context — shared state for every route
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }
}

// ═══════════════════════════════════════════════════════════
// Current user — injected by the login middleware
// ═══════════════════════════════════════════════════════════

/// Identity of the session owner, inserted into request extensions
/// once the session has been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub username: String,
}

/// Unwrap a JSON body that must be an object.
///
/// Field-level validation is left to the caller so missing names can be
/// reported together.
pub fn json_object(
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Map<String, Value>, ApiError> {
    match payload {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(Json(_)) => Err(ApiError::BadRequest("Expected a JSON object".into())),
        Err(rejection) => Err(rejection.into()),
    }
}
