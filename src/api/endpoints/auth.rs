//! Account endpoints.
//!
//! - `POST /register` — create an account
//! - `POST /login` — verify credentials and start a session
//! - `GET /logout` — end the session

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::Redirect;
use axum::Json;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, SESSION_USER_KEY};
use crate::crypto::{hash_password_blocking, verify_password_blocking};
use crate::models::User;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    fn require(payload: Result<Json<Credentials>, JsonRejection>) -> Result<Self, ApiError> {
        let Json(mut creds) = payload?;
        creds.username = creds.username.trim().to_string();
        if creds.username.is_empty() || creds.password.is_empty() {
            return Err(ApiError::BadRequest(
                "Username and password are required".into(),
            ));
        }
        Ok(creds)
    }
}

#[derive(Debug, Serialize)]
pub struct AuthSuccess {
    pub success: bool,
}

const OK: AuthSuccess = AuthSuccess { success: true };

/// `POST /register`
pub async fn register(
    State(ctx): State<ApiContext>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<AuthSuccess>, ApiError> {
    let creds = Credentials::require(payload)?;

    if ctx.core.repository().find_user(&creds.username)?.is_some() {
        return Err(ApiError::UsernameTaken);
    }

    let iterations = ctx.core.settings.auth.password_iterations;
    let password_hash = hash_password_blocking(creds.password, iterations).await?;

    // The store re-checks under its write lock, so a racing registration
    // still ends in UsernameTaken.
    ctx.core
        .repository()
        .insert_user(&User::new(creds.username, password_hash))?;

    Ok(Json(OK))
}

/// `POST /login`
pub async fn login(
    State(ctx): State<ApiContext>,
    session: Session,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<AuthSuccess>, ApiError> {
    let Json(creds) = payload?;

    let Some(user) = ctx.core.repository().find_user(creds.username.trim())? else {
        tracing::info!(username = %creds.username, "Login failed: unknown user");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password_blocking(creds.password, user.password_hash).await? {
        tracing::info!(username = %user.username, "Login failed: wrong password");
        return Err(ApiError::InvalidCredentials);
    }

    // New id on privilege change so a pre-login cookie cannot be replayed.
    session.cycle_id().await?;
    session.insert(SESSION_USER_KEY, &user.username).await?;
    tracing::info!(username = %user.username, "User logged in");

    Ok(Json(OK))
}

/// `GET /logout`
pub async fn logout(session: Session) -> Result<Redirect, ApiError> {
    if let Ok(Some(username)) = session.get::<String>(SESSION_USER_KEY).await {
        tracing::info!(%username, "User logged out");
    }
    session.flush().await?;
    Ok(Redirect::to("/"))
}
