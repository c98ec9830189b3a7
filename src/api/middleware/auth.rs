//! Session login check.
//!
//! Reads the username stored at login. Anonymous requests are sent to
//! `/login`; authenticated ones continue with `CurrentUser` in their
//! extensions.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use tower_sessions::Session;

use crate::api::error::ApiError;
use crate::api::types::{CurrentUser, SESSION_USER_KEY};

pub async fn require_login(session: Session, mut req: Request, next: Next) -> Response {
    match session.get::<String>(SESSION_USER_KEY).await {
        Ok(Some(username)) => {
            req.extensions_mut().insert(CurrentUser { username });
            next.run(req).await
        }
        Ok(None) => {
            tracing::debug!(path = %req.uri().path(), "Anonymous request redirected to login");
            Redirect::to("/login").into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}
