//! Access logging for protected routes.
//!
//! Logs username, method, path and response status for every request
//! that passed the login check.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::CurrentUser;

pub async fn log_access(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let username = req
        .extensions()
        .get::<CurrentUser>()
        .map(|u| u.username.clone())
        .unwrap_or_default();

    let response = next.run(req).await;

    tracing::info!(
        target: "copdcare::audit",
        %username,
        %method,
        %path,
        status = response.status().as_u16(),
        "access"
    );

    response
}
