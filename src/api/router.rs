//! Application router.
//!
//! Public routes serve the static pages plus login, registration and
//! health. Protected routes sit behind the login check.
//!
//! Middleware stack on protected routes (outermost → innermost):
//! 1. `Cache-Control: no-store` → 2. Login check → 3. Audit logger
//!
//! The whole app is wrapped in the session, CORS and trace layers.

use std::path::Path;
use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, get_service, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::config::{Auth, Cors};
use crate::core_state::CoreState;

pub const SESSION_COOKIE: &str = "copdcare_session";

/// Build the application router.
///
/// Middleware reads nothing from `ApiContext`; handlers get it through
/// `State<ApiContext>`.
pub fn app_router(core: Arc<CoreState>) -> Router {
    let ctx = ApiContext::new(core);
    let settings = &ctx.core.settings;
    let pages = settings.frontend.dir.clone();

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/dashboard", get(endpoints::dashboard::show))
        .route(
            "/add-patient",
            get_service(page(&pages, "add-patient.html")).post(endpoints::patients::add),
        )
        .route(
            "/patient/:id/predictions",
            get(endpoints::patients::predictions),
        )
        .route("/predict", post(endpoints::predict::submit))
        .route(
            "/prediction-form",
            get_service(page(&pages, "prediction-form.html")),
        )
        .with_state(ctx.clone())
        // Innermost first, outermost last. `route_layer` keeps the
        // fallback out, so unknown paths stay 404 after the merge.
        .route_layer(axum::middleware::from_fn(middleware::audit::log_access))
        .route_layer(axum::middleware::from_fn(middleware::auth::require_login))
        .route_layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ));

    let public = Router::new()
        .route("/", get_service(page(&pages, "index.html")))
        .route(
            "/login",
            get_service(page(&pages, "login.html")).post(endpoints::auth::login),
        )
        .route(
            "/register",
            get_service(page(&pages, "register.html")).post(endpoints::auth::register),
        )
        .route("/logout", get(endpoints::auth::logout))
        .route("/health", get(endpoints::health::check))
        .nest_service("/static", ServeDir::new(pages.join("static")))
        .with_state(ctx.clone());

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(session_layer(&settings.auth))
        .layer(cors_layer(&settings.cors))
        .layer(TraceLayer::new_for_http())
}

fn page(dir: &Path, file: &str) -> ServeFile {
    ServeFile::new(dir.join(file))
}

fn session_layer(auth: &Auth) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE)
        .with_secure(auth.secure_cookie)
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(
            auth.session_inactivity_secs,
        )))
}

/// Credentialed CORS for the configured origins only. With no origins
/// configured, no cross-origin request is granted.
fn cors_layer(cors: &Cors) -> CorsLayer {
    let origins: Vec<HeaderValue> = cors
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
