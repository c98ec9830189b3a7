//! HTTP layer.
//!
//! `app_router()` returns the complete `Router` (pages, auth, patients,
//! prediction) with session, CORS and trace layers applied; `server`
//! binds it and manages shutdown.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::app_router;
pub use server::{start_server, start_server_on, AppServer};
pub use types::ApiContext;
