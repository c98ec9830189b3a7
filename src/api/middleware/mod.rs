//! Middleware for the protected routes.
//!
//! Execution order (outermost → innermost):
//! 1. Login check — redirect anonymous visitors, inject `CurrentUser`
//! 2. Audit logger — runs after the login check so it knows the username

pub mod audit;
pub mod auth;
