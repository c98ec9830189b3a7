//! Endpoint handlers, one module per feature area.

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod patients;
pub mod predict;
