pub mod password;

pub use password::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),

    #[error("Hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
