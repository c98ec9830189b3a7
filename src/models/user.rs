use chrono::{DateTime, Utc};

/// Registered clinician account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub username: String,
    /// PHC-format PBKDF2 hash; the plaintext is never stored.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, password_hash: String) -> Self {
        Self {
            username,
            password_hash,
            created_at: Utc::now(),
        }
    }
}
