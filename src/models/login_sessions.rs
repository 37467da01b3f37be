use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LoginSessionRow {
    pub token: String,
    pub member_handle: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
