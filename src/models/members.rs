use chrono::{DateTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MemberRow {
    pub handle: String,
    pub display_name: String,
    pub origin: String,
    pub status_tag: String,
    pub note: Option<String>,
    pub profile_image: Option<String>,
    pub cover_image: Option<String>,
    pub is_admin: bool,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
