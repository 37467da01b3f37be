use chrono::{DateTime, NaiveDate, Utc};

// One participant on one scheduled date; rows sharing (session_date, code) form a group.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScheduleSessionRow {
    pub id: String,
    pub session_date: NaiveDate,
    pub participant: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
}
