use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::models::PushSubscriptionRow;

pub struct NewPushSubscription<'a> {
    pub endpoint: &'a str,
    pub p256dh: &'a str,
    pub auth: &'a str,
    pub member_handle: &'a str,
    pub created_at: DateTime<Utc>,
}

const SQL_UPSERT_SUBSCRIPTION: &str = r#"
INSERT INTO push_subscriptions (
  endpoint,
  p256dh,
  auth,
  member_handle,
  created_at
) VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT (endpoint) DO UPDATE SET
  p256dh = excluded.p256dh,
  auth = excluded.auth,
  member_handle = excluded.member_handle
"#;

pub async fn upsert_subscription(
    pool: &SqlitePool,
    sub: NewPushSubscription<'_>,
) -> sqlx::Result<()> {
    sqlx::query(SQL_UPSERT_SUBSCRIPTION)
        .bind(sub.endpoint)
        .bind(sub.p256dh)
        .bind(sub.auth)
        .bind(sub.member_handle)
        .bind(sub.created_at)
        .execute(pool)
        .await?;
    Ok(())
}

const SQL_LIST_SUBSCRIPTIONS: &str = r#"
SELECT endpoint, p256dh, auth, member_handle, created_at
FROM push_subscriptions
ORDER BY created_at ASC
"#;

pub async fn list_subscriptions(pool: &SqlitePool) -> sqlx::Result<Vec<PushSubscriptionRow>> {
    sqlx::query_as::<_, PushSubscriptionRow>(SQL_LIST_SUBSCRIPTIONS)
        .fetch_all(pool)
        .await
}

const SQL_DELETE_SUBSCRIPTION: &str = "DELETE FROM push_subscriptions WHERE endpoint = ?1";

pub async fn delete_subscription(pool: &SqlitePool, endpoint: &str) -> sqlx::Result<u64> {
    let res = sqlx::query(SQL_DELETE_SUBSCRIPTION)
        .bind(endpoint)
        .execute(pool)
        .await?;
    Ok(res.rows_affected())
}
