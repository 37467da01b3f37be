use chrono::Utc;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::database::push_subscription_repo;
use crate::error::{AppError, AppResult};
use crate::models::PushSubscriptionRow;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Shape of the browser's `PushSubscription.toJSON()`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SubscriptionPayload {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BroadcastMessage {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct BroadcastReport {
    pub sent: usize,
    pub pruned: usize,
    pub failed: usize,
}

#[derive(Debug, PartialEq, Eq)]
enum Delivery {
    Sent,
    Gone,
    Failed,
}

/// Forwards notifications to an external push relay, which owns the Web Push encryption.
#[derive(Debug, Clone)]
pub struct PushRelay {
    client: reqwest::Client,
    url: Option<String>,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct RelayRequest<'a> {
    subscription: SubscriptionPayload,
    payload: &'a BroadcastMessage,
}

impl PushRelay {
    pub fn new(url: Option<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.url.is_some()
    }

    async fn deliver(&self, sub: &PushSubscriptionRow, message: &BroadcastMessage) -> Delivery {
        let Some(url) = self.url.as_deref() else {
            return Delivery::Failed;
        };
        let body = RelayRequest {
            subscription: SubscriptionPayload {
                endpoint: sub.endpoint.clone(),
                keys: SubscriptionKeys {
                    p256dh: sub.p256dh.clone(),
                    auth: sub.auth.clone(),
                },
            },
            payload: message,
        };

        let mut req = self.client.post(url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }

        match req.send().await {
            Ok(resp) => classify(resp.status()),
            Err(e) => {
                warn!("🔔 push relay unreachable: {}", e);
                Delivery::Failed
            }
        }
    }
}

fn classify(status: StatusCode) -> Delivery {
    if status.is_success() {
        Delivery::Sent
    } else if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        Delivery::Gone
    } else {
        warn!("🔔 push relay non-OK: {}", status);
        Delivery::Failed
    }
}

pub async fn subscribe(
    pool: &SqlitePool,
    member_handle: &str,
    payload: &SubscriptionPayload,
) -> AppResult<()> {
    let endpoint = payload.endpoint.trim();
    if !endpoint.starts_with("https://") {
        return Err(AppError::bad_request("Endpoint push tidak valid"));
    }
    if payload.keys.p256dh.trim().is_empty() || payload.keys.auth.trim().is_empty() {
        return Err(AppError::bad_request("Kunci push tidak lengkap"));
    }
    push_subscription_repo::upsert_subscription(
        pool,
        push_subscription_repo::NewPushSubscription {
            endpoint,
            p256dh: payload.keys.p256dh.trim(),
            auth: payload.keys.auth.trim(),
            member_handle,
            created_at: Utc::now(),
        },
    )
    .await?;
    Ok(())
}

pub async fn unsubscribe(pool: &SqlitePool, endpoint: &str) -> AppResult<()> {
    push_subscription_repo::delete_subscription(pool, endpoint.trim()).await?;
    Ok(())
}

/// Sends `message` to every subscription. Subscriptions the relay reports as gone
/// (404/410) are deleted; other failures are only counted.
pub async fn broadcast(
    pool: &SqlitePool,
    relay: &PushRelay,
    message: &BroadcastMessage,
) -> AppResult<BroadcastReport> {
    if !relay.is_configured() {
        return Err(AppError::bad_request("PUSH_RELAY_URL belum diatur"));
    }
    if message.title.trim().is_empty() {
        return Err(AppError::bad_request("Judul notifikasi wajib diisi"));
    }

    let subscriptions = push_subscription_repo::list_subscriptions(pool).await?;
    let mut report = BroadcastReport::default();

    for sub in &subscriptions {
        match relay.deliver(sub, message).await {
            Delivery::Sent => report.sent += 1,
            Delivery::Gone => {
                push_subscription_repo::delete_subscription(pool, &sub.endpoint).await?;
                report.pruned += 1;
            }
            Delivery::Failed => report.failed += 1,
        }
    }

    info!(
        "🔔 broadcast done: sent={}, pruned={}, failed={}",
        report.sent, report.pruned, report.failed
    );
    Ok(report)
}
