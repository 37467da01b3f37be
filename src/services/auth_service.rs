use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::{login_session_repo, member_repo};
use crate::error::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct SessionMember {
    pub handle: String,
    pub display_name: String,
    pub is_admin: bool,
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| AppError::PasswordHash)
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn new_session_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Verifies the password and opens a session. Returns the session token.
pub async fn login(
    pool: &SqlitePool,
    handle: &str,
    password: &str,
    ttl: Duration,
) -> AppResult<String> {
    let handle = handle.trim().to_lowercase();
    let Some(member) = member_repo::load_member(pool, &handle).await? else {
        warn!("login failed for unknown handle '{}'", handle);
        return Err(AppError::Unauthorized);
    };
    if !verify_password(&member.password_hash, password) {
        warn!("login failed for '{}': wrong password", handle);
        return Err(AppError::Unauthorized);
    }

    let now = Utc::now();
    login_session_repo::purge_expired_for_member(pool, &member.handle, now).await?;

    let token = new_session_token();
    login_session_repo::insert_session(pool, &token, &member.handle, now, now + ttl).await?;
    info!("🔐 login {}", member.handle);
    Ok(token)
}

/// Looks the session up and re-reads the member row, so admin changes apply immediately.
pub async fn resolve_session(
    pool: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> AppResult<Option<SessionMember>> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }
    let Some(session) = login_session_repo::load_session(pool, token).await? else {
        return Ok(None);
    };
    if session.expires_at <= now {
        login_session_repo::delete_session(pool, token).await?;
        return Ok(None);
    }
    let Some(member) = member_repo::load_member(pool, &session.member_handle).await? else {
        login_session_repo::delete_session(pool, token).await?;
        return Ok(None);
    };
    Ok(Some(SessionMember {
        handle: member.handle,
        display_name: member.display_name,
        is_admin: member.is_admin,
    }))
}

pub async fn logout(pool: &SqlitePool, token: &str) -> AppResult<()> {
    login_session_repo::delete_session(pool, token).await?;
    Ok(())
}
