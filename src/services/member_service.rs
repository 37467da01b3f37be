use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::database::{attendance_repo, member_repo};
use crate::error::{AppError, AppResult};
use crate::models::MemberRow;
use crate::services::auth_service;
use crate::services::photo_store::{self, PhotoStore};

const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub handle: String,
    pub display_name: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub status_tag: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct ProfileForm {
    pub display_name: String,
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub status_tag: String,
    #[serde(default)]
    pub note: String,
    /// data URL; empty keeps the current photo
    #[serde(default)]
    pub profile_photo: String,
    #[serde(default)]
    pub cover_photo: String,
}

pub struct MemberView {
    pub handle: String,
    pub display_name: String,
    pub origin: String,
    pub status_tag: String,
    pub note: String,
    pub profile_url: Option<String>,
    pub cover_url: Option<String>,
    pub is_admin: bool,
    pub joined_label: String,
}

impl From<MemberRow> for MemberView {
    fn from(row: MemberRow) -> Self {
        MemberView {
            profile_url: row.profile_image.as_deref().map(photo_store::public_url),
            cover_url: row.cover_image.as_deref().map(photo_store::public_url),
            joined_label: row.created_at.format("%Y-%m-%d").to_string(),
            handle: row.handle,
            display_name: row.display_name,
            origin: row.origin,
            status_tag: row.status_tag,
            note: row.note.unwrap_or_default(),
            is_admin: row.is_admin,
        }
    }
}

/// Lowercase, 3-32 chars of `[a-z0-9._-]`.
pub fn normalize_handle(raw: &str) -> AppResult<String> {
    let handle = raw.trim().to_lowercase();
    let valid_chars = handle
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'));
    if !(3..=32).contains(&handle.chars().count()) || !valid_chars {
        return Err(AppError::bad_request(
            "Username 3-32 karakter: huruf kecil, angka, titik, garis bawah atau strip",
        ));
    }
    Ok(handle)
}

fn required(value: &str, message: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::bad_request(message));
    }
    Ok(value.to_string())
}

/// Creates a member. The very first account becomes admin.
pub async fn register(pool: &SqlitePool, form: &RegisterForm) -> AppResult<MemberRow> {
    let handle = normalize_handle(&form.handle)?;
    let display_name = required(&form.display_name, "Nama wajib diisi")?;
    if form.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::bad_request("Password minimal 6 karakter"));
    }
    if member_repo::load_member(pool, &handle).await?.is_some() {
        return Err(AppError::conflict("Username sudah dipakai"));
    }

    let is_admin = member_repo::count_members(pool).await? == 0;
    let password_hash = auth_service::hash_password(&form.password)?;

    let res = member_repo::insert_member(
        pool,
        member_repo::NewMember {
            handle: &handle,
            display_name: &display_name,
            origin: form.origin.trim(),
            status_tag: form.status_tag.trim(),
            is_admin,
            password_hash: &password_hash,
            created_at: Utc::now(),
        },
    )
    .await;
    match res {
        Ok(()) => {}
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            return Err(AppError::conflict("Username sudah dipakai"));
        }
        Err(e) => return Err(e.into()),
    }

    info!("👤 registered {} (admin={})", handle, is_admin);
    member_repo::load_member(pool, &handle)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn load_member_view(pool: &SqlitePool, handle: &str) -> AppResult<MemberView> {
    member_repo::load_member(pool, handle)
        .await?
        .map(MemberView::from)
        .ok_or(AppError::NotFound)
}

/// Updates the profile. New photos are written first; replaced photos are removed after
/// the row points at the new ones.
pub async fn update_profile(
    pool: &SqlitePool,
    photos: &PhotoStore,
    handle: &str,
    form: &ProfileForm,
) -> AppResult<MemberRow> {
    let Some(current) = member_repo::load_member(pool, handle).await? else {
        return Err(AppError::NotFound);
    };
    let display_name = required(&form.display_name, "Nama wajib diisi")?;

    let new_profile = match form.profile_photo.trim() {
        "" => None,
        url => Some(photos.save_data_url("profile", url).await?),
    };
    let new_cover = match form.cover_photo.trim() {
        "" => None,
        url => Some(photos.save_data_url("cover", url).await?),
    };

    let note = form.note.trim();
    member_repo::update_profile(
        pool,
        handle,
        member_repo::ProfileUpdate {
            display_name: &display_name,
            origin: form.origin.trim(),
            status_tag: form.status_tag.trim(),
            note: (!note.is_empty()).then_some(note),
            profile_image: new_profile.as_deref().or(current.profile_image.as_deref()),
            cover_image: new_cover.as_deref().or(current.cover_image.as_deref()),
        },
    )
    .await?;

    let replaced = [
        (new_profile.is_some(), current.profile_image.as_deref()),
        (new_cover.is_some(), current.cover_image.as_deref()),
    ];
    for (was_replaced, old) in replaced {
        if let (true, Some(old)) = (was_replaced, old) {
            if let Err(e) = photos.remove(old).await {
                warn!("could not remove replaced photo {}: {}", old, e);
            }
        }
    }

    member_repo::load_member(pool, handle)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn list_member_views(pool: &SqlitePool) -> AppResult<Vec<MemberView>> {
    Ok(member_repo::list_members(pool)
        .await?
        .into_iter()
        .map(MemberView::from)
        .collect())
}

pub async fn set_admin(
    pool: &SqlitePool,
    actor_handle: &str,
    target_handle: &str,
    is_admin: bool,
) -> AppResult<()> {
    if actor_handle == target_handle && !is_admin {
        return Err(AppError::bad_request("Tidak bisa mencabut akses admin sendiri"));
    }
    if member_repo::set_admin(pool, target_handle, is_admin).await? == 0 {
        return Err(AppError::NotFound);
    }
    info!("👤 {} set admin={} for {}", actor_handle, is_admin, target_handle);
    Ok(())
}

/// Removes the member, their attendance, schedule rows, subscriptions, sessions and photos.
pub async fn delete_member(
    pool: &SqlitePool,
    photos: &PhotoStore,
    actor_handle: &str,
    target_handle: &str,
) -> AppResult<()> {
    if actor_handle == target_handle {
        return Err(AppError::bad_request("Tidak bisa menghapus akun sendiri"));
    }
    let Some(member) = member_repo::load_member(pool, target_handle).await? else {
        return Err(AppError::NotFound);
    };

    let mut files = attendance_repo::list_photos_for_member(pool, target_handle).await?;
    files.extend(member.profile_image.clone());
    files.extend(member.cover_image.clone());

    member_repo::delete_member_cascade(pool, target_handle).await?;

    for file in files {
        if let Err(e) = photos.remove(&file).await {
            warn!("could not remove photo {} of {}: {}", file, target_handle, e);
        }
    }
    info!("👤 {} deleted member {}", actor_handle, target_handle);
    Ok(())
}
