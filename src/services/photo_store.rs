use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Photos live on disk under `root`; rows keep the relative reference (`izin/<uuid>.jpg`).
#[derive(Debug, Clone)]
pub struct PhotoStore {
    root: PathBuf,
}

#[derive(Debug, PartialEq, Eq)]
pub struct DecodedPhoto {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

impl PhotoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Decodes a `data:image/...;base64,` URL and writes it under `folder`.
    pub async fn save_data_url(&self, folder: &str, data_url: &str) -> AppResult<String> {
        let photo = decode_data_url(data_url)?;
        let reference = format!("{}/{}.{}", folder, Uuid::new_v4(), photo.extension);
        let path = self.root.join(&reference);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &photo.bytes).await?;
        info!("📷 stored photo {} ({} bytes)", reference, photo.bytes.len());
        Ok(reference)
    }

    /// Missing files are not an error.
    pub async fn remove(&self, reference: &str) -> AppResult<()> {
        let Some(path) = self.resolve(reference) else {
            warn!("refusing to remove photo outside store: {}", reference);
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(e)),
        }
    }

    pub fn exists(&self, reference: &str) -> bool {
        self.resolve(reference).is_some_and(|p| p.is_file())
    }

    fn resolve(&self, reference: &str) -> Option<PathBuf> {
        let reference = reference.trim();
        if reference.is_empty()
            || reference.starts_with('/')
            || reference.contains("..")
            || reference.contains('\\')
        {
            return None;
        }
        Some(self.root.join(reference))
    }
}

/// Public URL of a stored photo, served by the `/uploads` route.
pub fn public_url(reference: &str) -> String {
    format!("/uploads/{}", reference.trim_start_matches('/'))
}

pub fn decode_data_url(data_url: &str) -> AppResult<DecodedPhoto> {
    let data_url = data_url.trim();
    let Some(rest) = data_url.strip_prefix("data:") else {
        return Err(AppError::bad_request("Foto harus berupa data URL gambar"));
    };
    let Some((meta, payload)) = rest.split_once(',') else {
        return Err(AppError::bad_request("Format foto tidak valid"));
    };
    let Some(mime) = meta.strip_suffix(";base64") else {
        return Err(AppError::bad_request("Foto harus di-encode base64"));
    };

    let extension = match mime.to_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        _ => return Err(AppError::bad_request("Jenis foto tidak didukung")),
    };

    let bytes = general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|_| AppError::bad_request("Foto tidak bisa dibaca"))?;
    if bytes.is_empty() {
        return Err(AppError::bad_request("Foto kosong"));
    }
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(AppError::bad_request("Ukuran foto maksimal 5 MB"));
    }

    Ok(DecodedPhoto { extension, bytes })
}
