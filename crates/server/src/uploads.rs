//! Storage of uploaded documents and attachments.
//!
//! Files arrive either as a `multipart/form-data` part or base64-encoded
//! inside a JSON body, and are written under the upload directory with a
//! random UUID name, keeping the original extension.

use std::path::{Path, PathBuf};

use api_types::work_order::ArchivoUpload;
use axum::{
    Json,
    extract::{FromRequest, Multipart, Request},
    http::{StatusCode, header},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use uuid::Uuid;

use crate::ServerError;

const MB: usize = 1024 * 1024;

/// Purchase-order documents.
pub const ORDER_DOCUMENT_MAX_BYTES: usize = 10 * MB;
/// Work-order attachments.
pub const WORK_ORDER_FILE_MAX_BYTES: usize = 50 * MB;
/// Comment attachments.
pub const COMMENT_FILE_MAX_BYTES: usize = 20 * MB;

const ORDER_DOCUMENT_EXTENSIONS: [&str; 9] = [
    "pdf", "jpg", "jpeg", "png", "gif", "doc", "docx", "xls", "xlsx",
];

const ATTACHMENT_MIME_TYPES: [&str; 10] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
    "text/plain",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// Request body limit for an upload route whose decoded file may reach
/// `max_bytes`. Covers base64 growth plus the JSON or multipart envelope.
pub const fn body_limit(max_bytes: usize) -> usize {
    max_bytes / 3 * 4 + 64 * 1024
}

/// A file received in a request, before any validation.
#[derive(Debug)]
pub struct Upload {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl<S> FromRequest<S> for Upload
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));
        if !is_multipart {
            let Json(body) = Json::<ArchivoUpload>::from_request(req, state)
                .await
                .map_err(|err| rejected(err.status(), err.body_text()))?;
            return Ok(Self {
                bytes: decode(&body.contenido_base64)?,
                file_name: body.nombre_archivo,
                mime_type: body.tipo_mime,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|err| rejected(err.status(), err.body_text()))?;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| rejected(err.status(), err.body_text()))?
        {
            // Form fields without a file name are plain values.
            let Some(file_name) = field.file_name().map(str::to_string) else {
                continue;
            };
            let mime_type = field.content_type().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|err| rejected(err.status(), err.body_text()))?;
            return Ok(Self {
                file_name,
                mime_type,
                bytes: bytes.to_vec(),
            });
        }
        Err(ServerError::Generic("multipart body carries no file".to_string()))
    }
}

fn rejected(status: StatusCode, text: String) -> ServerError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(text)
    } else {
        ServerError::Generic(text)
    }
}

/// A file written to disk.
#[derive(Debug, Clone)]
pub struct StoredFile {
    pub stored_name: String,
    pub path: PathBuf,
    pub size: usize,
}

/// Lower-cased extension of `file_name`, if any.
pub fn extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// Validate a purchase-order document name, returning its extension.
pub fn check_order_document(file_name: &str) -> Result<String, ServerError> {
    match extension(file_name) {
        Some(ext) if ORDER_DOCUMENT_EXTENSIONS.contains(&ext.as_str()) => Ok(ext),
        _ => Err(ServerError::Generic(format!(
            "file type not allowed; accepted: {}",
            ORDER_DOCUMENT_EXTENSIONS.join(", ")
        ))),
    }
}

/// MIME type served back for a stored purchase-order document.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "pdf" => "application/pdf",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}

/// Normalized attachment MIME type, if it is on the allow-list.
pub fn check_attachment_mime(mime_type: Option<&str>) -> Result<String, ServerError> {
    let Some(mime_type) = mime_type.map(|mime| mime.trim().to_ascii_lowercase()) else {
        return Err(ServerError::UnsupportedMedia("file type missing".to_string()));
    };
    if ATTACHMENT_MIME_TYPES.contains(&mime_type.as_str()) {
        return Ok(mime_type);
    }
    Err(ServerError::UnsupportedMedia(format!(
        "file type {mime_type} not allowed"
    )))
}

pub fn decode(content: &str) -> Result<Vec<u8>, ServerError> {
    STANDARD
        .decode(content.trim())
        .map_err(|err| ServerError::Generic(format!("invalid base64 content: {err}")))
}

pub fn check_size(bytes: &[u8], max_bytes: usize) -> Result<(), ServerError> {
    if bytes.len() > max_bytes {
        return Err(too_large(max_bytes));
    }
    Ok(())
}

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

fn too_large(max_bytes: usize) -> ServerError {
    ServerError::PayloadTooLarge(format!("file exceeds {} MB", max_bytes / MB))
}

#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `bytes` under `subdir` with a fresh UUID name.
    pub async fn save(
        &self,
        subdir: &str,
        extension: Option<&str>,
        bytes: &[u8],
    ) -> Result<StoredFile, ServerError> {
        let dir = self.root.join(subdir);
        tokio::fs::create_dir_all(&dir).await.map_err(io_error)?;
        let stored_name = match extension {
            Some(ext) => format!("{}.{ext}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };
        let path = dir.join(&stored_name);
        tokio::fs::write(&path, bytes).await.map_err(io_error)?;
        tracing::info!(path = %path.display(), size = bytes.len(), "file stored");
        Ok(StoredFile {
            stored_name,
            path,
            size: bytes.len(),
        })
    }

    pub async fn read(&self, path: &str) -> Result<Vec<u8>, ServerError> {
        tokio::fs::read(path).await.map_err(|err| {
            tracing::warn!(path, "stored file missing: {err}");
            ServerError::Engine(engine::EngineError::KeyNotFound("file".to_string()))
        })
    }

    /// Remove a stored file. A missing file is only logged.
    pub async fn remove(&self, path: &str) {
        if let Err(err) = tokio::fs::remove_file(path).await {
            tracing::warn!(path, "could not remove stored file: {err}");
        }
    }
}

fn io_error(err: std::io::Error) -> ServerError {
    tracing::error!("upload storage failed: {err}");
    ServerError::Internal("could not store file".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_documents_are_checked_by_extension() {
        assert_eq!(check_order_document("Factura.PDF").unwrap(), "pdf");
        assert!(check_order_document("planilla.xlsx").is_ok());
        assert!(check_order_document("script.sh").is_err());
        assert!(check_order_document("sin_extension").is_err());
    }

    #[test]
    fn attachments_are_checked_by_mime() {
        assert_eq!(check_attachment_mime(Some("image/png")).unwrap(), "image/png");
        assert_eq!(
            check_attachment_mime(Some("Application/PDF")).unwrap(),
            "application/pdf"
        );
        assert!(matches!(
            check_attachment_mime(Some("application/x-msdownload")),
            Err(ServerError::UnsupportedMedia(_))
        ));
        assert!(matches!(
            check_attachment_mime(None),
            Err(ServerError::UnsupportedMedia(_))
        ));
    }

    #[test]
    fn size_limit_applies_to_decoded_bytes() {
        let bytes = decode(&encode(&[7u8; 64])).unwrap();
        assert!(check_size(&bytes, 64).is_ok());
        assert!(matches!(
            check_size(&bytes, 32),
            Err(ServerError::PayloadTooLarge(_))
        ));
        assert!(matches!(decode("@@@"), Err(ServerError::Generic(_))));
    }

    #[test]
    fn body_limit_leaves_room_for_base64() {
        let limit = body_limit(ORDER_DOCUMENT_MAX_BYTES);
        assert!(encode(&vec![0u8; ORDER_DOCUMENT_MAX_BYTES]).len() < limit);
    }

    #[tokio::test]
    async fn saved_files_get_uuid_names() {
        let root = tempfile::tempdir().unwrap();
        let store = UploadStore::new(root.path());
        let stored = store.save("ordenes", Some("pdf"), b"hola").await.unwrap();
        assert!(stored.stored_name.ends_with(".pdf"));
        let path = stored.path.to_string_lossy().to_string();
        assert_eq!(store.read(&path).await.unwrap(), b"hola");
        store.remove(&path).await;
        assert!(store.read(&path).await.is_err());
    }
}
