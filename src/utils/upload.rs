use std::fmt::Display;
use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::web::{self, Bytes, BytesMut};
use actix_web::HttpRequest;
use futures_util::{pin_mut, Stream, StreamExt};
use log::{debug, warn};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::errors::AppError;
use crate::utils::validation::{fields_from_json, RawFields};

/// URL prefix under which the upload directory is served.
pub const UPLOAD_URL_PREFIX: &str = "/uploads";

/// Name of the multipart file field carrying the attachment.
pub const PROFILE_PIC_FIELD: &str = "profile_pic";

const REFERENCE_PREFIX: &str = "uploads";

/// Largest JSON body accepted on create/update.
pub const JSON_BODY_LIMIT: usize = 100 * 1024;

/// An attachment persisted to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    /// Value stored in the record; `"/" + reference` resolves under [`UPLOAD_URL_PREFIX`].
    pub reference: String,
    pub path: PathBuf,
}

/// Decoded create/update request: text fields plus at most one attachment.
#[derive(Debug)]
pub struct EmployeePayload {
    pub fields: RawFields,
    pub profile_pic: Option<StoredFile>,
}

pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Opens the upload directory, creating it if it does not exist yet.
    pub async fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(UploadStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Streams `data` into a freshly named file. A partially written file is
    /// removed before the error is returned.
    pub async fn save<S, E>(&self, original_name: &str, data: S) -> Result<StoredFile, AppError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let file_name = unique_file_name(original_name);
        let stored = StoredFile {
            reference: format!("{}/{}", REFERENCE_PREFIX, file_name),
            path: self.dir.join(&file_name),
        };

        match write_stream(&stored.path, data).await {
            Ok(()) => {
                debug!("Stored attachment {} at {}", original_name, stored.path.display());
                Ok(stored)
            }
            Err(err) => {
                self.discard(&stored).await;
                Err(err)
            }
        }
    }

    /// Best-effort removal of a file that no record will reference.
    pub async fn discard(&self, file: &StoredFile) {
        match fs::remove_file(&file.path).await {
            Ok(()) => warn!("Removed orphaned attachment {}", file.path.display()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => warn!("Could not remove attachment {}: {}", file.path.display(), err),
        }
    }
}

/// `<uuid><ext>` where `<ext>` is the original extension, dot included, kept verbatim.
pub fn unique_file_name(original_name: &str) -> String {
    let extension = Path::new(original_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    format!("{}{}", Uuid::new_v4().simple(), extension)
}

async fn write_stream<S, E>(path: &Path, data: S) -> Result<(), AppError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    pin_mut!(data);
    let mut file = fs::File::create(path).await?;
    while let Some(chunk) = data.next().await {
        let chunk = chunk
            .map_err(|err| AppError::Validation(format!("upload interrupted: {}", err)))?;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(())
}

/// Reads a create/update body. Multipart bodies may carry one `profile_pic`
/// file, which is written to `uploads` before this returns; JSON bodies carry
/// fields only.
pub async fn read_payload(
    req: &HttpRequest,
    payload: web::Payload,
    uploads: &UploadStore,
) -> Result<EmployeePayload, AppError> {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::new(req.headers(), payload);
        read_multipart(multipart, uploads).await
    } else if content_type.starts_with("application/json") {
        let body = read_body(payload).await?;
        Ok(EmployeePayload { fields: fields_from_json(&body)?, profile_pic: None })
    } else {
        Ok(EmployeePayload { fields: RawFields::new(), profile_pic: None })
    }
}

async fn read_body(mut payload: web::Payload) -> Result<BytesMut, AppError> {
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|err| AppError::Validation(err.to_string()))?;
        if body.len() + chunk.len() > JSON_BODY_LIMIT {
            return Err(AppError::PayloadTooLarge(format!(
                "request body exceeds {} bytes",
                JSON_BODY_LIMIT
            )));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

async fn read_multipart(
    mut multipart: Multipart,
    uploads: &UploadStore,
) -> Result<EmployeePayload, AppError> {
    let mut fields = RawFields::new();
    let mut profile_pic = None;

    let result = read_parts(&mut multipart, uploads, &mut fields, &mut profile_pic).await;
    if let Err(err) = result {
        if let Some(file) = profile_pic.take() {
            uploads.discard(&file).await;
        }
        return Err(err);
    }
    Ok(EmployeePayload { fields, profile_pic })
}

async fn read_parts(
    multipart: &mut Multipart,
    uploads: &UploadStore,
    fields: &mut RawFields,
    profile_pic: &mut Option<StoredFile>,
) -> Result<(), AppError> {
    while let Some(part) = multipart.next().await {
        let mut field = part?;
        let disposition = field.content_disposition().clone();
        let name = disposition.get_name().unwrap_or_default().to_string();

        match disposition.get_filename() {
            Some(original_name) if name == PROFILE_PIC_FIELD && !original_name.is_empty() => {
                if profile_pic.is_some() {
                    return Err(AppError::Validation(format!(
                        "only one {} file is accepted",
                        PROFILE_PIC_FIELD
                    )));
                }
                *profile_pic = Some(uploads.save(original_name, &mut field).await?);
            }
            Some(_) => {
                while let Some(chunk) = field.next().await {
                    chunk?;
                }
            }
            None => {
                let mut value = BytesMut::new();
                while let Some(chunk) = field.next().await {
                    value.extend_from_slice(&chunk?);
                }
                let value = String::from_utf8(value.to_vec())
                    .map_err(|_| AppError::Validation(format!("{} is not valid UTF-8", name)))?;
                fields.insert(name, value);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("employee-uploads-{}", Uuid::new_v4()))
    }

    #[test]
    fn file_names_keep_the_original_extension() {
        let name = unique_file_name("portrait.final.PNG");
        assert!(name.ends_with(".PNG"));
        assert_eq!(name.len(), 32 + ".PNG".len());
        assert!(!unique_file_name("README").contains('.'));
        assert_ne!(unique_file_name("a.png"), unique_file_name("a.png"));
    }

    #[actix_web::test]
    async fn save_writes_bytes_and_discard_removes_them() {
        let uploads = UploadStore::open(temp_dir()).await.unwrap();
        let chunks: Vec<Result<Bytes, std::io::Error>> =
            vec![Ok(Bytes::from_static(b"\x89PNG")), Ok(Bytes::from_static(b"rest"))];
        let stored = uploads.save("me.png", stream::iter(chunks)).await.unwrap();

        assert!(stored.reference.starts_with("uploads/"));
        assert!(stored.reference.ends_with(".png"));
        assert_eq!(fs::read(&stored.path).await.unwrap(), b"\x89PNGrest");

        uploads.discard(&stored).await;
        assert!(!stored.path.exists());
    }

    #[actix_web::test]
    async fn failed_stream_leaves_no_file() {
        let uploads = UploadStore::open(temp_dir()).await.unwrap();
        let chunks: Vec<Result<Bytes, String>> =
            vec![Ok(Bytes::from_static(b"partial")), Err("connection reset".to_string())];
        let err = uploads.save("me.png", stream::iter(chunks)).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        let mut entries = fs::read_dir(uploads.dir()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }
}
