//! Upload policy: which files are accepted and where they land.
//!
//! The policy is pure; the [`crate::FileStore`] port writes the bytes to the
//! relative path chosen by [`plan_upload`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{FeedxError, Timestamp};

/// Largest accepted upload, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Message returned for uploads over [`MAX_UPLOAD_BYTES`].
pub const FILE_TOO_LARGE: &str = "File too large. Maximum size is 100MB.";

/// URL prefix under which stored files are served.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// MIME types accepted by the upload endpoint.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    // Images
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/svg+xml",
    // Videos
    "video/mp4",
    "video/avi",
    "video/mov",
    "video/mkv",
    "video/webm",
    "video/quicktime",
    "video/wmv",
    "video/flv",
    // Documents
    "application/pdf",
    "text/plain",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.ms-powerpoint",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    // Archives
    "application/zip",
    "application/x-zip-compressed",
    "application/x-rar-compressed",
    // Text / code
    "text/csv",
    "text/html",
    "text/css",
    "text/javascript",
    "application/json",
    // Audio
    "audio/mpeg",
    "audio/wav",
    "audio/ogg",
    "audio/mp4",
];

/// Top-level folder an upload is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadCategory {
    Images,
    Videos,
    Documents,
    Others,
}

impl UploadCategory {
    /// Files by MIME type.
    pub fn classify(mime_type: &str) -> Self {
        if mime_type.starts_with("image/") {
            return Self::Images;
        }
        if mime_type.starts_with("video/") {
            return Self::Videos;
        }
        const DOCUMENT_MARKERS: [&str; 8] = [
            "pdf",
            "document",
            "text",
            "word",
            "excel",
            "sheet",
            "powerpoint",
            "presentation",
        ];
        if DOCUMENT_MARKERS.iter().any(|m| mime_type.contains(m)) {
            Self::Documents
        } else {
            Self::Others
        }
    }

    pub fn folder(self) -> &'static str {
        match self {
            Self::Images => "images",
            Self::Videos => "videos",
            Self::Documents => "documents",
            Self::Others => "others",
        }
    }
}

/// An upload as received from a client.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub original_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// Groups the file under `resources/<slug>/` when set.
    pub resource_name: Option<String>,
    /// Suffix used with `resource_name`; defaults to unix millis.
    pub file_counter: Option<String>,
}

/// Where an accepted upload is written, relative to the uploads root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPlan {
    /// Slash-separated directory, e.g. `"images"` or `"resources/dbms-notes"`.
    pub directory: String,
    pub file_name: String,
}

impl UploadPlan {
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.directory, self.file_name)
    }

    pub fn url(&self) -> String {
        format!("{UPLOADS_URL_PREFIX}/{}", self.relative_path())
    }
}

/// Metadata of a stored upload, returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: usize,
    /// Path relative to the uploads root.
    pub path: String,
    pub url: String,
}

/// Validates `request` and chooses its destination.
pub fn plan_upload(request: &UploadRequest, now: Timestamp) -> Result<UploadPlan, FeedxError> {
    if request.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(FeedxError::validation(FILE_TOO_LARGE));
    }
    if !ALLOWED_MIME_TYPES.contains(&request.mime_type.as_str()) {
        return Err(FeedxError::validation(
            "File type not allowed. Supported: images, videos, PDFs, documents, archives, and text files.",
        ));
    }

    let (base, ext) = split_extension(&request.original_name);
    let millis = now.as_datetime().timestamp_millis();

    if let Some(slug) = request.resource_name.as_deref().map(slugify).filter(|s| !s.is_empty()) {
        let counter = request
            .file_counter
            .as_deref()
            .map(sanitize_base)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| millis.to_string());
        return Ok(UploadPlan {
            directory: format!("resources/{slug}"),
            file_name: format!("{slug}-{counter}{ext}"),
        });
    }

    let base = match sanitize_base(base) {
        b if b.is_empty() => "file".to_string(),
        b => b,
    };
    let nonce = Uuid::new_v4().simple().to_string();
    Ok(UploadPlan {
        directory: UploadCategory::classify(&request.mime_type).folder().to_string(),
        file_name: format!("{base}-{millis}-{}{ext}", &nonce[..6]),
    })
}

/// Keeps `[A-Za-z0-9_-]`.
pub fn sanitize_base(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Lower-cases and collapses every non-alphanumeric run into one `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Splits `"report.final.PDF"` into `("report.final", ".PDF")`.
///
/// The extension keeps alphanumerics only; a leading dot does not start one.
fn split_extension(name: &str) -> (&str, String) {
    let file = name.rsplit(['/', '\\']).next().unwrap_or(name);
    match file.rfind('.') {
        Some(i) if i > 0 => {
            let ext: String = file[i + 1..]
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect();
            let ext = if ext.is_empty() { String::new() } else { format!(".{ext}") };
            (&file[..i], ext)
        }
        _ => (file, String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(name: &str, mime: &str) -> UploadRequest {
        UploadRequest {
            original_name: name.into(),
            mime_type: mime.into(),
            bytes: vec![1, 2, 3],
            resource_name: None,
            file_counter: None,
        }
    }

    #[test]
    fn classifies_by_mime_family() {
        assert_eq!(UploadCategory::classify("image/png"), UploadCategory::Images);
        assert_eq!(UploadCategory::classify("video/webm"), UploadCategory::Videos);
        assert_eq!(UploadCategory::classify("application/pdf"), UploadCategory::Documents);
        assert_eq!(
            UploadCategory::classify("application/vnd.ms-excel"),
            UploadCategory::Documents
        );
        assert_eq!(UploadCategory::classify("application/zip"), UploadCategory::Others);
        assert_eq!(UploadCategory::classify("audio/mpeg"), UploadCategory::Others);
    }

    #[test]
    fn plan_sanitises_the_stored_name() {
        let plan = plan_upload(&request("../My Photo!.PNG", "image/png"), Timestamp::now()).unwrap();
        assert_eq!(plan.directory, "images");
        assert!(plan.file_name.starts_with("MyPhoto-"));
        assert!(plan.file_name.ends_with(".PNG"));
        assert!(plan.url().starts_with("/uploads/images/MyPhoto-"));
    }

    #[test]
    fn unnamed_files_fall_back_to_file() {
        let plan = plan_upload(&request("???.pdf", "application/pdf"), Timestamp::now()).unwrap();
        assert_eq!(plan.directory, "documents");
        assert!(plan.file_name.starts_with("file-"));
    }

    #[test]
    fn resource_uploads_are_grouped_by_slug() {
        let mut req = request("unit1.pdf", "application/pdf");
        req.resource_name = Some("  DBMS Notes (2024) ".into());
        req.file_counter = Some("3".into());
        let plan = plan_upload(&req, Timestamp::now()).unwrap();
        assert_eq!(plan.relative_path(), "resources/dbms-notes-2024/dbms-notes-2024-3.pdf");
    }

    #[test]
    fn disallowed_types_are_rejected() {
        let err = plan_upload(&request("run.exe", "application/x-msdownload"), Timestamp::now()).unwrap_err();
        assert!(err.to_string().starts_with("File type not allowed"));
    }

    #[test]
    fn oversize_files_are_rejected() {
        let mut req = request("big.mp4", "video/mp4");
        req.bytes = vec![0; MAX_UPLOAD_BYTES + 1];
        let err = plan_upload(&req, Timestamp::now()).unwrap_err();
        assert_eq!(err.to_string(), "File too large. Maximum size is 100MB.");
    }

    #[test]
    fn dotfiles_have_no_extension() {
        assert_eq!(split_extension(".env"), (".env", String::new()));
        assert_eq!(split_extension("a.tar.gz"), ("a.tar", ".gz".to_string()));
    }
}
