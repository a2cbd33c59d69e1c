use std::sync::Arc;

use domain::uploads::{plan_upload, StoredFile, UploadRequest};
use domain::{FeedxError, FileStore, Principal, Timestamp};
use tracing::{info, instrument};

/// Accepts uploaded files and writes them under the uploads root.
#[derive(Clone)]
pub struct UploadService {
    files: Arc<dyn FileStore>,
}

impl UploadService {
    pub fn new(files: Arc<dyn FileStore>) -> Self {
        Self { files }
    }

    #[instrument(skip(self, caller, request), fields(
        user = %caller.username,
        name = %request.original_name,
        mime = %request.mime_type,
        size = request.bytes.len(),
    ))]
    pub async fn store(
        &self,
        caller: &Principal,
        request: UploadRequest,
    ) -> Result<StoredFile, FeedxError> {
        let plan = plan_upload(&request, Timestamp::now())?;
        let path = plan.relative_path();
        self.files.save(&path, &request.bytes).await?;
        info!(path = %path, "file stored");
        Ok(StoredFile {
            url: plan.url(),
            filename: plan.file_name,
            original_name: request.original_name,
            mimetype: request.mime_type,
            size: request.bytes.len(),
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Harness;
    use domain::Role;

    fn request(name: &str, mime: &str) -> UploadRequest {
        UploadRequest {
            original_name: name.into(),
            mime_type: mime.into(),
            bytes: b"%PDF-1.4".to_vec(),
            resource_name: None,
            file_counter: None,
        }
    }

    #[tokio::test]
    async fn stores_under_the_category_folder() {
        let h = Harness::new();
        let student = h.account("22001-CM-001", Role::Student).await;
        let stored = h
            .services
            .uploads
            .store(&student, request("Lab Record.pdf", "application/pdf"))
            .await
            .unwrap();

        assert!(stored.path.starts_with("documents/LabRecord-"));
        assert_eq!(stored.url, format!("/uploads/{}", stored.path));
        assert_eq!(stored.size, 8);
        let on_disk = std::fs::read(h.uploads_dir.path().join(&stored.path)).unwrap();
        assert_eq!(on_disk, b"%PDF-1.4");
    }

    #[tokio::test]
    async fn resource_uploads_use_the_counter() {
        let h = Harness::new();
        let admin = h.account("root", Role::Admin).await;
        let mut req = request("u1.pdf", "application/pdf");
        req.resource_name = Some("OS Notes".into());
        req.file_counter = Some("2".into());
        let stored = h.services.uploads.store(&admin, req).await.unwrap();
        assert_eq!(stored.path, "resources/os-notes/os-notes-2.pdf");
        assert!(h.uploads_dir.path().join("resources/os-notes/os-notes-2.pdf").exists());
    }

    #[tokio::test]
    async fn rejected_types_write_nothing() {
        let h = Harness::new();
        let student = h.account("22001-CM-001", Role::Student).await;
        let err = h
            .services
            .uploads
            .store(&student, request("x.exe", "application/x-msdownload"))
            .await
            .unwrap_err();
        assert!(matches!(err, FeedxError::Validation(_)));
        assert_eq!(std::fs::read_dir(h.uploads_dir.path()).unwrap().count(), 0);
    }
}
