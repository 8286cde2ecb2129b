use chrono::{DateTime, Datelike, Utc};
use sea_orm::{ActiveValue, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{AttachmentType, EngineError, ResultEngine, Upload, attachments, util::best_effort};

use super::Engine;

/// Largest accepted attachment, 10 MiB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Images and PDFs up to [`MAX_UPLOAD_BYTES`]. Empty files are never stored.
pub(crate) fn accepts_upload(upload: &Upload) -> bool {
    let kind_ok =
        upload.content_type.starts_with("image/") || upload.content_type == "application/pdf";
    !upload.bytes.is_empty() && kind_ok && upload.bytes.len() <= MAX_UPLOAD_BYTES
}

/// Replaces everything but ASCII letters, digits, `.` and `-` with `_`.
pub(crate) fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `{type}/{YYYY}/{MM}/{expense_id}/{millis}-{sanitized name}`.
pub(crate) fn object_path(
    attachment_type: AttachmentType,
    expense_id: Uuid,
    at: DateTime<Utc>,
    file_name: &str,
) -> String {
    format!(
        "{}/{}/{:02}/{expense_id}/{}-{}",
        attachment_type.as_str(),
        at.year(),
        at.month(),
        at.timestamp_millis(),
        sanitize_file_name(file_name)
    )
}

impl Engine {
    /// Uploads the acceptable files and records their metadata. Returns how
    /// many were stored; rejected or failed uploads are skipped.
    pub(super) async fn store_uploads(&self, expense_id: Uuid, uploads: Vec<Upload>) -> usize {
        let mut rows = Vec::new();
        for upload in uploads {
            if !accepts_upload(&upload) {
                tracing::info!(
                    %expense_id,
                    file = %upload.file_name,
                    content_type = %upload.content_type,
                    size = upload.bytes.len(),
                    "skipping unsupported attachment"
                );
                continue;
            }

            let now = Utc::now();
            let path = object_path(upload.attachment_type, expense_id, now, &upload.file_name);
            if let Err(err) = self
                .objects
                .put(&path, upload.bytes, &upload.content_type, false)
                .await
            {
                tracing::warn!(%expense_id, %path, error = %err, "attachment upload failed");
                continue;
            }

            rows.push(attachments::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4()),
                expense_id: ActiveValue::Set(expense_id),
                attachment_type: ActiveValue::Set(upload.attachment_type.as_str().to_string()),
                file_path: ActiveValue::Set(path),
                file_name: ActiveValue::Set(upload.file_name),
                uploaded_at: ActiveValue::Set(now),
            });
        }

        if rows.is_empty() {
            return 0;
        }
        let stored = rows.len();
        let inserted = attachments::Entity::insert_many(rows)
            .exec(&self.database)
            .await
            .map(|_| ())
            .map_err(EngineError::from);
        if inserted.is_err() {
            best_effort("attachment metadata insert", inserted);
            return 0;
        }
        stored
    }

    /// Deletes the stored objects, then their metadata rows. Failures are
    /// logged and do not stop the remaining deletions.
    pub(super) async fn remove_attachments(&self, rows: Vec<attachments::Model>) {
        if rows.is_empty() {
            return;
        }
        for row in &rows {
            let deleted = self
                .objects
                .delete(&row.file_path)
                .await
                .map_err(|err| EngineError::ObjectStore(err.to_string()));
            best_effort("attachment object delete", deleted);
        }

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let removed = attachments::Entity::delete_many()
            .filter(attachments::Column::Id.is_in(ids))
            .exec(&self.database)
            .await
            .map(|_| ())
            .map_err(EngineError::from);
        best_effort("attachment metadata delete", removed);
    }
}
