//! Version and concurrency control
//!
//! Snapshot versions count full document rows per project; edit versions
//! count in-place content updates per row. Content updates are optimistic:
//! the caller presents the edit version it read, and the write is a
//! compare-and-swap on it. Exactly one of any racing pair succeeds; the
//! loser gets `Conflict` and must refetch and resubmit. No merge, no rebase.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crs_common::db::models::{AuditEntry, CrsDocument, CrsStatus};
use crs_common::events::DocumentEvent;
use crs_common::{CrsContent, Error, Result};

use crate::completeness;
use crate::hub::UpdateHub;
use crate::provenance;

/// Create a new document row for a project
///
/// The snapshot version is one past the project's current maximum and the
/// edit version starts at 1. Provenance is computed from the content and an
/// audit row is written in the same transaction. Publishes `DocumentCreated`
/// once committed.
pub async fn create_snapshot(
    pool: &SqlitePool,
    hub: &UpdateHub,
    session_id: Uuid,
    project_id: Uuid,
    created_by: Uuid,
    content: CrsContent,
) -> Result<CrsDocument> {
    let provenance = provenance::track(&content);
    let id = Uuid::new_v4();
    let now = Utc::now();

    let mut tx = pool.begin().await?;

    let snapshot_version: i64 = sqlx::query_scalar::<_, i64>(
        "SELECT COALESCE(MAX(snapshot_version), 0) FROM crs_documents WHERE project_id = ?",
    )
    .bind(project_id.to_string())
    .fetch_one(&mut *tx)
    .await?
        + 1;

    sqlx::query(
        r#"
        INSERT INTO crs_documents
            (id, project_id, snapshot_version, edit_version, status,
             content, provenance, created_by, created_at)
        VALUES (?, ?, ?, 1, 'draft', ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(project_id.to_string())
    .bind(snapshot_version)
    .bind(serde_json::to_string(&content).map_err(|e| Error::Validation(e.to_string()))?)
    .bind(serde_json::to_string(&provenance).map_err(|e| Error::Validation(e.to_string()))?)
    .bind(created_by.to_string())
    .bind(now.to_rfc3339())
    .execute(&mut *tx)
    .await?;

    insert_audit(
        &mut tx,
        id,
        created_by,
        "snapshot_created",
        None,
        Some(CrsStatus::Draft),
        Some(&content),
        format!("Snapshot v{snapshot_version} created as draft"),
    )
    .await?;

    tx.commit().await?;

    info!(
        "Created document {} (project {}, snapshot v{})",
        id, project_id, snapshot_version
    );

    let document = CrsDocument {
        id,
        project_id,
        snapshot_version,
        edit_version: 1,
        status: CrsStatus::Draft,
        content,
        provenance,
        created_by,
        approved_by: None,
        rejection_reason: None,
        reviewed_at: None,
        created_at: now,
    };

    hub.publish(DocumentEvent::DocumentCreated {
        session_id,
        document_id: id,
        project_id,
        snapshot_version,
        status: CrsStatus::Draft,
        timestamp: now,
    });

    Ok(document)
}

/// Apply an in-place content update under optimistic locking
///
/// Fails with `Conflict` when `expected_edit_version` is stale, with
/// `EditForbidden` when the document is approved (regardless of version
/// match), and with `NotFound` for an unknown document; none of those
/// mutate anything. On success the edit version increments by exactly one,
/// provenance is recomputed, a rejected document flips back to draft, and
/// `ContentUpdated` (with a fresh completeness report) is published.
pub async fn update_content(
    pool: &SqlitePool,
    hub: &UpdateHub,
    session_id: Uuid,
    document_id: Uuid,
    new_content: CrsContent,
    expected_edit_version: i64,
    actor: Uuid,
) -> Result<CrsDocument> {
    let new_provenance = provenance::track(&new_content);

    let mut tx = pool.begin().await?;

    // Compare-and-swap on the edit version. The rejected -> draft flip
    // happens in the same write so the rejection reason can never outlive
    // the rejected status.
    let updated = sqlx::query(
        r#"
        UPDATE crs_documents
        SET content = ?,
            provenance = ?,
            edit_version = edit_version + 1,
            rejection_reason = CASE WHEN status = 'rejected' THEN NULL ELSE rejection_reason END,
            status = CASE WHEN status = 'rejected' THEN 'draft' ELSE status END
        WHERE id = ? AND edit_version = ? AND status != 'approved'
        "#,
    )
    .bind(serde_json::to_string(&new_content).map_err(|e| Error::Validation(e.to_string()))?)
    .bind(serde_json::to_string(&new_provenance).map_err(|e| Error::Validation(e.to_string()))?)
    .bind(document_id.to_string())
    .bind(expected_edit_version)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        drop(tx);
        // Classify the failure against the current row state
        let current = fetch_document(pool, document_id).await?;
        return match current.status {
            CrsStatus::Approved => Err(Error::EditForbidden {
                status: current.status,
            }),
            _ => Err(Error::Conflict {
                current_edit_version: current.edit_version,
                status: current.status,
            }),
        };
    }

    let document = fetch_document_tx(&mut tx, document_id).await?;

    insert_audit(
        &mut tx,
        document_id,
        actor,
        "content_updated",
        None,
        Some(document.status),
        Some(&document.content),
        format!("Content updated to edit v{}", document.edit_version),
    )
    .await?;

    tx.commit().await?;

    info!(
        "Updated document {} content to edit v{}",
        document_id, document.edit_version
    );

    hub.publish(DocumentEvent::ContentUpdated {
        session_id,
        document_id,
        edit_version: document.edit_version,
        status: document.status,
        completeness: completeness::score(&document.content),
        timestamp: Utc::now(),
    });

    Ok(document)
}

/// Fetch a document by id
pub async fn get_document(pool: &SqlitePool, document_id: Uuid) -> Result<CrsDocument> {
    fetch_document(pool, document_id).await
}

/// Latest snapshot for a project (highest snapshot version)
pub async fn latest_for_project(
    pool: &SqlitePool,
    project_id: Uuid,
) -> Result<Option<CrsDocument>> {
    let row = sqlx::query(
        "SELECT * FROM crs_documents WHERE project_id = ?
         ORDER BY snapshot_version DESC LIMIT 1",
    )
    .bind(project_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(CrsDocument::from_row).transpose()
}

/// All snapshots for a project, newest first
pub async fn versions_for_project(pool: &SqlitePool, project_id: Uuid) -> Result<Vec<CrsDocument>> {
    let rows = sqlx::query(
        "SELECT * FROM crs_documents WHERE project_id = ? ORDER BY snapshot_version DESC",
    )
    .bind(project_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(CrsDocument::from_row).collect()
}

/// Latest approved snapshot for a project, if any
pub async fn latest_approved(pool: &SqlitePool, project_id: Uuid) -> Result<Option<CrsDocument>> {
    let row = sqlx::query(
        "SELECT * FROM crs_documents WHERE project_id = ? AND status = 'approved'
         ORDER BY snapshot_version DESC LIMIT 1",
    )
    .bind(project_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(CrsDocument::from_row).transpose()
}

/// Audit trail for a document, oldest first
pub async fn audit_trail(pool: &SqlitePool, document_id: Uuid) -> Result<Vec<AuditEntry>> {
    let rows = sqlx::query(
        "SELECT * FROM crs_audit_log WHERE document_id = ? ORDER BY timestamp, id",
    )
    .bind(document_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(AuditEntry::from_row).collect()
}

pub(crate) async fn fetch_document(pool: &SqlitePool, document_id: Uuid) -> Result<CrsDocument> {
    let row = sqlx::query("SELECT * FROM crs_documents WHERE id = ?")
        .bind(document_id.to_string())
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("document {document_id}")))?;

    CrsDocument::from_row(&row)
}

pub(crate) async fn fetch_document_tx(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    document_id: Uuid,
) -> Result<CrsDocument> {
    let row = sqlx::query("SELECT * FROM crs_documents WHERE id = ?")
        .bind(document_id.to_string())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("document {document_id}")))?;

    CrsDocument::from_row(&row)
}

/// Append one audit row inside the caller's transaction
pub(crate) async fn insert_audit(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    document_id: Uuid,
    actor: Uuid,
    action: &str,
    old_status: Option<CrsStatus>,
    new_status: Option<CrsStatus>,
    new_content: Option<&CrsContent>,
    summary: String,
) -> Result<()> {
    let content_json = new_content
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| Error::Validation(e.to_string()))?;

    sqlx::query(
        r#"
        INSERT INTO crs_audit_log
            (id, document_id, actor, action, old_status, new_status, new_content, summary, timestamp)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(document_id.to_string())
    .bind(actor.to_string())
    .bind(action)
    .bind(old_status.map(|s| s.as_str()))
    .bind(new_status.map(|s| s.as_str()))
    .bind(content_json)
    .bind(summary)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut **tx)
    .await?;

    Ok(())
}
