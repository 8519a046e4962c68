//! Database models

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

use crate::content::{CrsContent, Field, Provenance};
use crate::{Error, Result};

/// Approval workflow status of a document revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrsStatus {
    Draft,
    UnderReview,
    Approved,
    Rejected,
}

impl CrsStatus {
    /// Stable string form used in the database and on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            CrsStatus::Draft => "draft",
            CrsStatus::UnderReview => "under_review",
            CrsStatus::Approved => "approved",
            CrsStatus::Rejected => "rejected",
        }
    }

    /// Parse the stored string form
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(CrsStatus::Draft),
            "under_review" => Ok(CrsStatus::UnderReview),
            "approved" => Ok(CrsStatus::Approved),
            "rejected" => Ok(CrsStatus::Rejected),
            other => Err(Error::Validation(format!("unknown status: {other}"))),
        }
    }
}

impl std::fmt::Display for CrsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted CRS revision line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrsDocument {
    pub id: Uuid,
    pub project_id: Uuid,
    /// Monotonic per project, one per full new document row
    pub snapshot_version: i64,
    /// Monotonic per row, +1 per successful in-place content update
    pub edit_version: i64,
    pub status: CrsStatus,
    pub content: CrsContent,
    /// One entry per known field
    pub provenance: BTreeMap<Field, Provenance>,
    pub created_by: Uuid,
    pub approved_by: Option<Uuid>,
    /// Non-empty whenever status is rejected
    pub rejection_reason: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl CrsDocument {
    /// Map a `crs_documents` row
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        let content_json: String = row.get("content");
        let content: CrsContent = serde_json::from_str(&content_json)
            .map_err(|e| Error::Validation(format!("corrupt content column: {e}")))?;

        let provenance_json: String = row.get("provenance");
        let provenance: BTreeMap<Field, Provenance> = serde_json::from_str(&provenance_json)
            .map_err(|e| Error::Validation(format!("corrupt provenance column: {e}")))?;

        Ok(CrsDocument {
            id: parse_uuid(row.get("id"))?,
            project_id: parse_uuid(row.get("project_id"))?,
            snapshot_version: row.get("snapshot_version"),
            edit_version: row.get("edit_version"),
            status: CrsStatus::parse(row.get::<&str, _>("status"))?,
            content,
            provenance,
            created_by: parse_uuid(row.get("created_by"))?,
            approved_by: row
                .get::<Option<String>, _>("approved_by")
                .map(|s| parse_uuid(&s))
                .transpose()?,
            rejection_reason: row.get("rejection_reason"),
            reviewed_at: row
                .get::<Option<String>, _>("reviewed_at")
                .map(|s| parse_timestamp(&s))
                .transpose()?,
            created_at: parse_timestamp(row.get("created_at"))?,
        })
    }
}

/// Append-only audit record for a committed mutation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub document_id: Uuid,
    /// User who performed the mutation
    pub actor: Uuid,
    /// "snapshot_created", "content_updated" or "status_changed"
    pub action: String,
    pub old_status: Option<CrsStatus>,
    pub new_status: Option<CrsStatus>,
    /// Content as written by this mutation (content updates only)
    pub new_content: Option<CrsContent>,
    /// Human-readable summary of the change
    pub summary: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    /// Map a `crs_audit_log` row
    pub fn from_row(row: &SqliteRow) -> Result<Self> {
        Ok(AuditEntry {
            id: parse_uuid(row.get("id"))?,
            document_id: parse_uuid(row.get("document_id"))?,
            actor: parse_uuid(row.get("actor"))?,
            action: row.get("action"),
            old_status: row
                .get::<Option<&str>, _>("old_status")
                .map(CrsStatus::parse)
                .transpose()?,
            new_status: row
                .get::<Option<&str>, _>("new_status")
                .map(CrsStatus::parse)
                .transpose()?,
            new_content: row
                .get::<Option<String>, _>("new_content")
                .map(|json| {
                    serde_json::from_str(&json)
                        .map_err(|e| Error::Validation(format!("corrupt audit content: {e}")))
                })
                .transpose()?,
            summary: row.get("summary"),
            timestamp: parse_timestamp(row.get("timestamp"))?,
        })
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Validation(format!("corrupt uuid column: {e}")))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Validation(format!("corrupt timestamp column: {e}")))
}
