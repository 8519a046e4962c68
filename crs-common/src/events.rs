//! Event types for the document engine
//!
//! One event per committed state change, broadcast per session through the
//! update hub and serialized for SSE transmission. All variants use this
//! central enum for type safety and exhaustive matching.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::content::CompletenessReport;
use crate::db::models::CrsStatus;

/// Document lifecycle events
///
/// Wire shape is `{"type": ..., "sessionId": ..., <payload fields>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[serde(rename_all_fields = "camelCase")]
pub enum DocumentEvent {
    /// A new document snapshot row was created
    DocumentCreated {
        session_id: Uuid,
        document_id: Uuid,
        project_id: Uuid,
        snapshot_version: i64,
        status: CrsStatus,
        timestamp: DateTime<Utc>,
    },

    /// Document content was updated in place
    ///
    /// Carries the fresh completeness report so viewers can render progress
    /// without refetching the document.
    ContentUpdated {
        session_id: Uuid,
        document_id: Uuid,
        edit_version: i64,
        status: CrsStatus,
        completeness: CompletenessReport,
        timestamp: DateTime<Utc>,
    },

    /// Document moved through the approval workflow
    StatusChanged {
        session_id: Uuid,
        document_id: Uuid,
        old_status: CrsStatus,
        new_status: CrsStatus,
        actor: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Liveness marker emitted when no data event occurred within the
    /// keepalive interval
    Keepalive {
        session_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl DocumentEvent {
    /// Session this event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            DocumentEvent::DocumentCreated { session_id, .. }
            | DocumentEvent::ContentUpdated { session_id, .. }
            | DocumentEvent::StatusChanged { session_id, .. }
            | DocumentEvent::Keepalive { session_id, .. } => *session_id,
        }
    }

    /// Event name used for the SSE `event:` field
    pub fn event_name(&self) -> &'static str {
        match self {
            DocumentEvent::DocumentCreated { .. } => "document_created",
            DocumentEvent::ContentUpdated { .. } => "content_updated",
            DocumentEvent::StatusChanged { .. } => "status_changed",
            DocumentEvent::Keepalive { .. } => "keepalive",
        }
    }
}
