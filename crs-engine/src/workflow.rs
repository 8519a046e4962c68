//! Approval workflow state machine
//!
//! Legal transitions:
//! - draft -> under_review (any party with edit rights)
//! - under_review -> approved (approval authority; content becomes immutable)
//! - under_review -> rejected (approval authority; requires a non-empty
//!   rejection reason)
//!
//! rejected -> draft is not a direct status call: it happens implicitly via
//! the next successful content update (see [`crate::version`]). Everything
//! else is an invalid transition and performs no mutation.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crs_common::db::models::{CrsDocument, CrsStatus};
use crs_common::events::DocumentEvent;
use crs_common::{Error, Result};

use crate::hub::UpdateHub;
use crate::version::{fetch_document, fetch_document_tx, insert_audit};

/// Party performing a status mutation
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub id: Uuid,
    /// Approval authority: may move documents out of review
    pub can_approve: bool,
}

impl Actor {
    pub fn editor(id: Uuid) -> Self {
        Actor {
            id,
            can_approve: false,
        }
    }

    pub fn approver(id: Uuid) -> Self {
        Actor {
            id,
            can_approve: true,
        }
    }
}

/// Check a requested transition without touching storage
///
/// Rejection with an empty reason fails with a validation error before any
/// mutation; an unlisted transition fails as invalid; review decisions
/// require approval authority.
pub fn validate_transition(
    current: CrsStatus,
    requested: CrsStatus,
    actor: &Actor,
    rejection_reason: Option<&str>,
) -> Result<()> {
    match (current, requested) {
        (CrsStatus::Draft, CrsStatus::UnderReview) => Ok(()),
        (CrsStatus::UnderReview, CrsStatus::Approved) => {
            if actor.can_approve {
                Ok(())
            } else {
                Err(Error::Forbidden(
                    "approval authority required to approve".to_string(),
                ))
            }
        }
        (CrsStatus::UnderReview, CrsStatus::Rejected) => {
            if !actor.can_approve {
                return Err(Error::Forbidden(
                    "approval authority required to reject".to_string(),
                ));
            }
            match rejection_reason {
                Some(reason) if !reason.trim().is_empty() => Ok(()),
                _ => Err(Error::Validation(
                    "rejection reason is required when rejecting".to_string(),
                )),
            }
        }
        (from, to) => Err(Error::InvalidTransition { from, to }),
    }
}

/// Apply a status transition
///
/// Fetch, validate, then compare-and-swap on the current status so racing
/// status writers resolve to exactly one winner; the loser sees `Conflict`.
/// Every successful transition appends one audit row and publishes
/// `StatusChanged`.
pub async fn update_status(
    pool: &SqlitePool,
    hub: &UpdateHub,
    session_id: Uuid,
    document_id: Uuid,
    requested: CrsStatus,
    actor: &Actor,
    rejection_reason: Option<String>,
) -> Result<CrsDocument> {
    let current = fetch_document(pool, document_id).await?;
    validate_transition(current.status, requested, actor, rejection_reason.as_deref())?;

    let now = Utc::now();
    let approved_by = match requested {
        CrsStatus::Approved => Some(actor.id.to_string()),
        _ => current.approved_by.map(|u| u.to_string()),
    };
    let reason = match requested {
        CrsStatus::Rejected => rejection_reason,
        _ => None,
    };
    let reviewed_at = match requested {
        CrsStatus::Approved | CrsStatus::Rejected => Some(now.to_rfc3339()),
        _ => current.reviewed_at.map(|t| t.to_rfc3339()),
    };

    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE crs_documents
        SET status = ?, approved_by = ?, rejection_reason = ?, reviewed_at = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(requested.as_str())
    .bind(approved_by)
    .bind(reason)
    .bind(reviewed_at)
    .bind(document_id.to_string())
    .bind(current.status.as_str())
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if updated == 0 {
        drop(tx);
        // Another writer changed the status between fetch and write
        let latest = fetch_document(pool, document_id).await?;
        return Err(Error::Conflict {
            current_edit_version: latest.edit_version,
            status: latest.status,
        });
    }

    insert_audit(
        &mut tx,
        document_id,
        actor.id,
        "status_changed",
        Some(current.status),
        Some(requested),
        None,
        format!("Status changed from {} to {}", current.status, requested),
    )
    .await?;

    let document = fetch_document_tx(&mut tx, document_id).await?;
    tx.commit().await?;

    info!(
        "Document {} status {} -> {} by {}",
        document_id, current.status, requested, actor.id
    );

    hub.publish(DocumentEvent::StatusChanged {
        session_id,
        document_id,
        old_status: current.status,
        new_status: requested,
        actor: actor.id,
        timestamp: now,
    });

    Ok(document)
}
