//! Document lifecycle integration tests
//!
//! Exercises the full path: snapshot creation, optimistic-concurrency
//! content updates, the approval workflow, audit writes, and event fan-out,
//! against a scratch SQLite database.

use std::time::Duration;

use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

use crs_common::content::{CrsContent, Field, FunctionalRequirement, Provenance};
use crs_common::db::models::CrsStatus;
use crs_common::events::DocumentEvent;
use crs_common::Error;
use crs_engine::workflow::{self, Actor};
use crs_engine::{version, StreamItem, UpdateHub};

async fn test_pool() -> (TempDir, SqlitePool) {
    let dir = TempDir::new().expect("create temp dir");
    let pool = crs_common::db::init_database(&dir.path().join("crs.db"))
        .await
        .expect("init database");
    (dir, pool)
}

fn quality_content() -> CrsContent {
    CrsContent {
        title: "Volunteer Coordination Platform".to_string(),
        description:
            "A web platform for coordinating volunteer shifts across multiple city shelters."
                .to_string(),
        functional_requirements: (1..=5)
            .map(|n| FunctionalRequirement {
                id: format!("FR-{n}"),
                title: format!("Requirement {n}"),
                description: "Detailed behavior description exceeding thirty characters."
                    .to_string(),
                priority: "must".to_string(),
            })
            .collect(),
        objectives: vec![
            "Reduce shift scheduling effort by half".to_string(),
            "Give shelters real-time coverage visibility".to_string(),
        ],
        target_users: vec![
            "Shelter coordinators in mid-size cities".to_string(),
            "Registered volunteers with weekly shifts".to_string(),
        ],
        ..CrsContent::default()
    }
}

fn sparse_content() -> CrsContent {
    CrsContent {
        title: "Volunteer Coordination Platform".to_string(),
        ..CrsContent::default()
    }
}

#[tokio::test]
async fn snapshots_start_as_draft_and_count_up_per_project() {
    let (_dir, pool) = test_pool().await;
    let hub = UpdateHub::new();
    let session = Uuid::new_v4();
    let project = Uuid::new_v4();
    let author = Uuid::new_v4();

    let first = version::create_snapshot(&pool, &hub, session, project, author, sparse_content())
        .await
        .unwrap();
    assert_eq!(first.snapshot_version, 1);
    assert_eq!(first.edit_version, 1);
    assert_eq!(first.status, CrsStatus::Draft);
    assert_eq!(first.provenance.len(), Field::ALL.len());
    assert_eq!(first.provenance[&Field::Title], Provenance::ExplicitUserInput);
    assert_eq!(first.provenance[&Field::Risks], Provenance::Empty);

    let second = version::create_snapshot(&pool, &hub, session, project, author, sparse_content())
        .await
        .unwrap();
    assert_eq!(second.snapshot_version, 2);

    // Another project starts its own counter
    let other = version::create_snapshot(
        &pool,
        &hub,
        session,
        Uuid::new_v4(),
        author,
        sparse_content(),
    )
    .await
    .unwrap();
    assert_eq!(other.snapshot_version, 1);
}

#[tokio::test]
async fn racing_content_updates_have_exactly_one_winner() {
    let (_dir, pool) = test_pool().await;
    let hub = UpdateHub::new();
    let session = Uuid::new_v4();
    let author = Uuid::new_v4();

    let doc =
        version::create_snapshot(&pool, &hub, session, Uuid::new_v4(), author, sparse_content())
            .await
            .unwrap();

    // Walk the document up to edit version 5
    for expected in 1..=4 {
        version::update_content(
            &pool,
            &hub,
            session,
            doc.id,
            sparse_content(),
            expected,
            author,
        )
        .await
        .unwrap();
    }

    let winner = version::update_content(
        &pool,
        &hub,
        session,
        doc.id,
        quality_content(),
        5,
        author,
    )
    .await
    .unwrap();
    assert_eq!(winner.edit_version, 6);

    // Loser still presents the stale version
    let err = version::update_content(
        &pool,
        &hub,
        session,
        doc.id,
        sparse_content(),
        5,
        author,
    )
    .await
    .unwrap_err();
    match err {
        Error::Conflict {
            current_edit_version,
            status,
        } => {
            assert_eq!(current_edit_version, 6);
            assert_eq!(status, CrsStatus::Draft);
        }
        other => panic!("expected Conflict, got {other}"),
    }

    // The losing call mutated nothing
    let current = version::get_document(&pool, doc.id).await.unwrap();
    assert_eq!(current.edit_version, 6);
    assert_eq!(current.content, quality_content());
}

#[tokio::test]
async fn unknown_document_is_not_found() {
    let (_dir, pool) = test_pool().await;
    let hub = UpdateHub::new();

    let err = version::update_content(
        &pool,
        &hub,
        Uuid::new_v4(),
        Uuid::new_v4(),
        sparse_content(),
        1,
        Uuid::new_v4(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn full_lifecycle_to_approval_locks_the_document() {
    let (_dir, pool) = test_pool().await;
    let hub = UpdateHub::new();
    let session = Uuid::new_v4();
    let editor = Actor::editor(Uuid::new_v4());
    let approver = Actor::approver(Uuid::new_v4());

    let doc = version::create_snapshot(
        &pool,
        &hub,
        session,
        Uuid::new_v4(),
        editor.id,
        sparse_content(),
    )
    .await
    .unwrap();

    // Two content updates: edit version 1 -> 3
    version::update_content(&pool, &hub, session, doc.id, sparse_content(), 1, editor.id)
        .await
        .unwrap();
    let updated =
        version::update_content(&pool, &hub, session, doc.id, quality_content(), 2, editor.id)
            .await
            .unwrap();
    assert_eq!(updated.edit_version, 3);

    workflow::update_status(
        &pool,
        &hub,
        session,
        doc.id,
        CrsStatus::UnderReview,
        &editor,
        None,
    )
    .await
    .unwrap();

    let approved = workflow::update_status(
        &pool,
        &hub,
        session,
        doc.id,
        CrsStatus::Approved,
        &approver,
        None,
    )
    .await
    .unwrap();
    assert_eq!(approved.status, CrsStatus::Approved);
    assert_eq!(approved.approved_by, Some(approver.id));
    assert!(approved.reviewed_at.is_some());

    // Approved documents are permanently edit-locked
    let err = version::update_content(
        &pool,
        &hub,
        session,
        doc.id,
        sparse_content(),
        3,
        editor.id,
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        Error::EditForbidden {
            status: CrsStatus::Approved
        }
    ));
}

#[tokio::test]
async fn draft_cannot_be_approved_directly() {
    let (_dir, pool) = test_pool().await;
    let hub = UpdateHub::new();
    let session = Uuid::new_v4();
    let approver = Actor::approver(Uuid::new_v4());

    let doc = version::create_snapshot(
        &pool,
        &hub,
        session,
        Uuid::new_v4(),
        approver.id,
        sparse_content(),
    )
    .await
    .unwrap();

    let err = workflow::update_status(
        &pool,
        &hub,
        session,
        doc.id,
        CrsStatus::Approved,
        &approver,
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::InvalidTransition { .. }));

    // No mutation happened
    let current = version::get_document(&pool, doc.id).await.unwrap();
    assert_eq!(current.status, CrsStatus::Draft);
}

#[tokio::test]
async fn rejection_needs_a_reason_and_the_next_edit_reopens_the_draft() {
    let (_dir, pool) = test_pool().await;
    let hub = UpdateHub::new();
    let session = Uuid::new_v4();
    let editor = Actor::editor(Uuid::new_v4());
    let approver = Actor::approver(Uuid::new_v4());

    let doc = version::create_snapshot(
        &pool,
        &hub,
        session,
        Uuid::new_v4(),
        editor.id,
        sparse_content(),
    )
    .await
    .unwrap();

    workflow::update_status(
        &pool,
        &hub,
        session,
        doc.id,
        CrsStatus::UnderReview,
        &editor,
        None,
    )
    .await
    .unwrap();

    // Empty reason is rejected before any mutation
    let err = workflow::update_status(
        &pool,
        &hub,
        session,
        doc.id,
        CrsStatus::Rejected,
        &approver,
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    let current = version::get_document(&pool, doc.id).await.unwrap();
    assert_eq!(current.status, CrsStatus::UnderReview);

    let rejected = workflow::update_status(
        &pool,
        &hub,
        session,
        doc.id,
        CrsStatus::Rejected,
        &approver,
        Some("incomplete".to_string()),
    )
    .await
    .unwrap();
    assert_eq!(rejected.status, CrsStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("incomplete"));
    assert!(rejected.reviewed_at.is_some());

    // rejected -> draft only via a successful content update
    let reopened = version::update_content(
        &pool,
        &hub,
        session,
        doc.id,
        quality_content(),
        rejected.edit_version,
        editor.id,
    )
    .await
    .unwrap();
    assert_eq!(reopened.status, CrsStatus::Draft);
    assert!(reopened.rejection_reason.is_none());
}

#[tokio::test]
async fn audit_trail_gets_one_row_per_committed_mutation() {
    let (_dir, pool) = test_pool().await;
    let hub = UpdateHub::new();
    let session = Uuid::new_v4();
    let editor = Actor::editor(Uuid::new_v4());

    let doc = version::create_snapshot(
        &pool,
        &hub,
        session,
        Uuid::new_v4(),
        editor.id,
        sparse_content(),
    )
    .await
    .unwrap();
    version::update_content(&pool, &hub, session, doc.id, quality_content(), 1, editor.id)
        .await
        .unwrap();
    workflow::update_status(
        &pool,
        &hub,
        session,
        doc.id,
        CrsStatus::UnderReview,
        &editor,
        None,
    )
    .await
    .unwrap();

    // A failed mutation leaves no trace
    let _ = version::update_content(&pool, &hub, session, doc.id, sparse_content(), 1, editor.id)
        .await
        .unwrap_err();

    let trail = version::audit_trail(&pool, doc.id).await.unwrap();
    let actions: Vec<&str> = trail.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(
        actions,
        vec!["snapshot_created", "content_updated", "status_changed"]
    );

    let status_change = &trail[2];
    assert_eq!(status_change.old_status, Some(CrsStatus::Draft));
    assert_eq!(status_change.new_status, Some(CrsStatus::UnderReview));
    assert_eq!(status_change.actor, editor.id);
}

#[tokio::test]
async fn committed_mutations_are_fanned_out_to_the_session() {
    let (_dir, pool) = test_pool().await;
    let hub = UpdateHub::new();
    let session = Uuid::new_v4();
    let editor = Actor::editor(Uuid::new_v4());

    let mut subscription = hub.subscribe(session);

    let doc = version::create_snapshot(
        &pool,
        &hub,
        session,
        Uuid::new_v4(),
        editor.id,
        sparse_content(),
    )
    .await
    .unwrap();
    version::update_content(&pool, &hub, session, doc.id, quality_content(), 1, editor.id)
        .await
        .unwrap();
    workflow::update_status(
        &pool,
        &hub,
        session,
        doc.id,
        CrsStatus::UnderReview,
        &editor,
        None,
    )
    .await
    .unwrap();

    let mut events = Vec::new();
    for _ in 0..3 {
        match subscription.next_event(Duration::from_secs(1)).await {
            Some(StreamItem::Event(event)) => events.push(event),
            other => panic!("expected a data event, got {other:?}"),
        }
    }

    assert!(matches!(
        events[0],
        DocumentEvent::DocumentCreated {
            snapshot_version: 1,
            ..
        }
    ));
    match &events[1] {
        DocumentEvent::ContentUpdated {
            edit_version,
            completeness,
            ..
        } => {
            assert_eq!(*edit_version, 2);
            // Title, description, functional requirements + two optional slots
            assert_eq!(completeness.percentage, 100);
        }
        other => panic!("expected ContentUpdated, got {other:?}"),
    }
    assert!(matches!(
        events[2],
        DocumentEvent::StatusChanged {
            old_status: CrsStatus::Draft,
            new_status: CrsStatus::UnderReview,
            ..
        }
    ));
}

#[tokio::test]
async fn project_reads_follow_snapshot_order() {
    let (_dir, pool) = test_pool().await;
    let hub = UpdateHub::new();
    let session = Uuid::new_v4();
    let project = Uuid::new_v4();
    let editor = Actor::editor(Uuid::new_v4());
    let approver = Actor::approver(Uuid::new_v4());

    assert!(version::latest_for_project(&pool, project)
        .await
        .unwrap()
        .is_none());

    let v1 = version::create_snapshot(&pool, &hub, session, project, editor.id, sparse_content())
        .await
        .unwrap();
    let v2 = version::create_snapshot(&pool, &hub, session, project, editor.id, sparse_content())
        .await
        .unwrap();

    let latest = version::latest_for_project(&pool, project)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, v2.id);

    let versions = version::versions_for_project(&pool, project).await.unwrap();
    assert_eq!(
        versions.iter().map(|d| d.snapshot_version).collect::<Vec<_>>(),
        vec![2, 1]
    );

    // Approve v1 only
    workflow::update_status(
        &pool,
        &hub,
        session,
        v1.id,
        CrsStatus::UnderReview,
        &editor,
        None,
    )
    .await
    .unwrap();
    workflow::update_status(
        &pool,
        &hub,
        session,
        v1.id,
        CrsStatus::Approved,
        &approver,
        None,
    )
    .await
    .unwrap();

    let approved = version::latest_approved(&pool, project)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(approved.id, v1.id);
}
