//! # CRS Engine
//!
//! Document Quality & Lifecycle Engine: builds a requirements specification
//! incrementally from extracted field data, scores it for completeness,
//! versions it under concurrent edits, moves it through an approval
//! workflow, and fans committed changes out to connected viewers.
//!
//! Component dependency order (leaves first):
//! - [`quality`] - per-field quality validation
//! - [`completeness`] - completeness scoring
//! - [`provenance`] - field-origin classification
//! - [`version`] - snapshot/edit counters and optimistic locking
//! - [`workflow`] - approval state machine
//! - [`hub`] - per-session live-update fan-out
//!
//! A content mutation runs validator -> scorer -> provenance tracker, then
//! applies under optimistic locking; a status mutation runs through the
//! approval state machine; both publish through the hub once committed.

pub mod completeness;
pub mod hub;
pub mod provenance;
pub mod quality;
pub mod server;
pub mod sse;
pub mod state;
pub mod version;
pub mod workflow;

pub use hub::{StreamItem, Subscription, UpdateHub};
pub use state::AppState;
pub use workflow::Actor;
