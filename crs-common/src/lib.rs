//! # CRS Common Library
//!
//! Shared code for the CRS document engine:
//! - Typed content model and field enumeration
//! - Completeness report and provenance types
//! - Event types (DocumentEvent enum)
//! - Error taxonomy
//! - Database schema, models and initialization
//! - Configuration loading

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod events;

pub use content::{CompletenessReport, CrsContent, Field, Provenance};
pub use db::models::{AuditEntry, CrsDocument, CrsStatus};
pub use error::{Error, Result};
pub use events::DocumentEvent;
