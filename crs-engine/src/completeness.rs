//! Completeness scoring
//!
//! Aggregates per-field quality verdicts into a percentage and a report for
//! the presentation layer. Three required slots plus two optional slots make
//! up the denominator; extra quality optional fields are reported but capped
//! for scoring so the percentage can never exceed 100.

use crs_common::content::{CompletenessReport, CrsContent, Field};

use crate::quality::is_quality;

/// Required fields: all three must pass quality validation for a full score
pub const REQUIRED_FIELDS: [Field; 3] = [
    Field::Title,
    Field::Description,
    Field::FunctionalRequirements,
];

/// Optional fields: at most two contribute to the score
pub const OPTIONAL_FIELDS: [Field; 5] = [
    Field::Objectives,
    Field::TargetUsers,
    Field::TimelineConstraints,
    Field::BudgetConstraints,
    Field::SuccessMetrics,
];

/// Number of optional fields that count toward the percentage
const OPTIONAL_SLOTS: usize = 2;

/// Score a document's content
///
/// `percentage = floor(100 * (required passing + min(optional passing, 2)) / 5)`,
/// clamped to [0, 100]. Idempotent, and monotonic in any single field
/// improving from non-quality to quality.
pub fn score(content: &CrsContent) -> CompletenessReport {
    let missing_required: Vec<Field> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|f| !is_quality(*f, content))
        .collect();

    let missing_optional: Vec<Field> = OPTIONAL_FIELDS
        .iter()
        .copied()
        .filter(|f| !is_quality(*f, content))
        .collect();

    // Present but failing validation, across both scored groups
    let weak_fields: Vec<Field> = REQUIRED_FIELDS
        .iter()
        .chain(OPTIONAL_FIELDS.iter())
        .copied()
        .filter(|f| content.has_content(*f) && !is_quality(*f, content))
        .collect();

    let filled_optional_count = OPTIONAL_FIELDS.len() - missing_optional.len();
    let required_filled = REQUIRED_FIELDS.len() - missing_required.len();

    let filled_slots = required_filled + filled_optional_count.min(OPTIONAL_SLOTS);
    let total_slots = REQUIRED_FIELDS.len() + OPTIONAL_SLOTS;
    let percentage = ((100 * filled_slots / total_slots) as u8).min(100);

    CompletenessReport {
        percentage,
        missing_required,
        missing_optional,
        weak_fields,
        filled_optional_count,
    }
}
