//! Typed CRS content model
//!
//! The field-extraction collaborator delivers a loosely-typed JSON map. That
//! map is projected into [`CrsContent`] exactly once, at the boundary, so the
//! validator and scorer only ever operate on named, typed fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Every field the engine knows about
///
/// The provenance map always carries one entry per variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Title,
    Description,
    Objectives,
    TargetUsers,
    FunctionalRequirements,
    PerformanceRequirements,
    SecurityRequirements,
    ScalabilityRequirements,
    TechnologyStack,
    Integrations,
    BudgetConstraints,
    TimelineConstraints,
    TechnicalConstraints,
    SuccessMetrics,
    AcceptanceCriteria,
    Assumptions,
    Risks,
    OutOfScope,
}

impl Field {
    /// All known fields, in schema order
    pub const ALL: [Field; 18] = [
        Field::Title,
        Field::Description,
        Field::Objectives,
        Field::TargetUsers,
        Field::FunctionalRequirements,
        Field::PerformanceRequirements,
        Field::SecurityRequirements,
        Field::ScalabilityRequirements,
        Field::TechnologyStack,
        Field::Integrations,
        Field::BudgetConstraints,
        Field::TimelineConstraints,
        Field::TechnicalConstraints,
        Field::SuccessMetrics,
        Field::AcceptanceCriteria,
        Field::Assumptions,
        Field::Risks,
        Field::OutOfScope,
    ];

    /// Schema name of the field (snake_case, matches the JSON keys)
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Objectives => "objectives",
            Field::TargetUsers => "target_users",
            Field::FunctionalRequirements => "functional_requirements",
            Field::PerformanceRequirements => "performance_requirements",
            Field::SecurityRequirements => "security_requirements",
            Field::ScalabilityRequirements => "scalability_requirements",
            Field::TechnologyStack => "technology_stack",
            Field::Integrations => "integrations",
            Field::BudgetConstraints => "budget_constraints",
            Field::TimelineConstraints => "timeline_constraints",
            Field::TechnicalConstraints => "technical_constraints",
            Field::SuccessMetrics => "success_metrics",
            Field::AcceptanceCriteria => "acceptance_criteria",
            Field::Assumptions => "assumptions",
            Field::Risks => "risks",
            Field::OutOfScope => "out_of_scope",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the functional requirements list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FunctionalRequirement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: String,
}

/// The structured requirements document content
///
/// Schema is fixed by the extraction collaborator. Every field defaults to
/// empty so a partial upstream map still projects cleanly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrsContent {
    pub title: String,
    pub description: String,
    pub objectives: Vec<String>,
    pub target_users: Vec<String>,
    pub functional_requirements: Vec<FunctionalRequirement>,
    pub performance_requirements: Vec<String>,
    pub security_requirements: Vec<String>,
    pub scalability_requirements: Vec<String>,
    pub technology_stack: BTreeMap<String, String>,
    pub integrations: Vec<String>,
    pub budget_constraints: String,
    pub timeline_constraints: String,
    pub technical_constraints: Vec<String>,
    pub success_metrics: Vec<String>,
    pub acceptance_criteria: Vec<String>,
    pub assumptions: Vec<String>,
    pub risks: Vec<String>,
    pub out_of_scope: Vec<String>,
}

/// Borrowed view of a single field's value, for category-based validation
#[derive(Debug, Clone, Copy)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Items(&'a [String]),
    Requirements(&'a [FunctionalRequirement]),
    Map(&'a BTreeMap<String, String>),
}

impl FieldValue<'_> {
    /// True when the field carries no content at all
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(t) => t.trim().is_empty(),
            FieldValue::Items(items) => items.iter().all(|i| i.trim().is_empty()),
            FieldValue::Requirements(reqs) => reqs.is_empty(),
            FieldValue::Map(map) => map.values().all(|v| v.trim().is_empty()),
        }
    }
}

impl CrsContent {
    /// Project the untyped extraction payload into the typed model
    ///
    /// Unknown keys are ignored and missing keys default to empty; a payload
    /// that is not a JSON object is rejected.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::Validation(
                "content payload must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| Error::Validation(format!("malformed content payload: {e}")))
    }

    /// Borrow the value of one field
    pub fn field(&self, field: Field) -> FieldValue<'_> {
        match field {
            Field::Title => FieldValue::Text(&self.title),
            Field::Description => FieldValue::Text(&self.description),
            Field::Objectives => FieldValue::Items(&self.objectives),
            Field::TargetUsers => FieldValue::Items(&self.target_users),
            Field::FunctionalRequirements => {
                FieldValue::Requirements(&self.functional_requirements)
            }
            Field::PerformanceRequirements => FieldValue::Items(&self.performance_requirements),
            Field::SecurityRequirements => FieldValue::Items(&self.security_requirements),
            Field::ScalabilityRequirements => FieldValue::Items(&self.scalability_requirements),
            Field::TechnologyStack => FieldValue::Map(&self.technology_stack),
            Field::Integrations => FieldValue::Items(&self.integrations),
            Field::BudgetConstraints => FieldValue::Text(&self.budget_constraints),
            Field::TimelineConstraints => FieldValue::Text(&self.timeline_constraints),
            Field::TechnicalConstraints => FieldValue::Items(&self.technical_constraints),
            Field::SuccessMetrics => FieldValue::Items(&self.success_metrics),
            Field::AcceptanceCriteria => FieldValue::Items(&self.acceptance_criteria),
            Field::Assumptions => FieldValue::Items(&self.assumptions),
            Field::Risks => FieldValue::Items(&self.risks),
            Field::OutOfScope => FieldValue::Items(&self.out_of_scope),
        }
    }

    /// True when the field carries content, quality or not
    pub fn has_content(&self, field: Field) -> bool {
        !self.field(field).is_empty()
    }
}

/// Recorded origin of a field's current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Specific, substantive content traced to the user
    ExplicitUserInput,
    /// Present but weak content, assumed model-inferred
    LlmInference,
    /// No content at all
    Empty,
}

/// Completeness verdict for one document revision
///
/// Ephemeral: recomputed on demand, never persisted. Passed through to the
/// presentation collaborator unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletenessReport {
    /// 0-100, floor(100 * filled slots / 5)
    pub percentage: u8,
    /// Required fields failing quality validation
    pub missing_required: Vec<Field>,
    /// Optional fields failing quality validation
    pub missing_optional: Vec<Field>,
    /// Fields with content that fails quality validation
    pub weak_fields: Vec<Field>,
    /// Raw count of quality optional fields (uncapped, for UI display)
    pub filled_optional_count: usize,
}
