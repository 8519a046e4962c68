//! Field quality validation
//!
//! Judges one field's value in isolation: is it specific and substantive
//! enough to count toward completeness? Pure and deterministic; weak values
//! are accepted into the document but never count as quality.

use crs_common::content::{CrsContent, Field, FieldValue, FunctionalRequirement};

/// Placeholder values that never count as quality content.
///
/// Matched exactly (post-trim, case-folded), never as substrings, so long
/// legitimate text containing a banned token is not rejected.
const PLACEHOLDERS: [&str; 7] = [
    "not specified",
    "n/a",
    "tbd",
    "to be determined",
    "pending",
    "unknown",
    "not applicable",
];

/// Breakdown cues for budget text; a bare one-line figure is weak.
const BREAKDOWN_CUES: [&str; 8] = [
    "breakdown",
    "allocated",
    "allocation",
    "phase",
    "development",
    "infrastructure",
    "testing",
    "total",
];

/// Phase/milestone cues for timeline text.
const PHASE_CUES: [&str; 21] = [
    "phase",
    "week",
    "month",
    "day",
    "date",
    "milestone",
    "deadline",
    "start",
    "end",
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Quality verdict for one field of the document
///
/// Category rules:
/// - short identity text (title): trimmed length > 10, no placeholder
/// - narrative text (description): length >= 50, no placeholder
/// - numeric breakdown (budget): length >= 50, contains a digit and a
///   breakdown cue
/// - phased (timeline): length >= 40, contains a phase cue
/// - structured list (functional requirements): >= 5 items, every
///   description >= 30 chars
/// - breadth list (objectives, target users): >= 2 items, each >= 15 chars
/// - other lists: at least one item; maps: at least one non-empty value
/// - absent/empty values are never quality
pub fn is_quality(field: Field, content: &CrsContent) -> bool {
    let value = content.field(field);
    if value.is_empty() {
        return false;
    }

    match value {
        FieldValue::Text(text) => text_quality(field, text),
        FieldValue::Requirements(reqs) => structured_list_quality(reqs),
        FieldValue::Items(items) => match field {
            Field::Objectives | Field::TargetUsers => breadth_list_quality(items),
            _ => !items.is_empty(),
        },
        FieldValue::Map(map) => map.values().any(|v| !v.trim().is_empty()),
    }
}

fn text_quality(field: Field, text: &str) -> bool {
    let trimmed = text.trim();
    if is_placeholder(trimmed) {
        return false;
    }

    // Thresholds count characters, not bytes, so multibyte text is judged
    // by its visible length.
    match field {
        Field::Description => char_count(trimmed) >= 50,
        Field::BudgetConstraints => {
            char_count(trimmed) >= 50
                && trimmed.chars().any(|c| c.is_ascii_digit())
                && has_cue(trimmed, &BREAKDOWN_CUES)
        }
        Field::TimelineConstraints => char_count(trimmed) >= 40 && has_cue(trimmed, &PHASE_CUES),
        // Short identity text: title and any other free-text field
        _ => char_count(trimmed) > 10,
    }
}

fn structured_list_quality(reqs: &[FunctionalRequirement]) -> bool {
    reqs.len() >= 5 && reqs.iter().all(|r| char_count(r.description.trim()) >= 30)
}

fn breadth_list_quality(items: &[String]) -> bool {
    items.len() >= 2 && items.iter().all(|i| char_count(i.trim()) >= 15)
}

fn char_count(text: &str) -> usize {
    text.chars().count()
}

fn is_placeholder(trimmed: &str) -> bool {
    let folded = trimmed.to_lowercase();
    PLACEHOLDERS.contains(&folded.as_str())
}

fn has_cue(text: &str, cues: &[&str]) -> bool {
    let folded = text.to_lowercase();
    cues.iter().any(|cue| folded.contains(cue))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_title(title: &str) -> CrsContent {
        CrsContent {
            title: title.to_string(),
            ..CrsContent::default()
        }
    }

    #[test]
    fn validator_is_deterministic() {
        let content = with_title("A Thoroughly Named Project");
        let first = is_quality(Field::Title, &content);
        let second = is_quality(Field::Title, &content);
        assert_eq!(first, second);
        assert!(first);
    }

    #[test]
    fn placeholder_titles_fail_regardless_of_case() {
        assert!(!is_quality(Field::Title, &with_title("Not specified")));
        assert!(!is_quality(Field::Title, &with_title("NOT SPECIFIED")));
        assert!(!is_quality(Field::Title, &with_title("  tbd  ")));
        assert!(is_quality(Field::Title, &with_title("A Thoroughly Named Project")));
    }

    #[test]
    fn placeholder_match_is_exact_not_substring() {
        // Long legitimate text that happens to contain a banned token
        let content = with_title("Deliverables pending review are tracked separately");
        assert!(is_quality(Field::Title, &content));
    }

    #[test]
    fn short_titles_fail() {
        assert!(!is_quality(Field::Title, &with_title("CRM tool")));
        assert!(!is_quality(Field::Title, &with_title("")));
    }

    #[test]
    fn title_length_counts_characters_not_bytes() {
        // Ten characters, thirteen bytes: must still fail the > 10 check
        assert!(!is_quality(Field::Title, &with_title("Résumé-Öko")));
        assert!(is_quality(Field::Title, &with_title("Résumé-Ökosystem")));
    }

    #[test]
    fn narrative_needs_fifty_chars() {
        let mut content = CrsContent::default();
        content.description = "Too short to be useful.".to_string();
        assert!(!is_quality(Field::Description, &content));

        content.description =
            "A web platform for coordinating volunteer shifts across multiple city shelters."
                .to_string();
        assert!(is_quality(Field::Description, &content));
    }

    #[test]
    fn budget_needs_figures_and_breakdown() {
        let mut content = CrsContent::default();
        // Long enough but a single figure with no breakdown cue
        content.budget_constraints =
            "The overall spending limit for this whole effort is ninety thousand euros.".to_string();
        assert!(!is_quality(Field::BudgetConstraints, &content));

        content.budget_constraints =
            "Total 90000 EUR: 60000 allocated to development, 20000 to infrastructure, 10000 to testing."
                .to_string();
        assert!(is_quality(Field::BudgetConstraints, &content));
    }

    #[test]
    fn timeline_needs_phase_cues() {
        let mut content = CrsContent::default();
        content.timeline_constraints =
            "It should be finished reasonably soon, ideally quite quickly overall.".to_string();
        assert!(!is_quality(Field::TimelineConstraints, &content));

        content.timeline_constraints =
            "Phase 1 discovery in March, phase 2 build over eight weeks, launch milestone in June."
                .to_string();
        assert!(is_quality(Field::TimelineConstraints, &content));
    }

    #[test]
    fn functional_requirements_need_five_detailed_items() {
        let detailed = |n: u32| FunctionalRequirement {
            id: format!("FR-{n}"),
            title: format!("Requirement {n}"),
            description: "Detailed behavior description exceeding thirty characters.".to_string(),
            priority: "high".to_string(),
        };

        let mut content = CrsContent::default();
        content.functional_requirements = (1..=5).map(detailed).collect();
        assert!(is_quality(Field::FunctionalRequirements, &content));

        content.functional_requirements.pop();
        assert!(!is_quality(Field::FunctionalRequirements, &content));

        content.functional_requirements = (1..=5).map(detailed).collect();
        content.functional_requirements[2].description = "too terse".to_string();
        assert!(!is_quality(Field::FunctionalRequirements, &content));
    }

    #[test]
    fn breadth_lists_need_two_meaningful_items() {
        let mut content = CrsContent::default();
        content.objectives = vec!["Reduce onboarding time by half".to_string()];
        assert!(!is_quality(Field::Objectives, &content));

        content.objectives.push("Support ten thousand concurrent users".to_string());
        assert!(is_quality(Field::Objectives, &content));

        content.target_users = vec!["BA team".to_string(), "Ops".to_string()];
        assert!(!is_quality(Field::TargetUsers, &content));
    }

    #[test]
    fn generic_lists_and_maps_count_when_non_empty() {
        let mut content = CrsContent::default();
        assert!(!is_quality(Field::Risks, &content));
        assert!(!is_quality(Field::TechnologyStack, &content));

        content.risks = vec!["Vendor lock-in on the payments provider".to_string()];
        content.technology_stack.insert("backend".into(), "rust".into());
        assert!(is_quality(Field::Risks, &content));
        assert!(is_quality(Field::TechnologyStack, &content));
    }
}
