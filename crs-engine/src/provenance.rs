//! Field provenance classification
//!
//! Classifies the origin of every known field's current value with the same
//! validator the scorer uses, so provenance and completeness never disagree
//! on what counts as trustworthy content.

use std::collections::BTreeMap;

use crs_common::content::{CrsContent, Field, Provenance};

use crate::quality::is_quality;

/// Classify every known field of the document
///
/// Absent fields are `Empty`; fields passing quality validation are
/// `ExplicitUserInput`; present-but-weak fields are `LlmInference`. The
/// returned map always has one entry per known field.
pub fn track(content: &CrsContent) -> BTreeMap<Field, Provenance> {
    Field::ALL
        .iter()
        .map(|&field| {
            let tag = if !content.has_content(field) {
                Provenance::Empty
            } else if is_quality(field, content) {
                Provenance::ExplicitUserInput
            } else {
                Provenance::LlmInference
            };
            (field, tag)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_field_gets_an_entry() {
        let map = track(&CrsContent::default());
        assert_eq!(map.len(), Field::ALL.len());
        assert!(map.values().all(|p| *p == Provenance::Empty));
    }

    #[test]
    fn classification_follows_the_validator() {
        let mut content = CrsContent::default();
        content.title = "A Thoroughly Named Project".to_string();
        content.description = "short blurb".to_string();

        let map = track(&content);
        assert_eq!(map[&Field::Title], Provenance::ExplicitUserInput);
        assert_eq!(map[&Field::Description], Provenance::LlmInference);
        assert_eq!(map[&Field::Risks], Provenance::Empty);

        // Agreement with the validator on every field
        for &field in Field::ALL.iter() {
            match map[&field] {
                Provenance::ExplicitUserInput => assert!(is_quality(field, &content)),
                Provenance::LlmInference => {
                    assert!(content.has_content(field) && !is_quality(field, &content))
                }
                Provenance::Empty => assert!(!content.has_content(field)),
            }
        }
    }

    #[test]
    fn placeholder_content_is_inference_not_empty() {
        let mut content = CrsContent::default();
        content.title = "tbd".to_string();
        assert_eq!(track(&content)[&Field::Title], Provenance::LlmInference);
    }
}
