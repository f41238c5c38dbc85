use super::super::domain::RequiredDocument;
use super::payload::{RawDocument, RawRequirement};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

static STAY_DAYS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(?:day|days)").expect("stay pattern compiles"));

/// Structured `allowed_stay.value` first, then the free-text description.
pub(crate) fn stay_days(requirement: &RawRequirement) -> Option<u32> {
    let stay = requirement.allowed_stay.as_ref()?;

    if let Some(days) = stay.value.as_ref().and_then(|count| count.as_days()) {
        return Some(days);
    }

    let extracted = stay.description.as_deref().and_then(stay_days_from_text);
    if extracted.is_none() {
        debug!(
            description = stay.description.as_deref().unwrap_or(""),
            "no stay length found in provider data"
        );
    }
    extracted
}

/// Pull the first "<n> day(s)" figure out of free text. Non-matches are `None`, never zero.
pub fn stay_days_from_text(text: &str) -> Option<u32> {
    STAY_DAYS_PATTERN
        .captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|digits| digits.as_str().parse::<u32>().ok())
}

/// Upper bound of the provider range, falling back to the lower bound.
pub(crate) fn processing_days(requirement: &RawRequirement) -> Option<u32> {
    let range = requirement.processing_time.as_ref()?;
    range.max_days.or(range.min_days)
}

pub(crate) fn passport_validity_months(requirement: &RawRequirement) -> Option<u32> {
    requirement
        .passport_requirements
        .as_ref()
        .and_then(|passport| passport.validity_months)
}

pub(crate) fn documents(requirement: &RawRequirement) -> Vec<RequiredDocument> {
    requirement
        .documents
        .iter()
        .filter_map(|document| {
            let (name, required, note) = match document {
                RawDocument::Name(name) => (name.as_str(), true, None),
                RawDocument::Detailed {
                    name,
                    required,
                    note,
                } => (name.as_str(), required.unwrap_or(true), note.as_deref()),
            };

            let name = name.trim();
            if name.is_empty() {
                return None;
            }

            Some(RequiredDocument {
                name: name.to_string(),
                required,
                note: note
                    .map(str::trim)
                    .filter(|note| !note.is_empty())
                    .map(str::to_string),
            })
        })
        .collect()
}

/// Restrictions then notes, trimmed, empties and repeats dropped.
pub(crate) fn restrictions(requirement: &RawRequirement) -> Vec<String> {
    let mut seen = HashSet::new();
    requirement
        .restrictions
        .iter()
        .chain(requirement.notes.iter())
        .map(|entry| entry.as_str().trim())
        .filter(|entry| !entry.is_empty())
        .filter(|entry| seen.insert(entry.to_string()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn requirement(value: serde_json::Value) -> RawRequirement {
        serde_json::from_value(value).expect("requirement decodes")
    }

    #[test]
    fn stay_prefers_structured_value() {
        let raw = requirement(json!({
            "allowed_stay": {"value": 30, "description": "up to 90 days"}
        }));
        assert_eq!(stay_days(&raw), Some(30));
    }

    #[test]
    fn stay_falls_back_to_description() {
        let raw = requirement(json!({
            "allowed_stay": {"value": null, "description": "up to 90 days"}
        }));
        assert_eq!(stay_days(&raw), Some(90));

        let raw = requirement(json!({
            "allowed_stay": {"value": null, "description": "varies"}
        }));
        assert_eq!(stay_days(&raw), None);

        assert_eq!(stay_days(&requirement(json!({}))), None);
    }

    #[test]
    fn stay_pattern_handles_case_and_spacing() {
        assert_eq!(stay_days_from_text("Stay 14Days per visit"), Some(14));
        assert_eq!(stay_days_from_text("1 day transit"), Some(1));
        assert_eq!(stay_days_from_text("3 months"), None);
        assert_eq!(stay_days_from_text("99999999999 days"), None);
    }

    #[test]
    fn processing_prefers_max_then_min() {
        let raw = requirement(json!({"processing_time": {"min_days": 3, "max_days": 10}}));
        assert_eq!(processing_days(&raw), Some(10));

        let raw = requirement(json!({"processing_time": {"min_days": 3}}));
        assert_eq!(processing_days(&raw), Some(3));

        let raw = requirement(json!({"processing_time": {}}));
        assert_eq!(processing_days(&raw), None);
    }

    #[test]
    fn documents_default_to_required_and_drop_blank_names() {
        let raw = requirement(json!({
            "documents": [
                "Passport",
                {"name": "  Hotel booking ", "required": false, "note": " "},
                {"name": "Photo", "description": "white background"},
                {"name": "   "}
            ]
        }));

        let documents = documents(&raw);
        assert_eq!(
            documents,
            vec![
                RequiredDocument {
                    name: "Passport".to_string(),
                    required: true,
                    note: None,
                },
                RequiredDocument {
                    name: "Hotel booking".to_string(),
                    required: false,
                    note: None,
                },
                RequiredDocument {
                    name: "Photo".to_string(),
                    required: true,
                    note: Some("white background".to_string()),
                },
            ]
        );
    }

    #[test]
    fn restrictions_merge_notes_and_skip_duplicates() {
        let raw = requirement(json!({
            "restrictions": ["No employment", " "],
            "notes": [{"text": "Return ticket required"}, "No employment"]
        }));

        assert_eq!(
            restrictions(&raw),
            vec!["No employment".to_string(), "Return ticket required".to_string()]
        );
    }
}
