use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// Top level of a provider response. Only `requirements` is load-bearing.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProviderEnvelope {
    #[serde(default, deserialize_with = "lenient")]
    version: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    source_version: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) requirements: Option<Vec<Value>>,
}

impl ProviderEnvelope {
    /// `version` wins over `source_version`; blank values count as absent.
    pub(crate) fn version(&self) -> Option<&str> {
        non_blank(self.version.as_deref()).or_else(|| non_blank(self.source_version.as_deref()))
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawRequirement {
    #[serde(default, rename = "type", deserialize_with = "lenient")]
    kind: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    visa_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) category: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) allowed_stay: Option<RawAllowedStay>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) processing_time: Option<RawProcessingTime>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) passport_requirements: Option<RawPassportRequirements>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub(crate) documents: Vec<RawDocument>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub(crate) restrictions: Vec<RawText>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub(crate) notes: Vec<RawText>,
}

impl RawRequirement {
    /// `type` wins over `visa_type`; blank values count as absent.
    pub(crate) fn kind(&self) -> Option<&str> {
        non_blank(self.kind.as_deref()).or_else(|| non_blank(self.visa_type.as_deref()))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawAllowedStay {
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) value: Option<RawCount>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) description: Option<String>,
}

/// Providers send counts either as JSON integers or as numeric strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawCount {
    Integer(i64),
    Text(String),
}

impl RawCount {
    pub(crate) fn as_days(&self) -> Option<u32> {
        match self {
            RawCount::Integer(value) => u32::try_from(*value).ok(),
            RawCount::Text(text) => text.trim().parse::<u32>().ok(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawProcessingTime {
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) min_days: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) max_days: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawPassportRequirements {
    #[serde(default, deserialize_with = "lenient")]
    pub(crate) validity_months: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawDocument {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        required: Option<bool>,
        #[serde(default, alias = "notes", alias = "description")]
        note: Option<String>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawText {
    Plain(String),
    Described {
        #[serde(alias = "text")]
        description: String,
    },
}

impl RawText {
    pub(crate) fn as_str(&self) -> &str {
        match self {
            RawText::Plain(text) => text,
            RawText::Described { description } => description,
        }
    }
}

/// Deserialize a field, degrading a wrongly-typed value to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| decode_or_skip(value, "field")))
}

/// Deserialize a list, dropping entries that do not decode. Absent lists become empty.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Ok(items
            .into_iter()
            .filter_map(|item| decode_or_skip(item, "list entry"))
            .collect()),
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(other) => {
            debug!(value = %other, "provider list field is not an array; treating as empty");
            Ok(Vec::new())
        }
    }
}

fn decode_or_skip<T: DeserializeOwned>(value: Value, what: &'static str) -> Option<T> {
    if value.is_null() {
        return None;
    }

    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            debug!(%err, what, "ignoring malformed provider value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrongly_typed_fields_degrade_to_absent() {
        let raw: RawRequirement = serde_json::from_value(json!({
            "type": 42,
            "category": "Visa required",
            "processing_time": {"min_days": "soon", "max_days": -3},
            "documents": "passport",
        }))
        .expect("requirement decodes");

        assert!(raw.kind().is_none());
        assert_eq!(raw.category.as_deref(), Some("Visa required"));
        let processing = raw.processing_time.expect("object kept");
        assert!(processing.min_days.is_none());
        assert!(processing.max_days.is_none());
        assert!(raw.documents.is_empty());
    }

    #[test]
    fn both_spellings_of_a_key_decode_side_by_side() {
        let envelope: ProviderEnvelope = serde_json::from_value(json!({
            "version": " ",
            "source_version": "2025-07",
            "requirements": [{}],
        }))
        .expect("envelope decodes");
        assert_eq!(envelope.version(), Some("2025-07"));
        assert_eq!(envelope.requirements.map(|entries| entries.len()), Some(1));

        let raw: RawRequirement = serde_json::from_value(json!({
            "type": "eVisa",
            "visa_type": "embassy",
        }))
        .expect("requirement decodes");
        assert_eq!(raw.kind(), Some("eVisa"));

        let raw: RawRequirement =
            serde_json::from_value(json!({"visa_type": "Transit"})).expect("requirement decodes");
        assert_eq!(raw.kind(), Some("Transit"));
    }

    #[test]
    fn lists_keep_well_formed_entries_only() {
        let raw: RawRequirement = serde_json::from_value(json!({
            "documents": ["Passport", 7, {"name": "Photo", "required": false, "notes": "2x2"}, {"required": true}],
            "restrictions": [{"description": "No work"}, null, "Register within 3 days"],
        }))
        .expect("requirement decodes");

        assert_eq!(raw.documents.len(), 2);
        assert_eq!(raw.restrictions.len(), 2);
        assert_eq!(raw.restrictions[0].as_str(), "No work");
    }

    #[test]
    fn counts_accept_integers_and_numeric_strings() {
        let stay: RawAllowedStay =
            serde_json::from_value(json!({"value": " 30 "})).expect("decodes");
        assert_eq!(stay.value.and_then(|count| count.as_days()), Some(30));

        let stay: RawAllowedStay = serde_json::from_value(json!({"value": 90.5})).expect("decodes");
        assert!(stay.value.is_none());

        let negative = RawCount::Integer(-1);
        assert!(negative.as_days().is_none());
    }
}
