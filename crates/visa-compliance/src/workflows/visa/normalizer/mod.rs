//! Provider payload to canonical [`VisaRule`] conversion.
//!
//! Only a payload without any usable requirement entry is a hard failure; every
//! field-level extraction problem degrades to `None` or an empty list.

mod classify;
mod digest;
mod extract;
mod payload;

pub use classify::classify_visa_type;
pub use digest::payload_hash;
pub use extract::stay_days_from_text;

use super::domain::{CountryCode, VisaRule};
use payload::{ProviderEnvelope, RawRequirement};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("no visa requirements found for {citizenship}->{destination}")]
    NoRequirementsFound {
        citizenship: CountryCode,
        destination: CountryCode,
    },
    #[error("provider payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("provider payload could not be canonicalized: {0}")]
    Canonicalization(#[source] serde_json::Error),
}

impl NormalizeError {
    /// Message suitable for showing to a traveler.
    pub fn user_message(&self) -> &'static str {
        "unable to retrieve visa requirements, try again"
    }
}

/// Stateless converter; carries the source version stamped on rules whose payload has none.
#[derive(Debug, Clone)]
pub struct RuleNormalizer {
    default_source_version: String,
}

impl Default for RuleNormalizer {
    fn default() -> Self {
        Self::new("provider-v1")
    }
}

impl RuleNormalizer {
    pub fn new(default_source_version: impl Into<String>) -> Self {
        Self {
            default_source_version: default_source_version.into(),
        }
    }

    pub fn normalize_str(
        &self,
        raw: &str,
        citizenship: &str,
        destination: &str,
    ) -> Result<VisaRule, NormalizeError> {
        let payload: Value = serde_json::from_str(raw)?;
        self.normalize(&payload, citizenship, destination)
    }

    pub fn normalize(
        &self,
        payload: &Value,
        citizenship: &str,
        destination: &str,
    ) -> Result<VisaRule, NormalizeError> {
        let citizenship = CountryCode::new(citizenship);
        let destination = CountryCode::new(destination);

        let envelope = if payload.is_object() {
            ProviderEnvelope::deserialize(payload).unwrap_or_else(|err| {
                debug!(%err, "provider envelope did not decode");
                ProviderEnvelope::default()
            })
        } else {
            debug!("provider payload is not an object");
            ProviderEnvelope::default()
        };

        let primary = envelope
            .requirements
            .clone()
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .find_map(|(index, entry)| {
                if !entry.is_object() {
                    warn!(index, "skipping non-object requirement entry");
                    return None;
                }
                match serde_json::from_value::<RawRequirement>(entry) {
                    Ok(requirement) => Some(requirement),
                    Err(err) => {
                        warn!(%err, index, "skipping unusable requirement entry");
                        None
                    }
                }
            })
            .ok_or_else(|| NormalizeError::NoRequirementsFound {
                citizenship: citizenship.clone(),
                destination: destination.clone(),
            })?;

        let payload_hash = payload_hash(payload).map_err(NormalizeError::Canonicalization)?;
        let visa_type = classify_visa_type(
            primary.kind().unwrap_or(""),
            primary.category.as_deref().unwrap_or(""),
        );

        Ok(VisaRule {
            citizenship_code: citizenship,
            destination_code: destination,
            visa_type,
            allowed_stay_days: extract::stay_days(&primary),
            documents: extract::documents(&primary),
            processing_time_days: extract::processing_days(&primary),
            passport_validity_requirement_months: extract::passport_validity_months(&primary),
            restrictions: extract::restrictions(&primary),
            source_version: envelope
                .version()
                .map(str::to_string)
                .unwrap_or_else(|| self.default_source_version.clone()),
            payload_hash,
        })
    }
}
