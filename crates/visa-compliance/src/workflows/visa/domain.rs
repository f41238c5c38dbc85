use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Two-letter country identifier, trimmed and upper-cased on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CountryCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for CountryCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::new(&raw))
    }
}

/// Identity of a canonical rule: one rule per citizenship/destination pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleKey {
    pub citizenship: CountryCode,
    pub destination: CountryCode,
}

impl RuleKey {
    pub fn new(citizenship: impl Into<CountryCode>, destination: impl Into<CountryCode>) -> Self {
        Self {
            citizenship: citizenship.into(),
            destination: destination.into(),
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.citizenship, self.destination)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisaType {
    VisaFree,
    Evisa,
    VisaOnArrival,
    EmbassyRequired,
    Transit,
    Other,
}

impl VisaType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::VisaFree => "Visa free",
            Self::Evisa => "eVisa",
            Self::VisaOnArrival => "Visa on arrival",
            Self::EmbassyRequired => "Embassy visa",
            Self::Transit => "Transit visa",
            Self::Other => "Other",
        }
    }

    /// Visa types that need an application submitted ahead of travel.
    pub const fn requires_application(self) -> bool {
        matches!(self, Self::Evisa | Self::EmbassyRequired)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredDocument {
    pub name: String,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Canonical, provider-independent visa requirement for one citizenship/destination pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisaRule {
    pub citizenship_code: CountryCode,
    pub destination_code: CountryCode,
    pub visa_type: VisaType,
    pub allowed_stay_days: Option<u32>,
    pub documents: Vec<RequiredDocument>,
    pub processing_time_days: Option<u32>,
    pub passport_validity_requirement_months: Option<u32>,
    pub restrictions: Vec<String>,
    pub source_version: String,
    pub payload_hash: String,
}

impl VisaRule {
    pub fn key(&self) -> RuleKey {
        RuleKey {
            citizenship: self.citizenship_code.clone(),
            destination: self.destination_code.clone(),
        }
    }
}

/// Traveler itinerary evaluated against a rule. Date ordering is the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub citizenship_code: CountryCode,
    pub destination_code: CountryCode,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub passport_expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub rule_reference: Option<RuleKey>,
}

impl Trip {
    pub fn rule_key(&self) -> RuleKey {
        self.rule_reference.clone().unwrap_or_else(|| RuleKey {
            citizenship: self.citizenship_code.clone(),
            destination: self.destination_code.clone(),
        })
    }

    pub fn days_until_start(&self, today: NaiveDate) -> i64 {
        (self.start_date - today).num_days()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceStatus {
    Ok,
    ActionRequired,
    Unknown,
}

impl ComplianceStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::ActionRequired => "Action required",
            Self::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    PassportCheck,
    VisaApply,
    FinalCheck,
    Urgent,
}

impl ReminderKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PassportCheck => "passport_check",
            Self::VisaApply => "visa_apply",
            Self::FinalCheck => "final_check",
            Self::Urgent => "urgent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_codes_normalize_on_construction_and_deserialization() {
        assert_eq!(CountryCode::new(" us ").as_str(), "US");

        let decoded: CountryCode = serde_json::from_str("\"jp\"").expect("decode");
        assert_eq!(decoded, CountryCode::new("JP"));
        assert_eq!(serde_json::to_string(&decoded).expect("encode"), "\"JP\"");
    }

    #[test]
    fn trip_falls_back_to_its_own_pair_without_rule_reference() {
        let trip = Trip {
            citizenship_code: "in".into(),
            destination_code: "th".into(),
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid"),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 9).expect("valid"),
            passport_expiry_date: None,
            rule_reference: None,
        };

        assert_eq!(trip.rule_key(), RuleKey::new("IN", "TH"));
        assert_eq!(trip.rule_key().to_string(), "IN->TH");
    }

    #[test]
    fn only_evisa_and_embassy_require_applications() {
        assert!(VisaType::Evisa.requires_application());
        assert!(VisaType::EmbassyRequired.requires_application());
        assert!(!VisaType::VisaFree.requires_application());
        assert!(!VisaType::Transit.requires_application());
    }
}
