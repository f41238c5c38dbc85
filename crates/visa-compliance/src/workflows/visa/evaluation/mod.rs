mod config;
mod deadline;
mod passport;
mod policy;

pub use config::{ComplianceConfig, BUFFER_DAYS, REMINDER_INTERVALS};
pub use deadline::{calculate_apply_by, ApplyBy};
pub use passport::{check_passport_validity, PassportCheck};

use super::domain::{ComplianceStatus, Trip, VisaRule, VisaType};
use chrono::NaiveDate;
use policy::Findings;
use serde::{Deserialize, Serialize};

/// Trips starting within this many days get a document reminder on visa-free rules.
const VISA_FREE_NOTICE_DAYS: i64 = 7;

/// Outcome of one evaluation. Derived data; recomputed whenever it is needed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceResult {
    pub status: ComplianceStatus,
    pub passport_valid: bool,
    pub time_to_apply_days: Option<i64>,
    pub apply_by_date: Option<NaiveDate>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub next_action_date: Option<NaiveDate>,
    pub compliance_notes: String,
}

impl ComplianceResult {
    /// Result for a trip whose visa rule is not available yet.
    pub fn unknown(note: impl Into<String>) -> Self {
        let note = note.into();
        Self {
            status: ComplianceStatus::Unknown,
            passport_valid: false,
            time_to_apply_days: None,
            apply_by_date: None,
            warnings: vec![note.clone()],
            errors: Vec::new(),
            next_action_date: None,
            compliance_notes: note,
        }
    }
}

/// Pure evaluator; `today` is always supplied by the caller.
#[derive(Debug, Clone, Default)]
pub struct ComplianceEvaluator {
    config: ComplianceConfig,
}

impl ComplianceEvaluator {
    pub fn new(config: ComplianceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }

    pub fn apply_by(&self, trip: &Trip, rule: &VisaRule, today: NaiveDate) -> ApplyBy {
        calculate_apply_by(
            trip.start_date,
            rule.processing_time_days,
            self.config.buffer_days,
            today,
        )
    }

    pub fn evaluate(&self, trip: &Trip, rule: &VisaRule, today: NaiveDate) -> ComplianceResult {
        let mut findings = Findings::default();

        let passport = check_passport_validity(
            trip.passport_expiry_date,
            trip.start_date,
            rule.passport_validity_requirement_months,
        );
        if !passport.valid {
            findings.errors.push(passport.message);
        }

        let apply_by = if rule.visa_type.requires_application() {
            let apply_by = self.apply_by(trip, rule, today);
            policy::deadline_finding(&apply_by, &mut findings);
            apply_by
        } else {
            ApplyBy::default()
        };

        if rule.visa_type == VisaType::VisaFree {
            let days_until = trip.days_until_start(today);
            if (0..=VISA_FREE_NOTICE_DAYS).contains(&days_until) {
                findings.warnings.push(format!(
                    "Trip starts in {days_until} day(s): verify documents before departure"
                ));
            }
        }

        let (status, next_action_date) = policy::resolve_status(&findings, &apply_by, today);
        let compliance_notes = policy::compliance_notes(&findings);

        ComplianceResult {
            status,
            passport_valid: passport.valid,
            time_to_apply_days: apply_by.time_to_apply_days,
            apply_by_date: apply_by.apply_by_date,
            warnings: findings.warnings,
            errors: findings.errors,
            next_action_date,
            compliance_notes,
        }
    }
}
