//! Visa compliance engine: provider payload normalization, trip evaluation,
//! and reminder scheduling, plus the service and HTTP seams around them.
//!
//! Data flows one way: raw payload → [`RuleNormalizer`] → [`VisaRule`] →
//! [`ComplianceEvaluator`] / [`ReminderScheduler`]. Every entry point takes
//! `today` explicitly.

pub mod domain;
pub mod evaluation;
pub mod normalizer;
pub mod reminders;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ComplianceStatus, CountryCode, ReminderKind, RequiredDocument, RuleKey, Trip, VisaRule,
    VisaType,
};
pub use evaluation::{
    calculate_apply_by, check_passport_validity, ApplyBy, ComplianceConfig, ComplianceEvaluator,
    ComplianceResult, PassportCheck, BUFFER_DAYS, REMINDER_INTERVALS,
};
pub use normalizer::{classify_visa_type, payload_hash, NormalizeError, RuleNormalizer};
pub use reminders::{Reminder, ReminderSchedule, ReminderScheduler};
pub use repository::{
    PublishError, ReminderPublisher, RepositoryError, RuleChange, RuleRepository, TripId,
    TripRecord, TripRepository,
};
pub use router::compliance_router;
pub use service::{
    ComplianceServiceError, RuleIngestion, TripComplianceReport, TripComplianceService, TripDraft,
};
