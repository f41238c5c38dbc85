use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::domain::{ComplianceStatus, RuleKey, Trip, VisaRule};
use super::evaluation::ComplianceResult;
use super::reminders::ReminderSchedule;

/// Identifier wrapper for stored trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TripId(pub String);

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stored trip plus the fields re-evaluation is allowed to update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripRecord {
    pub id: TripId,
    pub trip: Trip,
    pub status: ComplianceStatus,
    pub next_action_date: Option<NaiveDate>,
    pub compliance_notes: String,
}

impl TripRecord {
    pub fn apply(&mut self, result: &ComplianceResult) {
        self.status = result.status;
        self.next_action_date = result.next_action_date;
        self.compliance_notes = result.compliance_notes.clone();
    }
}

/// Outcome of replacing the canonical rule for a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleChange {
    Created,
    Updated,
    Unchanged,
}

/// Canonical rule store; holds at most one rule per [`RuleKey`].
pub trait RuleRepository: Send + Sync {
    /// Replace the rule for its key atomically, reporting what changed via the payload hash.
    fn upsert(&self, rule: VisaRule) -> Result<RuleChange, RepositoryError>;
    fn fetch(&self, key: &RuleKey) -> Result<Option<VisaRule>, RepositoryError>;
}

pub trait TripRepository: Send + Sync {
    fn insert(&self, record: TripRecord) -> Result<TripRecord, RepositoryError>;
    fn update(&self, record: TripRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &TripId) -> Result<Option<TripRecord>, RepositoryError>;
    fn delete(&self, id: &TripId) -> Result<(), RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound hook toward the notification-delivery layer.
pub trait ReminderPublisher: Send + Sync {
    fn publish(&self, trip_id: &TripId, schedule: &ReminderSchedule) -> Result<(), PublishError>;

    /// Withdraw any pending reminders for a trip that no longer exists.
    fn retract(&self, _trip_id: &TripId) -> Result<(), PublishError> {
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("reminder transport unavailable: {0}")]
    Transport(String),
}
