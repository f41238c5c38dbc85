use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use super::domain::{ComplianceStatus, CountryCode, RuleKey, Trip, VisaRule};
use super::evaluation::{ComplianceConfig, ComplianceEvaluator, ComplianceResult};
use super::normalizer::{NormalizeError, RuleNormalizer};
use super::reminders::{ReminderSchedule, ReminderScheduler};
use super::repository::{
    PublishError, ReminderPublisher, RepositoryError, RuleChange, RuleRepository, TripId,
    TripRecord, TripRepository,
};

/// Trip details supplied by the caller when registering a trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripDraft {
    pub citizenship_code: CountryCode,
    pub destination_code: CountryCode,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub passport_expiry_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleIngestion {
    pub rule: VisaRule,
    pub change: RuleChange,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripComplianceReport {
    pub trip: TripRecord,
    pub result: ComplianceResult,
    pub reminders: ReminderSchedule,
}

/// Service composing the engine components with storage and notification seams.
pub struct TripComplianceService<R, T, P> {
    normalizer: RuleNormalizer,
    evaluator: ComplianceEvaluator,
    scheduler: ReminderScheduler,
    rules: Arc<R>,
    trips: Arc<T>,
    publisher: Arc<P>,
    trip_sequence: AtomicU64,
}

impl<R, T, P> TripComplianceService<R, T, P>
where
    R: RuleRepository + 'static,
    T: TripRepository + 'static,
    P: ReminderPublisher + 'static,
{
    pub fn new(
        rules: Arc<R>,
        trips: Arc<T>,
        publisher: Arc<P>,
        normalizer: RuleNormalizer,
        config: ComplianceConfig,
    ) -> Self {
        Self {
            normalizer,
            evaluator: ComplianceEvaluator::new(config.clone()),
            scheduler: ReminderScheduler::new(config),
            rules,
            trips,
            publisher,
            trip_sequence: AtomicU64::new(1),
        }
    }

    fn next_trip_id(&self) -> TripId {
        let id = self.trip_sequence.fetch_add(1, Ordering::Relaxed);
        TripId(format!("trip-{id:06}"))
    }

    /// Normalize a provider payload and replace the stored rule for the pair.
    pub fn ingest_rule(
        &self,
        payload: &Value,
        citizenship: &str,
        destination: &str,
    ) -> Result<RuleIngestion, ComplianceServiceError> {
        let rule = self.normalizer.normalize(payload, citizenship, destination)?;
        let change = self.rules.upsert(rule.clone())?;

        info!(
            pair = %rule.key(),
            visa_type = rule.visa_type.label(),
            ?change,
            "visa rule ingested"
        );

        Ok(RuleIngestion { rule, change })
    }

    pub fn rule(&self, key: &RuleKey) -> Result<VisaRule, ComplianceServiceError> {
        let rule = self.rules.fetch(key)?.ok_or(RepositoryError::NotFound)?;
        Ok(rule)
    }

    pub fn register_trip(&self, draft: TripDraft) -> Result<TripRecord, ComplianceServiceError> {
        let rule_reference = RuleKey {
            citizenship: draft.citizenship_code.clone(),
            destination: draft.destination_code.clone(),
        };

        let record = TripRecord {
            id: self.next_trip_id(),
            trip: Trip {
                citizenship_code: draft.citizenship_code,
                destination_code: draft.destination_code,
                start_date: draft.start_date,
                end_date: draft.end_date,
                passport_expiry_date: draft.passport_expiry_date,
                rule_reference: Some(rule_reference),
            },
            status: ComplianceStatus::Unknown,
            next_action_date: None,
            compliance_notes: "Awaiting compliance check".to_string(),
        };

        let stored = self.trips.insert(record)?;
        Ok(stored)
    }

    pub fn trip(&self, id: &TripId) -> Result<TripRecord, ComplianceServiceError> {
        let record = self.trips.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn delete_trip(&self, id: &TripId) -> Result<(), ComplianceServiceError> {
        self.trips.delete(id)?;
        self.publisher.retract(id)?;
        info!(trip = %id, "trip deleted");
        Ok(())
    }

    /// Re-evaluate a stored trip as of `today`, persist the outcome, and publish reminders.
    pub fn check_trip(
        &self,
        id: &TripId,
        today: NaiveDate,
    ) -> Result<TripComplianceReport, ComplianceServiceError> {
        let mut record = self.trip(id)?;
        let key = record.trip.rule_key();

        let (result, reminders) = match self.rules.fetch(&key)? {
            Some(rule) => (
                self.evaluator.evaluate(&record.trip, &rule, today),
                self.scheduler.schedule(&record.trip, &rule, today),
            ),
            None => (
                ComplianceResult::unknown(format!(
                    "Visa requirements not yet available for {key}"
                )),
                ReminderSchedule::default(),
            ),
        };

        record.apply(&result);
        self.trips.update(record.clone())?;

        if !reminders.is_empty() {
            self.publisher.publish(&record.id, &reminders)?;
        }

        info!(
            trip = %record.id,
            status = result.status.label(),
            reminders = reminders.len(),
            "trip compliance checked"
        );

        Ok(TripComplianceReport {
            trip: record,
            result,
            reminders,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ComplianceServiceError {
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Publish(#[from] PublishError),
}
