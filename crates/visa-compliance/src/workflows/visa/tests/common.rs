use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

use crate::workflows::visa::domain::{RuleKey, Trip, VisaRule, VisaType};
use crate::workflows::visa::evaluation::ComplianceConfig;
use crate::workflows::visa::normalizer::RuleNormalizer;
use crate::workflows::visa::reminders::ReminderSchedule;
use crate::workflows::visa::repository::{
    PublishError, ReminderPublisher, RepositoryError, RuleChange, RuleRepository, TripId,
    TripRecord, TripRepository,
};
use crate::workflows::visa::service::{TripComplianceService, TripDraft};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date")
}

pub(super) fn days_from_today(days: i64) -> NaiveDate {
    today() + Duration::days(days)
}

pub(super) fn rule(visa_type: VisaType) -> VisaRule {
    VisaRule {
        citizenship_code: "IN".into(),
        destination_code: "JP".into(),
        visa_type,
        allowed_stay_days: Some(90),
        documents: Vec::new(),
        processing_time_days: None,
        passport_validity_requirement_months: None,
        restrictions: Vec::new(),
        source_version: "provider-v1".to_string(),
        payload_hash: "0".repeat(64),
    }
}

pub(super) fn rule_with_processing(visa_type: VisaType, processing_days: u32) -> VisaRule {
    VisaRule {
        processing_time_days: Some(processing_days),
        ..rule(visa_type)
    }
}

pub(super) fn trip_starting_in(days: i64) -> Trip {
    let start_date = days_from_today(days);
    Trip {
        citizenship_code: "IN".into(),
        destination_code: "JP".into(),
        start_date,
        end_date: start_date + Duration::days(10),
        passport_expiry_date: Some(days_from_today(3650)),
        rule_reference: Some(RuleKey::new("IN", "JP")),
    }
}

pub(super) fn trip_draft(days: i64) -> TripDraft {
    let trip = trip_starting_in(days);
    TripDraft {
        citizenship_code: "in".into(),
        destination_code: "jp".into(),
        start_date: trip.start_date,
        end_date: trip.end_date,
        passport_expiry_date: trip.passport_expiry_date,
    }
}

pub(super) fn embassy_payload() -> Value {
    json!({
        "citizenship": "IN",
        "destination": "JP",
        "version": "2025-02",
        "requirements": [{
            "type": "Embassy visa",
            "category": "Visa required",
            "allowed_stay": {"value": null, "description": "Stay up to 90 days per entry"},
            "processing_time": {"min_days": 5, "max_days": 20},
            "passport_requirements": {"validity_months": 6},
            "documents": [
                "Passport",
                {"name": "Bank statement", "required": false, "note": "Last 3 months"}
            ],
            "restrictions": ["No paid employment"],
            "notes": ["Apply at the consulate with jurisdiction over your residence"]
        }]
    })
}

#[derive(Default, Clone)]
pub(super) struct MemoryRules {
    rules: Arc<Mutex<HashMap<RuleKey, VisaRule>>>,
}

impl RuleRepository for MemoryRules {
    fn upsert(&self, rule: VisaRule) -> Result<RuleChange, RepositoryError> {
        let mut guard = self.rules.lock().expect("rules mutex poisoned");
        let change = match guard.get(&rule.key()) {
            None => RuleChange::Created,
            Some(existing) if existing.payload_hash == rule.payload_hash => RuleChange::Unchanged,
            Some(_) => RuleChange::Updated,
        };
        guard.insert(rule.key(), rule);
        Ok(change)
    }

    fn fetch(&self, key: &RuleKey) -> Result<Option<VisaRule>, RepositoryError> {
        let guard = self.rules.lock().expect("rules mutex poisoned");
        Ok(guard.get(key).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryTrips {
    records: Arc<Mutex<HashMap<TripId, TripRecord>>>,
}

impl TripRepository for MemoryTrips {
    fn insert(&self, record: TripRecord) -> Result<TripRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("trips mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: TripRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("trips mutex poisoned");
        match guard.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &TripId) -> Result<Option<TripRecord>, RepositoryError> {
        let guard = self.records.lock().expect("trips mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn delete(&self, id: &TripId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("trips mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryPublisher {
    published: Arc<Mutex<Vec<(TripId, ReminderSchedule)>>>,
}

impl MemoryPublisher {
    pub(super) fn published(&self) -> Vec<(TripId, ReminderSchedule)> {
        self.published.lock().expect("publisher mutex poisoned").clone()
    }
}

impl ReminderPublisher for MemoryPublisher {
    fn publish(&self, trip_id: &TripId, schedule: &ReminderSchedule) -> Result<(), PublishError> {
        self.published
            .lock()
            .expect("publisher mutex poisoned")
            .push((trip_id.clone(), schedule.clone()));
        Ok(())
    }

    fn retract(&self, trip_id: &TripId) -> Result<(), PublishError> {
        self.published
            .lock()
            .expect("publisher mutex poisoned")
            .retain(|(published, _)| published != trip_id);
        Ok(())
    }
}

pub(super) struct OfflinePublisher;

impl ReminderPublisher for OfflinePublisher {
    fn publish(&self, _trip_id: &TripId, _schedule: &ReminderSchedule) -> Result<(), PublishError> {
        Err(PublishError::Transport("notification gateway offline".to_string()))
    }
}

pub(super) type MemoryService = TripComplianceService<MemoryRules, MemoryTrips, MemoryPublisher>;

pub(super) fn build_service() -> (MemoryService, MemoryRules, MemoryPublisher) {
    let rules = MemoryRules::default();
    let publisher = MemoryPublisher::default();
    let service = TripComplianceService::new(
        Arc::new(rules.clone()),
        Arc::new(MemoryTrips::default()),
        Arc::new(publisher.clone()),
        RuleNormalizer::default(),
        ComplianceConfig::default(),
    );
    (service, rules, publisher)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}
