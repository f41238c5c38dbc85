use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;
use visa_compliance::workflows::visa::{
    ComplianceConfig, ComplianceEvaluator, PublishError, Reminder, ReminderPublisher,
    ReminderSchedule, ReminderScheduler, RepositoryError, RuleChange, RuleKey, RuleRepository,
    TripId, TripRecord, TripRepository, VisaRule,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Stateless engine pieces shared by the ad-hoc evaluation endpoint.
#[derive(Clone, Default)]
pub(crate) struct EngineState {
    pub(crate) evaluator: Arc<ComplianceEvaluator>,
    pub(crate) scheduler: Arc<ReminderScheduler>,
}

impl EngineState {
    pub(crate) fn new(config: ComplianceConfig) -> Self {
        Self {
            evaluator: Arc::new(ComplianceEvaluator::new(config.clone())),
            scheduler: Arc::new(ReminderScheduler::new(config)),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RepositoryError> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryRuleRepository {
    rules: Arc<Mutex<HashMap<RuleKey, VisaRule>>>,
}

impl RuleRepository for InMemoryRuleRepository {
    fn upsert(&self, rule: VisaRule) -> Result<RuleChange, RepositoryError> {
        let mut guard = lock(&self.rules)?;
        let change = match guard.get(&rule.key()) {
            None => RuleChange::Created,
            Some(existing) if existing.payload_hash == rule.payload_hash => RuleChange::Unchanged,
            Some(_) => RuleChange::Updated,
        };
        if change != RuleChange::Unchanged {
            guard.insert(rule.key(), rule);
        }
        Ok(change)
    }

    fn fetch(&self, key: &RuleKey) -> Result<Option<VisaRule>, RepositoryError> {
        Ok(lock(&self.rules)?.get(key).cloned())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryTripRepository {
    records: Arc<Mutex<HashMap<TripId, TripRecord>>>,
}

impl TripRepository for InMemoryTripRepository {
    fn insert(&self, record: TripRecord) -> Result<TripRecord, RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: TripRecord) -> Result<(), RepositoryError> {
        let mut guard = lock(&self.records)?;
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &TripId) -> Result<Option<TripRecord>, RepositoryError> {
        Ok(lock(&self.records)?.get(id).cloned())
    }

    fn delete(&self, id: &TripId) -> Result<(), RepositoryError> {
        lock(&self.records)?
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

/// Keeps the latest schedule per live trip and logs it; delivery happens downstream.
#[derive(Default, Clone)]
pub(crate) struct LoggingReminderPublisher {
    schedules: Arc<Mutex<HashMap<TripId, Vec<Reminder>>>>,
}

impl ReminderPublisher for LoggingReminderPublisher {
    fn publish(&self, trip_id: &TripId, schedule: &ReminderSchedule) -> Result<(), PublishError> {
        let mut guard = self
            .schedules
            .lock()
            .map_err(|_| PublishError::Transport("reminder mutex poisoned".to_string()))?;
        for reminder in schedule {
            info!(
                trip = %trip_id,
                date = %reminder.date,
                kind = reminder.kind.label(),
                "reminder queued"
            );
        }
        guard.insert(trip_id.clone(), schedule.reminders().to_vec());
        Ok(())
    }

    fn retract(&self, trip_id: &TripId) -> Result<(), PublishError> {
        let mut guard = self
            .schedules
            .lock()
            .map_err(|_| PublishError::Transport("reminder mutex poisoned".to_string()))?;
        if guard.remove(trip_id).is_some() {
            info!(trip = %trip_id, "pending reminders withdrawn");
        }
        Ok(())
    }
}

#[cfg(test)]
impl LoggingReminderPublisher {
    pub(crate) fn scheduled(&self, trip_id: &TripId) -> Vec<Reminder> {
        self.schedules
            .lock()
            .map(|guard| guard.get(trip_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
