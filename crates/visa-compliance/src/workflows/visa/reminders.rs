use super::domain::{ReminderKind, Trip, VisaRule, VisaType};
use super::evaluation::{calculate_apply_by, check_passport_validity, ComplianceConfig};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Fixed pre-departure nudges for visa-free travel, in days before the trip.
const VISA_FREE_OFFSETS: [i64; 2] = [7, 1];
const FINAL_CHECK_DAYS: i64 = 3;
/// Apply-by offsets at or below this are flagged urgent.
const URGENT_INTERVAL_DAYS: u32 = 3;
const CSV_HEADER: [&str; 4] = ["date", "days_before_trip", "kind", "message"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub date: NaiveDate,
    pub days_before_trip: i64,
    pub kind: ReminderKind,
    pub message: String,
}

/// Reminders for one trip, ascending by date; same-day entries keep generation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderSchedule(Vec<Reminder>);

impl ReminderSchedule {
    fn from_unsorted(mut reminders: Vec<Reminder>) -> Self {
        reminders.sort_by_key(|reminder| reminder.date);
        Self(reminders)
    }

    pub fn reminders(&self) -> &[Reminder] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reminder> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<Reminder> {
        self.0
    }

    /// Emit `date,days_before_trip,kind,message` rows for the delivery layer.
    /// The header is written even when the schedule is empty.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(CSV_HEADER)?;
        for reminder in &self.0 {
            csv_writer.serialize(ReminderRow {
                date: reminder.date,
                days_before_trip: reminder.days_before_trip,
                kind: reminder.kind.label(),
                message: &reminder.message,
            })?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ReminderSchedule {
    type Item = &'a Reminder;
    type IntoIter = std::slice::Iter<'a, Reminder>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Serialize)]
struct ReminderRow<'a> {
    date: NaiveDate,
    days_before_trip: i64,
    kind: &'static str,
    message: &'a str,
}

/// Builds reminder schedules independently of the evaluator's status.
#[derive(Debug, Clone, Default)]
pub struct ReminderScheduler {
    config: ComplianceConfig,
}

impl ReminderScheduler {
    pub fn new(config: ComplianceConfig) -> Self {
        Self { config }
    }

    pub fn schedule(&self, trip: &Trip, rule: &VisaRule, today: NaiveDate) -> ReminderSchedule {
        let mut reminders = Vec::new();
        let destination = &trip.destination_code;

        match rule.visa_type {
            VisaType::VisaFree => {
                for offset in VISA_FREE_OFFSETS {
                    let Some(date) = days_before(trip.start_date, offset) else {
                        continue;
                    };
                    if date < today {
                        continue;
                    }
                    reminders.push(Reminder {
                        date,
                        days_before_trip: offset,
                        kind: ReminderKind::FinalCheck,
                        message: format!(
                            "Trip to {destination} in {offset} day(s): verify passport and entry documents"
                        ),
                    });
                }
            }
            visa_type if visa_type.requires_application() => {
                let apply_by = calculate_apply_by(
                    trip.start_date,
                    rule.processing_time_days,
                    self.config.buffer_days,
                    today,
                );

                if let Some(apply_by_date) = apply_by.apply_by_date {
                    for &interval in &self.config.reminder_intervals {
                        let Some(date) = days_before(apply_by_date, i64::from(interval)) else {
                            continue;
                        };
                        if date <= today {
                            continue;
                        }
                        let kind = if interval <= URGENT_INTERVAL_DAYS {
                            ReminderKind::Urgent
                        } else {
                            ReminderKind::VisaApply
                        };
                        reminders.push(Reminder {
                            date,
                            days_before_trip: (trip.start_date - date).num_days(),
                            kind,
                            message: format!(
                                "{interval} day(s) until the {} application deadline ({apply_by_date}) for {destination}",
                                visa_type.label()
                            ),
                        });
                    }
                }

                if let Some(date) = days_before(trip.start_date, FINAL_CHECK_DAYS) {
                    reminders.push(Reminder {
                        date,
                        days_before_trip: FINAL_CHECK_DAYS,
                        kind: ReminderKind::FinalCheck,
                        message: format!(
                            "Final check for {destination}: confirm your visa is approved and documents are ready"
                        ),
                    });
                }
            }
            _ => {}
        }

        if trip.passport_expiry_date.is_some() {
            let passport = check_passport_validity(
                trip.passport_expiry_date,
                trip.start_date,
                rule.passport_validity_requirement_months,
            );
            if !passport.valid {
                reminders.push(Reminder {
                    date: today,
                    days_before_trip: trip.days_until_start(today),
                    kind: ReminderKind::Urgent,
                    message: format!("URGENT: {}", passport.message),
                });
            }
        }

        ReminderSchedule::from_unsorted(reminders)
    }
}

/// `None` when the date falls outside the representable calendar.
fn days_before(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_sub_signed(Duration::days(days))
}
