use super::deadline::ApplyBy;
use crate::workflows::visa::domain::ComplianceStatus;
use chrono::{Duration, NaiveDate};

/// Deadlines closer than this still need user action even without a warning.
const ACTION_HORIZON_DAYS: i64 = 30;
/// Fallback follow-up when a warning carries no deadline of its own.
const WARNING_FOLLOW_UP_DAYS: i64 = 7;

#[derive(Debug, Default)]
pub(crate) struct Findings {
    pub(crate) errors: Vec<String>,
    pub(crate) warnings: Vec<String>,
}

/// Classify the remaining time before the apply-by date into an error or warning.
pub(crate) fn deadline_finding(apply_by: &ApplyBy, findings: &mut Findings) {
    let (Some(date), Some(days)) = (apply_by.apply_by_date, apply_by.time_to_apply_days) else {
        return;
    };

    match days {
        days if days < 0 => findings.errors.push(format!(
            "Visa application deadline passed {} day(s) ago (apply-by date was {date})",
            -days
        )),
        0..=3 => findings.warnings.push(format!(
            "Visa application is urgent: {days} day(s) left to apply (apply by {date})"
        )),
        4..=7 => findings.warnings.push(format!(
            "Visa application window closing, apply soon: {days} day(s) left (apply by {date})"
        )),
        _ => {}
    }
}

/// First match wins: errors, then warnings, then a near deadline, else ok.
pub(crate) fn resolve_status(
    findings: &Findings,
    apply_by: &ApplyBy,
    today: NaiveDate,
) -> (ComplianceStatus, Option<NaiveDate>) {
    if !findings.errors.is_empty() {
        return (ComplianceStatus::ActionRequired, Some(today));
    }

    if !findings.warnings.is_empty() {
        let next = apply_by.apply_by_date.or_else(|| {
            today
                .checked_add_signed(Duration::days(WARNING_FOLLOW_UP_DAYS))
                .or(Some(today))
        });
        return (ComplianceStatus::ActionRequired, next);
    }

    if let (Some(date), Some(days)) = (apply_by.apply_by_date, apply_by.time_to_apply_days) {
        if days <= ACTION_HORIZON_DAYS {
            return (ComplianceStatus::ActionRequired, Some(date));
        }
    }

    (ComplianceStatus::Ok, None)
}

pub(crate) fn compliance_notes(findings: &Findings) -> String {
    if findings.errors.is_empty() && findings.warnings.is_empty() {
        return "All requirements met".to_string();
    }

    findings
        .errors
        .iter()
        .map(|error| format!("ERROR: {error}"))
        .chain(
            findings
                .warnings
                .iter()
                .map(|warning| format!("WARNING: {warning}")),
        )
        .collect::<Vec<_>>()
        .join(" | ")
}
