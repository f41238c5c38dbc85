use chrono::{Duration, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ApplyBy {
    pub apply_by_date: Option<NaiveDate>,
    /// Negative once the deadline has passed; never clamped.
    pub time_to_apply_days: Option<i64>,
}

/// `apply_by = trip_start - (processing_days + buffer_days)`, measured against `today`.
pub fn calculate_apply_by(
    trip_start: NaiveDate,
    processing_days: Option<u32>,
    buffer_days: u32,
    today: NaiveDate,
) -> ApplyBy {
    let Some(processing_days) = processing_days else {
        return ApplyBy::default();
    };

    let lead = Duration::days(i64::from(processing_days) + i64::from(buffer_days));
    match trip_start.checked_sub_signed(lead) {
        Some(apply_by) => ApplyBy {
            apply_by_date: Some(apply_by),
            time_to_apply_days: Some((apply_by - today).num_days()),
        },
        None => ApplyBy::default(),
    }
}
