use serde::{Deserialize, Serialize};

/// Safety margin added on top of provider processing time.
pub const BUFFER_DAYS: u32 = 7;

/// Apply-by reminder offsets, in days before the deadline.
pub const REMINDER_INTERVALS: [u32; 5] = [30, 14, 7, 3, 1];

/// Engine constants shared by the evaluator and the reminder scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceConfig {
    pub buffer_days: u32,
    pub reminder_intervals: Vec<u32>,
}

impl ComplianceConfig {
    /// Intervals are kept descending and unique so reminders generate far-to-near.
    pub fn new(buffer_days: u32, mut reminder_intervals: Vec<u32>) -> Self {
        reminder_intervals.sort_unstable_by(|a, b| b.cmp(a));
        reminder_intervals.dedup();
        Self {
            buffer_days,
            reminder_intervals,
        }
    }
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self::new(BUFFER_DAYS, REMINDER_INTERVALS.to_vec())
    }
}
