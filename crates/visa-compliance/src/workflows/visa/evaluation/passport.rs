use chrono::{Months, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassportCheck {
    pub valid: bool,
    pub message: String,
}

impl PassportCheck {
    fn valid(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: message.into(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Compare the passport expiry with `trip_start + required_months` (calendar months,
/// clamped to the last day of shorter months).
pub fn check_passport_validity(
    expiry: Option<NaiveDate>,
    trip_start: NaiveDate,
    required_months: Option<u32>,
) -> PassportCheck {
    let Some(expiry) = expiry else {
        return PassportCheck::invalid("Passport expiry date not provided");
    };

    let Some(months) = required_months else {
        return PassportCheck::valid("No passport validity requirement");
    };

    let Some(required_until) = trip_start.checked_add_months(Months::new(months)) else {
        return PassportCheck::invalid(format!(
            "Passport validity requirement of {months} months cannot be computed from {trip_start}"
        ));
    };

    if expiry < required_until {
        PassportCheck::invalid(format!(
            "Passport must be valid until at least {required_until} ({months} months after entry) but expires {expiry}"
        ))
    } else {
        PassportCheck::valid(format!("Passport valid until {expiry}"))
    }
}
