use crate::infra::{InMemoryRuleRepository, InMemoryTripRepository, LoggingReminderPublisher};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use visa_compliance::config::{AppConfig, EngineConfig};
use visa_compliance::error::AppError;
use visa_compliance::workflows::visa::{
    ComplianceEvaluator, ComplianceResult, ReminderSchedule, ReminderScheduler, RuleNormalizer, Trip, TripComplianceReport, TripComplianceService, TripDraft, VisaRule,
};

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Provider payload (JSON) describing the visa requirements
    #[arg(long)]
    pub(crate) payload: PathBuf,
    /// Traveler citizenship (ISO country code)
    #[arg(long)]
    pub(crate) citizenship: String,
    /// Trip destination (ISO country code)
    #[arg(long)]
    pub(crate) destination: String,
    /// Trip start date (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) start_date: NaiveDate,
    /// Trip end date (YYYY-MM-DD). Defaults to start_date + 14 days.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) end_date: Option<NaiveDate>,
    /// Passport expiry date (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) passport_expiry: Option<NaiveDate>,
    /// Evaluation date (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the reminder schedule as CSV instead of the summary
    #[arg(long)]
    pub(crate) csv: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the evaluation date (defaults to today).
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        payload,
        citizenship,
        destination,
        start_date,
        end_date,
        passport_expiry,
        today,
        csv,
    } = args;

    let engine = AppConfig::load()?.engine;
    let raw = std::fs::read_to_string(&payload)?;
    let rule = RuleNormalizer::new(engine.source_version).normalize_str(
        &raw,
        &citizenship,
        &destination,
    )?;

    let trip = Trip {
        citizenship_code: citizenship.as_str().into(),
        destination_code: destination.as_str().into(),
        start_date,
        end_date: end_date.unwrap_or_else(|| start_date + Duration::days(14)),
        passport_expiry_date: passport_expiry,
        rule_reference: Some(rule.key()),
    };

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let result = ComplianceEvaluator::new(engine.compliance.clone()).evaluate(&trip, &rule, today);
    let reminders = ReminderScheduler::new(engine.compliance).schedule(&trip, &rule, today);

    if csv {
        reminders.write_csv(std::io::stdout().lock())?;
        return Ok(());
    }

    render_rule(&rule);
    render_result(&result);
    render_reminders(&reminders);
    Ok(())
}

struct DemoScenario {
    title: &'static str,
    citizenship: &'static str,
    destination: &'static str,
    starts_in: i64,
    passport_valid_for: i64,
    payload: Value,
}

fn demo_scenarios() -> Vec<DemoScenario> {
    vec![
        DemoScenario {
            title: "Visa-free weekend",
            citizenship: "US",
            destination: "MX",
            starts_in: 5,
            passport_valid_for: 900,
            payload: json!({
                "version": "demo-2025",
                "requirements": [{
                    "type": "Visa not required",
                    "category": "Visa-free",
                    "allowed_stay": {"description": "Up to 180 days"},
                    "documents": ["Passport", {"name": "Return ticket", "required": false}]
                }]
            }),
        },
        DemoScenario {
            title: "eVisa with comfortable lead time",
            citizenship: "GB",
            destination: "KE",
            starts_in: 60,
            passport_valid_for: 1200,
            payload: json!({
                "version": "demo-2025",
                "requirements": [{
                    "type": "eVisa",
                    "allowed_stay": {"value": 90},
                    "processing_time": {"min_days": 3, "max_days": 5},
                    "passport_requirements": {"validity_months": 6},
                    "documents": ["Passport scan", "Passport photo"]
                }]
            }),
        },
        DemoScenario {
            title: "Embassy visa with an expiring passport",
            citizenship: "IN",
            destination: "US",
            starts_in: 20,
            passport_valid_for: 90,
            payload: json!({
                "version": "demo-2025",
                "requirements": [{
                    "type": "Embassy visa",
                    "processing_time": {"min_days": 10, "max_days": 30},
                    "passport_requirements": {"validity_months": 6},
                    "documents": [{"name": "DS-160 confirmation", "note": "Printed copy"}],
                    "restrictions": ["In-person interview required"]
                }]
            }),
        },
    ]
}

type DemoService =
    TripComplianceService<InMemoryRuleRepository, InMemoryTripRepository, LoggingReminderPublisher>;

fn demo_service(engine: EngineConfig) -> DemoService {
    TripComplianceService::new(
        Arc::new(InMemoryRuleRepository::default()),
        Arc::new(InMemoryTripRepository::default()),
        Arc::new(LoggingReminderPublisher::default()),
        RuleNormalizer::new(engine.source_version),
        engine.compliance,
    )
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let engine = AppConfig::load()?.engine;
    println!(
        "Engine: {} day buffer, reminders at {:?} days before the deadline",
        engine.compliance.buffer_days, engine.compliance.reminder_intervals
    );
    let service = demo_service(engine);

    println!("Visa compliance demo (as of {today})");
    for scenario in demo_scenarios() {
        println!("\n== {} ({} -> {})", scenario.title, scenario.citizenship, scenario.destination);

        let ingestion =
            service.ingest_rule(&scenario.payload, scenario.citizenship, scenario.destination)?;
        render_rule(&ingestion.rule);

        let start_date = today + Duration::days(scenario.starts_in);
        let record = service.register_trip(TripDraft {
            citizenship_code: scenario.citizenship.into(),
            destination_code: scenario.destination.into(),
            start_date,
            end_date: start_date + Duration::days(10),
            passport_expiry_date: Some(today + Duration::days(scenario.passport_valid_for)),
        })?;
        println!("- Registered {} departing {}", record.id, start_date);

        let TripComplianceReport {
            result, reminders, ..
        } = service.check_trip(&record.id, today)?;
        render_result(&result);
        render_reminders(&reminders);
    }

    println!("\n== Destination without published requirements (FR -> BT)");
    let start_date = today + Duration::days(45);
    let record = service.register_trip(TripDraft {
        citizenship_code: "FR".into(),
        destination_code: "BT".into(),
        start_date,
        end_date: start_date + Duration::days(7),
        passport_expiry_date: None,
    })?;
    let report = service.check_trip(&record.id, today)?;
    render_result(&report.result);

    Ok(())
}

fn render_rule(rule: &VisaRule) {
    println!(
        "- Rule {}: {} (source {}, hash {}…)",
        rule.key(),
        rule.visa_type.label(),
        rule.source_version,
        &rule.payload_hash[..12.min(rule.payload_hash.len())]
    );
    if let Some(days) = rule.allowed_stay_days {
        println!("  Allowed stay: {days} days");
    }
    if let Some(days) = rule.processing_time_days {
        println!("  Processing time: up to {days} days");
    }
    if let Some(months) = rule.passport_validity_requirement_months {
        println!("  Passport validity: {months} months beyond entry");
    }
    for document in &rule.documents {
        let marker = if document.required { "required" } else { "optional" };
        match &document.note {
            Some(note) => println!("  Document ({marker}): {} ({note})", document.name),
            None => println!("  Document ({marker}): {}", document.name),
        }
    }
    for restriction in &rule.restrictions {
        println!("  Restriction: {restriction}");
    }
}

fn render_result(result: &ComplianceResult) {
    println!("- Status: {}", result.status.label());
    if let Some(apply_by) = result.apply_by_date {
        println!(
            "  Apply by {} ({} day(s) left)",
            apply_by,
            result.time_to_apply_days.unwrap_or_default()
        );
    }
    if let Some(next) = result.next_action_date {
        println!("  Next action: {next}");
    }
    println!("  Notes: {}", result.compliance_notes);
}

fn render_reminders(reminders: &ReminderSchedule) {
    if reminders.is_empty() {
        println!("- Reminders: none scheduled");
        return;
    }
    println!("- Reminders:");
    for reminder in reminders {
        println!(
            "    {} [{}] T-{}: {}",
            reminder.date,
            reminder.kind.label(),
            reminder.days_before_trip,
            reminder.message
        );
    }
}
