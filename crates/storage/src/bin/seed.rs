use std::fmt;
use std::sync::Arc;

use careplan_core::QuestionnaireKind;
use careplan_core::form::FormEngine;
use careplan_core::model::{AssignmentId, DocumentId, MemberId};
use chrono::{DateTime, Duration, Utc};
use storage::repository::{Storage, UpsertResponseRecord};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    member_id: MemberId,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidMemberId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidMemberId { raw } => write!(f, "invalid --member value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("CAREPLAN_DB_URL")
            .unwrap_or_else(|_| "sqlite://careplan.sqlite3?mode=rwc".into());
        let mut member_id = MemberId::new(1);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--member" => {
                    let value = require_value(&mut args, "--member")?;
                    member_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidMemberId { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            member_id,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://careplan.sqlite3?mode=rwc)");
    eprintln!("  --member <id>             Member owning the seeded responses (default: 1)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CAREPLAN_DB_URL");
}

struct Sample {
    assignment_id: AssignmentId,
    document_id: DocumentId,
    kind: QuestionnaireKind,
    values: &'static [(&'static str, &'static str)],
}

// Assignment 1 is partly filled; assignment 2 is a finished Firefly document.
const SAMPLES: &[Sample] = &[
    Sample {
        assignment_id: AssignmentId::new(1),
        document_id: DocumentId::new(1),
        kind: QuestionnaireKind::DementiaValues,
        values: &[
            ("personal.full_name", "Margaret Ellis"),
            ("personal.preferred_name", "Peggy"),
            ("values.what_matters_most", "Being with my grandchildren"),
            ("stage_mild.goal", "extend_life"),
            ("stage_mild.hospital_care", "yes"),
        ],
    },
    Sample {
        assignment_id: AssignmentId::new(2),
        document_id: DocumentId::new(2),
        kind: QuestionnaireKind::Firefly,
        values: &[
            ("person.full_name", "Thomas Reyes"),
            ("person.date_of_birth", "1948-03-12"),
            ("person.address", "12 Orchard Lane"),
            ("person.phone", "555-0142"),
            ("agent.primary.name", "Ana Reyes"),
            ("agent.primary.relationship", "daughter"),
            ("agent.primary.phone", "555-0199"),
            ("agent.alternate.name", "Luis Reyes"),
            ("agent.alternate.phone", "555-0123"),
            ("treatment.cpr", "no"),
            ("treatment.mechanical_ventilation", "trial_only"),
            ("treatment.artificial_nutrition", "no"),
            ("treatment.dialysis", "no"),
            ("treatment.antibiotics", "yes"),
            ("comfort.pain_management", "as needed"),
            ("comfort.place_of_care", "home"),
            ("comfort.people_present", "family"),
            ("comfort.music_or_readings", "old boleros"),
            ("spiritual.tradition", "Catholic"),
            ("spiritual.clergy_contact", "St. Anne parish"),
            ("spiritual.rituals", "anointing of the sick"),
            ("after_death.organ_donation", "yes"),
            ("after_death.body_disposition", "burial"),
            ("after_death.service_wishes", "small mass"),
            ("signatures.signed_on", "2024-05-01"),
            ("signatures.witness_one", "R. Patel"),
            ("signatures.witness_two", "J. Kim"),
        ],
    },
];

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    for (offset, sample) in (0_i64..).zip(SAMPLES) {
        let mut engine = FormEngine::new(Arc::new(sample.kind.questionnaire()?));
        for (path, value) in sample.values {
            engine.set_field(path, *value)?;
        }
        if sample.kind == QuestionnaireKind::Firefly {
            engine.set_field("signatures.member_acknowledged", true)?;
        }

        let snapshot = engine.snapshot()?;
        let saved = storage
            .responses
            .upsert_response(UpsertResponseRecord {
                assignment_id: sample.assignment_id,
                document_id: sample.document_id,
                member_id: args.member_id,
                responses: snapshot.responses,
                progress: snapshot.progress,
                section_progress: snapshot.section_progress,
                saved_at: now - Duration::minutes(offset * 15),
            })
            .await?;

        println!(
            "Seeded assignment {} ({}) at {}%",
            saved.assignment_id, sample.kind, saved.progress
        );
    }

    println!("Seeded {} responses into {}", SAMPLES.len(), args.db_url);
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
