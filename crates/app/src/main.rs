use std::fmt;

use careplan_core::QuestionnaireKind;
use careplan_core::form::{FormValue, ProgressReport};
use careplan_core::model::{Assignment, AssignmentId, DocumentId, MemberId};
use services::{ApiConfig, AppServices, Clock, FormSession};
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArg { what: &'static str },
    UnknownArg(String),
    InvalidId { flag: &'static str, raw: String },
    InvalidKind { raw: String },
    InvalidDbUrl { raw: String },
    InvalidEdit { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArg { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidKind { raw } => write!(
                f,
                "unknown questionnaire: {raw} (expected dementia_values or firefly)"
            ),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidEdit { raw } => {
                write!(f, "invalid edit (expected <path>=<value>): {raw}")
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

fn parse_kind(raw: String) -> Result<QuestionnaireKind, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidKind { raw })
}

fn parse_id<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidId { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- schema <kind>");
    eprintln!("  cargo run -p app -- status --assignment <id> --kind <kind> [--db <sqlite_url>]");
    eprintln!(
        "  cargo run -p app -- set --assignment <id> --kind <kind> --member <id> --document <id> [--db <sqlite_url>] <path>=<value>..."
    );
    eprintln!();
    eprintln!("Kinds: dementia_values, firefly");
    eprintln!("Values `true` and `false` set checkboxes; anything else is text.");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://careplan.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CAREPLAN_DB_URL, CAREPLAN_API_BASE_URL, CAREPLAN_API_TOKEN,");
    eprintln!("  CAREPLAN_AUTOSAVE_ENABLED, CAREPLAN_AUTOSAVE_QUIET_MS, CAREPLAN_SAVE_STATUS_MS,");
    eprintln!("  RUST_LOG");
}

#[derive(Debug)]
struct Edit {
    path: String,
    value: FormValue,
}

impl Edit {
    fn parse(raw: String) -> Result<Self, ArgsError> {
        let parsed = raw.split_once('=').and_then(|(path, value)| {
            let path = path.trim();
            (!path.is_empty()).then(|| (path.to_string(), value.to_string()))
        });
        let Some((path, value)) = parsed else {
            return Err(ArgsError::InvalidEdit { raw });
        };
        let value = match value.as_str() {
            "true" => FormValue::Flag(true),
            "false" => FormValue::Flag(false),
            text => FormValue::from(text),
        };
        Ok(Self { path, value })
    }
}

#[derive(Debug)]
enum Command {
    Schema {
        kind: QuestionnaireKind,
    },
    Status {
        db_url: String,
        assignment_id: AssignmentId,
        kind: QuestionnaireKind,
    },
    Set {
        db_url: String,
        assignment_id: AssignmentId,
        document_id: DocumentId,
        member_id: MemberId,
        kind: QuestionnaireKind,
        edits: Vec<Edit>,
    },
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let Some(name) = args.next() else {
            return Ok(None);
        };
        match name.as_str() {
            "schema" => {
                let kind = match args.next() {
                    Some(raw) if raw == "--help" || raw == "-h" => return Ok(None),
                    Some(raw) => parse_kind(raw)?,
                    None => return Err(ArgsError::MissingArg { what: "<kind>" }),
                };
                if let Some(extra) = args.next() {
                    return Err(ArgsError::UnknownArg(extra));
                }
                Ok(Some(Self::Schema { kind }))
            }
            "status" | "set" => Self::parse_form_command(&name, &mut args).map(Some),
            "--help" | "-h" => Ok(None),
            _ => Err(ArgsError::UnknownArg(name)),
        }
    }

    fn parse_form_command(
        name: &str,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("CAREPLAN_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://careplan.sqlite3".into(), normalize_sqlite_url);
        let mut assignment_id = None;
        let mut document_id = None;
        let mut member_id = None;
        let mut kind = None;
        let mut edits = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--assignment" => {
                    let value = require_value(args, "--assignment")?;
                    assignment_id = Some(parse_id("--assignment", value)?);
                }
                "--document" => {
                    let value = require_value(args, "--document")?;
                    document_id = Some(parse_id("--document", value)?);
                }
                "--member" => {
                    let value = require_value(args, "--member")?;
                    member_id = Some(parse_id("--member", value)?);
                }
                "--kind" => {
                    let value = require_value(args, "--kind")?;
                    kind = Some(parse_kind(value)?);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ if name == "set" => edits.push(Edit::parse(arg)?),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let assignment_id = assignment_id.ok_or(ArgsError::MissingValue {
            flag: "--assignment",
        })?;
        let kind = kind.ok_or(ArgsError::MissingValue { flag: "--kind" })?;

        if name == "status" {
            return Ok(Self::Status {
                db_url,
                assignment_id,
                kind,
            });
        }

        if edits.is_empty() {
            return Err(ArgsError::MissingArg {
                what: "<path>=<value>",
            });
        }
        Ok(Self::Set {
            db_url,
            assignment_id,
            document_id: document_id.ok_or(ArgsError::MissingValue { flag: "--document" })?,
            member_id: member_id.ok_or(ArgsError::MissingValue { flag: "--member" })?,
            kind,
            edits,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn connect(db_url: &str) -> Result<AppServices, Box<dyn std::error::Error>> {
    if ApiConfig::from_env()?.is_none() {
        prepare_sqlite_file(db_url)?;
    }
    Ok(AppServices::from_env(db_url, Clock::default()).await?)
}

fn print_schema(kind: QuestionnaireKind) -> Result<(), Box<dyn std::error::Error>> {
    let questionnaire = kind.questionnaire()?;
    let schema = questionnaire.schema();
    println!("{} ({kind})", questionnaire.title());
    println!(
        "{} sections, {} tracked fields",
        schema.len(),
        schema.total_fields()
    );
    for (index, section) in schema.sections().iter().enumerate() {
        println!();
        println!("[{index}] {} (id {})", section.title(), section.id());
        if !section.description().is_empty() {
            println!("    {}", section.description());
        }
        for path in section.field_paths() {
            println!("    - {path}");
        }
    }
    Ok(())
}

fn print_progress(session: &FormSession, report: &ProgressReport) {
    let schema = session.questionnaire().schema();
    println!("{}: {}% complete", session.questionnaire().title(), report.overall);
    for (section, percent) in schema.sections().iter().zip(report.sections.as_slice()) {
        println!("  {percent:>3}%  {}", section.title());
    }
    match session.last_saved_at() {
        Some(at) => println!("last saved {}", at.to_rfc3339()),
        None => println!("not saved yet"),
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(Some(command)) => command,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            return Err(e.into());
        }
    };
    debug!(?command, "parsed command");

    match command {
        Command::Schema { kind } => print_schema(kind),
        Command::Status {
            db_url,
            assignment_id,
            kind,
        } => {
            let services = connect(&db_url).await?;
            // Status only reads; the document id is never sent anywhere.
            let assignment = Assignment::new(assignment_id, DocumentId::new(0), kind);
            let session = services.open_form(assignment, MemberId::new(0)).await?;
            print_progress(&session, &session.progress()?);
            Ok(())
        }
        Command::Set {
            db_url,
            assignment_id,
            document_id,
            member_id,
            kind,
            edits,
        } => {
            let services = connect(&db_url).await?;
            let assignment = Assignment::new(assignment_id, document_id, kind);
            let session = services.open_form(assignment, member_id).await?;
            for edit in edits {
                session.set_field(&edit.path, edit.value)?;
            }
            session.close();
            session.save_now().await?;
            print_progress(&session, &session.progress()?);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
