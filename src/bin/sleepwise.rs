//! Sleepwise CLI - Command-line interface for the Sleepwise engine
//!
//! Commands:
//! - encode: Encode questionnaire forms into predictor feature vectors
//! - interpret: Explain a score for one form
//! - submit: Encode, store, score and interpret one form
//! - validate: Strictly validate questionnaire forms
//! - register / login / logout: Manage accounts and session tokens
//! - history / show: Re-read stored submissions
//! - doctor: Diagnose configuration and data files

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use sleepwise::accounts::AccountStore;
use sleepwise::config::{Settings, DEFAULT_LOG_FILTER, ENV_DATA_DIR, ENV_PREDICTOR_URL};
use sleepwise::features::FeatureDeriver;
use sleepwise::interpret::interpret;
use sleepwise::pipeline;
use sleepwise::schema::{SubmissionAdapter, SubmissionForm, SCHEMA_VERSION};
use sleepwise::session::SessionContext;
use sleepwise::store::MemoryStore;
use sleepwise::{
    FeatureEncoder, FixedPredictor, HttpPredictor, Predictor, SleepwiseError, SleepwiseProcessor,
    SLEEPWISE_VERSION,
};

/// Sleepwise - Sleep-quality feature encoding and interpretation
#[derive(Parser)]
#[command(name = "sleepwise")]
#[command(version = SLEEPWISE_VERSION)]
#[command(about = "Encode sleep questionnaires and interpret sleep-quality scores", long_about = None)]
struct Cli {
    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    /// Directory holding submission and account snapshots
    #[arg(long, global = true, env = ENV_DATA_DIR)]
    data_dir: Option<PathBuf>,

    /// Base URL of the prediction service
    #[arg(long, global = true, env = ENV_PREDICTOR_URL)]
    predictor_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode forms into feature vectors
    Encode {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        /// Include the engineered model columns
        #[arg(long)]
        model_row: bool,
    },

    /// Interpret a score against one form
    Interpret {
        /// Form file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Predicted score; omit to report an uninterpretable score
        #[arg(long, allow_negative_numbers = true)]
        score: Option<f64>,
    },

    /// Encode, store, score and interpret one form
    Submit {
        /// Form file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Use this score instead of calling the prediction service
        #[arg(long)]
        fixed_score: Option<f64>,

        /// Session token from `login`; attaches the submission to its account
        #[arg(long)]
        token: Option<String>,
    },

    /// Strictly validate forms
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Register an account
    Register {
        #[arg(long)]
        email: String,

        /// Handle stored with each submission
        #[arg(long)]
        user_id: String,

        #[arg(long)]
        password: String,
    },

    /// Check credentials and print a session token
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// Revoke a session token
    Logout {
        #[arg(long)]
        token: String,
    },

    /// List a user's submissions with their interpretations
    History {
        #[arg(long, required_unless_present = "token", conflicts_with = "token")]
        user_id: Option<String>,

        /// List the submissions of the account behind this session token
        #[arg(long)]
        token: Option<String>,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,
    },

    /// Re-interpret one stored submission
    Show {
        /// Submission id
        id: Uuid,
    },

    /// Diagnose configuration and data files
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one form per line)
    Ndjson,
    /// A single form or a JSON array of forms
    Json,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(dir) = cli.data_dir.clone() {
        settings.data_dir = dir;
    }
    if let Some(url) = cli.predictor_url.clone() {
        settings.predictor.base_url = url;
    }
    init_tracing(&settings.log_filter, cli.log_json);

    match run(cli.command, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(filter: &str, json: bool) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run(command: Commands, settings: &Settings) -> Result<(), SleepwiseCliError> {
    match command {
        Commands::Encode {
            input,
            input_format,
            output_format,
            model_row,
        } => cmd_encode(&input, input_format, output_format, model_row),

        Commands::Interpret { input, score } => cmd_interpret(&input, score),

        Commands::Submit {
            input,
            fixed_score,
            token,
        } => cmd_submit(settings, &input, fixed_score, token.as_deref()),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format, json),

        Commands::Register {
            email,
            user_id,
            password,
        } => cmd_register(settings, &email, &user_id, &password),

        Commands::Login { email, password } => cmd_login(settings, &email, &password),

        Commands::Logout { token } => cmd_logout(settings, &token),

        Commands::History {
            user_id,
            token,
            output_format,
        } => cmd_history(settings, user_id, token.as_deref(), output_format),

        Commands::Show { id } => cmd_show(settings, id),

        Commands::Doctor { json } => cmd_doctor(settings, json),
    }
}

fn cmd_encode(
    input: &Path,
    input_format: InputFormat,
    output_format: OutputFormat,
    model_row: bool,
) -> Result<(), SleepwiseCliError> {
    let forms = read_forms(input, input_format)?;
    if forms.is_empty() {
        return Err(SleepwiseCliError::NoSubmissions);
    }

    let encoder = FeatureEncoder::new();
    let vectors = forms
        .iter()
        .map(|form| encoder.encode(&form.to_raw()))
        .collect::<Result<Vec<_>, _>>()?;

    let output = if model_row {
        let rows: Vec<_> = vectors.into_iter().map(FeatureDeriver::model_row).collect();
        format_output(&rows, &output_format)?
    } else {
        format_output(&vectors, &output_format)?
    };
    print!("{}", output);
    Ok(())
}

fn cmd_interpret(input: &Path, score: Option<f64>) -> Result<(), SleepwiseCliError> {
    let form = SubmissionAdapter::parse_form(&read_input(input)?)?;
    let interpretation = interpret(score, Some(&form.to_raw()));
    println!("{}", serde_json::to_string_pretty(&interpretation)?);
    Ok(())
}

fn cmd_submit(
    settings: &Settings,
    input: &Path,
    fixed_score: Option<f64>,
    token: Option<&str>,
) -> Result<(), SleepwiseCliError> {
    let form = SubmissionAdapter::parse_form(&read_input(input)?)?;

    let mut session = SessionContext::default();
    if let Some(token) = token {
        let accounts = load_accounts(settings)?;
        session.resume(&accounts, token)?;
    }

    let store = load_store(settings)?;
    let predictor = build_predictor(settings, fixed_score)?;
    let processor = SleepwiseProcessor::new(&store, predictor.as_ref());

    // The submission is kept even when scoring fails.
    let outcome = if session.is_signed_in() {
        processor.submit_as(&session, &form)
    } else {
        processor.submit(&form)
    };
    save_store(settings, &store)?;

    println!("{}", serde_json::to_string_pretty(&outcome?)?);
    Ok(())
}

fn cmd_validate(
    input: &Path,
    input_format: InputFormat,
    json: bool,
) -> Result<(), SleepwiseCliError> {
    let forms = read_forms(input, input_format)?;
    let results = SubmissionAdapter::validate_forms(&forms);

    let report = ValidationReport {
        schema_version: SCHEMA_VERSION.to_string(),
        total_submissions: forms.len(),
        valid_submissions: forms.len() - results.len(),
        invalid_submissions: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                user_id: r.user_id.clone(),
                issues: r.issues.iter().map(|i| i.to_string()).collect(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report ({})", report.schema_version);
        println!("=================");
        println!("Total submissions:   {}", report.total_submissions);
        println!("Valid submissions:   {}", report.valid_submissions);
        println!("Invalid submissions: {}", report.invalid_submissions);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Submission {} (index {}):",
                    err.user_id.as_deref().unwrap_or("anonymous"),
                    err.index
                );
                for issue in &err.issues {
                    println!("      {}", issue);
                }
            }
        }
    }

    if report.invalid_submissions > 0 {
        Err(SleepwiseCliError::ValidationFailed(report.invalid_submissions))
    } else {
        Ok(())
    }
}

fn cmd_register(
    settings: &Settings,
    email: &str,
    user_id: &str,
    password: &str,
) -> Result<(), SleepwiseCliError> {
    let accounts = load_accounts(settings)?;
    let summary = accounts.register(email, user_id, password)?;
    write_snapshot(&settings.accounts_path(), &accounts.save_accounts()?)?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_login(settings: &Settings, email: &str, password: &str) -> Result<(), SleepwiseCliError> {
    let accounts = load_accounts(settings)?;
    let session = accounts.login(email, password)?;
    write_snapshot(&settings.accounts_path(), &accounts.save_accounts()?)?;

    println!("{}", serde_json::to_string_pretty(&session)?);
    Ok(())
}

fn cmd_logout(settings: &Settings, token: &str) -> Result<(), SleepwiseCliError> {
    let accounts = load_accounts(settings)?;
    accounts.logout(token)?;
    write_snapshot(&settings.accounts_path(), &accounts.save_accounts()?)?;
    Ok(())
}

fn cmd_history(
    settings: &Settings,
    user_id: Option<String>,
    token: Option<&str>,
    output_format: OutputFormat,
) -> Result<(), SleepwiseCliError> {
    let user_id = match (user_id, token) {
        (Some(user_id), _) => user_id,
        (None, Some(token)) => load_accounts(settings)?.authenticate(token)?.user_id,
        (None, None) => return Err(SleepwiseError::SessionExpired.into()),
    };

    let store = load_store(settings)?;
    let entries: Vec<HistoryEntry> = pipeline::history(&store, &user_id)?
        .into_iter()
        .map(|(record, interpretation)| HistoryEntry {
            id: record.id,
            created_at: record.created_at.to_rfc3339(),
            score: record.prediction,
            message: interpretation.message,
            recommendations: interpretation.recommendations,
        })
        .collect();

    print!("{}", format_output(&entries, &output_format)?);
    Ok(())
}

fn cmd_show(settings: &Settings, id: Uuid) -> Result<(), SleepwiseCliError> {
    let store = load_store(settings)?;
    let interpretation = pipeline::interpret_stored(&store, id)?;
    println!("{}", serde_json::to_string_pretty(&interpretation)?);
    Ok(())
}

fn cmd_doctor(settings: &Settings, json: bool) -> Result<(), SleepwiseCliError> {
    let mut checks: Vec<DoctorCheck> = vec![
        DoctorCheck {
            name: "version".to_string(),
            status: CheckStatus::Ok,
            message: format!("Sleepwise version {}", SLEEPWISE_VERSION),
        },
        DoctorCheck {
            name: "schema_version".to_string(),
            status: CheckStatus::Ok,
            message: format!("Input schema: {}", SCHEMA_VERSION),
        },
        DoctorCheck {
            name: "predictor".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "{} (timeout {}s)",
                settings.predictor.predict_url(),
                settings.predictor.timeout.as_secs()
            ),
        },
    ];

    checks.push(check_snapshot("submissions", &settings.submissions_path(), |json| {
        let store = MemoryStore::from_json(json).map_err(|e| e.to_string())?;
        let count = store.len().map_err(|e| e.to_string())?;
        Ok(format!("{} submissions", count))
    }));
    checks.push(check_snapshot("accounts", &settings.accounts_path(), |json| {
        let snapshot: serde_json::Value = serde_json::from_str(json).map_err(|e| e.to_string())?;
        let count = |key: &str| snapshot.get(key).and_then(|v| v.as_array()).map(Vec::len);
        match count("accounts") {
            Some(accounts) => Ok(format!(
                "{} accounts, {} live sessions",
                accounts,
                count("sessions").unwrap_or(0)
            )),
            None => Err("missing \"accounts\" array".to_string()),
        }
    }));

    checks.push(DoctorCheck {
        name: "stdin".to_string(),
        status: CheckStatus::Ok,
        message: if atty::is(atty::Stream::Stdin) {
            "stdin is a TTY (pass forms with --input)".to_string()
        } else {
            "stdin is a pipe (forms can be piped in)".to_string()
        },
    });

    let report = DoctorReport {
        version: SLEEPWISE_VERSION.to_string(),
        data_dir: settings.data_dir.display().to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Sleepwise Doctor Report");
        println!("=======================");
        println!("Version:  {}", report.version);
        println!("Data dir: {}", report.data_dir);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    if report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error)) {
        Err(SleepwiseCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn check_snapshot<F>(name: &str, path: &Path, describe: F) -> DoctorCheck
where
    F: Fn(&str) -> Result<String, String>,
{
    let (status, message) = if !path.exists() {
        (
            CheckStatus::Warning,
            format!("{} does not exist yet", path.display()),
        )
    } else {
        match fs::read_to_string(path) {
            Ok(content) => match describe(&content) {
                Ok(summary) => (CheckStatus::Ok, format!("{} ({})", path.display(), summary)),
                Err(e) => (CheckStatus::Error, format!("Invalid snapshot: {}", e)),
            },
            Err(e) => (CheckStatus::Error, format!("Cannot read {}: {}", path.display(), e)),
        }
    };

    DoctorCheck {
        name: name.to_string(),
        status,
        message,
    }
}

fn read_input(input: &Path) -> Result<String, SleepwiseCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_forms(
    input: &Path,
    input_format: InputFormat,
) -> Result<Vec<SubmissionForm>, SleepwiseCliError> {
    let data = read_input(input)?;
    let forms = match input_format {
        InputFormat::Ndjson => SubmissionAdapter::parse_ndjson(&data)?,
        InputFormat::Json if data.trim_start().starts_with('[') => {
            SubmissionAdapter::parse_array(&data)?
        }
        InputFormat::Json => vec![SubmissionAdapter::parse_form(&data)?],
    };
    Ok(forms)
}

fn build_predictor(
    settings: &Settings,
    fixed_score: Option<f64>,
) -> Result<Box<dyn Predictor>, SleepwiseCliError> {
    Ok(match fixed_score {
        Some(score) => Box::new(FixedPredictor::new(score)),
        None => Box::new(HttpPredictor::new(settings.predictor.clone())?),
    })
}

fn load_store(settings: &Settings) -> Result<MemoryStore, SleepwiseCliError> {
    let path = settings.submissions_path();
    if !path.exists() {
        return Ok(MemoryStore::new());
    }
    Ok(MemoryStore::from_json(&fs::read_to_string(path)?)?)
}

fn save_store(settings: &Settings, store: &MemoryStore) -> Result<(), SleepwiseCliError> {
    write_snapshot(&settings.submissions_path(), &store.to_json()?)
}

fn load_accounts(settings: &Settings) -> Result<AccountStore, SleepwiseCliError> {
    let mut accounts = AccountStore::new();
    let path = settings.accounts_path();
    if path.exists() {
        accounts.load_accounts(&fs::read_to_string(path)?)?;
    }
    Ok(accounts)
}

fn write_snapshot(path: &Path, json: &str) -> Result<(), SleepwiseCliError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    tracing::debug!(path = %path.display(), "snapshot written");
    Ok(())
}

fn format_output<T: Serialize>(
    records: &[T],
    format: &OutputFormat,
) -> Result<String, SleepwiseCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for record in records {
                lines.push(serde_json::to_string(record)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(records)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(records)? + "\n"),
    }
}

// Error types

#[derive(Debug)]
enum SleepwiseCliError {
    Io(io::Error),
    Engine(SleepwiseError),
    Json(serde_json::Error),
    NoSubmissions,
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for SleepwiseCliError {
    fn from(e: io::Error) -> Self {
        SleepwiseCliError::Io(e)
    }
}

impl From<SleepwiseError> for SleepwiseCliError {
    fn from(e: SleepwiseError) -> Self {
        SleepwiseCliError::Engine(e)
    }
}

impl From<serde_json::Error> for SleepwiseCliError {
    fn from(e: serde_json::Error) -> Self {
        SleepwiseCliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(code: &str, message: String, hint: &str) -> Self {
        Self {
            code: code.to_string(),
            message,
            hint: Some(hint.to_string()),
        }
    }
}

impl From<SleepwiseCliError> for CliError {
    fn from(e: SleepwiseCliError) -> Self {
        match e {
            SleepwiseCliError::Io(e) => {
                CliError::new("IO_ERROR", e.to_string(), "Check file paths and permissions")
            }
            SleepwiseCliError::Json(e) => {
                CliError::new("JSON_ERROR", e.to_string(), "Check JSON syntax")
            }
            SleepwiseCliError::Engine(e) => engine_error(e),
            SleepwiseCliError::NoSubmissions => CliError::new(
                "NO_SUBMISSIONS",
                "No submissions found in input".to_string(),
                "Ensure input file is not empty",
            ),
            SleepwiseCliError::ValidationFailed(count) => CliError::new(
                "VALIDATION_FAILED",
                format!("{} submissions failed validation", count),
                "Fix validation errors and retry",
            ),
            SleepwiseCliError::DoctorFailed => CliError::new(
                "DOCTOR_FAILED",
                "One or more health checks failed".to_string(),
                "Review the doctor report for details",
            ),
        }
    }
}

fn engine_error(e: SleepwiseError) -> CliError {
    let message = e.to_string();
    match e {
        SleepwiseError::InvalidFeatureValue { .. } => CliError::new(
            "INVALID_FEATURE",
            message,
            "Activity level is Low/Medium/High; dietary habits are Unhealthy/Medium/Healthy",
        ),
        SleepwiseError::ParseError(_) | SleepwiseError::JsonError(_) => CliError::new(
            "PARSE_ERROR",
            message,
            &format!("Ensure input matches {} schema", SCHEMA_VERSION),
        ),
        SleepwiseError::UpstreamUnavailable(_) | SleepwiseError::UpstreamResponse(_) => {
            CliError::new(
                "UPSTREAM_ERROR",
                message,
                "Check --predictor-url or use --fixed-score; the submission was kept",
            )
        }
        SleepwiseError::SubmissionNotFound(_) => {
            CliError::new("NOT_FOUND", message, "Run 'sleepwise history' to list ids")
        }
        SleepwiseError::UserExists
        | SleepwiseError::UserNotFound
        | SleepwiseError::InvalidPassword
        | SleepwiseError::SessionExpired => {
            CliError::new(
                "AUTH_ERROR",
                message,
                "Check email and password, or run 'sleepwise login' for a fresh token",
            )
        }
        SleepwiseError::CredentialError(_) | SleepwiseError::StorageError(_) => {
            CliError::new("STORAGE_ERROR", message, "Run 'sleepwise doctor'")
        }
    }
}

// Report types

#[derive(Serialize)]
struct ValidationReport {
    schema_version: String,
    total_submissions: usize,
    valid_submissions: usize,
    invalid_submissions: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(Serialize)]
struct ValidationErrorDetail {
    index: usize,
    user_id: Option<String>,
    issues: Vec<String>,
}

#[derive(Serialize)]
struct HistoryEntry {
    id: Uuid,
    created_at: String,
    score: Option<f64>,
    message: Option<String>,
    recommendations: Vec<String>,
}

#[derive(Serialize)]
struct DoctorReport {
    version: String,
    data_dir: String,
    checks: Vec<DoctorCheck>,
}

#[derive(Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
