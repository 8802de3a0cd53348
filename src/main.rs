//! Purpose: `mpk-corpus` CLI entry point.
//! Role: Binary crate root; parses args, runs `check` or `generate`, reports on stdout.
//! Invariants: `check` prints `Reading: <path>` per attempted file and
//!   `File: <path> had error: <description>` per decode failure.
//! Invariants: Decode failures never change the exit code; fatal errors map via `to_exit_code`.
//! Invariants: Fatal errors go to stderr as text on a TTY and as JSON otherwise.
//! Invariants: Log output goes to stderr so stdout stays a clean report.
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use mpk_corpus::api::{
    CheckEvent, Error, ErrorKind, GenerateReport, GenerateStatus, check_corpus,
    default_corpus_dir, generate_corpus, to_exit_code,
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                return Ok(RunOutcome::with_code(0));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Try `mpk-corpus --help`."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    init_tracing();

    let corpus_dir = cli.dir.unwrap_or_else(default_corpus_dir);
    let color_mode = cli.color;

    let result = match cli.command.unwrap_or(Command::Check { json: false }) {
        Command::Check { json } => run_check(corpus_dir, json),
        Command::Generate => run_generate(corpus_dir),
    };

    result
        .map_err(add_corrupt_hint)
        .map_err(add_io_hint)
        .map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "mpk-corpus",
    version,
    about = "Validate MessagePack fixtures in an example corpus",
    long_about = r#"Decode every non-JSON file in a corpus directory as one MessagePack value.

Files ending in .json are skipped. Files that fail to decode are reported and the
run continues; a file that cannot be read ends the run with a non-zero exit code."#,
    after_help = r#"EXAMPLES
  $ mpk-corpus                          # check ./example-data
  $ mpk-corpus --dir tests/data check   # check another directory
  $ mpk-corpus check --json             # one JSON summary on stdout
  $ mpk-corpus generate                 # rebuild <name>.mpk from <name>.json

NOTES
  - Default directory: $MPK_CORPUS_DIR, else ./example-data
  - Log verbosity: RUST_LOG=debug"#
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "Corpus directory (default: $MPK_CORPUS_DIR or ./example-data)",
        value_hint = ValueHint::DirPath
    )]
    dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Decode every binary fixture and report failures (default)",
        after_help = r#"OUTPUT
  Reading: <path>
  File: <path> had error: <description>"#
    )]
    Check {
        #[arg(long, help = "Print one JSON summary instead of per-file lines")]
        json: bool,
    },
    #[command(about = "Regenerate <name>.mpk from each <name>.json in the corpus")]
    Generate,
}

fn run_check(dir: PathBuf, json: bool) -> Result<RunOutcome, Error> {
    let outcome = check_corpus(&dir, |event| {
        if json {
            return;
        }
        match event {
            CheckEvent::Reading { path } => println!("Reading: {}", path.display()),
            CheckEvent::Failed { path, failure } => {
                println!("File: {} had error: {failure}", path.display())
            }
        }
    })?;

    if json {
        let mut value = serde_json::to_value(&outcome).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("failed to encode check summary")
                .with_source(err)
        })?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("dir".to_string(), json!(dir.display().to_string()));
        }
        println!("{value}");
    }
    Ok(RunOutcome::ok())
}

fn run_generate(dir: PathBuf) -> Result<RunOutcome, Error> {
    generate_corpus(&dir, emit_generate_report)?;
    Ok(RunOutcome::ok())
}

fn emit_generate_report(report: &GenerateReport) {
    println!("File: {}", report.mpk_path.display());
    match &report.status {
        GenerateStatus::Created => println!("File newly created!"),
        GenerateStatus::Unchanged => println!("File is ok & did not get updated"),
        GenerateStatus::Updated {
            old_len,
            new_len,
            n_diff,
        } => println!(
            "File content updated (& checks passed)! New len: {new_len}, Old len: {old_len}, n_diff: {n_diff}"
        ),
        GenerateStatus::Undecodable { message } => {
            println!("Warning, failed to deserialize with error: {message}")
        }
    }
    println!("===");
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::NotFound => err.with_hint(
            "Path does not exist. Pass --dir or set MPK_CORPUS_DIR to the corpus directory.",
        ),
        ErrorKind::Permission => {
            err.with_hint("Permission denied. Check file and directory permissions.")
        }
        ErrorKind::Io => err.with_hint(
            "I/O error. Every non-.json entry must be a readable file; check the path.",
        ),
        _ => err,
    }
}

fn add_corrupt_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Corrupt || err.hint().is_some() {
        return err;
    }
    err.with_hint("Fix the JSON fixture and rerun `mpk-corpus generate`.")
}

/// Stderr shape of a fatal error when stderr is not a terminal.
#[derive(Serialize)]
struct ErrorBody<'a> {
    kind: String,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hint: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    causes: Vec<String>,
}

impl<'a> ErrorBody<'a> {
    fn from_error(err: &'a Error) -> Self {
        Self {
            kind: format!("{:?}", err.kind()),
            message: err.summary(),
            hint: err.hint(),
            path: err.path().map(|path| path.display().to_string()),
            causes: err.causes(),
        }
    }
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }
    eprintln!("{}", error_json(err));
}

fn error_json(err: &Error) -> Value {
    json!({ "error": ErrorBody::from_error(err) })
}

fn error_text(err: &Error, use_color: bool) -> String {
    // Red for the headline, yellow for detail labels.
    let paint = |label: &str, code: &str| {
        if use_color {
            format!("\u{1b}[{code}m{label}\u{1b}[0m")
        } else {
            label.to_string()
        }
    };

    let body = ErrorBody::from_error(err);
    let mut lines = vec![format!("{} {}", paint("error:", "31"), body.message)];
    let details = [
        ("hint:", body.hint.map(str::to_string)),
        ("path:", body.path),
        ("caused by:", body.causes.into_iter().next()),
    ];
    for (label, value) in details {
        if let Some(value) = value {
            lines.push(format!("{} {value}", paint(label, "33")));
        }
    }
    lines.join("\n")
}

/// First meaningful line of a clap error, without its `error:` prefix.
fn clap_error_summary(err: &clap::Error) -> String {
    err.to_string()
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.strip_prefix("error:").unwrap_or(line).trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}
