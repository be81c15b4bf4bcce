//! CLI tool to check the syntax of SQL statements.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use sqlcheck_rs::input::{self, InputError};
use sqlcheck_rs::report::{self, ReportError, TokenEntry};
use sqlcheck_rs::{
    BatchReport, DEFAULT_MAX_DEPTH, TrailingTokens, Validator, ValidatorConfig, tokenize,
};

/// Some query was rejected.
const EXIT_INVALID: u8 = 1;
/// Input, output, or usage error.
const EXIT_ERROR: u8 = 2;

/// Check SQL statements against a SELECT/INSERT/UPDATE/DELETE grammar.
#[derive(Parser)]
#[command(name = "sqlcheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Maximum nesting of parenthesized subqueries.
    #[arg(long, env = "SQLCHECK_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH, global = true)]
    max_depth: usize,

    /// Accept statements followed by extra tokens.
    #[arg(long, global = true)]
    allow_trailing: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Text, global = true)]
    format: Format,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate queries given on the command line.
    Check {
        #[arg(required = true)]
        queries: Vec<String>,
    },

    /// Validate queries loaded from files (.json batches or one query per file).
    File {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Print the token stream of a query.
    Tokens { query: String },

    /// Read queries from stdin, one per line, until EOF or `exit`.
    ///
    /// Supports the text and JSON formats.
    Shell,
}

/// Failure that prevents a complete report.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Input(#[from] InputError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

fn render_batch(report: &BatchReport, format: Format) -> Result<String, ReportError> {
    match format {
        Format::Text => Ok(report::batch_text(report)),
        Format::Json => report::batch_json(report),
        Format::Csv => report::batch_csv(report),
    }
}

fn print_batch(
    report: &BatchReport,
    format: Format,
    out: &mut impl Write,
) -> Result<bool, CliError> {
    let rendered = render_batch(report, format)?;
    write!(out, "{rendered}")?;
    if format == Format::Json {
        writeln!(out)?;
    }
    Ok(report.all_valid())
}

fn run_files(
    validator: &Validator,
    paths: &[PathBuf],
    format: Format,
    out: &mut impl Write,
) -> Result<bool, CliError> {
    // load everything up front so a bad path fails before any output
    let batches = paths
        .iter()
        .map(|path| input::load(path).map(|queries| (path, queries)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut all_valid = true;
    for (path, queries) in &batches {
        info!(path = %path.display(), queries = queries.len(), "validating file");
        if format == Format::Text && batches.len() > 1 {
            writeln!(out, "{}:", path.display())?;
        }
        all_valid &= print_batch(&validator.validate_batch(queries), format, out)?;
    }
    Ok(all_valid)
}

fn run_tokens(query: &str, format: Format, out: &mut impl Write) -> Result<bool, CliError> {
    let tokens = match tokenize(query) {
        Ok(tokens) => tokens,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("hint: {}", e.hint());
            return Ok(false);
        }
    };

    if format == Format::Json {
        let entries: Vec<TokenEntry<'_>> = tokens.iter().map(TokenEntry::from).collect();
        let rendered = serde_json::to_string_pretty(&entries).map_err(ReportError::from)?;
        writeln!(out, "{rendered}")?;
    } else {
        write!(out, "{}", report::token_table(&tokens))?;
    }
    Ok(true)
}

fn run_shell(
    validator: &Validator,
    format: Format,
    mut input: impl BufRead,
    out: &mut impl Write,
) -> Result<bool, CliError> {
    let mut all_valid = true;

    loop {
        write!(out, "sql> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("exit") || query.eq_ignore_ascii_case("quit") {
            break;
        }

        let result = validator.validate(query);
        all_valid &= result.is_valid();
        let rendered = match format {
            Format::Json => report::json(&result)?,
            Format::Text | Format::Csv => report::text(query, &result),
        };
        writeln!(out, "{rendered}")?;
    }

    Ok(all_valid)
}

/// Flag combinations clap cannot express on its own.
fn check_usage(cli: &Cli) -> Result<(), clap::Error> {
    if matches!(cli.command, Commands::Shell) && cli.format == Format::Csv {
        return Err(Cli::command().error(
            ErrorKind::ArgumentConflict,
            "`shell` does not support --format csv",
        ));
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = check_usage(&cli) {
        e.exit();
    }
    init_logging(cli.verbose);

    let validator = Validator::new(ValidatorConfig {
        max_depth: cli.max_depth,
        trailing_tokens: if cli.allow_trailing {
            TrailingTokens::Allow
        } else {
            TrailingTokens::Reject
        },
    });
    debug!(config = ?validator.config(), "validator ready");

    let mut out = io::stdout().lock();
    let outcome = match cli.command {
        Commands::Check { queries } => {
            print_batch(&validator.validate_batch(&queries), cli.format, &mut out)
        }
        Commands::File { paths } => run_files(&validator, &paths, cli.format, &mut out),
        Commands::Tokens { query } => run_tokens(&query, cli.format, &mut out),
        Commands::Shell => run_shell(&validator, cli.format, io::stdin().lock(), &mut out),
    };
    let outcome = outcome.and_then(|ok| {
        out.flush()?;
        Ok(ok)
    });

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_INVALID),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
