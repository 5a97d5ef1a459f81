//! pdffill CLI tool
//!
//! A command-line tool for listing and filling PDF form fields.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{ArgAction, CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use pdffill::fill::{fill_form, Destination, FillOptions};

/// Environment variable holding the log filter, e.g. `PDFFILL_LOG=debug`
const LOG_ENV: &str = "PDFFILL_LOG";

/// pdffill - PDF form fill utility
#[derive(Parser)]
#[command(name = "pdffill")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "The result is saved to DST, or standard output when DST is '-'.
Nothing is written unless -F or -s is given.

EXAMPLES:
    # List all form fields
    pdffill -l form.pdf

    # Fill two fields
    pdffill -s name=Alice -s ok=yes form.pdf filled.pdf

    # Show every field's name inside the field itself
    pdffill -F form.pdf - > names.pdf")]
struct Cli {
    /// List form fields
    #[arg(short = 'l')]
    list: bool,

    /// Fill form fields with their names
    #[arg(short = 'F')]
    fill_names: bool,

    /// Set form field to value; FIELD is a fully-qualified name or an object id
    #[arg(short = 's', value_name = "FIELD=VALUE", action = ArgAction::Append, allow_hyphen_values = true)]
    set: Vec<String>,

    /// Source PDF file
    #[arg(value_name = "SRC")]
    src: Option<PathBuf>,

    /// Destination file, '-' for standard output
    #[arg(value_name = "DST")]
    dst: Option<String>,
}

fn main() {
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not errors
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            process::exit(code);
        }
    };

    let Some(source) = cli.src else {
        eprint!("{}", Cli::command().render_help());
        process::exit(1);
    };

    let options = FillOptions {
        source,
        destination: cli.dst.as_deref().map(Destination::parse),
        list: cli.list,
        fill_with_names: cli.fill_names,
        assignments: cli.set,
    };

    if let Err(e) = run(&options) {
        tracing::error!("{:#}", e);
        process::exit(1);
    }
}

fn run(options: &FillOptions) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut diagnostics = io::stderr().lock();

    let result = fill_form(options, &mut out, &mut diagnostics);
    out.flush().context("failed to flush standard output")?;

    let report = result.with_context(|| format!("processing {}", options.source.display()))?;
    tracing::debug!(?report, "finished");
    Ok(())
}

/// Log to standard error, silent unless `PDFFILL_LOG` asks otherwise
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
