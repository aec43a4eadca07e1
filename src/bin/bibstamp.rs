//! CLI binary for bibstamp.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `AnnotateConfig` and reports the outcome.

use anyhow::{Context, Result};
use bibstamp::{annotate, resolve_publication, AnnotateConfig};
use clap::Parser;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Annotate a paper with the copyright note derived from its bibtex entry
  bibstamp -b refs.bib -k smith2020 -i accepted.pdf -o out/smith2020.pdf

  # The copyright is held by the authors, not the publisher
  bibstamp -b refs.bib -k smith2020 -c "The Authors" -i accepted.pdf -o out.pdf

  # Check what would be typeset, without compiling anything
  bibstamp -b refs.bib -k smith2020 -i accepted.pdf -o out.pdf --resolve-only

  # Use a custom overlay template
  bibstamp -b refs.bib -k smith2020 -i in.pdf -o out.pdf --template my-overlay.tex

SUPPORTED ENTRY TYPES:
  Type            Publication name taken from
  ─────────────   ───────────────────────────
  inbook          title
  article         journal
  inproceedings   booktitle
  incollection    booktitle

  Any other entry type is rejected. The copyright holder is the -c value if
  given, otherwise the entry's publisher (with known aliases applied, e.g.
  "IEEE Computer Society" → "IEEE").

EXIT STATUS:
  0 on success, 1 on any failure.

ENVIRONMENT VARIABLES:
  BIBSTAMP_COMPILER   Document compiler to invoke (default: latexmk)
  BIBSTAMP_TEMPLATE   Path to a custom overlay template

REQUIREMENTS:
  The document compiler (latexmk with a TeX distribution, by default) must
  be installed and on PATH. The input PDF is staged next to the rendered
  overlay source and included by it, so no other tool touches the PDF."#;

/// Stamp a publication PDF with a copyright cover overlay from BibTeX metadata.
#[derive(Parser, Debug)]
#[command(
    name = "bibstamp",
    version,
    about = "Stamp a publication PDF with a copyright cover overlay from BibTeX metadata",
    long_about = "Look up a bibliography entry, derive the copyright notice (publisher, year, \
venue, DOI), render it into a TeX overlay sized to the input PDF's first page, and compile \
the combined, annotated PDF.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Obtain publication data from FILE.
    #[arg(short = 'b', long = "bibtex", value_name = "FILE")]
    bibtex: PathBuf,

    /// Copyright is held by NAME instead of the publisher.
    #[arg(short = 'c', long = "copyright", value_name = "NAME")]
    copyright: Option<String>,

    /// Read the original PDF from FILE.
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    input: PathBuf,

    /// Use bibtex entry KEY.
    #[arg(short = 'k', long = "key", value_name = "KEY")]
    key: String,

    /// Write the annotated PDF to FILE.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    output: PathBuf,

    /// Document compiler invoked on the rendered overlay source.
    #[arg(long, env = "BIBSTAMP_COMPILER", default_value = bibstamp::DEFAULT_COMPILER, value_name = "PROG")]
    compiler: String,

    /// Path to a custom overlay template (defaults to the built-in one).
    #[arg(long, env = "BIBSTAMP_TEMPLATE", value_name = "FILE")]
    template: Option<PathBuf>,

    /// Print the resolved publication fields and exit without compiling.
    #[arg(long)]
    resolve_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "BIBSTAMP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "BIBSTAMP_QUIET")]
    quiet: bool,
}

fn main() {
    // Every failure exits with status 1 (clap's own argument-error default
    // would be 2); help and version are not failures and exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = i32::from(err.use_stderr());
            let _ = err.print();
            std::process::exit(code);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("ERROR: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let template = match cli.template {
        Some(ref path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read overlay template from {path:?}"))?,
        ),
        None => None,
    };

    let mut builder = AnnotateConfig::builder()
        .bibliography(cli.bibtex.as_path())
        .key(cli.key.as_str())
        .compiler(cli.compiler.as_str());
    if let Some(holder) = cli.copyright.as_deref() {
        builder = builder.copyright_holder(holder);
    }
    if let Some(template) = template {
        builder = builder.template(template);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Resolve-only mode ────────────────────────────────────────────────
    if cli.resolve_only {
        let publication =
            resolve_publication(&cli.bibtex, &cli.key, config.copyright_holder.as_deref())?;
        println!("Key:        {}", publication.key);
        println!("Published:  {}", publication.pubname);
        println!("Year:       {}", publication.year);
        println!("DOI:        {}", publication.doi.as_deref().unwrap_or("-"));
        println!("Copyright:  {}", publication.copyright_holder);
        return Ok(());
    }

    // ── Run the pipeline ─────────────────────────────────────────────────
    let report = annotate(&cli.input, &cli.output, &config).context("Annotation failed")?;

    if !cli.quiet {
        eprintln!(
            "{} {} → {}  {}",
            green("✔"),
            cli.input.display(),
            bold(&report.output.display().to_string()),
            dim(&format!(
                "{}ms compile / {}ms total",
                report.compile_duration_ms, report.total_duration_ms
            )),
        );
    }

    Ok(())
}
