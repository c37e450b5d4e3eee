//! seqparse - FASTA and GenBank summary tool
//!
//! ## Usage
//!
//! ```bash
//! seqparse <sequence_file>
//! seqparse -f genbank <sequence_file>  # Force format
//! seqparse -v <sequence_file>          # Debug logging
//! ```
//!
//! ## Supported Formats
//!
//! - FASTA (.fasta, .fa, .fna, .faa, .fas)
//! - GenBank (.gb, .gbk, .gbff, .genbank): LOCUS line and FEATURES table

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};

use seqparse::formats::genbank::{FeatureLayout, FEATURE_INDENT, QUALIFIER_INDENT};
use seqparse::formats::{parse_file_with_options, Format, ParseError, ParseOptions, ParsedData};
use seqparse::model::{FastaRecord, GenBankDocument};

/// File format specification for command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// FASTA format
    Fasta,
    /// GenBank flat file
    Genbank,
    /// Auto-detect from content
    Auto,
}

impl From<FormatArg> for Option<Format> {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Fasta => Some(Format::Fasta),
            FormatArg::Genbank => Some(Format::GenBank),
            FormatArg::Auto => None,
        }
    }
}

/// seqparse - Summarise FASTA records or GenBank feature tables
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Sequence file to read (FASTA or GenBank)
    file: PathBuf,

    /// Force a specific file format (overrides auto-detection)
    #[arg(short = 'f', long = "format", value_enum, default_value = "auto")]
    format: FormatArg,

    /// Indentation of feature keys in the GenBank FEATURES table
    #[arg(long = "feature-indent", default_value_t = FEATURE_INDENT)]
    feature_indent: usize,

    /// Indentation of qualifiers in the GenBank FEATURES table
    #[arg(long = "qualifier-indent", default_value_t = QUALIFIER_INDENT)]
    qualifier_indent: usize,

    /// Wrap width for qualifier values
    #[arg(short = 'w', long = "width", default_value_t = 80)]
    width: usize,

    /// Print debug logs (RUST_LOG also works)
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

impl Args {
    fn parse_options(&self) -> Result<ParseOptions> {
        let layout = FeatureLayout {
            feature_indent: self.feature_indent,
            qualifier_indent: self.qualifier_indent,
        };
        if !layout.is_usable() {
            anyhow::bail!(
                "Invalid feature table layout: --feature-indent ({}) must be at least 1 and less than --qualifier-indent ({})",
                layout.feature_indent,
                layout.qualifier_indent
            );
        }
        Ok(ParseOptions {
            format: self.format.into(),
            layout,
        })
    }
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    } else if std::env::var_os("RUST_LOG").is_none() {
        builder.filter_level(LevelFilter::Warn);
    }
    builder.format_timestamp(None).init();
}

/// Writes one line per record: header and length.
fn write_fasta(out: &mut impl Write, records: &[FastaRecord]) -> io::Result<()> {
    for record in records {
        writeln!(out, ">{}\t{}", record.header(), record.len())?;
    }
    writeln!(out, "{} record(s)", records.len())
}

/// Writes the LOCUS line and every feature with its qualifiers.
fn write_genbank(out: &mut impl Write, doc: &GenBankDocument, width: usize) -> io::Result<()> {
    match &doc.locus {
        Some(locus) => writeln!(out, "{}", locus)?,
        None => writeln!(out, "LOCUS: (none)")?,
    }

    let indent = "    ";
    let options = textwrap::Options::new(width.max(indent.len() + 1))
        .initial_indent(indent)
        .subsequent_indent("      ");
    for feature in &doc.features {
        writeln!(out, "{}\t{}", feature.key, feature.location)?;
        for (key, value) in feature.qualifiers.iter() {
            let text = if value.is_flag() {
                format!("/{}", key)
            } else {
                format!("/{}={}", key, value)
            };
            for line in textwrap::wrap(&text, &options) {
                writeln!(out, "{}", line)?;
            }
        }
    }
    writeln!(out, "{} feature(s)", doc.feature_count())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let options = args.parse_options()?;
    let parsed = match parse_file_with_options(&args.file, &options) {
        Ok(parsed) => parsed,
        Err(e @ ParseError::ReadFailed { .. }) => return Err(e).context("Could not read input"),
        Err(ParseError::DetectionFailed) => anyhow::bail!(
            "{}: unrecognised format. Use -f fasta or -f genbank to force one.",
            args.file.display()
        ),
        Err(ParseError::ParseFailed(reason)) => {
            anyhow::bail!("{}: parsing failed unexpectedly: {}", args.file.display(), reason)
        }
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match &parsed {
        ParsedData::Fasta(records) => {
            info!("Read {} FASTA record(s)", records.len());
            write_fasta(&mut handle, records)?;
        }
        ParsedData::GenBank(doc) => {
            info!("Read {} GenBank feature(s)", doc.feature_count());
            write_genbank(&mut handle, doc, args.width)?;
        }
    }

    Ok(())
}
