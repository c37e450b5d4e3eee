//! Multi-format sequence file parser.
//!
//! Supports content-based detection for:
//! - GenBank flat files (any line starting with `LOCUS`)
//! - FASTA (any line starting with `>`)
//!
//! GenBank is checked first, so a GenBank file quoting a FASTA header is
//! still read as GenBank. A format can also be forced, bypassing detection.
//!
//! The parsers themselves never fail. [`parse`] still guards them and turns
//! an unexpected panic into [`ParseOutcome::ParseFailed`].

pub mod fasta;
pub mod genbank;

use std::ffi::OsStr;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use log::{debug, error, warn};
use thiserror::Error;

use crate::model::{FastaRecord, GenBankDocument};
use fasta::parse_fasta;
use genbank::{parse_genbank_with_layout, FeatureLayout};

/// Detected file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Fasta,
    GenBank,
    Unknown,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Fasta => write!(f, "FASTA"),
            Format::GenBank => write!(f, "GenBank"),
            Format::Unknown => write!(f, "unknown"),
        }
    }
}

/// Errors reported to callers of the file-level API.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read {}: {source}", .path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine file format (expected a LOCUS line for GenBank or a '>' header for FASTA)")]
    DetectionFailed,

    #[error("Parser failed: {0}")]
    ParseFailed(String),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result of parsing a piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    Fasta(Vec<FastaRecord>),
    GenBank(GenBankDocument),
    /// The text matched neither format.
    DetectionFailed,
    /// A parser failed unexpectedly; carries the cause.
    ParseFailed(String),
}

/// Successfully parsed data, for callers that prefer `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedData {
    Fasta(Vec<FastaRecord>),
    GenBank(GenBankDocument),
}

impl ParseOutcome {
    /// The format that was parsed, or `Unknown` for failures.
    pub fn format(&self) -> Format {
        match self {
            ParseOutcome::Fasta(_) => Format::Fasta,
            ParseOutcome::GenBank(_) => Format::GenBank,
            ParseOutcome::DetectionFailed | ParseOutcome::ParseFailed(_) => Format::Unknown,
        }
    }

    /// Converts the outcome into a `Result`, keeping the failure kind.
    pub fn into_result(self) -> ParseResult<ParsedData> {
        match self {
            ParseOutcome::Fasta(records) => Ok(ParsedData::Fasta(records)),
            ParseOutcome::GenBank(document) => Ok(ParsedData::GenBank(document)),
            ParseOutcome::DetectionFailed => Err(ParseError::DetectionFailed),
            ParseOutcome::ParseFailed(reason) => Err(ParseError::ParseFailed(reason)),
        }
    }
}

/// Options controlling detection and parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Skip detection and parse as this format
    pub format: Option<Format>,
    /// Column layout of GenBank feature tables
    pub layout: FeatureLayout,
}

/// Detects the format by examining the content.
pub fn detect_format(content: &str) -> Format {
    if content.lines().any(|line| line.starts_with("LOCUS")) {
        return Format::GenBank;
    }
    if content.trim().lines().any(|line| line.starts_with('>')) {
        return Format::Fasta;
    }
    Format::Unknown
}

/// Guesses the format from a file extension.
pub fn format_from_extension<P: AsRef<Path>>(path: P) -> Option<Format> {
    let ext = path.as_ref().extension().and_then(OsStr::to_str)?;
    match ext.to_lowercase().as_str() {
        "fa" | "fas" | "fasta" | "fna" | "faa" | "ffn" | "frn" => Some(Format::Fasta),
        "gb" | "gbk" | "gbff" | "genbank" => Some(Format::GenBank),
        _ => None,
    }
}

/// Parses text, detecting the format from its content.
pub fn parse(content: &str) -> ParseOutcome {
    parse_with_options(content, &ParseOptions::default())
}

/// Parses text with explicit options.
pub fn parse_with_options(content: &str, options: &ParseOptions) -> ParseOutcome {
    let format = options.format.unwrap_or_else(|| detect_format(content));
    debug!("Parsing {} bytes as {}", content.len(), format);

    match format {
        Format::Fasta => {
            guarded(|| parse_fasta(content)).map_or_else(ParseOutcome::ParseFailed, ParseOutcome::Fasta)
        }
        Format::GenBank => guarded(|| parse_genbank_with_layout(content, &options.layout))
            .map_or_else(ParseOutcome::ParseFailed, ParseOutcome::GenBank),
        Format::Unknown => ParseOutcome::DetectionFailed,
    }
}

/// Runs a parser, converting a panic into its message.
fn guarded<T>(parser: impl FnOnce() -> T) -> Result<T, String> {
    panic::catch_unwind(AssertUnwindSafe(parser)).map_err(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown parser failure".to_string());
        error!("Parser failed: {}", reason);
        reason
    })
}

/// Reads a sequence file as UTF-8 text.
pub fn read_sequence_file<P: AsRef<Path>>(path: P) -> ParseResult<String> {
    let path = path.as_ref();
    let read_failed = |source: std::io::Error| ParseError::ReadFailed {
        path: path.to_path_buf(),
        source,
    };

    let bytes = std::fs::read(path).map_err(read_failed)?;
    String::from_utf8(bytes)
        .map_err(|e| read_failed(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Reads and parses a sequence file.
///
/// The file extension is only used to warn when it disagrees with the
/// detected content.
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: &ParseOptions) -> ParseResult<ParsedData> {
    let path = path.as_ref();
    let content = read_sequence_file(path)?;

    let outcome = parse_with_options(&content, options);
    if options.format.is_none() {
        if let Some(expected) = format_from_extension(path) {
            let found = outcome.format();
            if found != Format::Unknown && found != expected {
                warn!(
                    "{} has a {} extension but looks like {}",
                    path.display(),
                    expected,
                    found
                );
            }
        }
    }
    outcome.into_result()
}

/// Reads and parses a sequence file, detecting the format from its content.
pub fn parse_file<P: AsRef<Path>>(path: P) -> ParseResult<ParsedData> {
    parse_file_with_options(path, &ParseOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_fasta() {
        assert_eq!(detect_format(">seq1\nACGT\n"), Format::Fasta);
        assert_eq!(detect_format("\n\n  \n>seq1\nACGT\n"), Format::Fasta);
        assert_eq!(detect_format("   >seq1\nACGT\n"), Format::Fasta);
        assert_eq!(detect_format("notes\n>seq1\nACGT\n"), Format::Fasta);
    }

    #[test]
    fn test_detect_genbank() {
        assert_eq!(detect_format("LOCUS       NC_001  100 bp\n//\n"), Format::GenBank);
    }

    #[test]
    fn test_genbank_wins_over_fasta() {
        let content = ">not really fasta\nLOCUS   NC_001 ...\n";
        assert_eq!(detect_format(content), Format::GenBank);
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_format("This is not a valid sequence file\n"), Format::Unknown);
        assert_eq!(detect_format(""), Format::Unknown);
        // LOCUS must start the line
        assert_eq!(detect_format("  LOCUS x\n"), Format::Unknown);
        assert_eq!(detect_format("seq\n  >indented\n"), Format::Unknown);
    }

    #[test]
    fn test_detect_from_extension() {
        assert_eq!(format_from_extension("test.fa"), Some(Format::Fasta));
        assert_eq!(format_from_extension("test.FASTA"), Some(Format::Fasta));
        assert_eq!(format_from_extension("test.faa"), Some(Format::Fasta));
        assert_eq!(format_from_extension("test.gb"), Some(Format::GenBank));
        assert_eq!(format_from_extension("test.gbk"), Some(Format::GenBank));
        assert_eq!(format_from_extension("test.genbank"), Some(Format::GenBank));
        assert_eq!(format_from_extension("test.txt"), None);
        assert_eq!(format_from_extension("test"), None);
    }

    #[test]
    fn test_parse_dispatch() {
        match parse(">seq1\nACGT\nACGT\n>seq2\nTTTT\n") {
            ParseOutcome::Fasta(records) => {
                assert_eq!(records.len(), 2);
                assert_eq!(records[0].sequence(), "ACGTACGT");
            }
            other => panic!("expected FASTA, got {:?}", other),
        }

        match parse("LOCUS       TEST\nFEATURES             Location/Qualifiers\n     gene            1..10\n") {
            ParseOutcome::GenBank(doc) => {
                assert_eq!(doc.locus.as_deref(), Some("LOCUS       TEST"));
                assert_eq!(doc.features.len(), 1);
            }
            other => panic!("expected GenBank, got {:?}", other),
        }

        assert_eq!(parse("hello"), ParseOutcome::DetectionFailed);
    }

    #[test]
    fn test_indented_fasta_header_keeps_record() {
        let content = "   >seq1\nACGT\n";
        assert_eq!(detect_format(content), Format::Fasta);

        match parse(content) {
            ParseOutcome::Fasta(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].header(), "seq1");
                assert_eq!(records[0].len(), 4);
            }
            other => panic!("expected FASTA, got {:?}", other),
        }
    }

    #[test]
    fn test_forced_format() {
        let options = ParseOptions {
            format: Some(Format::Fasta),
            ..Default::default()
        };
        // Forced FASTA on text without headers yields no records, not an error
        assert_eq!(parse_with_options("hello", &options), ParseOutcome::Fasta(Vec::new()));

        let options = ParseOptions {
            format: Some(Format::GenBank),
            ..Default::default()
        };
        assert_eq!(
            parse_with_options(">seq1\nACGT\n", &options),
            ParseOutcome::GenBank(GenBankDocument::default())
        );

        let options = ParseOptions {
            format: Some(Format::Unknown),
            ..Default::default()
        };
        assert_eq!(parse_with_options(">seq1\nACGT\n", &options), ParseOutcome::DetectionFailed);
    }

    #[test]
    fn test_guarded_reports_panic_message() {
        let result: Result<(), String> = guarded(|| panic!("boom at line {}", 3));
        assert_eq!(result, Err("boom at line 3".to_string()));

        let result: Result<(), String> = guarded(|| panic!("static message"));
        assert_eq!(result, Err("static message".to_string()));

        assert_eq!(guarded(|| 42), Ok(42));
    }

    #[test]
    fn test_into_result_keeps_kind() {
        assert!(matches!(
            ParseOutcome::DetectionFailed.into_result(),
            Err(ParseError::DetectionFailed)
        ));
        assert!(matches!(
            ParseOutcome::ParseFailed("x".into()).into_result(),
            Err(ParseError::ParseFailed(reason)) if reason == "x"
        ));
        assert!(matches!(
            ParseOutcome::Fasta(Vec::new()).into_result(),
            Ok(ParsedData::Fasta(records)) if records.is_empty()
        ));
        assert_eq!(ParseOutcome::GenBank(GenBankDocument::default()).format(), Format::GenBank);
        assert_eq!(ParseOutcome::DetectionFailed.format(), Format::Unknown);
    }
}
