//! # seqparse - FASTA and GenBank parsing
//!
//! Turns raw sequence-file text into structured records.
//!
//! ## Architecture
//!
//! - `model`: Records produced by the parsers (FASTA records, GenBank
//!   documents, features and qualifiers)
//! - `formats`: Format detection and the parse entry points
//!   - `formats::fasta`: FASTA record splitter
//!   - `formats::genbank`: LOCUS line and FEATURES table parser
//!
//! Parsing is a pure function of the input text. Reading files is kept
//! outside the parsers (`formats::read_sequence_file`), so read failures
//! never reach them.
//!
//! ```
//! use seqparse::formats::{parse, ParseOutcome};
//!
//! let outcome = parse(">seq1\nACGT\n");
//! assert!(matches!(outcome, ParseOutcome::Fasta(ref records) if records.len() == 1));
//! ```

pub mod formats;
pub mod model;
