//! FASTA parser.
//!
//! Splits FASTA text into records. Single-line and multi-line sequences are
//! supported, and the parser never fails: unusual input produces fewer or
//! emptier records rather than an error.
//!
//! ## FASTA Format
//!
//! ```text
//! >sequence_identifier optional description
//! ACGTACGTACGT...
//! >another_sequence
//! TGCATGCATGCA...
//! ```

use log::debug;

use crate::model::FastaRecord;

/// Parses FASTA content from a string.
///
/// A new record starts at every line beginning with `>`. Chunks that are
/// empty after trimming are skipped, as is any text before the first `>`
/// line. Leading whitespace before the first header is ignored, so an
/// indented first `>` still starts a record. A header without sequence
/// lines yields an empty record.
///
/// # Examples
///
/// ```
/// use seqparse::formats::fasta::parse_fasta;
///
/// let records = parse_fasta(">seq1\nACGT\nACGT\n>seq2\nTTTT\n");
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[0].sequence(), "ACGTACGT");
/// assert_eq!(records[1].len(), 4);
/// ```
pub fn parse_fasta(content: &str) -> Vec<FastaRecord> {
    let mut records = Vec::new();
    let mut current: Option<Chunk> = None;
    let mut leading_lines = 0;

    for line in content.trim_start().lines() {
        if let Some(header) = line.strip_prefix('>') {
            if let Some(chunk) = current.take() {
                records.extend(chunk.into_record());
            }
            current = Some(Chunk::new(header));
        } else if let Some(chunk) = current.as_mut() {
            chunk.push_line(line);
        } else if !line.trim().is_empty() {
            leading_lines += 1;
        }
    }

    // Don't forget the last record
    if let Some(chunk) = current {
        records.extend(chunk.into_record());
    }

    if leading_lines > 0 {
        debug!("Ignored {} line(s) before the first FASTA header", leading_lines);
    }
    debug!("Parsed {} FASTA record(s)", records.len());
    records
}

/// Text of one `>`-initiated chunk.
struct Chunk<'a> {
    header: &'a str,
    sequence: String,
}

impl<'a> Chunk<'a> {
    fn new(header: &'a str) -> Self {
        Self {
            header,
            sequence: String::new(),
        }
    }

    fn push_line(&mut self, line: &str) {
        // Fast append: most FASTA lines don't have internal whitespace
        if line.chars().all(|c| !c.is_whitespace()) {
            self.sequence.push_str(line);
        } else {
            self.sequence.extend(line.chars().filter(|c| !c.is_whitespace()));
        }
    }

    /// Builds the record, or `None` for a chunk with nothing in it (a bare `>`).
    fn into_record(self) -> Option<FastaRecord> {
        let header = self.header.trim();
        if header.is_empty() && self.sequence.is_empty() {
            return None;
        }
        Some(FastaRecord::new(header, &self.sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_fasta() {
        let records = parse_fasta(">seq1\nACGT\nACGT\n>seq2\nTTTT\n");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].header(), "seq1");
        assert_eq!(records[0].sequence(), "ACGTACGT");
        assert_eq!(records[0].len(), 8);
        assert_eq!(records[1].header(), "seq2");
        assert_eq!(records[1].sequence(), "TTTT");
        assert_eq!(records[1].len(), 4);
    }

    #[test]
    fn test_parse_with_description() {
        let records = parse_fasta(">seq1 This is a description  \nACGT\n");

        assert_eq!(records[0].header(), "seq1 This is a description");
        assert_eq!(records[0].id(), "seq1");
    }

    #[test]
    fn test_whitespace_removed_from_sequence() {
        let records = parse_fasta(">seq1\nAC GT\n\n\tTG CA \r\n");

        assert_eq!(records[0].sequence(), "ACGTTGCA");
        assert_eq!(records[0].len(), 8);
    }

    #[test]
    fn test_empty_sequence_is_kept() {
        let records = parse_fasta(">empty\n>seq2\nAC\n>last");

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].header(), "empty");
        assert_eq!(records[0].sequence(), "");
        assert_eq!(records[0].len(), 0);
        assert_eq!(records[2].header(), "last");
        assert!(records[2].is_empty());
    }

    #[test]
    fn test_bare_delimiters_are_skipped() {
        let records = parse_fasta(">\n>   \n>seq1\nACGT\n>\n");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].header(), "seq1");
    }

    #[test]
    fn test_leading_content_is_ignored() {
        let records = parse_fasta("\n\n  \n>seq1\nACGT\n");
        assert_eq!(records.len(), 1);

        let records = parse_fasta("junk before header\n>seq1\nACGT\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence(), "ACGT");
    }

    #[test]
    fn test_indented_first_header_starts_record() {
        let records = parse_fasta("   >seq1\nACGT\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].header(), "seq1");
        assert_eq!(records[0].sequence(), "ACGT");

        let records = parse_fasta("\n\t >seq1\nAC\n>seq2\nGT\n");
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].sequence(), "GT");
    }

    #[test]
    fn test_headerless_sequence_lines_keep_record() {
        // A '>' with no header text but sequence data still forms a record
        let records = parse_fasta(">\nACGT\n");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].header(), "");
        assert_eq!(records[0].sequence(), "ACGT");
    }

    #[test]
    fn test_case_preserved() {
        let records = parse_fasta(">seq1\nacgt\n");
        assert_eq!(records[0].sequence(), "acgt");
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_fasta("").is_empty());
        assert!(parse_fasta("no headers here\n").is_empty());
    }

    mod prop {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            /// Rewrapping a sequence at any width parses back to the same record
            #[test]
            fn test_fasta_rewrap_roundtrip(
                header in "[A-Za-z0-9_][A-Za-z0-9_ |.]{0,40}",
                seq in "[ACGTN]{0,500}",
                width in 1..120usize,
            ) {
                let mut fasta = format!(">{}\n", header);
                let bytes = seq.as_bytes();
                for line in bytes.chunks(width) {
                    fasta.push_str(std::str::from_utf8(line).unwrap());
                    fasta.push('\n');
                }

                let records = parse_fasta(&fasta);
                prop_assert_eq!(records.len(), 1);
                prop_assert_eq!(records[0].header(), header.trim());
                prop_assert_eq!(records[0].sequence(), seq.as_str());
                prop_assert_eq!(records[0].len(), seq.len());
            }

            /// One record per non-empty '>' chunk, length equals sequence chars
            #[test]
            fn test_record_count_matches_headers(
                seqs in proptest::collection::vec("[ACGT \t]{0,60}", 1..20),
            ) {
                let mut fasta = String::new();
                for (i, seq) in seqs.iter().enumerate() {
                    fasta.push_str(&format!(">s{}\n{}\n", i, seq));
                }

                let records = parse_fasta(&fasta);
                prop_assert_eq!(records.len(), seqs.len());
                for (record, seq) in records.iter().zip(&seqs) {
                    let expected: String = seq.chars().filter(|c| !c.is_whitespace()).collect();
                    prop_assert_eq!(record.sequence(), expected.as_str());
                    prop_assert_eq!(record.len(), record.sequence().chars().count());
                }
            }
        }
    }
}
