//! GenBank flat-file parser.
//!
//! Only the LOCUS line and the FEATURES table are read. Everything else
//! (DEFINITION, REFERENCE, the ORIGIN sequence block, ...) is skipped.
//!
//! ## Feature Table Layout
//!
//! ```text
//! FEATURES             Location/Qualifiers
//!      source          1..5028
//!                      /organism="Saccharomyces cerevisiae"
//!                      /db_xref="taxon:4932"
//!      CDS             <1..206
//!                      /codon_start=3
//!                      /product="TCP1-beta"
//!                      /translation="SSIYNGISTSGLDLNNGTIADMRQLGIVESYKLKRAVVSSASEA
//!                      AEVLLRVDNIIRARPRTANRQHM"
//! ORIGIN
//! ```
//!
//! Feature keys start in column 6 and qualifiers in column 22. Lines indented
//! like a qualifier but not starting with `/` continue the previous value.
//!
//! ## Relaxed Parsing
//!
//! The parser never fails. Lines it does not recognise are dropped, a
//! missing FEATURES section gives an empty feature list and a missing LOCUS
//! line gives no locus.

use log::debug;

use crate::model::{Feature, GenBankDocument, QualifierValue};

/// Indentation of feature keys in standard GenBank files.
pub const FEATURE_INDENT: usize = 5;
/// Indentation of qualifiers and their continuation lines.
pub const QUALIFIER_INDENT: usize = 21;

/// Column layout of the feature table.
///
/// Both widths are exact: a feature key indented by 4 or 6 spaces is not a
/// feature line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureLayout {
    pub feature_indent: usize,
    pub qualifier_indent: usize,
}

impl FeatureLayout {
    /// A layout is usable when feature keys are indented and qualifiers sit
    /// deeper than feature keys. Anything else lets section headers or
    /// qualifiers pass for feature lines.
    pub fn is_usable(&self) -> bool {
        self.feature_indent > 0 && self.feature_indent < self.qualifier_indent
    }
}

impl Default for FeatureLayout {
    fn default() -> Self {
        Self {
            feature_indent: FEATURE_INDENT,
            qualifier_indent: QUALIFIER_INDENT,
        }
    }
}

/// Parses GenBank content with the standard column layout.
pub fn parse_genbank(content: &str) -> GenBankDocument {
    parse_genbank_with_layout(content, &FeatureLayout::default())
}

/// Parses GenBank content using the given column layout.
pub fn parse_genbank_with_layout(content: &str, layout: &FeatureLayout) -> GenBankDocument {
    let lines: Vec<&str> = content.lines().collect();

    let locus = lines
        .iter()
        .find(|line| line.starts_with("LOCUS"))
        .map(|line| line.trim().to_string());

    let Some(start) = lines.iter().position(|line| line.starts_with("FEATURES")) else {
        debug!("No FEATURES section found");
        return GenBankDocument {
            locus,
            features: Vec::new(),
        };
    };
    let end = feature_table_end(&lines, start);
    debug!("FEATURES table spans lines {}..{}", start + 1, end);

    let scan = lines[start..end]
        .iter()
        .fold(TableScan::default(), |scan, line| scan.step(line, layout));
    if scan.dropped > 0 {
        debug!("Dropped {} unrecognised line(s) in FEATURES table", scan.dropped);
    }
    let features = scan.finish();
    debug!("Parsed {} feature(s)", features.len());

    GenBankDocument { locus, features }
}

/// Index of the first line after the feature table: `ORIGIN`, else `//`,
/// else end of input.
fn feature_table_end(lines: &[&str], start: usize) -> usize {
    let after = &lines[start + 1..];
    after
        .iter()
        .position(|line| line.starts_with("ORIGIN"))
        .or_else(|| after.iter().position(|line| line.trim_end() == "//"))
        .map_or(lines.len(), |offset| start + 1 + offset)
}

/// What a single feature-table line contributes.
#[derive(Debug, PartialEq, Eq)]
enum TableLine<'a> {
    FeatureStart { key: &'a str, location: &'a str },
    QualifierStart { key: &'a str, value: RawValue<'a> },
    Continuation(&'a str),
    Inert,
}

/// Qualifier value as written after `/key`.
#[derive(Debug, PartialEq, Eq)]
enum RawValue<'a> {
    Flag,
    Bare(&'a str),
    /// `closed` is false when the closing quote is on a later line.
    Quoted { text: &'a str, closed: bool },
}

impl RawValue<'_> {
    /// The stored value and whether a quote is still open.
    fn into_value(self) -> (QualifierValue, bool) {
        match self {
            RawValue::Flag => (QualifierValue::Flag, false),
            RawValue::Bare(text) => (QualifierValue::Scalar(text.to_string()), false),
            RawValue::Quoted { text, closed } => (QualifierValue::Scalar(text.to_string()), !closed),
        }
    }
}

fn classify<'a>(line: &'a str, layout: &FeatureLayout) -> TableLine<'a> {
    if let Some(rest) = strip_indent(line, layout.feature_indent) {
        if let Some((key, location)) = split_feature(rest) {
            return TableLine::FeatureStart { key, location };
        }
    }
    if let Some(rest) = strip_indent(line, layout.qualifier_indent) {
        if let Some((key, value)) = split_qualifier(rest) {
            return TableLine::QualifierStart { key, value };
        }
        let text = rest.trim();
        if !text.is_empty() {
            return TableLine::Continuation(text);
        }
    }
    TableLine::Inert
}

/// Strips exactly `width` leading spaces; the next character must not be whitespace.
fn strip_indent(line: &str, width: usize) -> Option<&str> {
    let bytes = line.as_bytes();
    let indented = bytes.len() > width && bytes[..width].iter().all(|&b| b == b' ');
    if indented && !bytes[width].is_ascii_whitespace() {
        Some(&line[width..])
    } else {
        None
    }
}

/// Splits `key   location`. A key without a location is not a feature line.
fn split_feature(rest: &str) -> Option<(&str, &str)> {
    let split = rest.find(char::is_whitespace)?;
    let location = rest[split..].trim();
    if location.is_empty() {
        return None;
    }
    Some((&rest[..split], location))
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

/// Parses `/key`, `/key=token` or `/key="text"`.
fn split_qualifier(rest: &str) -> Option<(&str, RawValue<'_>)> {
    let rest = rest.strip_prefix('/')?;
    let key_len = rest.find(|c: char| !is_key_char(c)).unwrap_or(rest.len());
    if key_len == 0 {
        return None;
    }
    let (key, after) = rest.split_at(key_len);

    let value = match after.strip_prefix('=') {
        None => RawValue::Flag,
        Some(raw) => match raw.strip_prefix('"') {
            Some(quoted) => match quoted.find('"') {
                Some(end) => RawValue::Quoted {
                    text: &quoted[..end],
                    closed: true,
                },
                None => RawValue::Quoted {
                    text: quoted.trim_end(),
                    closed: false,
                },
            },
            None => RawValue::Bare(raw.split_whitespace().next().unwrap_or("")),
        },
    };
    Some((key, value))
}

/// The qualifier that continuation lines extend.
#[derive(Debug)]
struct OpenQualifier {
    key: String,
    in_quotes: bool,
}

#[derive(Debug, Default)]
enum Cursor {
    #[default]
    NoCurrentFeature,
    InFeature {
        feature: Feature,
        open: Option<OpenQualifier>,
    },
}

/// Accumulator folded over the feature-table lines.
#[derive(Debug, Default)]
struct TableScan {
    features: Vec<Feature>,
    cursor: Cursor,
    dropped: usize,
}

impl TableScan {
    fn step(mut self, line: &str, layout: &FeatureLayout) -> Self {
        match classify(line, layout) {
            TableLine::FeatureStart { key, location } => {
                self.commit();
                self.cursor = Cursor::InFeature {
                    feature: Feature::new(key, location),
                    open: None,
                };
            }
            TableLine::QualifierStart { key, value } => match &mut self.cursor {
                Cursor::InFeature { feature, open } => {
                    let (value, in_quotes) = value.into_value();
                    feature.qualifiers.insert(key, value);
                    *open = Some(OpenQualifier {
                        key: key.to_string(),
                        in_quotes,
                    });
                }
                Cursor::NoCurrentFeature => self.dropped += 1,
            },
            TableLine::Continuation(text) => match &mut self.cursor {
                Cursor::InFeature {
                    feature,
                    open: Some(open),
                } => {
                    let text = if open.in_quotes {
                        match text.find('"') {
                            Some(end) => {
                                open.in_quotes = false;
                                text[..end].trim_end()
                            }
                            None => text,
                        }
                    } else {
                        text
                    };
                    if let Some(value) = feature.qualifiers.get_mut(&open.key) {
                        if !text.is_empty() {
                            value.append(text);
                        }
                    }
                }
                _ => self.dropped += 1,
            },
            TableLine::Inert => {
                if !line.trim().is_empty() {
                    self.dropped += 1;
                }
            }
        }
        self
    }

    fn commit(&mut self) {
        if let Cursor::InFeature { feature, .. } = std::mem::take(&mut self.cursor) {
            self.features.push(feature);
        }
    }

    fn finish(mut self) -> Vec<Feature> {
        self.commit();
        self.features
    }
}
