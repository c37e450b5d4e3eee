//! Data model for parsed sequence files.
//!
//! This module contains the structures produced by the parsers:
//! - FASTA records (header + sequence)
//! - GenBank documents (LOCUS line + feature table)
//! - Features and their ordered qualifiers
//!
//! Everything here is built once per parse and never mutated afterwards.

use std::fmt;

/// A single FASTA record.
///
/// The length is derived from the sequence when the record is built and
/// cannot be set independently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    header: String,
    sequence: String,
    length: usize,
}

impl FastaRecord {
    /// Creates a new record. Whitespace inside `sequence` is removed.
    pub fn new(header: impl Into<String>, sequence: &str) -> Self {
        let sequence: String = sequence.chars().filter(|c| !c.is_whitespace()).collect();
        let length = sequence.chars().count();
        Self {
            header: header.into(),
            sequence,
            length,
        }
    }

    /// The header line, without the leading '>'.
    pub fn header(&self) -> &str {
        &self.header
    }

    /// The sequence data with all whitespace removed.
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Number of characters in the sequence.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true if the record carries no sequence data.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The sequence identifier: everything before the first space of the header.
    pub fn id(&self) -> &str {
        self.header.split_whitespace().next().unwrap_or("")
    }

    /// Free text following the identifier, if any.
    pub fn description(&self) -> Option<&str> {
        let rest = self.header.trim_start();
        let (_, description) = rest.split_once(char::is_whitespace)?;
        let description = description.trim();
        (!description.is_empty()).then_some(description)
    }
}

/// Value attached to a feature qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualifierValue {
    /// Presence-only qualifier such as `/pseudo`.
    Flag,
    /// Single value.
    Scalar(String),
    /// Values collected from repeated occurrences of the same key.
    Multi(Vec<String>),
}

impl QualifierValue {
    /// Returns true for presence-only qualifiers.
    pub fn is_flag(&self) -> bool {
        matches!(self, QualifierValue::Flag)
    }

    /// The textual values, in order. Empty for a flag.
    pub fn values(&self) -> Vec<&str> {
        match self {
            QualifierValue::Flag => Vec::new(),
            QualifierValue::Scalar(value) => vec![value.as_str()],
            QualifierValue::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// Combines this value with a repeated occurrence of the same key.
    ///
    /// A flag repeated stays a flag. Otherwise the result is `Multi`, with a
    /// flag contributing an empty string.
    pub(crate) fn promote(self, next: QualifierValue) -> QualifierValue {
        match (self, next) {
            (QualifierValue::Flag, QualifierValue::Flag) => QualifierValue::Flag,
            (current, next) => {
                let mut values = current.into_multi_values();
                values.extend(next.into_multi_values());
                QualifierValue::Multi(values)
            }
        }
    }

    /// Appends continuation text to the open value.
    ///
    /// Text goes to the last element of a `Multi`. A flag becomes a scalar
    /// holding only the continuation text.
    pub(crate) fn append(&mut self, text: &str) {
        match self {
            QualifierValue::Flag => *self = QualifierValue::Scalar(text.to_string()),
            QualifierValue::Scalar(value) => push_separated(value, text),
            QualifierValue::Multi(values) => match values.last_mut() {
                Some(last) => push_separated(last, text),
                None => values.push(text.to_string()),
            },
        }
    }

    fn into_multi_values(self) -> Vec<String> {
        match self {
            QualifierValue::Flag => vec![String::new()],
            QualifierValue::Scalar(value) => vec![value],
            QualifierValue::Multi(values) => values,
        }
    }
}

fn push_separated(value: &mut String, text: &str) {
    if !value.is_empty() {
        value.push(' ');
    }
    value.push_str(text);
}

impl fmt::Display for QualifierValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualifierValue::Flag => Ok(()),
            QualifierValue::Scalar(value) => write!(f, "{}", value),
            QualifierValue::Multi(values) => write!(f, "{}", values.join("; ")),
        }
    }
}

/// Qualifiers of a feature, kept in first-seen key order.
///
/// Features carry a handful of qualifiers, so lookups scan the list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qualifiers {
    entries: Vec<(String, QualifierValue)>,
}

impl Qualifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, promoting to `Multi` if the key is already present.
    /// A repeated key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: QualifierValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => {
                let current = std::mem::replace(existing, QualifierValue::Flag);
                *existing = current.promote(value);
            }
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&QualifierValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut QualifierValue> {
        self.entries.iter_mut().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QualifierValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An annotated region from the FEATURES table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Feature key, e.g. `CDS` or `gene`
    pub key: String,
    /// Location string exactly as written, e.g. `complement(12..2189)`
    pub location: String,
    pub qualifiers: Qualifiers,
}

impl Feature {
    /// Creates a feature with no qualifiers.
    pub fn new(key: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            location: location.into(),
            qualifiers: Qualifiers::new(),
        }
    }

    /// Looks up a qualifier by key.
    pub fn qualifier(&self, key: &str) -> Option<&QualifierValue> {
        self.qualifiers.get(key)
    }
}

/// The parts of a GenBank flat file this crate understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenBankDocument {
    /// The LOCUS line, trimmed, if the file has one
    pub locus: Option<String>,
    /// Features in file order
    pub features: Vec<Feature>,
}

impl GenBankDocument {
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Features whose key matches `key` exactly.
    pub fn features_with_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Feature> + 'a {
        self.features.iter().filter(move |f| f.key == key)
    }
}
