//! Minimal BibTeX model: a library of entries addressed by citation key.
//!
//! This is deliberately not a full bibliography manager. The annotation
//! pipeline needs exactly three things from a `.bib` file: find an entry by
//! its key, read its raw type string, and read a handful of fields. The
//! types here model that and nothing more; everything syntactic lives in
//! [`parse`].
//!
//! Citation keys are case-sensitive (two entries differing only in key case
//! are distinct). Field names are case-insensitive, per BibTeX convention.

pub mod parse;

pub use parse::{parse_library, ParseError};

/// A single `name = value` pair inside an entry.
///
/// The name is stored as written; lookup through [`Entry::field`] ignores
/// ASCII case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// One parsed BibTeX entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Citation key, as written in the source.
    pub key: String,
    /// Raw entry-type string (`article`, `inproceedings`, ...), case
    /// preserved. Classification happens downstream.
    pub kind: String,
    pub fields: Vec<Field>,
}

impl Entry {
    /// Look up a field value by name, ignoring ASCII case.
    ///
    /// When a field name is repeated, the first occurrence wins (BibTeX
    /// implementations disagree here; first-wins matches the common ones).
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| f.value.as_str())
    }

    /// True if the entry has a non-empty value for `name`.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some_and(|v| !v.trim().is_empty())
    }
}

/// A parsed bibliography: the ordered list of entries from one `.bib` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Library {
    entries: Vec<Entry>,
}

impl Library {
    /// Parse BibTeX source text into a library.
    ///
    /// Parsing is strict: the first malformed construct aborts with a
    /// [`ParseError`] carrying a line number. Text between entries and
    /// `@comment` blocks are skipped; `@string` macros are substituted into
    /// field values.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parse_library(input)
    }

    pub(crate) fn from_entries(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Fetch an entry by citation key (exact, case-sensitive match).
    ///
    /// Duplicate keys keep the first entry, matching what BibTeX itself does.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in file order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }
}
