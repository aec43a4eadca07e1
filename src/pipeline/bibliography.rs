//! Bibliography resolution: from a `.bib` file and a citation key to the
//! fields the overlay needs.
//!
//! Where the publication name comes from depends on the entry's type — an
//! article is "published in" its journal, a conference paper in its
//! proceedings volume. Only the four types with a well-defined venue field
//! are supported; anything else fails loudly rather than guessing, because a
//! wrong venue typeset onto a copyright notice is worse than no output.
//!
//! The copyright holder is resolved most-specific first: an explicit
//! override from the caller, else the entry's publisher run through the
//! alias table below.

use crate::bibtex::{Entry, Library};
use crate::error::BibstampError;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

/// Publishers whose copyright holder of record differs from the imprint
/// name that appears in bibliography entries. Literal match on the full
/// publisher string; extend by adding pairs.
const COPYRIGHT_ALIASES: &[(&str, &str)] = &[("IEEE Computer Society", "IEEE")];

/// The supported publication types.
///
/// Classification is an exact, case-sensitive match on the raw entry-type
/// string; the set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationKind {
    InBook,
    Article,
    InProceedings,
    InCollection,
}

impl PublicationKind {
    /// Classify a raw entry-type string, or `None` outside the supported set.
    pub fn classify(kind: &str) -> Option<Self> {
        match kind {
            "inbook" => Some(Self::InBook),
            "article" => Some(Self::Article),
            "inproceedings" => Some(Self::InProceedings),
            "incollection" => Some(Self::InCollection),
            _ => None,
        }
    }

    /// The field this publication type sources its publication name from.
    pub fn source_field(self) -> &'static str {
        match self {
            Self::InBook => "title",
            Self::Article => "journal",
            Self::InProceedings | Self::InCollection => "booktitle",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InBook => "inbook",
            Self::Article => "article",
            Self::InProceedings => "inproceedings",
            Self::InCollection => "incollection",
        }
    }
}

impl fmt::Display for PublicationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The bibliographic facts one annotation run needs, resolved and ready for
/// the render context. Values are raw — template escaping happens when the
/// context is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationInfo {
    /// Citation key of the resolved entry.
    pub key: String,
    /// Journal, proceedings, or book the work appeared in.
    pub pubname: String,
    /// Publication year; empty when the entry has none.
    pub year: String,
    /// DOI, if the entry carries one.
    pub doi: Option<String>,
    /// Resolved copyright holder.
    pub copyright_holder: String,
}

/// Load a bibliography file and resolve one entry into a [`PublicationInfo`].
///
/// `copyright_override`, when given, is used verbatim as the copyright
/// holder; otherwise the entry must carry a non-empty publisher.
pub fn resolve_publication(
    bibliography: &Path,
    key: &str,
    copyright_override: Option<&str>,
) -> Result<PublicationInfo, BibstampError> {
    let source = std::fs::read_to_string(bibliography).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => BibstampError::PermissionDenied {
            path: bibliography.to_path_buf(),
        },
        _ => BibstampError::FileNotFound {
            path: bibliography.to_path_buf(),
        },
    })?;

    let library = Library::parse(&source).map_err(|e| BibstampError::BibtexParse {
        path: bibliography.to_path_buf(),
        detail: e.to_string(),
    })?;
    debug!(entries = library.len(), "Bibliography parsed");

    let entry = library.get(key).ok_or_else(|| BibstampError::KeyNotFound {
        key: key.to_string(),
        path: bibliography.to_path_buf(),
    })?;

    let info = publication_from_entry(entry, copyright_override)?;
    info!(
        key = %info.key,
        pubname = %info.pubname,
        copyright = %info.copyright_holder,
        "Publication resolved"
    );
    Ok(info)
}

/// Map one entry to a [`PublicationInfo`], applying the type table and the
/// copyright fallback chain.
pub fn publication_from_entry(
    entry: &Entry,
    copyright_override: Option<&str>,
) -> Result<PublicationInfo, BibstampError> {
    let kind =
        PublicationKind::classify(&entry.kind).ok_or_else(|| BibstampError::UnsupportedType {
            key: entry.key.clone(),
            kind: entry.kind.clone(),
        })?;

    let source_field = kind.source_field();
    let pubname = match entry.field(source_field) {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => {
            return Err(BibstampError::MissingField {
                key: entry.key.clone(),
                field: source_field.to_string(),
            })
        }
    };

    let copyright_holder = resolve_copyright(entry, copyright_override)?;

    Ok(PublicationInfo {
        key: entry.key.clone(),
        pubname,
        year: entry.field("year").unwrap_or_default().to_string(),
        doi: entry
            .field("doi")
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string),
        copyright_holder,
    })
}

/// Override > publisher (alias table applied) > failure.
fn resolve_copyright(
    entry: &Entry,
    copyright_override: Option<&str>,
) -> Result<String, BibstampError> {
    if let Some(holder) = copyright_override {
        return Ok(holder.to_string());
    }

    let publisher = match entry.field("publisher") {
        Some(v) if !v.trim().is_empty() => v,
        _ => {
            return Err(BibstampError::MissingPublisher {
                key: entry.key.clone(),
            })
        }
    };

    let holder = COPYRIGHT_ALIASES
        .iter()
        .find(|(imprint, _)| *imprint == publisher)
        .map(|(_, holder)| *holder)
        .unwrap_or(publisher);

    Ok(holder.to_string())
}
