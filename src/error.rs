//! Error types for the bibstamp library.
//!
//! Every failure in this tool is terminal — there is no retry and no partial
//! output — so a single enum covers the whole taxonomy. Variants map one-to-one
//! onto the stages of the pipeline: path validation, bibliography resolution,
//! PDF introspection, and compilation. The two argument-level failures
//! (missing required option, unrecognized flag) are owned by the CLI parser in
//! the binary and never reach this type.
//!
//! The first line of each message is a self-contained diagnostic; some
//! variants add a hint line telling the user what to do about it.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the bibstamp library.
#[derive(Debug, Error)]
pub enum BibstampError {
    // ── Path validation ───────────────────────────────────────────────────
    /// A required file (bibliography or input PDF) was not found.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Bibliography resolution ───────────────────────────────────────────
    /// The bibliography file is malformed.
    #[error("Could not parse bibliography '{path}': {detail}")]
    BibtexParse { path: PathBuf, detail: String },

    /// The requested citation key does not exist in the bibliography.
    #[error("Key '{key}' not found in bibliography '{path}'")]
    KeyNotFound { key: String, path: PathBuf },

    /// The entry's publication type is outside the supported set.
    #[error("Entry '{key}' has unsupported publication type '{kind}'\nSupported types: inbook, article, inproceedings, incollection.")]
    UnsupportedType { key: String, kind: String },

    /// The entry lacks the field its publication type sources the
    /// publication name from (e.g. an article without a journal).
    #[error("Entry '{key}' is missing the '{field}' field required for its publication type")]
    MissingField { key: String, field: String },

    /// No publisher field and no explicit copyright holder.
    #[error("Entry '{key}' has no publisher.\nName the copyright holder explicitly with --copyright.")]
    MissingPublisher { key: String },

    // ── PDF introspection ─────────────────────────────────────────────────
    /// First-page geometry could not be read from the input PDF.
    #[error("Could not read page geometry from '{path}': {detail}")]
    Introspection { path: PathBuf, detail: String },

    // ── Compilation ───────────────────────────────────────────────────────
    /// The external document compiler failed or produced no artifact.
    #[error("Compiler '{program}' failed: {detail}")]
    Compilation { program: String, detail: String },

    /// Could not create or write the final output PDF.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
