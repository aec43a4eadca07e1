//! # bibstamp
//!
//! Stamp a publication PDF with a copyright cover overlay built from BibTeX
//! metadata.
//!
//! ## Why this crate?
//!
//! Many publishers let authors self-archive the accepted version of a paper
//! — provided the copy carries the copyright notice, venue, and DOI of the
//! published version. Doing that by hand for every paper means editing a
//! TeX overlay, looking up page sizes, and re-running a compiler. This crate
//! automates the whole round trip: the facts come from the entry you already
//! have in your `.bib` file, the page size comes from the PDF itself, and a
//! fixed overlay template ties them together.
//!
//! ## Pipeline Overview
//!
//! ```text
//! .bib + .pdf
//!  │
//!  ├─ 1. Input         validate paths, check the PDF magic bytes
//!  ├─ 2. Bibliography  parse the library, resolve one entry by key
//!  ├─ 3. Geometry      first-page width/height via lopdf
//!  ├─ 4. Render        substitute %%TOKEN%% values into the overlay source
//!  └─ 5. Compile       latexmk in a scoped temp dir, publish the result
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bibstamp::{annotate, AnnotateConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AnnotateConfig::builder()
//!         .bibliography("refs.bib")
//!         .key("smith2020")
//!         .build()?;
//!     let report = annotate("accepted.pdf", "out/smith2020.pdf", &config)?;
//!     eprintln!("wrote {} in {}ms", report.output.display(), report.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `bibstamp` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only
//! deps:
//! ```toml
//! bibstamp = { version = "0.2", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod annotate;
pub mod bibtex;
pub mod config;
pub mod error;
pub mod pipeline;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use annotate::{annotate, resolve_publication, AnnotateReport};
pub use config::{AnnotateConfig, AnnotateConfigBuilder, DEFAULT_COMPILER};
pub use error::BibstampError;
pub use pipeline::bibliography::{PublicationInfo, PublicationKind};
pub use pipeline::geometry::{read_geometry, PageGeometry};
pub use pipeline::render::OVERLAY_TEMPLATE;
