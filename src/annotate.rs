//! Top-level entry points: the whole pipeline as one call.
//!
//! [`annotate`] is what the CLI binary wraps. Each stage either returns the
//! value the next stage needs or fails the run with a typed
//! [`BibstampError`]; nothing is written outside the scoped working
//! directory until the compiler has produced its artifact.

use crate::config::AnnotateConfig;
use crate::error::BibstampError;
use crate::pipeline::bibliography::{self, PublicationInfo};
use crate::pipeline::geometry::{self, PageGeometry};
use crate::pipeline::render::{self, RenderContext};
use crate::pipeline::{compile, input};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// What one successful run produced and measured.
#[derive(Debug, Clone)]
pub struct AnnotateReport {
    /// The resolved bibliographic fields that went into the overlay.
    pub publication: PublicationInfo,
    /// First-page geometry of the input PDF.
    pub geometry: PageGeometry,
    /// Absolute path of the written output file.
    pub output: PathBuf,
    /// Wall-clock time of the external compiler invocation.
    pub compile_duration_ms: u64,
    /// Wall-clock time of the whole run.
    pub total_duration_ms: u64,
}

/// Annotate `input` with a copyright cover overlay and write the combined
/// PDF to `output`.
///
/// # Errors
/// Any failure aborts the run: invalid paths, an unparseable bibliography or
/// missing key, an unreadable input PDF, a failing compiler, or an
/// unwritable destination. The destination file is created only on success.
pub fn annotate(
    input_pdf: impl AsRef<Path>,
    output_pdf: impl AsRef<Path>,
    config: &AnnotateConfig,
) -> Result<AnnotateReport, BibstampError> {
    let total_start = Instant::now();
    info!(
        input = %input_pdf.as_ref().display(),
        key = %config.key,
        "Starting annotation"
    );

    // ── Step 1: Validate and absolutize paths ────────────────────────────
    let paths = input::resolve_paths(&config.bibliography, input_pdf.as_ref(), output_pdf.as_ref())?;

    // ── Step 2: Resolve the bibliography entry ───────────────────────────
    let publication = bibliography::resolve_publication(
        &paths.bibliography,
        &config.key,
        config.copyright_holder.as_deref(),
    )?;

    // ── Step 3: Read first-page geometry ─────────────────────────────────
    let geometry = geometry::read_geometry(&paths.input)?;

    // ── Step 4: Render the overlay source ────────────────────────────────
    let base_filename = format!("{}-orig", publication.key);
    let context = RenderContext::new(&publication, &geometry, &base_filename);
    let template = config
        .template
        .as_deref()
        .unwrap_or(render::OVERLAY_TEMPLATE);
    let rendered = render::render(template, &context);
    debug!(bytes = rendered.len(), "Overlay source rendered");

    // ── Step 5: Compile and publish ──────────────────────────────────────
    let compile_start = Instant::now();
    compile::compile_and_publish(
        &publication.key,
        &rendered,
        &paths.input,
        &paths.output,
        &config.compiler,
    )?;
    let compile_duration_ms = compile_start.elapsed().as_millis() as u64;

    let total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        output = %paths.output.display(),
        compile_ms = compile_duration_ms,
        total_ms = total_duration_ms,
        "Annotation complete"
    );

    Ok(AnnotateReport {
        publication,
        geometry,
        output: paths.output,
        compile_duration_ms,
        total_duration_ms,
    })
}

/// Resolve the bibliographic fields for `key` without touching any PDF.
///
/// This is the `--resolve-only` entry point: it exercises the same lookup,
/// classification, and copyright fallback chain as [`annotate`], and stops
/// there.
pub fn resolve_publication(
    bibliography: impl AsRef<Path>,
    key: &str,
    copyright_override: Option<&str>,
) -> Result<PublicationInfo, BibstampError> {
    bibliography::resolve_publication(bibliography.as_ref(), key, copyright_override)
}
