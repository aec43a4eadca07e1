//! Compilation: stage, run the external compiler, publish the artifact.
//!
//! All intermediates live in a `tempfile::TempDir`, so cleanup happens when
//! the guard drops — on success, on error, and on panic alike. The compiler
//! runs synchronously with the staging directory as its working directory,
//! which keeps every auxiliary file it produces (`.aux`, `.log`, `.fls`,
//! ...) inside the scope.
//!
//! The destination is only touched after the compiler has produced its
//! artifact; a failed run never leaves a partial or stale file at the
//! output path.

use crate::error::BibstampError;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, info};

/// How many trailing lines of compiler output to keep in a diagnostic.
const DIAGNOSTIC_LINES: usize = 12;

/// Compile the rendered overlay source and copy the result to `output`.
///
/// Inside a scoped working directory this writes `<key>.tex`, stages the
/// input PDF as `<key>-orig.pdf`, runs `<compiler> -pdf <key>`, and expects
/// `<key>.pdf` back.
pub fn compile_and_publish(
    key: &str,
    rendered: &str,
    input_pdf: &Path,
    output: &Path,
    compiler: &str,
) -> Result<(), BibstampError> {
    let workdir = TempDir::new()
        .map_err(|e| BibstampError::Internal(format!("cannot create working directory: {e}")))?;

    let tex_path = workdir.path().join(format!("{key}.tex"));
    std::fs::write(&tex_path, rendered)
        .map_err(|e| BibstampError::Internal(format!("cannot stage overlay source: {e}")))?;

    let staged_pdf = workdir.path().join(format!("{key}-orig.pdf"));
    std::fs::copy(input_pdf, &staged_pdf)
        .map_err(|e| BibstampError::Internal(format!("cannot stage input PDF: {e}")))?;
    debug!(workdir = %workdir.path().display(), "Staged overlay source and input PDF");

    info!(compiler, key, "Running document compiler");
    let run = Command::new(compiler)
        .arg("-pdf")
        .arg(key)
        .current_dir(workdir.path())
        .output()
        .map_err(|e| BibstampError::Compilation {
            program: compiler.to_string(),
            detail: format!("failed to launch: {e}"),
        })?;

    if !run.status.success() {
        return Err(BibstampError::Compilation {
            program: compiler.to_string(),
            detail: format!(
                "exit {}\n{}",
                run.status
                    .code()
                    .map_or_else(|| "by signal".to_string(), |c| format!("code {c}")),
                diagnostic_tail(&run.stdout, &run.stderr),
            ),
        });
    }

    let artifact = workdir.path().join(format!("{key}.pdf"));
    if !artifact.is_file() {
        return Err(BibstampError::Compilation {
            program: compiler.to_string(),
            detail: format!("reported success but produced no '{key}.pdf'"),
        });
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).map_err(|e| BibstampError::OutputWriteFailed {
            path: output.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::copy(&artifact, output).map_err(|e| BibstampError::OutputWriteFailed {
        path: output.to_path_buf(),
        source: e,
    })?;

    info!(output = %output.display(), "Annotated PDF written");
    Ok(())
}

/// The last lines of the compiler's combined output.
///
/// latexmk writes its diagnostics to stdout, the wrapped TeX engine's
/// errors can land on either stream; the tail of both is what a user needs
/// to see.
fn diagnostic_tail(stdout: &[u8], stderr: &[u8]) -> String {
    let combined = format!(
        "{}\n{}",
        String::from_utf8_lossy(stdout),
        String::from_utf8_lossy(stderr)
    );
    let lines: Vec<&str> = combined.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(DIAGNOSTIC_LINES);
    lines[start..].join("\n")
}
