//! Path validation: check preconditions and pin every path down to an
//! absolute form before the pipeline runs.
//!
//! The compile stage later changes the process working directory into a
//! staging area, so any relative path the user gave on the command line
//! would dangle by the time it is used. Resolving everything up front also
//! means the "file not found" class of errors fires before any work — and
//! before anything is written anywhere.
//!
//! The input PDF's `%PDF` magic bytes are validated here so a mislabelled
//! file produces a meaningful error rather than a downstream parser crash.

use crate::error::BibstampError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The validated, absolute paths of one run.
#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    /// Bibliography file; exists.
    pub bibliography: PathBuf,
    /// Input PDF; exists and starts with `%PDF`.
    pub input: PathBuf,
    /// Destination; absolute, but neither it nor its parent needs to exist yet.
    pub output: PathBuf,
}

/// Validate preconditions and absolutize all three paths.
pub fn resolve_paths(
    bibliography: &Path,
    input: &Path,
    output: &Path,
) -> Result<ResolvedPaths, BibstampError> {
    let bibliography = canonicalize_existing(bibliography)?;
    let input = canonicalize_existing(input)?;
    require_pdf_magic(&input)?;
    let output = absolutize(output)?;

    debug!(
        bibliography = %bibliography.display(),
        input = %input.display(),
        output = %output.display(),
        "Paths resolved"
    );

    Ok(ResolvedPaths {
        bibliography,
        input,
        output,
    })
}

/// Canonicalize a path that must already exist.
fn canonicalize_existing(path: &Path) -> Result<PathBuf, BibstampError> {
    std::fs::canonicalize(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => BibstampError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => BibstampError::FileNotFound {
            path: path.to_path_buf(),
        },
    })
}

/// Make a path absolute without requiring it to exist.
fn absolutize(path: &Path) -> Result<PathBuf, BibstampError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir()
        .map_err(|e| BibstampError::Internal(format!("cannot determine working directory: {e}")))?;
    Ok(cwd.join(path))
}

/// Verify the file starts with the `%PDF` magic bytes.
fn require_pdf_magic(path: &Path) -> Result<(), BibstampError> {
    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(BibstampError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(BibstampError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        Err(_) => Err(BibstampError::FileNotFound {
            path: path.to_path_buf(),
        }),
    }
}
