//! Configuration for an annotation run.
//!
//! Everything that varies between runs besides the input and output paths
//! lives in [`AnnotateConfig`], built via its [`AnnotateConfigBuilder`]. The
//! builder validates the two fields that have no sensible default — the
//! bibliography path and the citation key — so a half-configured run fails
//! at build time, not halfway through the pipeline.

use crate::error::BibstampError;
use std::path::PathBuf;

/// The external compiler invoked on the rendered overlay when the caller
/// does not choose one.
pub const DEFAULT_COMPILER: &str = "latexmk";

/// Configuration for a single annotation run.
///
/// # Example
/// ```rust
/// use bibstamp::AnnotateConfig;
///
/// let config = AnnotateConfig::builder()
///     .bibliography("refs.bib")
///     .key("smith2020")
///     .copyright_holder("ACME Press")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct AnnotateConfig {
    /// Path to the BibTeX library the entry is looked up in.
    pub bibliography: PathBuf,

    /// Citation key of the entry to annotate with.
    pub key: String,

    /// Explicit copyright holder. When set it is used verbatim and the
    /// entry's publisher field is ignored entirely.
    pub copyright_holder: Option<String>,

    /// External document compiler, invoked as `<compiler> -pdf <key>` from
    /// inside the staging directory. Default: [`DEFAULT_COMPILER`].
    pub compiler: String,

    /// Custom overlay template source. If `None`, the built-in template is
    /// used. The text must carry the `%%NAME%%` placeholder tokens.
    pub template: Option<String>,
}

impl AnnotateConfig {
    /// Create a new builder for `AnnotateConfig`.
    pub fn builder() -> AnnotateConfigBuilder {
        AnnotateConfigBuilder::default()
    }
}

/// Builder for [`AnnotateConfig`].
#[derive(Debug, Default)]
pub struct AnnotateConfigBuilder {
    bibliography: Option<PathBuf>,
    key: Option<String>,
    copyright_holder: Option<String>,
    compiler: Option<String>,
    template: Option<String>,
}

impl AnnotateConfigBuilder {
    pub fn bibliography(mut self, path: impl Into<PathBuf>) -> Self {
        self.bibliography = Some(path.into());
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn copyright_holder(mut self, holder: impl Into<String>) -> Self {
        self.copyright_holder = Some(holder.into());
        self
    }

    pub fn compiler(mut self, program: impl Into<String>) -> Self {
        self.compiler = Some(program.into());
        self
    }

    pub fn template(mut self, source: impl Into<String>) -> Self {
        self.template = Some(source.into());
        self
    }

    /// Build the configuration, validating required fields.
    pub fn build(self) -> Result<AnnotateConfig, BibstampError> {
        let bibliography = self
            .bibliography
            .ok_or_else(|| BibstampError::InvalidConfig("bibliography path is required".into()))?;

        let key = match self.key {
            Some(k) if !k.trim().is_empty() => k,
            _ => {
                return Err(BibstampError::InvalidConfig(
                    "bibliography key is required".into(),
                ))
            }
        };

        let compiler = match self.compiler {
            Some(c) if !c.trim().is_empty() => c,
            _ => DEFAULT_COMPILER.to_string(),
        };

        Ok(AnnotateConfig {
            bibliography,
            key,
            copyright_holder: self.copyright_holder,
            compiler,
            template: self.template,
        })
    }
}
