//! Template rendering: substitute `%%NAME%%` tokens with computed values.
//!
//! The overlay source ships inside the crate ([`OVERLAY_TEMPLATE`]); what
//! varies per run is only the handful of values substituted into it. Callers
//! can swap the whole template via `AnnotateConfig::template`, as long as
//! the replacement uses the same token syntax.
//!
//! Rendering is line-oriented and touches nothing but the tokens, so the
//! template's line structure survives verbatim — TeX error messages keep
//! pointing at the right lines.
//!
//! Two escapes are applied while building the context, both demanded by the
//! typesetting downstream: `". "` inside pubname and copyright becomes
//! `".\ "` (an abbreviation's space must not be typeset as an end of
//! sentence), and `_` in a DOI becomes `\_`.

use crate::pipeline::bibliography::PublicationInfo;
use crate::pipeline::geometry::PageGeometry;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use tracing::warn;

/// The built-in overlay source, used when no custom template is configured.
pub const OVERLAY_TEMPLATE: &str = include_str!("overlay.tex");

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"%%([A-Z]+)%%").unwrap());

/// The placeholder values of one run. Built once, consumed by [`render`].
#[derive(Debug, Clone)]
pub struct RenderContext {
    values: BTreeMap<&'static str, String>,
}

impl RenderContext {
    /// Build the context from resolved publication data, page geometry, and
    /// the staged base filename (the input copy, without its extension).
    pub fn new(
        publication: &PublicationInfo,
        geometry: &PageGeometry,
        base_filename: &str,
    ) -> Self {
        let mut values = BTreeMap::new();
        values.insert("WIDTH", geometry.width.to_string());
        values.insert("HEIGHT", geometry.height.to_string());
        values.insert("FILENAME", base_filename.to_string());
        values.insert("YEAR", publication.year.clone());
        values.insert(
            "DOI",
            publication
                .doi
                .as_deref()
                .map(escape_underscores)
                .unwrap_or_default(),
        );
        values.insert("PUBNAME", escape_sentence_spacing(&publication.pubname));
        values.insert(
            "COPYRIGHT",
            escape_sentence_spacing(&publication.copyright_holder),
        );
        Self { values }
    }

    /// Look up a placeholder value by token name (without the `%%`).
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

/// Replace every `%%NAME%%` token in `template` with its context value.
///
/// A token matching the pattern but absent from the context renders as the
/// empty string; it is logged, because a silently blanked value is invisible
/// in the compiled PDF.
pub fn render(template: &str, context: &RenderContext) -> String {
    let mut output = String::with_capacity(template.len());

    for line in template.lines() {
        let rendered = PLACEHOLDER.replace_all(line, |caps: &Captures| {
            let name = &caps[1];
            match context.get(name) {
                Some(value) => value.to_string(),
                None => {
                    warn!(token = name, "Unrecognized template placeholder, substituting empty");
                    String::new()
                }
            }
        });
        output.push_str(&rendered);
        output.push('\n');
    }

    if !template.ends_with('\n') {
        output.pop();
    }
    output
}

/// Escape `". "` so the typesetter does not widen the space after an
/// abbreviation into an end-of-sentence space.
pub fn escape_sentence_spacing(text: &str) -> String {
    text.replace(". ", ".\\ ")
}

/// Escape `_`, which would otherwise start a subscript.
pub fn escape_underscores(text: &str) -> String {
    text.replace('_', "\\_")
}
