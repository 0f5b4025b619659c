//! HTML Reference Rewriting
//!
//! Plain substring replacement, no HTML parsing. A source path that appears
//! in a comment or in visible text is rewritten exactly like one inside a
//! `<link>` or `<script>` attribute. Pages are handled as raw bytes, so
//! text in any ASCII-compatible encoding passes through unchanged.

use std::fs;
use tracing::debug;

use crate::config::{BuildConfig, Rewrite};
use crate::pipeline::BuildError;
use crate::report::{ItemOutcome, SkipReason, Stage, StageReport};
use crate::stages::ensure_parent;

/// Apply every rewrite, in order, to all occurrences
pub fn rewrite_references(content: &[u8], rewrites: &[Rewrite]) -> Vec<u8> {
    rewrites
        .iter()
        .fold(content.to_vec(), |bytes, r| replace_all(&bytes, r.from.as_bytes(), r.to.as_bytes()))
}

/// Non-overlapping, left to right, like `str::replace`
fn replace_all(haystack: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    if from.is_empty() {
        return haystack.to_vec();
    }
    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(from) {
            out.extend_from_slice(to);
            i += from.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}

/// Rewrite each configured page into the output tree. IO errors are fatal.
pub fn rewrite_pages(config: &BuildConfig) -> Result<StageReport, BuildError> {
    let rewrites = config.rewrites();
    let mut report = StageReport::new(Stage::RewriteHtml);

    for page in &config.html_files {
        let input = config.source_path(page);
        if !input.is_file() {
            report.push(ItemOutcome::skipped(page.as_str(), SkipReason::NotFound));
            continue;
        }

        let content = fs::read(&input).map_err(|e| BuildError::io("read", &input, e))?;
        let rewritten = rewrite_references(&content, &rewrites);

        let output = config.output_path(page);
        ensure_parent(&output).map_err(|e| BuildError::io("create directory", &output, e))?;
        fs::write(&output, rewritten).map_err(|e| BuildError::io("write", &output, e))?;

        debug!(page = %page, "references updated");
        report.push(ItemOutcome::done(page.as_str(), output));
    }
    Ok(report)
}
