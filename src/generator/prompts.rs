//!
//! # Prompt File Reader
//!
//! Parses the line-delimited prompt file into ordered [`PromptEntry`] values.
//! Each entry line is `filename|description`, split on the first `|`. Blank
//! lines and `#` comments are skipped. Lines without a `|` follow an explicit
//! [`MissingSeparator`] policy.

use std::fs;
use std::path::Path;

use super::error::GenError;

/// One filename/description pair parsed from the input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptEntry {
    /// Output filename, relative to the output directory.
    pub filename: String,
    /// Text prompt describing the image to generate.
    pub description: String,
}

/// Policy for entry lines that carry no `|` separator.
///
/// The source scripts disagreed on this: two dropped such lines, one assigned
/// a synthetic sequential filename. The choice is explicit configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingSeparator {
    /// Drop the line entirely.
    #[default]
    Skip,
    /// Treat the whole line as the description and synthesize a sequential
    /// filename (`image_001.jpg`, `image_002.jpg`, ...).
    Synthesize,
}

/// Reads prompt entries from `path` in file order.
///
/// Blank lines and lines starting with `#` are ignored. Entries keep their
/// file order; duplicate filenames are preserved, so each occurrence counts
/// as its own attempt (the later write overwrites the earlier file).
///
/// A missing or unreadable file is a [`GenError::Input`]; callers treat that
/// as "nothing to do" rather than a crash.
pub fn read_prompt_entries(
    path: &Path,
    on_missing_separator: MissingSeparator,
) -> Result<Vec<PromptEntry>, GenError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| GenError::Input(format!("cannot read '{}': {}", path.display(), e)))?;

    let mut entries = Vec::new();
    // Counts every entry line seen (including skipped separator-less ones) so
    // synthetic names stay stable regardless of the configured policy.
    let mut entry_number = 0usize;

    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        entry_number += 1;

        match line.split_once('|') {
            Some((filename, description)) => entries.push(PromptEntry {
                filename: filename.trim().to_string(),
                description: description.trim().to_string(),
            }),
            None => match on_missing_separator {
                MissingSeparator::Skip => {
                    log::warn!("Skipping line without separator: {}", line);
                }
                MissingSeparator::Synthesize => entries.push(PromptEntry {
                    filename: format!("image_{:03}.jpg", entry_number),
                    description: line.to_string(),
                }),
            },
        }
    }

    Ok(entries)
}
