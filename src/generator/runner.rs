//!
//! # Batch Runner
//!
//! Drives the generation loop: prompt entries in, image files out. Entries
//! are processed strictly one at a time; the in-process backend exclusively
//! owns the loaded model, and the network backends serialize for simplicity.
//! A failed entry is logged and skipped, never retried.

use std::fs;
use std::path::PathBuf;

use super::backend::{GenerationRequest, ImageBackend};
use super::dimensions::select_dimensions;
use super::error::GenError;
use super::prompts::PromptEntry;

/// Outcome of one batch run. Purely informational, not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of entries processed (equals the number of parsed entries).
    pub attempted: usize,
    /// Number of entries that produced an output file, including entries
    /// skipped because their output already existed.
    pub succeeded: usize,
    /// Directory the images were written under.
    pub output_dir: PathBuf,
}

/// Sequentially generates every prompt entry through one backend.
pub struct BatchRunner {
    pub output_dir: PathBuf,
    pub default_width: u32,
    pub default_height: u32,
    /// When set, entries whose output file already exists are not
    /// regenerated. A raw existence check, not a content check.
    pub skip_existing: bool,
}

impl BatchRunner {
    pub fn new(output_dir: PathBuf, default_width: u32, default_height: u32) -> Self {
        Self {
            output_dir,
            default_width,
            default_height,
            skip_existing: false,
        }
    }

    pub fn skip_existing(mut self, skip: bool) -> Self {
        self.skip_existing = skip;
        self
    }

    /// Runs the batch. Per-entry failures are logged with their prompt and
    /// do not stop the run.
    pub fn run(&self, backend: &mut dyn ImageBackend, entries: &[PromptEntry]) -> RunSummary {
        let total = entries.len();
        let mut succeeded = 0usize;

        for (index, entry) in entries.iter().enumerate() {
            let output_path = self.output_dir.join(&entry.filename);

            if self.skip_existing && output_path.exists() {
                log::info!("Skipping existing: {}", entry.filename);
                succeeded += 1;
                continue;
            }

            let (width, height) =
                select_dimensions(&entry.filename, self.default_width, self.default_height);
            let request = GenerationRequest::new(&entry.description, width, height);

            log::info!(
                "Generating {}/{}: {} ({}x{})",
                index + 1,
                total,
                entry.filename,
                width,
                height
            );

            match backend.generate(&request) {
                Ok(image) => match self.save_image(&image, &output_path) {
                    Ok(()) => {
                        log::info!("Saved: {}", output_path.display());
                        succeeded += 1;
                    }
                    Err(e) => {
                        log::error!("Error saving {}: {}", entry.filename, e);
                        log::error!("Prompt used: {}", request.prompt);
                    }
                },
                Err(e) => {
                    log::error!("Error generating {}: {}", entry.filename, e);
                    log::error!("Prompt used: {}", request.prompt);
                }
            }
        }

        RunSummary {
            attempted: total,
            succeeded,
            output_dir: self.output_dir.clone(),
        }
    }

    fn save_image(
        &self,
        image: &image::DynamicImage,
        output_path: &std::path::Path,
    ) -> Result<(), GenError> {
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Convert to RGB so PNGs with alpha still save as plain JPEG/PNG.
        image.to_rgb8().save(output_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    struct PanickingBackend;

    impl ImageBackend for PanickingBackend {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn generate(&mut self, _request: &GenerationRequest) -> Result<DynamicImage, GenError> {
            panic!("backend must not be invoked for skipped entries");
        }
    }

    #[test]
    fn test_skip_existing_never_invokes_backend() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("already.png");
        std::fs::write(&existing, b"placeholder").unwrap();

        let entries = vec![PromptEntry {
            filename: "already.png".to_string(),
            description: "a fox".to_string(),
        }];

        let runner = BatchRunner::new(dir.path().to_path_buf(), 800, 1000).skip_existing(true);
        let summary = runner.run(&mut PanickingBackend, &entries);

        assert_eq!(summary.attempted, 1);
        assert_eq!(summary.succeeded, 1);
    }
}
