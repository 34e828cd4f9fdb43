//!
//! # Batch Image Generator
//!
//! Reads a line-delimited prompt file, derives an output filename and target
//! dimensions per entry, invokes one of the interchangeable image-generation
//! backends, and writes results to disk. Simple sequential orchestration:
//! no retries, no queue, no parallelism.

pub mod backend;
pub mod dimensions;
#[cfg(feature = "diffusion")]
pub mod diffusion;
pub mod error;
pub mod hosted;
pub mod local;
pub mod prompts;
pub mod runner;

pub use backend::{GenerationRequest, ImageBackend, DEFAULT_STYLE, NEGATIVE_PROMPT};
pub use error::GenError;
pub use prompts::{read_prompt_entries, MissingSeparator, PromptEntry};
pub use runner::{BatchRunner, RunSummary};
