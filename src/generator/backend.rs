//!
//! # Image Backend Capability
//!
//! The polymorphic interface shared by the three image-generation mechanisms
//! (hosted API, local daemon, in-process model), plus the policy constants
//! applied uniformly to every request.

use image::DynamicImage;

use super::error::GenError;

/// Style suffix appended to every prompt to bias output toward coloring-book
/// line art.
pub const DEFAULT_STYLE: &str = "Coloring book style, black and white line art, high contrast, \
clean lines, no shading, white background, suitable for children's coloring book, \
simple and clear outlines, minimal details, no text, no watermark";

/// Negative prompt applied by every backend.
pub const NEGATIVE_PROMPT: &str = "text, watermark, signature, dark, blurry, shaded, grayscale, \
photo, realistic, complex, detailed";

/// Inference step count. A policy constant, not computed.
pub const NUM_INFERENCE_STEPS: u32 = 30;

/// Classifier-free guidance scale. A policy constant, not computed.
pub const GUIDANCE_SCALE: f64 = 7.5;

/// One fully-resolved generation request handed to a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Full prompt, style suffix already appended.
    pub prompt: String,
    /// Target width in pixels.
    pub width: u32,
    /// Target height in pixels.
    pub height: u32,
}

impl GenerationRequest {
    /// Builds a request from a bare description, appending the style suffix.
    pub fn new(description: &str, width: u32, height: u32) -> Self {
        Self {
            prompt: format!("{}. {}", description, DEFAULT_STYLE),
            width,
            height,
        }
    }
}

/// The capability contract shared by all image-generation backends.
///
/// `generate` takes `&mut self` because the in-process variant owns loaded
/// model state that inference mutates; the network-backed variants simply
/// ignore the exclusivity.
pub trait ImageBackend {
    /// Human-readable backend name, used in logs and the CLI banner.
    fn name(&self) -> &'static str;

    /// Generates one image for the request, or fails for this entry only.
    fn generate(&mut self, request: &GenerationRequest) -> Result<DynamicImage, GenError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_appends_style_suffix() {
        let request = GenerationRequest::new("a red fox", 800, 1000);
        assert!(request.prompt.starts_with("a red fox. Coloring book style"));
        assert_eq!(request.width, 800);
        assert_eq!(request.height, 1000);
    }
}
