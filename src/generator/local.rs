//!
//! # Local-Daemon Backend
//!
//! Talks to a locally running Ollama-compatible inference daemon over HTTP.
//! The daemon's generate endpoint returns the image as a base64 payload
//! embedded in the JSON response.

use base64::engine::general_purpose;
use base64::Engine;
use image::DynamicImage;
use serde::Deserialize;
use serde_json::json;

use super::backend::{GenerationRequest, ImageBackend, GUIDANCE_SCALE, NEGATIVE_PROMPT, NUM_INFERENCE_STEPS};
use super::error::GenError;

/// Default daemon address (Ollama's standard port).
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model tag to ask the daemon for.
pub const DEFAULT_MODEL: &str = "sdxl";

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    /// Base64-encoded image payload.
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub digest: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

/// Backend that generates through a local inference daemon.
pub struct OllamaBackend {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    pub fn new(base_url: String, model: String) -> Result<Self, GenError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| GenError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    /// Lists the models the daemon has pulled, for the CLI's `--list-models`.
    pub fn list_models(&self) -> Result<Vec<ModelInfo>, GenError> {
        let response: TagsResponse = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()?
            .error_for_status()?
            .json()?;
        Ok(response.models)
    }
}

impl ImageBackend for OllamaBackend {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn generate(&mut self, request: &GenerationRequest) -> Result<DynamicImage, GenError> {
        let body = json!({
            "model": self.model,
            "prompt": request.prompt,
            "stream": false,
            "options": {
                "num_inference_steps": NUM_INFERENCE_STEPS,
                "guidance_scale": GUIDANCE_SCALE,
                "width": request.width,
                "height": request.height,
                "negative_prompt": NEGATIVE_PROMPT,
            },
        });

        let response: GenerateResponse = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;

        if let Some(error) = response.error {
            return Err(GenError::Backend(format!("daemon error: {}", error)));
        }

        let encoded = response
            .image
            .ok_or_else(|| GenError::Backend("daemon response carried no image".into()))?;

        let bytes = general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| GenError::Image(format!("invalid base64 image payload: {}", e)))?;

        Ok(image::load_from_memory(&bytes)?)
    }
}
