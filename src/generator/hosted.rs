//!
//! # Hosted-API Backend
//!
//! Calls Replicate's prediction API: create a prediction, poll it to a
//! terminal state, then download the first output URL and decode it. The
//! image download is the only step with an enforced timeout.

use std::thread;
use std::time::Duration;

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::backend::{GenerationRequest, ImageBackend, GUIDANCE_SCALE, NEGATIVE_PROMPT, NUM_INFERENCE_STEPS};
use super::error::GenError;

/// Stable Diffusion model version pinned by the original batch scripts.
pub const DEFAULT_MODEL_VERSION: &str =
    "stability-ai/stable-diffusion:27b93a2413e7f36cd83da926f3656280b2931564ff050bf9575f1fdf9bcd7478";

const API_BASE: &str = "https://api.replicate.com/v1";
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLLS: u32 = 300;

#[derive(Debug, Serialize)]
struct PredictionCreate<'a> {
    version: &'a str,
    input: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Option<Vec<String>>,
    #[serde(default)]
    error: Option<String>,
}

/// Backend that generates through Replicate's hosted inference API.
pub struct ReplicateBackend {
    client: reqwest::blocking::Client,
    api_token: String,
    model_version: String,
}

impl ReplicateBackend {
    /// Creates a backend for the given API token and model version string
    /// (`owner/name:version-id`).
    pub fn new(api_token: String, model_version: String) -> Result<Self, GenError> {
        if api_token.trim().is_empty() {
            return Err(GenError::Config("REPLICATE_API_TOKEN is empty".into()));
        }
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| GenError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_token,
            model_version,
        })
    }

    /// The model version id is everything after the first `:`; Replicate's
    /// predictions endpoint takes the bare id.
    fn version_id(&self) -> &str {
        self.model_version
            .split_once(':')
            .map(|(_, version)| version)
            .unwrap_or(&self.model_version)
    }

    fn create_prediction(&self, request: &GenerationRequest) -> Result<Prediction, GenError> {
        let body = PredictionCreate {
            version: self.version_id(),
            input: json!({
                "prompt": request.prompt,
                "width": request.width,
                "height": request.height,
                "num_outputs": 1,
                "negative_prompt": NEGATIVE_PROMPT,
                "num_inference_steps": NUM_INFERENCE_STEPS,
                "guidance_scale": GUIDANCE_SCALE,
            }),
        };

        let response = self
            .client
            .post(format!("{}/predictions", API_BASE))
            .header("Authorization", format!("Token {}", self.api_token))
            .json(&body)
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().unwrap_or_default();
            return Err(GenError::Backend(format!(
                "prediction create failed with {}: {}",
                status, text
            )));
        }

        Ok(response.json()?)
    }

    fn poll_prediction(&self, id: &str) -> Result<Prediction, GenError> {
        for _ in 0..MAX_POLLS {
            let prediction: Prediction = self
                .client
                .get(format!("{}/predictions/{}", API_BASE, id))
                .header("Authorization", format!("Token {}", self.api_token))
                .send()?
                .json()?;

            match prediction.status.as_str() {
                "succeeded" => return Ok(prediction),
                "failed" | "canceled" => {
                    return Err(GenError::Backend(format!(
                        "prediction {} {}: {}",
                        prediction.id,
                        prediction.status,
                        prediction.error.unwrap_or_else(|| "no detail".into())
                    )))
                }
                _ => thread::sleep(POLL_INTERVAL),
            }
        }
        Err(GenError::Backend(format!(
            "prediction {} did not finish after {} polls",
            id, MAX_POLLS
        )))
    }

    fn download_image(&self, url: &str) -> Result<DynamicImage, GenError> {
        let response = self
            .client
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()?
            .error_for_status()?;
        let bytes = response.bytes()?;
        Ok(image::load_from_memory(&bytes)?)
    }
}

impl ImageBackend for ReplicateBackend {
    fn name(&self) -> &'static str {
        "replicate"
    }

    fn generate(&mut self, request: &GenerationRequest) -> Result<DynamicImage, GenError> {
        let prediction = self.create_prediction(request)?;
        let finished = self.poll_prediction(&prediction.id)?;

        let url = finished
            .output
            .as_deref()
            .and_then(|urls| urls.first())
            .ok_or_else(|| {
                GenError::Backend(format!("prediction {} returned no output", finished.id))
            })?;

        self.download_image(url)
    }
}
