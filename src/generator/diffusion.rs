//!
//! # In-Process Model Backend
//!
//! Runs Stable Diffusion v1.5 inference in-process via candle. The pipeline
//! (tokenizer, CLIP text encoder, UNet, VAE) is loaded once per run and
//! amortized across entries; the backend value exclusively owns the loaded
//! model and device state, which is released on drop on every exit path.
//!
//! Device, dtype, seed, and the performance knobs (reduced precision,
//! attention slicing) are explicit construction inputs rather than ambient
//! process state.

use candle_core::{DType, Device, IndexOp, Tensor};
use candle_transformers::models::stable_diffusion::{
    self, clip::ClipTextTransformer, unet_2d::UNet2DConditionModel, vae::AutoEncoderKL,
    StableDiffusionConfig,
};
use image::{DynamicImage, RgbImage};
use tokenizers::Tokenizer;

use super::backend::{GenerationRequest, ImageBackend, GUIDANCE_SCALE, NEGATIVE_PROMPT, NUM_INFERENCE_STEPS};
use super::error::GenError;

/// Default model repository on the Hugging Face hub.
pub const DEFAULT_MODEL_ID: &str = "runwayml/stable-diffusion-v1-5";

const VAE_SCALE: f64 = 0.18215;

/// Requested compute device. Explicit; nothing reads ambient device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceRequest {
    /// Use the accelerator if one is available, otherwise fall back to CPU.
    #[default]
    Auto,
    /// Force CPU even when an accelerator is present.
    Cpu,
}

/// Construction inputs for the in-process backend.
#[derive(Debug, Clone)]
pub struct DiffusionConfig {
    /// Hugging Face model id to load weights from.
    pub model_id: String,
    pub device: DeviceRequest,
    /// Deterministic seed for reproducible runs.
    pub seed: Option<u64>,
    /// Run inference in f16. Speed/memory only; ignored on CPU.
    pub reduced_precision: bool,
    /// Enable sliced attention. Speed/memory only.
    pub attention_slicing: bool,
}

impl Default for DiffusionConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            device: DeviceRequest::Auto,
            seed: None,
            reduced_precision: false,
            attention_slicing: false,
        }
    }
}

/// Backend that runs the diffusion model in-process.
pub struct DiffusionBackend {
    device: Device,
    dtype: DType,
    sd_config: StableDiffusionConfig,
    tokenizer: Tokenizer,
    text_model: ClipTextTransformer,
    unet: UNet2DConditionModel,
    vae: AutoEncoderKL,
}

impl DiffusionBackend {
    /// Loads the full pipeline. This downloads the model weights on first
    /// use (several GB) and keeps everything resident until drop.
    pub fn load(config: &DiffusionConfig) -> Result<Self, GenError> {
        let device = match config.device {
            DeviceRequest::Cpu => Device::Cpu,
            DeviceRequest::Auto => Device::cuda_if_available(0)?,
        };
        let dtype = if config.reduced_precision && !device.is_cpu() {
            DType::F16
        } else {
            DType::F32
        };
        if let Some(seed) = config.seed {
            device.set_seed(seed)?;
        }

        log::info!(
            "Loading model {} on {:?} ({:?})...",
            config.model_id,
            device,
            dtype
        );

        let sliced_attention_size = config.attention_slicing.then_some(128);
        let sd_config = StableDiffusionConfig::v1_5(sliced_attention_size, None, None);

        let api = hf_hub::api::sync::Api::new()
            .map_err(|e| GenError::Config(format!("hub API unavailable: {}", e)))?;
        let repo = api.model(config.model_id.clone());
        let fetch = |path: &str| {
            repo.get(path).map_err(|e| {
                GenError::Config(format!("failed to fetch '{}' from the hub: {}", path, e))
            })
        };

        let tokenizer_path = api
            .model("openai/clip-vit-base-patch32".to_string())
            .get("tokenizer.json")
            .map_err(|e| GenError::Config(format!("failed to fetch tokenizer: {}", e)))?;
        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| GenError::Config(format!("failed to load tokenizer: {}", e)))?;

        let clip_weights = fetch("text_encoder/model.safetensors")?;
        let vae_weights = fetch("vae/diffusion_pytorch_model.safetensors")?;
        let unet_weights = fetch("unet/diffusion_pytorch_model.safetensors")?;

        let text_model =
            stable_diffusion::build_clip_transformer(&sd_config.clip, clip_weights, &device, dtype)?;
        let vae = sd_config.build_vae(vae_weights, &device, dtype)?;
        let unet = sd_config.build_unet(unet_weights, &device, 4, false, dtype)?;

        log::info!("Model loaded");
        Ok(Self {
            device,
            dtype,
            sd_config,
            tokenizer,
            text_model,
            unet,
            vae,
        })
    }

    fn encode_prompt(&self, prompt: &str) -> Result<Tensor, GenError> {
        let pad_id = self
            .sd_config
            .clip
            .pad_with
            .as_deref()
            .and_then(|pad| self.tokenizer.get_vocab(true).get(pad).copied())
            .unwrap_or(0);

        let mut tokens = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| GenError::Backend(format!("tokenization failed: {}", e)))?
            .get_ids()
            .to_vec();
        if tokens.len() > self.sd_config.clip.max_position_embeddings {
            tokens.truncate(self.sd_config.clip.max_position_embeddings);
        }
        while tokens.len() < self.sd_config.clip.max_position_embeddings {
            tokens.push(pad_id);
        }

        let tokens = Tensor::new(tokens.as_slice(), &self.device)?.unsqueeze(0)?;
        Ok(self.text_model.forward(&tokens)?)
    }
}

impl ImageBackend for DiffusionBackend {
    fn name(&self) -> &'static str {
        "diffusion"
    }

    fn generate(&mut self, request: &GenerationRequest) -> Result<DynamicImage, GenError> {
        // Latent space is 8x downsampled; dimensions must divide evenly.
        if request.width % 8 != 0 || request.height % 8 != 0 {
            return Err(GenError::Backend(format!(
                "dimensions {}x{} are not multiples of 8",
                request.width, request.height
            )));
        }
        let latent_height = (request.height / 8) as usize;
        let latent_width = (request.width / 8) as usize;

        let text_embeddings = self.encode_prompt(&request.prompt)?;
        let uncond_embeddings = self.encode_prompt(NEGATIVE_PROMPT)?;
        let text_embeddings =
            Tensor::cat(&[uncond_embeddings, text_embeddings], 0)?.to_dtype(self.dtype)?;

        let scheduler = self
            .sd_config
            .build_scheduler(NUM_INFERENCE_STEPS as usize)?;
        let timesteps = scheduler.timesteps().to_vec();

        let latents = Tensor::randn(
            0f32,
            1f32,
            (1, 4, latent_height, latent_width),
            &self.device,
        )?
        .to_dtype(self.dtype)?;
        let mut latents = (latents * scheduler.init_noise_sigma())?;

        for &timestep in timesteps.iter() {
            // Classifier-free guidance: one unconditional and one conditional pass.
            let latent_model_input = Tensor::cat(&[&latents, &latents], 0)?;
            let latent_model_input = scheduler.scale_model_input(latent_model_input, timestep)?;
            let noise_pred =
                self.unet
                    .forward(&latent_model_input, timestep as f64, &text_embeddings)?;

            let noise_pred = noise_pred.chunk(2, 0)?;
            let (noise_pred_uncond, noise_pred_text) = (&noise_pred[0], &noise_pred[1]);
            let noise_pred = (noise_pred_uncond
                + ((noise_pred_text - noise_pred_uncond)? * GUIDANCE_SCALE)?)?;

            latents = scheduler.step(&noise_pred, timestep, &latents)?;
        }

        let image = self.vae.decode(&(&latents / VAE_SCALE)?)?;
        let image = ((image / 2.)? + 0.5)?.clamp(0f32, 1.)?;
        let image = (image.to_device(&Device::Cpu)? * 255.)?
            .to_dtype(DType::U8)?
            .i(0)?;
        let (_channels, height, width) = image.dims3()?;
        let pixels = image.permute((1, 2, 0))?.flatten_all()?.to_vec1::<u8>()?;

        let buffer = RgbImage::from_raw(width as u32, height as u32, pixels)
            .ok_or_else(|| GenError::Image("decoded tensor has unexpected shape".into()))?;
        Ok(DynamicImage::ImageRgb8(buffer))
    }
}
