//! Batch coloring-book image generator CLI.
//!
//! Reads `filename|description` lines from the input file and generates one
//! image per entry through the selected backend.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use colorwish::generator::hosted::{ReplicateBackend, DEFAULT_MODEL_VERSION};
use colorwish::generator::local::{OllamaBackend, DEFAULT_BASE_URL, DEFAULT_MODEL};
use colorwish::generator::{
    read_prompt_entries, BatchRunner, GenError, ImageBackend, MissingSeparator, RunSummary,
};

#[derive(Parser, Debug)]
#[command(name = "generate")]
#[command(about = "Generate coloring book images from a prompt description file")]
struct Args {
    /// Input file with image descriptions (`filename|description` per line)
    #[arg(long, short = 'i', default_value = "img_desc.txt")]
    input: PathBuf,

    /// Output directory for generated images
    #[arg(long, short = 'o', default_value = "generated_images")]
    output: PathBuf,

    /// Image generation backend
    #[arg(long, value_enum, default_value_t = Backend::Hosted)]
    backend: Backend,

    /// Model name/version (defaults to the backend's standard model)
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Default image width for filenames matching no preset
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Default image height for filenames matching no preset
    #[arg(long, default_value_t = 1000)]
    height: u32,

    /// Skip entries whose output file already exists
    #[arg(long)]
    skip_existing: bool,

    /// What to do with entry lines that have no `|` separator
    #[arg(long, value_enum, default_value_t = SeparatorPolicy::Skip)]
    on_missing_separator: SeparatorPolicy,

    /// Base URL of the local inference daemon (local backend)
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// List the local daemon's available models and exit (local backend)
    #[arg(long)]
    list_models: bool,

    /// Force CPU mode (diffusion backend)
    #[cfg(feature = "diffusion")]
    #[arg(long)]
    cpu: bool,

    /// Deterministic seed for reproducible output (diffusion backend)
    #[cfg(feature = "diffusion")]
    #[arg(long)]
    seed: Option<u64>,

    /// Run inference in reduced (f16) precision (diffusion backend)
    #[cfg(feature = "diffusion")]
    #[arg(long)]
    fp16: bool,

    /// Enable sliced attention for lower memory usage (diffusion backend)
    #[cfg(feature = "diffusion")]
    #[arg(long)]
    attention_slicing: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Backend {
    /// Hosted inference API (requires REPLICATE_API_TOKEN)
    Hosted,
    /// Local Ollama-compatible daemon
    Local,
    /// In-process Stable Diffusion (requires the `diffusion` build feature)
    #[cfg(feature = "diffusion")]
    Diffusion,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum SeparatorPolicy {
    Skip,
    Synthesize,
}

impl From<SeparatorPolicy> for MissingSeparator {
    fn from(policy: SeparatorPolicy) -> Self {
        match policy {
            SeparatorPolicy::Skip => MissingSeparator::Skip,
            SeparatorPolicy::Synthesize => MissingSeparator::Synthesize,
        }
    }
}

fn build_backend(args: &Args) -> Result<Box<dyn ImageBackend>, GenError> {
    match args.backend {
        Backend::Hosted => {
            // Fatal before any work starts: the hosted backend is unusable
            // without the API token.
            let api_token = std::env::var("REPLICATE_API_TOKEN").map_err(|_| {
                GenError::Config(
                    "REPLICATE_API_TOKEN is not set. Add it to your .env file; \
                     get a free API key at https://replicate.com/account/api-tokens"
                        .into(),
                )
            })?;
            let model = args
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL_VERSION.to_string());
            Ok(Box::new(ReplicateBackend::new(api_token, model)?))
        }
        Backend::Local => {
            let model = args.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string());
            Ok(Box::new(OllamaBackend::new(args.base_url.clone(), model)?))
        }
        #[cfg(feature = "diffusion")]
        Backend::Diffusion => {
            use colorwish::generator::diffusion::{
                DeviceRequest, DiffusionBackend, DiffusionConfig, DEFAULT_MODEL_ID,
            };
            let config = DiffusionConfig {
                model_id: args
                    .model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
                device: if args.cpu {
                    DeviceRequest::Cpu
                } else {
                    DeviceRequest::Auto
                },
                seed: args.seed,
                reduced_precision: args.fp16,
                attention_slicing: args.attention_slicing,
            };
            Ok(Box::new(DiffusionBackend::load(&config)?))
        }
    }
}

fn run(args: &Args) -> Result<Option<RunSummary>, GenError> {
    if args.list_models {
        let model = args.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let daemon = OllamaBackend::new(args.base_url.clone(), model)?;
        let models = daemon.list_models()?;
        println!("\nAvailable models:");
        for model in &models {
            println!("- {} (digest: {})", model.name, model.digest);
        }
        return Ok(None);
    }

    println!("Reading image descriptions from: {}", args.input.display());
    let entries = read_prompt_entries(&args.input, args.on_missing_separator.into())?;

    if entries.is_empty() {
        println!("No valid image descriptions found.");
        return Ok(None);
    }

    println!("Found {} images to generate", entries.len());
    println!("Output directory: {}", args.output.display());

    let mut backend = build_backend(args)?;
    println!("Using backend: {}", backend.name());
    println!("{}\n", "=".repeat(50));

    let runner = BatchRunner::new(args.output.clone(), args.width, args.height)
        .skip_existing(args.skip_existing);
    Ok(Some(runner.run(backend.as_mut(), &entries)))
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    println!("{}", "=".repeat(50));
    println!("ColorWish AI - Image Generator");
    println!("{}", "=".repeat(50));

    match run(&args) {
        Ok(Some(summary)) => {
            println!("\n{}", "=".repeat(50));
            println!("Image generation complete!");
            println!(
                "Successfully generated: {}/{} images",
                summary.succeeded, summary.attempted
            );
            println!("Output directory: {}", summary.output_dir.display());
            println!("{}", "=".repeat(50));
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
