//! derain CLI - Remove rain streaks from photographs.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use derain::{FrequencyMode, ModelStore, Pipeline, RestoreConfig};

/// Remove rain streaks from photographs using frequency-domain restoration.
#[derive(Parser, Debug)]
#[command(name = "derain")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input image paths.
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Output image path (single input only).
    #[arg(short, long, value_name = "OUTPUT", conflicts_with = "out_dir")]
    output: Option<PathBuf>,

    /// Directory to write restored images to, keeping their file names.
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// ONNX weights file. Defaults to the platform cache directory.
    #[arg(long, value_name = "PATH")]
    model: Option<PathBuf>,

    /// Download weights from this URL if they are not present yet.
    #[arg(long, value_name = "URL")]
    model_url: Option<String>,

    /// Spectrum representation fed to the model (real_imag or mag_phase).
    #[arg(long, default_value = "real_imag", value_name = "MODE")]
    mode: String,

    /// Skip recombining restored brightness with the original colours.
    #[arg(long)]
    no_blend: bool,

    /// Apply gamma lift and local contrast equalization.
    #[arg(long)]
    enhance: bool,

    /// Output JPEG quality (1-100).
    #[arg(short, long, default_value = "95", value_name = "INT")]
    quality: u8,

    /// Keep the 256x256 working resolution instead of resizing back.
    #[arg(long)]
    no_resize_back: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("derain={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(&args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: &Args) -> Result<()> {
    if args.output.is_some() && args.inputs.len() > 1 {
        anyhow::bail!("--output takes a single input; use --out-dir for several");
    }
    for input in &args.inputs {
        if !input.exists() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }
    }

    if let Some(dir) = &args.out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let mode: FrequencyMode = args.mode.parse().context("Invalid --mode")?;
    let config = RestoreConfig {
        mode,
        blend_luminance: !args.no_blend,
        enhance_contrast: args.enhance,
        output_quality: args.quality,
        keep_original_size: !args.no_resize_back,
    };
    let pipeline = Pipeline::new(config).context("Failed to initialize pipeline")?;

    let store = match &args.model {
        Some(path) => ModelStore::at(path),
        None => ModelStore::new().context("Failed to prepare model cache")?,
    };
    tracing::debug!("Model weights: {}", store.weights_path().display());
    if let Some(url) = &args.model_url {
        store.fetch(url).context("Failed to fetch model weights")?;
    }
    let estimator = store
        .load_estimator()
        .context("Failed to load model weights")?;

    let pb = if args.inputs.len() > 1 {
        let pb = ProgressBar::new(args.inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Restoring [{bar:40.cyan/blue}] {pos}/{len}")
                .expect("valid template")
                .progress_chars("#>-"),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    for input in &args.inputs {
        let output = output_path(args, input);
        pipeline
            .process(estimator.as_ref(), input, &output)
            .with_context(|| format!("Failed to process {}", input.display()))?;
        pb.suspend(|| println!("{} -> {}", input.display(), output.display()));
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(())
}

/// Where the restored version of `input` is written.
fn output_path(args: &Args, input: &Path) -> PathBuf {
    if let Some(output) = &args.output {
        return output.clone();
    }
    if let Some(dir) = &args.out_dir {
        return dir.join(input.file_name().unwrap_or(input.as_os_str()));
    }

    let stem = input
        .file_stem()
        .map_or_else(|| "image".into(), |s| s.to_string_lossy());
    let extension = input
        .extension()
        .map_or_else(|| "png".into(), |e| e.to_string_lossy());
    input.with_file_name(format!("{stem}_derained.{extension}"))
}
