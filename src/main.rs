//! cartoonify CLI - stylize a photograph as a cartoon.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cartoonify::{
    image::save_image, CartoonConfig, CartoonPipeline, Device, Style, StyleRegistry,
    StylizeConfig, StylizePipeline,
};

/// Stylize a photograph with a classical cartoon filter or a pretrained
/// generator network.
#[derive(Parser, Debug)]
#[command(name = "cartoonify")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply the classical cartoon filter chain.
    Cartoon {
        /// Input image path.
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output image path.
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,

        /// Number of quantization clusters.
        #[arg(short = 'k', long, default_value = "5", value_name = "INT")]
        clusters: usize,

        /// Bilateral filter neighborhood radius.
        #[arg(long, default_value = "3", value_name = "INT")]
        bilateral_radius: u32,

        /// Adaptive threshold block size (odd).
        #[arg(long, default_value = "3", value_name = "INT")]
        block_size: u32,

        /// Morphology structuring element side length (odd).
        #[arg(long, default_value = "1", value_name = "INT")]
        kernel_size: u32,

        /// Erosion/dilation iteration count.
        #[arg(long, default_value = "3", value_name = "INT")]
        iterations: u32,

        /// Random seed for K-means centroid initialization.
        #[arg(long, value_name = "INT")]
        seed: Option<u64>,

        /// Output JPEG quality (1-100).
        #[arg(short, long, default_value = "95", value_name = "INT")]
        quality: u8,
    },

    /// Run a pretrained style-transfer generator.
    Stylize {
        /// Input image path.
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output image path.
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,

        /// Style to apply (Hosoda, Hayao, Shinkai, or Paprika).
        #[arg(short, long, value_name = "STYLE")]
        style: Style,

        /// Directory holding the pretrained weight archives.
        #[arg(short, long, value_name = "DIR")]
        models_dir: PathBuf,

        /// Target size for the longer image edge.
        #[arg(long, default_value = "450", value_name = "INT")]
        load_size: u32,

        /// Run the forward pass on the GPU.
        #[arg(long)]
        gpu: bool,

        /// Output JPEG quality (1-100).
        #[arg(short, long, default_value = "95", value_name = "INT")]
        quality: u8,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("cartoonify={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Err(err) = run(args) {
        tracing::error!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(args: Args) -> Result<()> {
    match args.command {
        Command::Cartoon {
            input,
            output,
            clusters,
            bilateral_radius,
            block_size,
            kernel_size,
            iterations,
            seed,
            quality,
        } => {
            let config = CartoonConfig {
                clusters,
                bilateral_radius,
                block_size,
                morph_kernel_size: kernel_size,
                morph_iterations: iterations,
                seed,
                ..CartoonConfig::default()
            };

            let pipeline = CartoonPipeline::new(config).context("invalid filter configuration")?;
            let cartoon = pipeline
                .process(&input)
                .context("failed to cartoonify image")?;
            save_image(&cartoon, &output, quality).context("failed to save output")?;

            println!("Cartoonified {} -> {}", input.display(), output.display());
        }

        Command::Stylize {
            input,
            output,
            style,
            models_dir,
            load_size,
            gpu,
            quality,
        } => {
            let config = StylizeConfig {
                style,
                load_size,
                device: if gpu { Device::Gpu } else { Device::Cpu },
            };

            let registry =
                StyleRegistry::load_styles(&models_dir, &[style]).context("failed to load model")?;
            let pipeline = StylizePipeline::new(&registry, config)
                .context("failed to initialize pipeline")?;
            let stylized = pipeline.process(&input).context("failed to stylize image")?;
            save_image(&stylized, &output, quality).context("failed to save output")?;

            println!(
                "Stylized {} as {} -> {}",
                input.display(),
                style,
                output.display()
            );
        }
    }

    Ok(())
}
