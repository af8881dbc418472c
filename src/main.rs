use anyhow::{bail, Context, Result};
use breast_cancer_predict::{
    config::{Config, SampleDirs},
    image::ImageLoader,
    models::{get_model_stats, Model, ModelManager},
    predict::{predict_image_detailed, Prediction},
    ComputeTarget,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "breast-cancer-predict")]
#[command(about = "Classify breast histopathology images as Benign or Malignant")]
struct Args {
    /// ONNX model path
    #[arg(long, global = true, default_value = breast_cancer_predict::config::DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Intra-op CPU threads
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Never use an accelerator
    #[arg(long, global = true)]
    cpu: bool,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict one or more image files
    Predict {
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Predict every image in the sample folders
    Samples {
        #[arg(long, default_value = "utils/test_data")]
        test_dir: PathBuf,

        #[arg(long, default_value = "utils/user_images")]
        user_dir: PathBuf,
    },

    /// Show the loaded model's signature and runtime settings
    Info,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Model path: {}", args.model.display());

    let mut config = Config::new(args.model.clone(), args.threads, !args.cpu)?;
    if let Command::Samples { test_dir, user_dir } = &args.command {
        config = config.with_samples(SampleDirs {
            test_dir: test_dir.clone(),
            user_dir: user_dir.clone(),
        });
    }

    // A model that fails to load is fatal; nothing is predicted.
    let manager = ModelManager::init(config).context("failed to load classifier")?;
    let target = manager.target();
    let model = manager.model();

    match &args.command {
        Command::Predict { images } => run_batch(images, &target, model.as_ref(), args.json),
        Command::Samples { .. } => {
            let samples = &manager.config().samples;
            let mut images = ImageLoader::list_images(&samples.test_dir)?;
            images.extend(ImageLoader::list_images(&samples.user_dir)?);
            if images.is_empty() {
                tracing::warn!(
                    "No images found in {} or {}",
                    samples.test_dir.display(),
                    samples.user_dir.display()
                );
                return Ok(());
            }
            run_batch(&images, &target, model.as_ref(), args.json)
        }
        Command::Info => {
            let stats = get_model_stats()?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("target:        {}", stats.target);
                println!("model:         {}", stats.model_path.display());
                println!("input:         {} {:?}", stats.input_name, stats.input_dims);
                println!("output:        {}", stats.output_name);
                println!("intra threads: {}", stats.intra_threads);
                println!("optimization:  level {}", stats.optimization_level);
            }
            Ok(())
        }
    }
}

/// Predict each image in turn. Bad images are reported and skipped; any other
/// failure stops the run.
fn run_batch<M: Model + ?Sized>(
    images: &[PathBuf],
    target: &ComputeTarget,
    model: &M,
    json: bool,
) -> Result<()> {
    let mut predictions: Vec<Prediction> = Vec::with_capacity(images.len());
    let mut failed = 0usize;

    for path in images {
        match predict_image_detailed(path, target, model) {
            Ok(prediction) => {
                if !json {
                    println!("{}: {}", path.display(), prediction.label);
                }
                predictions.push(prediction);
            }
            Err(e) if e.is_recoverable() => {
                tracing::error!("{}: {} ({})", path.display(), e, e.error_code());
                failed += 1;
            }
            Err(e) => return Err(e).with_context(|| format!("prediction failed for {}", path.display())),
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&predictions)?);
    }

    if failed > 0 {
        bail!("{} of {} images could not be classified", failed, images.len());
    }
    Ok(())
}
