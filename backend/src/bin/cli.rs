//! Offline tooling: train model artifacts from the dataset and run local
//! predictions without the oracle.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::Rng;
use serde_json::json;

use crop_advisory::{
    ml::{train_model, ArtifactPaths},
    services::{load_dataset, pipeline::local_predict, ModelRegistry},
    Config,
};
use shared::{build_advisory, normalize_request, variant_count, weather_summary};

#[derive(Parser)]
#[command(author, version, about = "Crop Health Advisory offline tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the encoder and classifier from the dataset and write both artifacts
    Train {
        #[arg(long, value_name = "FILE")]
        dataset: Option<PathBuf>,

        #[arg(long, value_name = "FILE")]
        model_out: Option<PathBuf>,

        #[arg(long, value_name = "FILE")]
        encoder_out: Option<PathBuf>,
    },

    /// Predict with the local classifier only
    Predict {
        #[arg(long)]
        crop: String,

        #[arg(long)]
        location: String,

        #[arg(long)]
        soil: String,

        #[arg(long, default_value = "unknown")]
        weather: String,

        #[arg(long, default_value_t = 0.0)]
        temperature: f64,

        #[arg(long, default_value_t = 0.0)]
        humidity: f64,

        #[arg(long, default_value_t = 0.0)]
        rainfall: f64,

        #[arg(long, default_value = "farmer")]
        farmer_name: String,

        #[arg(long, default_value_t = 0)]
        days_since_planting: u32,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::load().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .init();

    match cli.command {
        Commands::Train {
            dataset,
            model_out,
            encoder_out,
        } => {
            let dataset = dataset.unwrap_or_else(|| config.data.dataset_path.clone());
            let paths = ArtifactPaths::new(
                model_out.unwrap_or_else(|| config.data.model_path.clone()),
                encoder_out.unwrap_or_else(|| config.data.encoder_path.clone()),
            );

            let examples = load_dataset(&dataset)
                .with_context(|| format!("Failed to read dataset {}", dataset.display()))?;
            let model = train_model(&examples, &config.training.params()).context("Training failed")?;
            paths.save(&model).context("Failed to write artifacts")?;

            let report = &model.report;
            println!("Trained on {} rows ({} train / {} validation)", report.rows, report.train_rows, report.validation_rows);
            println!("Classes: {}", report.classes.join(", "));
            println!("Train accuracy: {:.3}", report.train_accuracy);
            println!("Validation accuracy: {:.3}", report.validation_accuracy);
            println!("Model written to {}", paths.model.display());
            println!("Encoder written to {}", paths.encoder.display());
        }
        Commands::Predict {
            crop,
            location,
            soil,
            weather,
            temperature,
            humidity,
            rainfall,
            farmer_name,
            days_since_planting,
        } => {
            let record = normalize_request(json!({
                "crop": crop,
                "location": location,
                "soil": soil,
                "weather": weather,
                "temperature": temperature,
                "humidity": humidity,
                "rainfall": rainfall,
                "farmer_name": farmer_name,
                "days_since_planting": days_since_planting,
            }))?;

            let paths = config.data.artifact_paths();
            let (classifier, encoder) = paths.load().context("Failed to load model artifacts")?;
            let registry = ModelRegistry::new(encoder, classifier.forest, classifier.report);

            let prediction = local_predict(&registry.current(), &record)?;
            let variant = rand::thread_rng().gen_range(0..variant_count(&prediction.label).max(1));

            println!("Label: {}", prediction.label);
            println!("Confidence: {:.3}", prediction.confidence);
            if prediction.confidence < config.inference.confidence_threshold {
                println!(
                    "Below the {:.2} threshold; the server would ask the oracle instead.",
                    config.inference.confidence_threshold
                );
            }
            println!();
            println!("{}", build_advisory(&prediction.label, &record, variant));
            println!();
            println!("{}", weather_summary(&record));
        }
    }

    Ok(())
}
