use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};

use rusty_starclass::config::{self, CONFIG_FILE_NAME};
use rusty_starclass::data::training::verify_training_csv;
use rusty_starclass::{ClassifyError, InferenceService};

/// Exit status for out-of-range inputs.
const EXIT_VALIDATION: u8 = 2;

#[derive(Debug, Parser)]
#[command(
    name = "rusty-starclass",
    version,
    about = "Classify an astronomical object as GALAXY, QSO or STAR from ugriz magnitudes"
)]
struct Cli {
    /// Configuration file (TOML). Defaults apply when it does not exist.
    #[arg(long, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Artifact path, overriding the configuration.
    #[arg(long)]
    model: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Classify one object.
    Classify {
        #[arg(allow_negative_numbers = true)]
        u: f64,
        #[arg(allow_negative_numbers = true)]
        g: f64,
        #[arg(allow_negative_numbers = true)]
        r: f64,
        #[arg(allow_negative_numbers = true)]
        i: f64,
        #[arg(allow_negative_numbers = true)]
        z: f64,
        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Check a prepared training CSV against the model's feature layout.
    CheckTraining { file: PathBuf },
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Classify { u, g, r, i, z, json } => {
            let mut config = config::load_or_default(&cli.config)
                .with_context(|| format!("loading {}", cli.config.display()))?;
            if let Some(model) = cli.model {
                config = config.with_model_path(model);
            }

            // The service is not ready until its artifact is; nothing is served otherwise.
            let service = InferenceService::new(config);
            service.load().context("model unavailable")?;
            info!("service ready");

            match service.classify(u, g, r, i, z) {
                Ok(result) => {
                    if json {
                        println!("{}", serde_json::to_string(&result)?);
                    } else {
                        println!("{result}");
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(ClassifyError::Validation(failure)) => {
                    if json {
                        println!("{}", serde_json::to_string(&failure)?);
                    } else {
                        println!("{failure}");
                    }
                    Ok(ExitCode::from(EXIT_VALIDATION))
                }
                Err(ClassifyError::Artifact(err)) => Err(err).context("model unavailable"),
            }
        }
        Command::CheckTraining { file } => {
            let report = verify_training_csv(&file)?;
            println!("{report}");
            Ok(if report.is_consistent() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}
