//! TextCamera - recognize the text in a photo from the command line

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use text_camera::config::{self, AppConfig};
use text_camera::vision::{self, OcrBackend, RecognitionLanguage};

/// TextCamera - photo to text
#[derive(Parser, Debug)]
#[command(name = "text-camera")]
#[command(about = "Recognize the text in a photographed document")]
struct Args {
    /// Configuration file (defaults to config.toml in the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Recognize the text in an image file
    Recognize {
        /// Image to recognize
        image: PathBuf,

        /// Recognition language tag (e.g. en-US, ko-KR)
        #[arg(short, long)]
        language: Option<String>,

        /// OCR backend
        #[arg(long, value_enum)]
        backend: Option<OcrBackend>,

        /// Number of bands the image height is divided by
        #[arg(long)]
        divisions: Option<u32>,

        /// Drop repeated lines read in two overlapping patches
        #[arg(long)]
        dedup: bool,

        /// Print the merged result as JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// List the supported recognition languages
    Languages {
        /// Also list the languages the configured backend has installed
        #[arg(long)]
        installed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout is reserved for recognized text
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut config = load_or_create_config(args.config.as_deref());

    match args.command {
        Command::Languages { installed } => {
            for lang in RecognitionLanguage::ALL {
                println!("{:<8} {}", lang.tag(), lang.display_name());
            }
            if installed {
                let backend = config.recognition.backend;
                let languages = vision::installed_languages(backend, &config.tesseract)?;
                println!();
                println!("Installed for {:?}: {}", backend, languages.join(", "));
            }
        }
        Command::Recognize {
            image,
            language,
            backend,
            divisions,
            dedup,
            json,
        } => {
            if let Some(tag) = language {
                config.recognition.language = tag.parse()?;
            }
            if let Some(backend) = backend {
                config.recognition.backend = backend;
            }
            if let Some(divisions) = divisions {
                config.recognition.division_count = divisions;
            }
            config.recognition.deduplicate_overlaps |= dedup;

            let pipeline = vision::pipeline_from_settings(&config.recognition, &config.tesseract)?;
            let result = pipeline
                .recognize_file(&image)
                .await
                .with_context(|| format!("Failed to recognize {}", image.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.text());
            }
        }
    }

    Ok(())
}

/// Load configuration from file or fall back to defaults
fn load_or_create_config(explicit: Option<&Path>) -> AppConfig {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => config::get_config_dir().ok().map(|dir| dir.join("config.toml")),
    };

    if let Some(path) = path {
        if path.exists() {
            match config::load_config(&path) {
                Ok(config) => {
                    info!("Loaded configuration from {:?}", path);
                    return config;
                }
                Err(e) => tracing::warn!("Ignoring configuration {:?}: {:#}", path, e),
            }
        }
    }

    info!("Using default configuration");
    AppConfig::default()
}
