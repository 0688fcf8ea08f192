//! Hanzi Tutor - main entry point
//!
//! Subcommands:
//! - `serve` (default): HTTP/SSE API for the tutor UI
//! - `import [DIR]`: rebuild the character catalog from reference data
//! - `assess-audio WAV`: rate a pronunciation clip from a file

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hanzi_common::config::TomlConfig;
use hanzi_common::events::EventBus;
use hanzi_tutor::api::{self, AppContext};
use hanzi_tutor::audio::{read_wav, UnavailableDevice};
use hanzi_tutor::catalog::{self, CatalogSource, CATALOG_VERSION};
use hanzi_tutor::config::TutorConfig;
use hanzi_tutor::recognition::{HandwritingRecognizer, NullRecognizer, RemoteRecognizer};
use hanzi_tutor::reference::FileReferenceData;
use hanzi_tutor::scoring::{assess, AudioFeatures};
use hanzi_tutor::session::Collaborators;
use hanzi_tutor::speech::LoggingSpeech;
use hanzi_tutor::SharedState;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Phrase list looked up next to the reference data
const PHRASES_FILE: &str = "quiz.json";

/// Command-line arguments for hanzi-tutor
#[derive(Parser, Debug)]
#[command(name = "hanzi-tutor")]
#[command(about = "Chinese character handwriting and pronunciation tutor")]
#[command(version)]
struct Args {
    /// Root folder holding the database and reference data
    #[arg(short, long, global = true)]
    root_folder: Option<String>,

    /// Port to listen on
    #[arg(short, long, global = true, env = "HANZI_PORT")]
    port: Option<u16>,

    /// Base URL of the handwriting recognizer service
    #[arg(long, global = true, env = "HANZI_RECOGNIZER_URL")]
    recognizer_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the tutor API (default)
    Serve,

    /// Rebuild the character catalog
    Import {
        /// Directory of per-character reference files (defaults to the root folder's data)
        dir: Option<PathBuf>,

        /// Phrase list used for example words
        #[arg(long)]
        phrases: Option<PathBuf>,

        /// Grade map replacing the built-in one
        #[arg(long)]
        grades: Option<PathBuf>,

        /// Import even when the catalog is up to date
        #[arg(long)]
        force: bool,
    },

    /// Rate a 16 kHz mono WAV clip
    AssessAudio {
        wav: PathBuf,

        /// Character the clip should pronounce
        #[arg(long, default_value = "")]
        character: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hanzi_tutor=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let toml_config = TomlConfig::load_or_default();
    let config = TutorConfig::resolve(
        args.root_folder.as_deref(),
        args.port,
        args.recognizer_url.as_deref(),
        Some(&toml_config),
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Import {
            dir,
            phrases,
            grades,
            force,
        } => import(config, dir, phrases, grades, force).await,
        Command::AssessAudio { wav, character } => assess_audio(wav, &character),
    }
}

async fn serve(config: TutorConfig) -> Result<()> {
    info!("Starting Hanzi Tutor on port {}", config.port);
    info!("Root folder: {}", config.root_folder.display());

    let db = hanzi_common::db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let mut source = CatalogSource::new(&config.data_dir);
    let phrases = config.data_dir.join(PHRASES_FILE);
    if phrases.exists() {
        source = source.with_phrases(phrases);
    }
    if config.data_dir.is_dir() {
        if let Err(e) = catalog::import_if_stale(&db, &source, CATALOG_VERSION).await {
            warn!("Character catalog import failed: {}", e);
        }
    } else {
        warn!("No reference data directory at {}", config.data_dir.display());
    }

    let recognizer: Arc<dyn HandwritingRecognizer> = match &config.recognizer_url {
        Some(url) => {
            let remote = RemoteRecognizer::new(url).context("Failed to create recognizer client")?;
            info!("Using handwriting recognizer at {}", remote.endpoint());
            Arc::new(remote)
        }
        None => {
            warn!("No recognizer configured; handwriting will never be recognized");
            Arc::new(NullRecognizer)
        }
    };

    let collaborators = Collaborators {
        recognizer,
        reference: Arc::new(FileReferenceData::new(&config.data_dir)),
        speech: Arc::new(LoggingSpeech),
        audio: Arc::new(UnavailableDevice),
    };

    let state = Arc::new(SharedState::new(db, Arc::new(EventBus::default()), collaborators));
    let app = api::create_router(AppContext {
        state: Arc::clone(&state),
        port: config.port,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Flush learning time of everyone still practising
    state.stop_all().await;

    info!("Server shutdown complete");
    Ok(())
}

async fn import(
    config: TutorConfig,
    dir: Option<PathBuf>,
    phrases: Option<PathBuf>,
    grades: Option<PathBuf>,
    force: bool,
) -> Result<()> {
    let db = hanzi_common::db::init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let dir = dir.unwrap_or_else(|| config.data_dir.clone());
    let mut source = CatalogSource::new(&dir);
    if let Some(phrases) = phrases.or_else(|| Some(dir.join(PHRASES_FILE)).filter(|p| p.exists())) {
        source = source.with_phrases(phrases);
    }
    if let Some(grades) = grades {
        source = source.with_grades(grades);
    }

    let imported = if force {
        Some(catalog::import_catalog(&db, &source, CATALOG_VERSION).await?)
    } else {
        catalog::import_if_stale(&db, &source, CATALOG_VERSION).await?
    };

    match imported {
        Some(count) => println!("Imported {} characters from {}", count, dir.display()),
        None => println!("Catalog already at version {} (use --force to re-import)", CATALOG_VERSION),
    }
    Ok(())
}

fn assess_audio(wav: PathBuf, character: &str) -> Result<()> {
    let samples = read_wav(&wav).with_context(|| format!("Failed to read {}", wav.display()))?;

    match AudioFeatures::from_samples(&samples) {
        Some(features) => println!(
            "duration {:.2}s, average {:.3}, peak {:.3}, silence {:.0}%",
            features.duration,
            features.avg_energy,
            features.peak_energy,
            features.silence_ratio * 100.0
        ),
        None => println!("empty clip"),
    }
    println!("stars: {}", assess(&samples, character));
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
