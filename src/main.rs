//! posture-guardian: writing-posture checking service.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use posture_guardian::api::{self, AppState};
use posture_guardian::config::Config;
use posture_guardian::detector::Detector;
use posture_guardian::records::RecordStore;
use posture_guardian::tts::TtsClient;
use posture_guardian::vision::VisionClient;

#[derive(Parser, Debug)]
#[command(name = "posture-guardian", about = "Writing-posture checking service")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen host
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // RUST_LOG wins; otherwise keep hyper/reqwest internals quiet
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if args.verbose {
            EnvFilter::new("debug,hyper=info,reqwest=info")
        } else {
            EnvFilter::new("info,hyper=warn,reqwest=warn")
        }
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("posture-guardian starting");

    let mut config = Config::load(args.config.as_deref());
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let store = Arc::new(RecordStore::open(&config.store.dir)?);
    let vision = Arc::new(VisionClient::new(config.vision.clone())?);
    let speech = Arc::new(TtsClient::new(config.tts.clone())?);
    let detector = Arc::new(Detector::new(vision, speech, store.clone()));

    let state = AppState {
        detector,
        store,
        static_dir: config.server.static_dir.clone(),
    };

    api::serve(state, &config.server.bind_addr()).await?;

    Ok(())
}
