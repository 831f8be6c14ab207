//! LoopCam - scene-to-loop installation runtime
//!
//! Reads controller lines from a serial device (or stdin), turns captures
//! into generated clips and loops them per instrument until EOF or ctrl-c.

mod config;

use anyhow::{Context, Result};
use config::{AppConfig, Args};
use loopcam_audio::{Mixer, MixerBackend, NullBackend, PlayerBackend, TrackManager};
use loopcam_control::{
    controller, Collaborators, ControlCommand, PlaceholderGenerator, Session, StaticDescriber,
    StillFrame,
};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("LoopCam starting...");

    let args = Args::parse(std::env::args().skip(1));
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = &args.export_dir {
        config.session.export_dir = dir.clone();
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("building runtime")?;
    runtime.block_on(run(args, config))
}

async fn open_controller(args: &Args) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match &args.serial {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening controller {}", path.display()))?;
            info!(path = %path.display(), "Reading controller from device");
            Ok(Box::new(BufReader::new(file)))
        }
        None => {
            info!("Reading controller from stdin");
            Ok(Box::new(BufReader::new(tokio::io::stdin())))
        }
    }
}

async fn run(args: Args, config: AppConfig) -> Result<()> {
    let mixer = Mixer::shared(config.mixer.clone());

    #[cfg(feature = "device")]
    let _output = if args.headless {
        None
    } else {
        Some(loopcam_audio::OutputStream::open_default(Arc::clone(&mixer))?)
    };
    #[cfg(not(feature = "device"))]
    if !args.headless {
        warn!("Built without the device feature; mixer output is not audible");
    }

    let backend: Arc<dyn PlayerBackend> = if args.headless {
        Arc::new(NullBackend::new())
    } else {
        Arc::new(MixerBackend::new(mixer))
    };
    let tracks = TrackManager::new(config.tracks.clone(), backend);

    let frame = match &args.frame {
        Some(path) => tokio::fs::read(path)
            .await
            .with_context(|| format!("reading frame {}", path.display()))?,
        None => Vec::new(),
    };
    let describer = match config.scene_reply.clone() {
        Some(reply) => StaticDescriber::new(reply),
        None => StaticDescriber::default(),
    };
    let mut session = Session::new(
        config.session.clone(),
        tracks.clone(),
        Collaborators {
            frames: Arc::new(StillFrame::new(frame)),
            describer: Arc::new(describer),
            generator: Arc::new(PlaceholderGenerator),
        },
    );

    let (tx, mut rx) = mpsc::channel::<ControlCommand>(32);
    let reader = open_controller(&args).await?;
    let input = tokio::spawn(controller::run_lines(reader, tx));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            command = rx.recv() => {
                let Some(command) = command else { break };
                match session.handle(command).await {
                    Ok(event) => info!(?event, "Command applied"),
                    Err(e) if e.is_upstream() => warn!(error = %e, "Upstream failure"),
                    Err(e) => error!(error = %e, ?command, "Command failed"),
                }
            }
            _ = &mut shutdown => {
                info!("Interrupted");
                break;
            }
        }
    }

    input.abort();
    tracks.stop_all().await;
    info!("LoopCam stopped");
    Ok(())
}
