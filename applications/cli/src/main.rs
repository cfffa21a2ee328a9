/// Cadence - terminal player for the Cadence transport
use anyhow::Context;
use cadence_cli::commands::{self, Command, Reply};
use cadence_cli::config::AppConfig;
use cadence_cli::engine::SimulatedEngine;
use cadence_core::{TrackCatalog, TrackId};
use cadence_playback::{RepeatMode, TransportController, TransportEvent, TransportHandle};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Queue tracks and drive playback from the terminal", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./cadence.toml if present)
    #[arg(short, long, global = true, env = "CADENCE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the catalog by title
    Search {
        /// Title fragment (empty lists everything)
        #[arg(default_value = "")]
        query: String,
    },
    /// Load a queue and start an interactive session
    Play {
        /// Track ids to queue (default: the whole catalog)
        ids: Vec<String>,
        /// Queue position to start from (1-based)
        #[arg(short, long, default_value_t = 1)]
        start: usize,
        /// Start with shuffle on
        #[arg(long)]
        shuffle: bool,
        /// Initial repeat mode: off, track or queue
        #[arg(long)]
        repeat: Option<RepeatMode>,
        /// Playback speed multiplier for the simulated engine
        #[arg(long, default_value_t = 1)]
        speed: u32,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interleave with command replies
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cadence=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Search { query } => search(&config, &query).await?,
        Commands::Play {
            ids,
            start,
            shuffle,
            repeat,
            speed,
        } => {
            let mut config = config;
            config.playback.shuffle |= shuffle;
            if let Some(mode) = repeat {
                config.playback.repeat = mode;
            }
            let ids: Vec<TrackId> = ids.into_iter().map(TrackId::from).collect();
            play(config, ids, start.saturating_sub(1), speed).await?;
        }
        Commands::Config => {
            let rendered =
                toml::to_string_pretty(&config).context("Failed to render configuration")?;
            println!("{rendered}");
        }
    }

    Ok(())
}

async fn search(config: &AppConfig, query: &str) -> anyhow::Result<()> {
    let catalog = cadence_cli::build_catalog(config)?;
    let tracks = catalog.search_tracks(query).await?;

    if tracks.is_empty() {
        println!("No tracks match '{query}'");
        return Ok(());
    }

    for track in tracks {
        println!(
            "{:>6}  {}  {} ({})",
            track.id,
            track.title,
            track.artist_name,
            commands::format_time(track.duration_ms)
        );
    }
    Ok(())
}

async fn play(config: AppConfig, ids: Vec<TrackId>, start: usize, speed: u32) -> anyhow::Result<()> {
    let catalog = cadence_cli::build_catalog(&config)?;
    let tracks = cadence_cli::resolve_queue(catalog.as_ref(), &ids).await?;

    let (engine_tx, engine_rx) = mpsc::unbounded_channel();
    let engine = SimulatedEngine::new(engine_tx, Duration::from_millis(250), speed)
        .with_durations(cadence_cli::durations(&tracks));

    let handle = TransportController::new(config.playback.clone(), Arc::new(engine))
        .with_catalog(catalog)
        .with_engine_events(engine_rx)
        .spawn();

    let printer = tokio::spawn(print_events(handle.subscribe()));

    let queue: Vec<TrackId> = tracks.into_iter().map(|track| track.id).collect();
    handle.load(queue, start).await?;
    handle.play().await?;

    println!("Type 'help' for commands.");
    let result = repl(&handle).await;

    handle.shutdown().await;
    printer.abort();
    result
}

async fn repl(handle: &TransportHandle) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let command: Command = match line.parse() {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };

        match commands::execute(handle, command).await {
            Ok(Reply::Message(message)) => println!("{message}"),
            Ok(Reply::Quit) => break,
            Err(err) => println!("error: {err}"),
        }
    }

    Ok(())
}

async fn print_events(mut events: broadcast::Receiver<TransportEvent>) {
    loop {
        match events.recv().await {
            Ok(TransportEvent::TrackChanged { track_id, .. }) => println!("-> now playing {track_id}"),
            Ok(TransportEvent::StateChanged { state }) => println!("-> {state:?}"),
            Ok(TransportEvent::EndOfQueue) => println!("-> end of queue"),
            Ok(TransportEvent::Error { message }) => println!("-> playback error: {message}"),
            // Position ticks are too chatty for the terminal
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Event printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
