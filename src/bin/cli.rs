use anyhow::{anyhow, bail, Context, Result};
use duocam::capture::{CaptureSessionController, OutcomeSource};
use duocam::config::DuoCamConfig;
use duocam::feed::{FeedSource, MockFeedSource};
use duocam::library::{open_library, DirectoryMediaLibrary, FileKeyValueStore, LibraryStore};
use duocam::testing::SyntheticCaptureBackend;
use duocam::timing::MAX_RECORDING_DURATION;
use duocam::types::RecordingState;
use std::env;
use std::time::Duration;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    duocam::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: duocam-cli <record|list|remove|usage|feed|export|config> [args]");
        std::process::exit(1);
    }

    let config = DuoCamConfig::load_or_default();
    if let Err(e) = config.validate() {
        bail!("invalid configuration: {}", e);
    }

    let command = &args[1];
    match command.as_str() {
        "record" => cmd_record(&args, config).await,
        "list" => cmd_list(&args, &config),
        "remove" => cmd_remove(&args, &config),
        "usage" => cmd_usage(&config),
        "feed" => cmd_feed(&args, &config).await,
        "export" => cmd_export(&args, &config),
        "config" => {
            let info = duocam::get_info();
            println!("# {} {}", info.name, info.version);
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

fn open_loaded_library(config: &DuoCamConfig) -> Result<LibraryStore<FileKeyValueStore>> {
    let mut library = open_library(&config.library).context("failed to open library")?;
    library.load();
    Ok(library)
}

async fn cmd_record(args: &[String], mut config: DuoCamConfig) -> Result<()> {
    // record [--seconds <n>] [--simulated] [--json]
    let mut seconds: Option<Duration> = None;
    let mut json = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--seconds" => {
                i += 1;
                let value = args.get(i).ok_or_else(|| anyhow!("--seconds needs a value"))?;
                seconds = Some(parse_seconds(value)?);
            }
            "--simulated" => config.capture.simulated = true,
            "--json" => json = true,
            other => bail!("unexpected argument: {}", other),
        }
        i += 1;
    }

    let controller = CaptureSessionController::new(SyntheticCaptureBackend::new(), config.capture.clone());
    let mut completions = controller.subscribe_completions();
    let mut status = controller.subscribe();

    controller.start().await;
    if !json {
        println!("Recording ({:?} mode)...", controller.mode());
    }

    let outcome = match seconds {
        Some(secs) => {
            tokio::time::sleep(secs).await;
            match controller.stop().await {
                Some(outcome) => outcome,
                // The ceiling got there first.
                None => completions.recv().await?,
            }
        }
        None => loop {
            tokio::select! {
                outcome = completions.recv() => break outcome?,
                changed = status.changed() => {
                    changed?;
                    let snapshot = *status.borrow();
                    if !json && snapshot.state == RecordingState::Recording && snapshot.elapsed.subsec_millis() == 0 {
                        println!("  {:>4.1}s ({:.0}%)", snapshot.elapsed.as_secs_f64(), snapshot.progress * 100.0);
                    }
                }
            }
        },
    };

    let mut library = open_loaded_library(&config)?;
    library.append(outcome.video.clone())?;

    if json {
        println!("{}", serde_json::to_string(&outcome)?);
    } else {
        println!("Saved {} ({:.1}s)", outcome.video.id, outcome.video.duration_secs);
        match &outcome.source {
            OutcomeSource::Captured => {}
            OutcomeSource::Simulated => println!("  simulated recording, no media written"),
            OutcomeSource::Fallback { missing } => println!("  missing output for {:?}", missing),
        }
    }
    Ok(())
}

fn cmd_list(args: &[String], config: &DuoCamConfig) -> Result<()> {
    let library = open_loaded_library(config)?;
    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(library.videos())?);
    } else {
        for video in library.videos() {
            println!(
                "{}  {}  {:>5.1}s  {}",
                video.id,
                video.created_at.format("%Y-%m-%d %H:%M:%S"),
                video.duration_secs,
                LibraryStore::<FileKeyValueStore>::formatted_size_of(video)
            );
        }
    }
    Ok(())
}

fn parse_ids(args: &[String]) -> Result<Vec<Uuid>> {
    args.iter()
        .map(|s| Uuid::parse_str(s).with_context(|| format!("invalid id: {}", s)))
        .collect()
}

fn cmd_remove(args: &[String], config: &DuoCamConfig) -> Result<()> {
    if args.len() < 3 {
        eprintln!("Usage: duocam-cli remove <id>...");
        std::process::exit(1);
    }
    let ids = parse_ids(&args[2..])?;
    let mut library = open_loaded_library(config)?;
    let removed = library.remove(&ids)?;
    println!("Removed {} recording(s)", removed);
    Ok(())
}

fn cmd_usage(config: &DuoCamConfig) -> Result<()> {
    let library = open_loaded_library(config)?;
    println!(
        "{} recording(s), {}",
        library.len(),
        library.formatted_total_storage_used()
    );
    Ok(())
}

async fn cmd_feed(args: &[String], config: &DuoCamConfig) -> Result<()> {
    let source = MockFeedSource::from_config(&config.feed);
    let posts = source.load_feed().await;
    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&posts)?);
    } else {
        for post in posts {
            println!(
                "{:<32} {:<20} {:>6} views {:>6} likes  {}",
                post.title,
                post.creator,
                post.formatted_views(),
                post.formatted_likes(),
                post.formatted_duration()
            );
        }
    }
    Ok(())
}

fn cmd_export(args: &[String], config: &DuoCamConfig) -> Result<()> {
    if args.len() < 4 {
        eprintln!("Usage: duocam-cli export <id> <directory>");
        std::process::exit(1);
    }
    let id = Uuid::parse_str(&args[2]).with_context(|| format!("invalid id: {}", args[2]))?;
    let library = open_loaded_library(config)?;
    let video = library
        .find(&id)
        .ok_or_else(|| anyhow!("recording not found: {}", id))?;

    let mut media_library = DirectoryMediaLibrary::new(&args[3]);
    if library.export_to_platform_library(video, &mut media_library) {
        println!("Exported {} to {}", id, args[3]);
        Ok(())
    } else {
        bail!("export of {} failed", id)
    }
}

/// Parse a `--seconds` value; anything past the ceiling waits for the auto-stop
fn parse_seconds(value: &str) -> Result<Duration> {
    let secs: f64 = value
        .parse()
        .with_context(|| format!("invalid --seconds value: {}", value))?;
    if secs.is_nan() || secs < 0.0 {
        bail!("--seconds must be a non-negative number, got {}", value);
    }
    let ceiling = MAX_RECORDING_DURATION + Duration::from_millis(500);
    Ok(Duration::try_from_secs_f64(secs).map_or(ceiling, |d| d.min(ceiling)))
}
