use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use joint_sequencer::cli::{Cli, Command};
use joint_sequencer::config::{self, Options};
use joint_sequencer::logging;
use joint_sequencer::runtime::Runtime;
use joint_sequencer::store::{
    import_yaml, DocumentStore, JsonFileStore, PoseDocument, SceneDocument,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging before the config file so its warnings are not lost
    let log_handle = logging::init(cli.initial_log_level());

    // Config file first, then CLI flags on top
    let options = config::load_config(cli.config.as_deref())?;
    let options = cli.merge_into_options(options)?;
    if let Some(handle) = &log_handle {
        handle.set_level(options.log_level);
    }

    tracing::info!("Configuration:");
    tracing::info!("  Store dir: {}", options.store_dir.display());
    match &options.sink_dir {
        Some(dir) => tracing::info!("  Sink dir: {}", dir.display()),
        None if options.telemetry_url.trim().is_empty() => tracing::info!("  Sink: in-memory"),
        None => tracing::info!("  Telemetry server: {}", options.telemetry_url),
    }
    tracing::info!("  Telemetry key: {}", options.telemetry_key);
    tracing::info!("  Publish rate: {} Hz", options.publish_rate_hz);

    let command = cli.command.clone().unwrap_or(Command::Stream { seconds: None });
    match command {
        Command::List => list(&options),
        Command::Import { poses, scenes } => import(&options, poses.as_deref(), scenes.as_deref()),
        Command::Play { scene, looping } => {
            let mut runtime = Runtime::start(&options)?;
            runtime
                .controller()
                .play_stored_scene(&scene, looping.then_some(true))
                .with_context(|| format!("Cannot play scene '{}'", scene))?;
            runtime.run_until_idle(None)?;
            finish(runtime)
        }
        Command::Pose { name, duration } => {
            let mut runtime = Runtime::start(&options)?;
            let controller = runtime.controller();
            let moved = match duration {
                Some(duration) => controller.interpolate_to_pose(&name, &duration).map(drop),
                None => controller.load_pose(&name),
            };
            moved.with_context(|| format!("Cannot load pose '{}'", name))?;
            runtime.run_until_idle(None)?;
            finish(runtime)
        }
        Command::Stream { seconds } => {
            let mut runtime = Runtime::start(&options)?;
            let mut remaining = seconds.filter(|s| s.is_finite() && *s >= 0.0);
            loop {
                let slice = remaining.map_or(1.0, |r| r.min(1.0));
                runtime.run_for(Duration::from_secs_f64(slice))?;
                println!("{}", runtime.current_frame().to_json()?);
                if let Some(r) = remaining.as_mut() {
                    *r -= slice;
                    if *r <= 0.0 {
                        break;
                    }
                }
            }
            finish(runtime)
        }
    }
}

fn finish(runtime: Runtime) -> Result<()> {
    let stats = runtime.shutdown()?;
    tracing::info!(published = stats.published, failed = stats.failed, "Done");
    Ok(())
}

fn list(options: &Options) -> Result<()> {
    let poses = JsonFileStore::<PoseDocument>::new(options.poses_path());
    let scenes = JsonFileStore::<SceneDocument>::new(options.scenes_path());

    println!("Poses ({}):", options.poses_path().display());
    for (name, doc) in poses.load_all()? {
        println!("  {:<24} {}  {}", name, doc.timestamp, doc.description);
    }
    println!("Scenes ({}):", options.scenes_path().display());
    for (name, doc) in scenes.load_all()? {
        let looping = if doc.looping { ", loop" } else { "" };
        println!("  {:<24} {}  ({} steps{})", name, doc.timestamp, doc.steps.len(), looping);
    }
    Ok(())
}

fn import(options: &Options, poses: Option<&Path>, scenes: Option<&Path>) -> Result<()> {
    if poses.is_none() && scenes.is_none() {
        anyhow::bail!("Nothing to import: pass --poses and/or --scenes");
    }
    if let Some(path) = poses {
        let store = JsonFileStore::<PoseDocument>::new(options.poses_path());
        let count = import_yaml(path, &store)
            .with_context(|| format!("Cannot import poses from {}", path.display()))?;
        println!("Imported {} poses into {}", count, store.path().display());
    }
    if let Some(path) = scenes {
        let store = JsonFileStore::<SceneDocument>::new(options.scenes_path());
        let count = import_yaml(path, &store)
            .with_context(|| format!("Cannot import scenes from {}", path.display()))?;
        println!("Imported {} scenes into {}", count, store.path().display());
    }
    Ok(())
}
