#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line host for the living city wordmark.
//!
//! Builds an engine from flags and an optional TOML file, plays scripted
//! events against a simulated clock and prints the final frame.

mod headless;
mod script;

use std::{
    cell::RefCell,
    collections::BTreeMap,
    fmt::Write as _,
    fs,
    io::{self, Write as _},
    path::PathBuf,
    rc::Rc,
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use living_city_core::{Config, ConfigOverrides, Density, RenderDetail, RenderOverrides, Scheme};
use living_city_engine::{Engine, EngineOptions, EngineSnapshot};
use living_city_rendering::{CitySim, RenderingBackend};
use living_city_system_event_bridge::{EventBus, ManualClock};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::{
    headless::HeadlessBackend,
    script::{EventScript, ScriptedEvent},
};

/// Shape of the final frame written by the CLI.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Standalone SVG document.
    #[default]
    Svg,
    /// Engine snapshot as JSON.
    Json,
    /// Short human-readable report.
    Summary,
}

#[derive(Debug, Parser)]
#[command(name = "living-city", version, about = "Render the living city wordmark headlessly")]
struct Cli {
    /// Seed for every deterministic generator.
    #[arg(long)]
    seed: Option<String>,

    /// TOML file with configuration overrides; flags win over the file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Actor population preset (sparse, normal, dense).
    #[arg(long)]
    density: Option<Density>,

    /// Palette preset (classic, noir, neon).
    #[arg(long)]
    scheme: Option<Scheme>,

    /// Glyph detail tier (standard, hd).
    #[arg(long)]
    detail: Option<RenderDetail>,

    /// Resolution multiplier for the whole scene.
    #[arg(long)]
    voxel_scale: Option<u32>,

    /// Width multiplier for banner layouts.
    #[arg(long)]
    banner_scale: Option<u32>,

    /// Normalized time of day; 0.0 is midnight and 0.5 is noon.
    #[arg(long)]
    time_of_day: Option<f64>,

    /// Simulation speed multiplier.
    #[arg(long)]
    time_scale: Option<f64>,

    /// Number of host frames to simulate.
    #[arg(long, default_value_t = 0)]
    frames: u32,

    /// Milliseconds between simulated host frames.
    #[arg(long, default_value_t = 16)]
    frame_ms: u64,

    /// Scripted event as TYPE[:ARG]@MS; may be repeated.
    #[arg(long = "event", value_name = "TYPE[:ARG]@MS")]
    events: Vec<ScriptedEvent>,

    /// Freeze the scene and drop every event.
    #[arg(long)]
    reduced_motion: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Svg)]
    format: OutputFormat,

    /// Write to this file instead of stdout.
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        let render = (self.voxel_scale.is_some()
            || self.banner_scale.is_some()
            || self.detail.is_some())
        .then_some(RenderOverrides {
            voxel_scale: self.voxel_scale,
            banner_scale: self.banner_scale,
            detail: self.detail,
        });
        ConfigOverrides {
            seed: self.seed.clone(),
            time_of_day: self.time_of_day,
            time_scale: self.time_scale,
            density: self.density,
            scheme: self.scheme,
            render,
            ..ConfigOverrides::default()
        }
    }

    fn load_config(&self) -> Result<Config> {
        let mut config = Config::default();
        if let Some(path) = &self.config {
            let document = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            let overrides = ConfigOverrides::from_toml_str(&document)
                .with_context(|| format!("invalid config file {}", path.display()))?;
            config = config.merge(&overrides)?;
        }
        config
            .merge(&self.overrides())
            .context("invalid command-line configuration")
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to install logger")
}

fn summarize(snapshot: &EngineSnapshot) -> String {
    let mut tones: BTreeMap<&str, usize> = BTreeMap::new();
    for rect in &snapshot.actor_rects {
        *tones.entry(rect.tone.as_str()).or_default() += 1;
    }

    let config = &snapshot.config;
    let mut report = String::new();
    let _ = writeln!(report, "seed: {}", config.seed);
    let _ = writeln!(report, "simulated: {}ms", snapshot.now_ms);
    let _ = writeln!(report, "time of day: {:.4}", config.time_of_day);
    let _ = writeln!(
        report,
        "scheme: {}, density: {}, detail: {}",
        config.scheme, config.density, config.render.detail
    );
    let _ = writeln!(report, "actor rects: {}", snapshot.actor_rects.len());
    for (tone, count) in tones {
        let _ = writeln!(report, "  {tone}: {count}");
    }
    report
}

fn render(sim: &CitySim, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Svg => sim.render_svg(),
        OutputFormat::Json => serde_json::to_string_pretty(sim.snapshot())
            .context("failed to encode snapshot")?,
        OutputFormat::Summary => summarize(sim.snapshot()),
    })
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    info!(
        seed = %config.seed,
        density = %config.density,
        scheme = %config.scheme,
        "starting headless city"
    );

    let clock = Arc::new(ManualClock::new(0));
    let bus = EventBus::new(clock.clone());
    bus.set_reduced_motion(cli.reduced_motion);

    let engine = Engine::new(
        EngineOptions::default()
            .with_config(config)
            .with_clock(clock.clone())
            .with_event_source(bus.clone()),
    )
    .context("failed to build the engine")?;
    let mut sim = CitySim::with_enabled(Rc::new(RefCell::new(engine)), !cli.reduced_motion);

    let backend = HeadlessBackend::new(
        clock,
        bus,
        EventScript::new(cli.events.clone()),
        cli.frames,
        cli.frame_ms,
    );
    backend.run(&mut sim, |_| Ok(()))?;

    let output = render(&sim, cli.format)?;
    match &cli.output {
        Some(path) => fs::write(path, output)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => io::stdout()
            .lock()
            .write_all(output.as_bytes())
            .context("failed to write to stdout")?,
    }
    Ok(())
}

/// Entry point for the living city command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    run(cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    use living_city_core::Tone;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "living-city",
            "--seed",
            "harbor",
            "--density",
            "dense",
            "--detail",
            "standard",
            "--event",
            "alert@100",
            "--event",
            "search:maps@200",
        ]);
        let config = cli.load_config().expect("valid flags");
        assert_eq!(config.seed, "harbor");
        assert_eq!(config.density, Density::Dense);
        assert_eq!(config.render.detail, RenderDetail::Standard);
        assert_eq!(config.render.voxel_scale, Config::default().render.voxel_scale);
        assert_eq!(cli.events.len(), 2);
        assert_eq!(cli.format, OutputFormat::Svg);
    }

    #[test]
    fn invalid_flags_are_rejected_before_the_engine_exists() {
        let cli = Cli::parse_from(["living-city", "--voxel-scale", "0"]);
        assert!(cli.load_config().is_err());
        assert!(Cli::try_parse_from(["living-city", "--scheme", "sepia"]).is_err());
    }

    #[test]
    fn summary_counts_rects_per_tone() {
        let engine = Engine::new(EngineOptions::default()).expect("engine builds");
        let report = summarize(engine.snapshot());
        assert!(report.starts_with("seed: markdowntown\n"));
        assert!(report.contains(&format!(
            "actor rects: {}",
            engine.snapshot().actor_rects.len()
        )));
    }

    #[test]
    fn scripted_run_spawns_event_actors() {
        let cli = Cli::parse_from([
            "living-city",
            "--frames",
            "30",
            "--event",
            "upload:file@100",
            "--format",
            "json",
        ]);
        let clock = Arc::new(ManualClock::new(0));
        let bus = EventBus::new(clock.clone());
        let engine = Engine::new(
            EngineOptions::default()
                .with_config(cli.load_config().expect("valid flags"))
                .with_clock(clock.clone())
                .with_event_source(bus.clone()),
        )
        .expect("engine builds");
        let mut sim = CitySim::new(Rc::new(RefCell::new(engine)));

        let mut presented = 0;
        let backend = HeadlessBackend::new(
            clock,
            bus,
            EventScript::new(cli.events.clone()),
            cli.frames,
            cli.frame_ms,
        );
        backend
            .run(&mut sim, |_| {
                presented += 1;
                Ok(())
            })
            .expect("run succeeds");

        assert_eq!(presented, 30);
        assert!(sim.snapshot().now_ms > 0);
        assert!(sim
            .snapshot()
            .actor_rects
            .iter()
            .any(|rect| rect.tone == Tone::Dog));
        let json = render(&sim, cli.format).expect("encodes");
        assert!(json.contains("\"actorRects\""));
    }
}
