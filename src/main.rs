// Headless path-planning lab.
// Loads one scenario, drives its planner frame by frame and reports the
// stats a front end would display.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;

use path_lab::engine::{ForceParams, Speed};
use path_lab::{Lab, Planner, Scenario, Stats};

#[derive(Parser, Debug)]
#[command(
    name = "path-lab",
    version,
    about = "Run a potential-field, wavefront or RRT scenario headlessly"
)]
struct Cli {
    /// Scenario JSON file.
    scenario: PathBuf,

    /// Seed for noise injection and tree sampling.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Playback speed multiplier: 0.25, 0.5, 1, 2 or 4.
    #[arg(long, default_value = "1", value_parser = parse_speed)]
    speed: Speed,

    /// Stop after this many frames even if the planner is still working.
    #[arg(long, default_value_t = 100_000)]
    max_frames: u64,

    /// Print stats every N frames.
    #[arg(long, default_value_t = 60)]
    report_every: u64,

    /// JSON file with force-parameter overrides (potential field only).
    #[arg(long)]
    params: Option<PathBuf>,

    /// Print each report as a JSON line instead of text.
    #[arg(long)]
    json: bool,
}

fn parse_speed(s: &str) -> Result<Speed, String> {
    let value: f64 = s.parse().map_err(|e| format!("{e}"))?;
    Speed::from_multiplier(value)
        .ok_or_else(|| format!("unsupported speed {value}; use 0.25, 0.5, 1, 2 or 4"))
}

// ============================================================================
// REPORTING
// ============================================================================

fn describe(stats: &Stats) -> String {
    match stats {
        Stats::Field(s) => format!(
            "reached {}/{} agents, t = {:.3}{}",
            s.reached_count,
            s.total_agents,
            s.simulated_time,
            if s.all_done { " (all done)" } else { "" }
        ),
        Stats::Wavefront(s) => match (s.done, s.path_length) {
            (true, Some(len)) => format!("done, path {len} cells, {} visited", s.cells_visited),
            (true, None) => format!("done, no path, {} visited", s.cells_visited),
            (false, _) => format!("expanding, {} visited", s.cells_visited),
        },
        Stats::Rrt(s) => match s.path_length {
            Some(len) => format!("done, path {len} nodes, tree {} nodes", s.node_count),
            None => format!("{} nodes sampled", s.node_count),
        },
    }
}

fn report(frame: u64, stats: &Stats, json: bool) {
    if json {
        let line = serde_json::json!({ "frame": frame, "stats": stats });
        println!("{line}");
    } else {
        println!("[frame {frame:>6}] {}", describe(stats));
    }
}

// ============================================================================
// MAIN
// ============================================================================

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let scenario = Scenario::load(&cli.scenario)
        .with_context(|| format!("loading {}", cli.scenario.display()))?;
    let mut lab = Lab::new(scenario, cli.seed);
    lab.set_speed(cli.speed);

    if let Some(path) = &cli.params {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let params: ForceParams = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        if !matches!(lab.planner(), Planner::PotentialField(_)) {
            bail!("--params only applies to potential-field scenarios");
        }
        lab.set_force_params(params)?;
    }

    let every = cli.report_every.max(1);
    let mut stats = lab.stats();
    while !lab.is_settled() && lab.frames() < cli.max_frames {
        stats = lab.frame();
        if lab.frames() % every == 0 {
            report(lab.frames(), &stats, cli.json);
        }
    }
    report(lab.frames(), &stats, cli.json);

    if !stats.finished() {
        info!(
            "scenario {:?} stopped without finishing after {} frames",
            lab.scenario().name,
            lab.frames()
        );
    }
    Ok(())
}
