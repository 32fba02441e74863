use std::{path::PathBuf, time::Duration};

use anyhow::ensure;
use bevy::{app::ScheduleRunnerPlugin, prelude::*};
use clap::Parser;
use pf_conf::ConfigPluginGroup;
use pf_core::CorePluginGroup;
use pf_influence::InfluencePluginGroup;
use pf_log::LogPluginGroup;
use pf_movement::MovementPluginGroup;
use pf_pathing::PathingPluginGroup;
use sim::{Scenario, SimulationPlugin};

mod sim;

const CARGO_PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
const GIT_SHA: &str = env!("GIT_SHA");
/// Simulation ticks per second.
const TICK_RATE: f64 = 30.;

/// Headless simulation of a flock navigating a waypoint grid.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Path to a YAML configuration file. Configuration is loaded from the
    /// user configuration directory by default.
    #[arg(long)]
    conf: Option<PathBuf>,
    /// Number of flock members.
    #[arg(long, default_value_t = 12)]
    agents: u32,
    /// Maximum number of simulated ticks.
    #[arg(long, default_value_t = 900)]
    ticks: u32,
    /// Number of waypoints along each side of the square waypoint grid.
    #[arg(long, default_value_t = 16)]
    grid: u32,
    /// Directory log files are stored to.
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    ensure!(args.agents > 0, "At least one agent is needed");
    ensure!(args.grid >= 2, "Waypoint grid must have at least 2 x 2 nodes");

    let conf = match args.conf {
        Some(path) => ConfigPluginGroup::with_path(path),
        None => ConfigPluginGroup::default(),
    };

    let mut app = App::new();
    app.add_plugins((
        MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
            1. / TICK_RATE,
        ))),
        LogPluginGroup::new(args.log_dir),
        conf,
        CorePluginGroup,
        PathingPluginGroup,
        MovementPluginGroup,
        InfluencePluginGroup,
        SimulationPlugin::new(Scenario::new(args.agents, args.grid, args.ticks)),
    ));

    // This has to be after LogPlugin is inserted.
    info!(
        "Starting Pathflock {{ \"Version\": \"{}\", \"GitSha\": \"{}\" }}",
        CARGO_PKG_VERSION, GIT_SHA
    );

    app.run();
    Ok(())
}
