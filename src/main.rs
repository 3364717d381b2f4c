use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use vessel_sim::config::{self, VesselConfig};
use vessel_sim::host::VesselClass;
use vessel_sim::io::{csv, json, ScenarioBlock};
use vessel_sim::sim::{full_throttle, launch_profile, FlightConditions, SimHost, Simulation};
use vessel_sim::vehicle::{ScramGlider, ScramModel, TankConfig, VesselModule};

#[derive(Parser, Debug)]
#[command(author, version, about = "Launch stack staging and scramjet performance simulator")]
struct Cli {
    /// TOML file with [sim] and [staging] tables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fly the launch stack from the pad at full throttle.
    Launch {
        /// Vessel name; debris is named after it.
        #[arg(long, default_value = "STS-101")]
        name: String,
        /// Resume from a saved vessel state block.
        #[arg(long)]
        scenario: Option<PathBuf>,
        /// Write per-frame telemetry as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write a JSON flight summary.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Tabulate scramjet performance over a Mach sweep.
    Scram {
        #[arg(long, default_value_t = 25_000.0)]
        altitude: f64,
        #[arg(long, default_value_t = 1.0)]
        mach_min: f64,
        #[arg(long, default_value_t = 8.0)]
        mach_max: f64,
        #[arg(long, default_value_t = 0.5)]
        mach_step: f64,
        #[arg(long, value_enum, default_value_t = Model::Easy)]
        model: Model,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Model {
    Easy,
    Realistic,
}

impl From<Model> for ScramModel {
    fn from(m: Model) -> Self {
        match m {
            Model::Easy => ScramModel::Easy,
            Model::Realistic => ScramModel::Realistic,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Launch { name, scenario, csv: csv_out, json: json_out } => {
            handle_launch(&cfg, &name, scenario.as_deref(), csv_out.as_deref(), json_out.as_deref())
        }
        Command::Scram { altitude, mach_min, mach_max, mach_step, model } => {
            handle_scram(altitude, mach_min, mach_max, mach_step, model.into())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<VesselConfig> {
    match path {
        Some(p) => config::load(p).with_context(|| format!("failed to load config from {}", p.display())),
        None => Ok(VesselConfig::default()),
    }
}

fn handle_launch(
    cfg: &VesselConfig,
    name: &str,
    scenario: Option<&Path>,
    csv_out: Option<&Path>,
    json_out: Option<&Path>,
) -> Result<()> {
    let sim = match scenario {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read scenario {}", p.display()))?;
            Simulation::from_scenario(cfg, name, VesselClass::LaunchStack, &ScenarioBlock::parse(&text))
                .context("failed to restore vessel state")?
        }
        None => Simulation::new(cfg, name, VesselClass::LaunchStack)?,
    };
    let mut sim = sim.with_profile(launch_profile).with_pilot(full_throttle);
    sim.run();

    print_launch_report(&sim, cfg);

    if let Some(p) = csv_out {
        csv::write_telemetry_file(p, sim.samples())
            .with_context(|| format!("failed to write telemetry to {}", p.display()))?;
        println!("  Telemetry written to {}", p.display());
    }
    if let Some(p) = json_out {
        let summary = json::FlightSummary::from_run(name, sim.samples(), sim.events());
        json::write_summary_file(p, &summary)
            .with_context(|| format!("failed to write summary to {}", p.display()))?;
        println!("  Summary written to {}", p.display());
    }
    Ok(())
}

fn print_launch_report(sim: &Simulation, cfg: &VesselConfig) {
    let primary = sim.primary();
    println!();
    println!("====================================================================");
    println!("  LAUNCH STACK SIMULATION — {}", primary.name());
    println!("====================================================================");
    println!();

    println!("  Flight Events");
    println!("  ──────────────────────────────────────────────────────────────────");
    for ev in sim.events() {
        println!("  {ev}");
    }
    println!();

    println!("  Telemetry");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>5}  {:>6}  {:>6}  {:>12}  {:>8}  {:>6}",
        "t (s)", "cfg", "main", "srb", "prop (kg)", "gimbal", "debris"
    );
    println!("  {}", "─".repeat(64));

    let samples = sim.samples();
    let sample_interval = (samples.len() / 30).max(1);
    for (i, s) in samples.iter().enumerate() {
        if i % sample_interval != 0 && i != samples.len() - 1 {
            continue;
        }
        let gimbal = s.gimbal_dir.map_or(0.0, |d| d.y.atan2(d.z).to_degrees());
        println!(
            "  {:>7.1}  {:>5}  {:>6.3}  {:>6.3}  {:>12.0}  {:>7.2}°  {:>6}",
            s.time,
            s.configuration.map_or_else(|| "-".to_string(), |c| c.to_string()),
            s.main_level,
            s.booster_level,
            s.propellant,
            gimbal,
            s.debris,
        );
    }
    println!();

    let saved = primary.save(sim.time());
    println!("  Final state");
    println!("  ──────────────────────────────────────────────────────────────────");
    print!("{saved}");
    println!();
    println!("  Simulation: {} frames, dt={} s", samples.len(), cfg.sim.dt);
    println!("====================================================================");
    println!();
}

fn handle_scram(altitude: f64, mach_min: f64, mach_max: f64, mach_step: f64, model: ScramModel) -> Result<()> {
    anyhow::ensure!(mach_step > 0.0, "mach step must be positive");

    let mut host = SimHost::new("DG-S");
    let mut dg = ScramGlider::with_model(model);
    dg.set_class_caps(&mut host);
    dg.set_tank_config(TankConfig::ScramSmall);
    dg.post_creation(&mut host, 0.0);
    dg.set_scram_level(&mut host, 2, 1.0);

    println!();
    println!("====================================================================");
    println!("  SCRAMJET PERFORMANCE — {model:?} model, altitude {:.0} m", altitude);
    println!("====================================================================");
    println!(
        "  {:>5}  {:>10}  {:>9}  {:>11}  {:>7}  {:>7}  {:>7}",
        "Mach", "thrust (N)", "dmf(kg/s)", "tsfc(g/kNs)", "Td (K)", "Tb (K)", "Te (K)"
    );
    println!("  {}", "─".repeat(66));

    let n = ((mach_max - mach_min) / mach_step).floor().max(0.0) as usize;
    for i in 0..=n {
        let mach = mach_min + i as f64 * mach_step;
        host.set_conditions(FlightConditions::isa(altitude, mach));
        dg.post_step(&mut host, 0.0, 0.0);

        let engine = dg.scramjet();
        let thrust = engine.def(0).map_or(0.0, |d| d.thrust);
        let [td, tb, te] = engine.temperatures(0);
        println!(
            "  {:>5.2}  {:>10.0}  {:>9.3}  {:>11.3}  {:>7.0}  {:>7.0}  {:>7.0}",
            mach,
            thrust,
            engine.dmf(0),
            engine.tsfc(0) * 1e6,
            td,
            tb,
            te,
        );
    }
    println!();
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
