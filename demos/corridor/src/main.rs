//! corridor: one simulated day on a two-line network over Mobile, Alabama.
//!
//! Runs the engine in batch mode with an observer printing an hourly table,
//! plans a transfer journey, writes the final snapshot as JSON, then drives
//! a short live session through the threaded host using wire-format
//! commands.
//!
//! ```text
//! RUST_LOG=info cargo run -p corridor [-- config.json]
//! ```

mod network;

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::info;
use memory_stats::memory_stats;

use rail_core::Tick;
use rail_sim::{
    Command, EngineBuilder, EngineConfig, Event, Incident, IncidentTransition, SimObserver,
    Snapshot, spawn_host,
};

use network::{AIRPORT, SPRINGHILL, build_network};

// ── Memory helper ─────────────────────────────────────────────────────────────

fn mem_mb() -> f64 {
    memory_stats()
        .map(|s| s.physical_mem as f64 / (1024.0 * 1024.0))
        .unwrap_or(0.0)
}

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:               u64 = 42;
const TICK_DURATION_SECS: u32 = 5;
/// 05:00 → 05:00 next day.
const START_SECS:         u32 = 5 * 3_600;
const TICKS_PER_HOUR:     u64 = 3_600 / TICK_DURATION_SECS as u64;
const LIVE_SESSION:       Duration = Duration::from_millis(500);

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct HourlyTable {
    rows:      usize,
    incidents: usize,
}

impl SimObserver for HourlyTable {
    fn on_snapshot(&mut self, s: &Snapshot) {
        if s.minute == 0 {
            println!(
                "{:>3} {:02}:00 {:>8} {:>8} {:>8} {:>14.0} {:>12.0}",
                s.day, s.hour, s.waiting_passengers, s.completed_today, s.abandoned_trips, s.budget,
                s.cashflow_per_hour,
            );
            self.rows += 1;
        }
    }

    fn on_incident(&mut self, transition: IncidentTransition, incident: &Incident) {
        if transition == IncidentTransition::Created {
            self.incidents += 1;
            println!("        ! {}", incident.message);
        }
    }

    fn on_sim_end(&mut self, final_tick: Tick) {
        info!("batch run finished at {final_tick}");
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::init();

    let mut config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => EngineConfig::from_json_path(&path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => EngineConfig::default(),
    };
    config.sim.seed = SEED;
    config.sim.start_secs = START_SECS;
    config.sim.tick_duration_secs = TICK_DURATION_SECS;
    config.sim.total_ticks = 24 * TICKS_PER_HOUR;
    // Hourly rows only need a snapshot every minute.
    config.sim.snapshot_interval_ticks = 60 / TICK_DURATION_SECS as u64;

    println!("=== corridor: rail operations simulator ===");
    println!(
        "Seed: {}  |  Tick: {} s  |  Ticks: {}  |  Memory: {:.1} MB",
        config.sim.seed, config.sim.tick_duration_secs, config.sim.total_ticks, mem_mb()
    );

    // 1. Build engine and network.
    let mut engine = EngineBuilder::with_default_router(config.clone())
        .network(build_network())
        .build()?;
    for line in &engine.network().lines {
        println!(
            "  {:<10} {:>5.1} km  {} stops  {}",
            line.name,
            line.length_m / 1_000.0,
            line.stops.len(),
            if line.is_serviceable() { "in service" } else { "not serviceable" },
        );
    }
    println!("  {} trains", engine.trains().len());
    println!();

    // 2. Pay for construction up front.
    let cost: f64 = engine
        .network()
        .lines
        .iter()
        .map(|l| engine.economics().estimate_line_cost(l.length_m / 1_000.0, l.stops.len()))
        .sum();
    engine.handle(Command::BuildInfrastructure { cost });
    println!("Construction: {cost:.0}  →  budget {:.0}", engine.economics().budget());
    println!();

    // 3. Run one day.
    println!(
        "{:>3} {:>5} {:>8} {:>8} {:>8} {:>14} {:>12}",
        "day", "time", "waiting", "done", "gave up", "budget", "cash/h"
    );
    println!("{}", "-".repeat(64));
    engine.handle(Command::Start);
    let mut table = HourlyTable::default();
    let t0 = Instant::now();
    engine.run(&mut table);
    let elapsed = t0.elapsed();
    println!();
    println!(
        "Simulated 24 h in {:.3} s  ({} rows, {} incidents, {:.1} MB)",
        elapsed.as_secs_f64(),
        table.rows,
        table.incidents,
        mem_mb()
    );

    // 4. Plan a transfer journey.
    let plan = engine.plan_journey(SPRINGHILL.into(), AIRPORT.into());
    match (&plan.route, plan.total_time_secs) {
        (Some(route), Some(total)) => println!(
            "Springhill → Airport Blvd: {} leg(s), {:.1} km, {:.0} min door to door (walking: {:.0} min)",
            route.leg_count(),
            route.distance_km(),
            total / 60.0,
            plan.direct_walk_secs / 60.0,
        ),
        _ => println!("Springhill → Airport Blvd: no rail route"),
    }

    // 5. Final snapshot.
    let out_dir = Path::new("output/corridor");
    std::fs::create_dir_all(out_dir)?;
    let snapshot = engine.snapshot();
    let path = out_dir.join("final_snapshot.json");
    std::fs::write(&path, serde_json::to_string_pretty(&snapshot)?)?;
    println!(
        "Riders: {} completed, {} gave up, avg journey {:.0} s  →  {}",
        snapshot.total_ridership,
        snapshot.abandoned_trips,
        snapshot.average_wait_secs,
        path.display()
    );
    println!();

    // 6. Live session through the host, driven by wire-format commands.
    let live = EngineBuilder::with_default_router(config).network(build_network()).build()?;
    let host = spawn_host(live, Duration::from_millis(1))?;
    for json in [
        r#"{ "type": "Start" }"#,
        r#"{ "type": "PlanJourney", "origin": [-88.09, 30.69], "destination": [-88.05, 30.65] }"#,
    ] {
        let command: Command = serde_json::from_str(json)?;
        host.send(command)?;
    }

    let deadline = Instant::now() + LIVE_SESSION;
    let mut ticks = 0usize;
    let mut last_tick = None;
    while Instant::now() < deadline {
        let Some(event) = host.recv_timeout(Duration::from_millis(20))? else { continue };
        match event {
            Event::Tick(s) => {
                ticks += 1;
                last_tick = Some(s);
            }
            Event::JourneyPlanResult(plan) => {
                println!("Live plan: {}", serde_json::to_string(&plan.total_time_secs)?);
            }
            other => info!("live event: {}", serde_json::to_string(&other)?),
        }
    }
    host.shutdown()?;
    if let Some(s) = last_tick {
        println!("Live session: {ticks} tick events, reached {:02}:{:02} on day {}", s.hour, s.minute, s.day);
    }

    Ok(())
}
