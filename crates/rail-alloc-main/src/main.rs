// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use rail_alloc_model::{
    generator::{FleetGenConfig, FleetGenerator},
    ingest::ingest_csv,
    prelude::*,
};
use rail_alloc_solver::prelude::*;
use serde::Serialize;
use std::{env, fs, fs::File, io::BufWriter, path::Path, time::Duration};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReport {
    description: String,
    fleet_size: usize,
    summary: ScheduleSummary,
    diagnostics: ScheduleDiagnostics,
    results: Vec<ScheduleResult>,
    daily_plan: AllocationPlan,
    ticks: u64,
    final_plan: AllocationPlan,
    final_readiness: Vec<TrainReadiness>,
}

/// Fleet from a CSV file when given, otherwise a seeded synthetic fleet with a
/// matching shunt cost table.
fn load_fleet(path: Option<&Path>, config: &mut SchedulingConfig) -> Vec<Train> {
    match path {
        Some(p) => {
            let text = fs::read_to_string(p).expect("read fleet file");
            let (trains, dropped) = ingest_csv(&text).expect("valid fleet file");
            if !dropped.is_empty() {
                warn!(?dropped, "Dropped rows with a column count mismatch");
            }
            info!(trains = trains.len(), file = %p.display(), "Fleet loaded");
            trains
        }
        None => {
            let mut generator = FleetGenerator::new(FleetGenConfig {
                seed: 42,
                ..FleetGenConfig::default()
            });
            let trains = generator.generate();
            config.shunt_cost_by_pos = generator.shunt_cost_table(trains.len() as u32);
            info!(trains = trains.len(), "Synthetic fleet generated");
            trains
        }
    }
}

fn load_config(path: Option<&Path>) -> SchedulingConfig {
    match path {
        Some(p) => {
            let text = fs::read_to_string(p).expect("read config file");
            serde_json::from_str(&text).expect("valid scheduling config")
        }
        None => SchedulingConfig::default(),
    }
}

#[tokio::main]
async fn main() {
    enable_tracing();

    // Usage: rail-alloc [fleet.csv] [config.json]
    let args: Vec<String> = env::args().skip(1).collect();
    let fleet_path = args.first().map(Path::new);
    let config_path = args.get(1).map(Path::new);

    let mut config = load_config(config_path);
    let trains = load_fleet(fleet_path, &mut config);

    let schedule = schedule_trains(&trains, &config);
    let planner = BayPlanner::default();
    let daily_plan = planner.generate_daily_forecast(schedule.results());
    daily_plan.validate().expect("valid daily plan");

    let simulator =
        ReadinessSimulator::new(ReadinessMonitor::default(), SimulatorConfig::default());
    let source = std::sync::Arc::new(simulator);
    let monitor = RealTimeMonitor::new(
        ReallocationEngine::default(),
        source.clone(),
        SharedPlan::new(daily_plan.clone()),
        schedule.results().to_vec(),
        MonitorConfig {
            interval: Duration::from_millis(250),
        },
    );

    monitor.start().expect("start monitor");
    tokio::time::sleep(Duration::from_millis(250 * 8 + 100)).await;
    monitor.shutdown().await;

    let final_plan = monitor.plan().snapshot();
    final_plan.validate().expect("valid final plan");

    let report = RunReport {
        description:
            "Nightly fleet schedule, daily bay forecast and real-time reallocation ticks."
                .into(),
        fleet_size: trains.len(),
        summary: *schedule.summary(),
        diagnostics: schedule.diagnostics().clone(),
        results: schedule.results().to_vec(),
        daily_plan,
        ticks: monitor.ticks(),
        final_readiness: source.current(),
        final_plan,
    };

    let file = File::create("rail_alloc_report.json").expect("create rail_alloc_report.json");
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &report).expect("write json report");

    let s = report.summary;
    println!();
    println!("=================================================================");
    println!("========================= Run Complete ==========================");
    println!("=================================================================");
    println!();
    println!(
        "In service: {}, standby: {}, IBL: {}, workshop: {}",
        s.in_service, s.standby, s.ibl, s.workshop
    );
    println!(
        "Ticks: {}, replacements: {}, shunting steps: {}",
        report.ticks,
        report
            .final_plan
            .changes()
            .iter()
            .filter(|c| c.kind() == ChangeKind::Replacement)
            .count(),
        report.final_plan.summary().total_shunting_steps
    );
    println!("Wrote: rail_alloc_report.json");
}
