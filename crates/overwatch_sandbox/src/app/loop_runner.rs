use std::process::ExitCode;

use overwatch::{
    Category, CategoryRegistry, Changeset, Monitor, MonitorState, Overwatch, SandboxSimulation,
    Simulation, TickSummary,
};
use serde::Serialize;
use tracing::{debug, error, info};

use super::bootstrap::AppWiring;
use super::scenario::{Scenario, ScenarioStats};

#[derive(Debug, Serialize)]
struct CategoryCount<C> {
    category: C,
    label: &'static str,
    count: usize,
}

#[derive(Debug, Serialize)]
struct KindReport<'a, C> {
    state: MonitorState,
    tracked: usize,
    categories: Vec<CategoryCount<C>>,
    last_changes: &'a Changeset,
}

#[derive(Debug, Serialize)]
struct RunReport<'a, B, V, A> {
    steps: u32,
    frame_index: u32,
    scenario: ScenarioStats,
    last_tick: Option<TickSummary>,
    buildings: KindReport<'a, B>,
    vehicles: KindReport<'a, V>,
    animals: KindReport<'a, A>,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let mut sim = SandboxSimulation::new(app.capacities);
    let mut overwatch = Overwatch::new(app.config);
    let mut scenario = Scenario::new(app.capacities, &sim);
    let mut last_tick = None;

    info!(steps = app.ticks, "sandbox_run_started");
    for step in 0..app.ticks {
        scenario.apply(step, &mut sim);
        overwatch.before_simulation_tick(&sim);
        sim.advance();
        let summary = overwatch.on_update(&sim);
        debug!(step, frame_index = sim.frame_index(), ?summary, "sandbox_step");
        last_tick = Some(summary);
    }

    let report = RunReport {
        steps: app.ticks,
        frame_index: sim.frame_index(),
        scenario: scenario.stats(),
        last_tick,
        buildings: kind_report(overwatch.buildings(), overwatch.buildings().categories()),
        vehicles: kind_report(overwatch.vehicles(), overwatch.vehicles().categories()),
        animals: kind_report(overwatch.animals(), overwatch.animals().categories()),
    };
    let encoded = serde_json::to_string_pretty(&report);
    overwatch.on_release();

    match encoded {
        Ok(json) => {
            println!("{json}");
            info!("sandbox_run_finished");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "report_encode_failed");
            ExitCode::FAILURE
        }
    }
}

fn kind_report<'a, C: Category + Serialize>(
    monitor: &'a dyn Monitor,
    registry: &CategoryRegistry<C>,
) -> KindReport<'a, C> {
    KindReport {
        state: monitor.state(),
        tracked: monitor.tracked_count(),
        categories: registry
            .counts()
            .map(|(category, count)| CategoryCount {
                category,
                label: category.label(),
                count,
            })
            .collect(),
        last_changes: monitor.changes(),
    }
}
