use serde::Serialize;
use tracing::{error, info};

use crate::config::OverwatchConfig;
use crate::host::Simulation;
use crate::monitor::{
    AnimalMonitor, BuildingMonitor, Monitor, MonitorError, MonitorState, TickOutcome,
    VehicleMonitor,
};
use crate::{EntityId, EntityKind};

/// Player-facing messages such as "Building monitor initialized".
pub trait Notifier {
    fn notify(&mut self, message: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&mut self, message: &str) {
        info!(text = message, "notification");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    pub buildings: TickOutcome,
    pub vehicles: TickOutcome,
    pub animals: TickOutcome,
}

/// Owns one monitor per kind and drives them in dependency order.
pub struct Overwatch<N: Notifier = LogNotifier> {
    config: OverwatchConfig,
    buildings: BuildingMonitor,
    vehicles: VehicleMonitor,
    animals: AnimalMonitor,
    notifier: N,
}

impl Overwatch<LogNotifier> {
    pub fn new(config: OverwatchConfig) -> Self {
        Self::with_notifier(config, LogNotifier)
    }
}

impl<N: Notifier> Overwatch<N> {
    pub fn with_notifier(config: OverwatchConfig, notifier: N) -> Self {
        let config = config.normalized();
        Self {
            buildings: BuildingMonitor::new(config.building_frames, Vec::new()),
            vehicles: VehicleMonitor::new(config.vehicle_frames, Vec::new()),
            animals: AnimalMonitor::new(config.tracked_animals.clone()),
            config,
            notifier,
        }
    }

    /// Host hook that runs before each simulation step, while its
    /// updated-buildings flags are still set.
    pub fn before_simulation_tick(&mut self, sim: &dyn Simulation) {
        if !self.config.enable.building {
            return;
        }
        if let Err(err) = self.buildings.before_simulation_tick(sim) {
            terminate(&mut self.buildings, &mut self.notifier, sim.frame_index(), &err);
        }
    }

    /// Host hook for every tick. Buildings run before animals so the animal
    /// monitor sees this tick's building changes.
    pub fn on_update(&mut self, sim: &dyn Simulation) -> TickSummary {
        let tick = sim.frame_index();
        let enable = self.config.enable;

        let buildings = if enable.building {
            let result = self.buildings.update(sim);
            settle(&mut self.buildings, &mut self.notifier, tick, result)
        } else {
            TickOutcome::Disabled
        };

        let vehicles = if enable.vehicle {
            let result = self.vehicles.update(sim);
            settle(&mut self.vehicles, &mut self.notifier, tick, result)
        } else {
            TickOutcome::Disabled
        };

        let animals = if enable.animal {
            let source =
                (self.buildings.state() == MonitorState::Steady).then_some(&self.buildings);
            let result = self.animals.update(sim, source);
            settle(&mut self.animals, &mut self.notifier, tick, result)
        } else {
            TickOutcome::Disabled
        };

        self.emit_debug_reports(sim.is_paused());
        TickSummary {
            buildings,
            vehicles,
            animals,
        }
    }

    /// Host hook for simulation unload.
    pub fn on_release(&mut self) {
        self.buildings.release();
        self.vehicles.release();
        self.animals.release();
        info!("monitors_released");
    }

    /// Forces an out-of-window check of one entity. Returns whether it was
    /// purged.
    pub fn request_removal(
        &mut self,
        sim: &dyn Simulation,
        kind: EntityKind,
        id: EntityId,
    ) -> bool {
        if !self.config.enable.for_kind(kind) {
            return false;
        }
        let tick = sim.frame_index();
        let notifier = &mut self.notifier;
        match kind {
            EntityKind::Building => {
                let result = self.buildings.request_removal(sim, id);
                purged(&mut self.buildings, notifier, tick, result)
            }
            EntityKind::Vehicle => {
                let result = self.vehicles.request_removal(sim, id);
                purged(&mut self.vehicles, notifier, tick, result)
            }
            EntityKind::Animal => {
                let result = self.animals.request_removal(sim, id);
                purged(&mut self.animals, notifier, tick, result)
            }
        }
    }

    pub fn state(&self, kind: EntityKind) -> MonitorState {
        match kind {
            EntityKind::Building => self.buildings.state(),
            EntityKind::Vehicle => self.vehicles.state(),
            EntityKind::Animal => self.animals.state(),
        }
    }

    pub fn config(&self) -> &OverwatchConfig {
        &self.config
    }

    pub fn buildings(&self) -> &BuildingMonitor {
        &self.buildings
    }

    pub fn vehicles(&self) -> &VehicleMonitor {
        &self.vehicles
    }

    pub fn animals(&self) -> &AnimalMonitor {
        &self.animals
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    fn emit_debug_reports(&mut self, paused: bool) {
        let debug = self.config.debug;
        if debug.building {
            emit_report(&mut self.buildings, paused);
        }
        if debug.vehicle {
            emit_report(&mut self.vehicles, paused);
        }
        if debug.animal {
            emit_report(&mut self.animals, paused);
        }
    }
}

fn settle<M: Monitor>(
    monitor: &mut M,
    notifier: &mut impl Notifier,
    tick: u32,
    result: Result<TickOutcome, MonitorError>,
) -> TickOutcome {
    match result {
        Ok(TickOutcome::Initialized { tracked }) => {
            let kind = monitor.kind();
            info!(monitor = %kind, tick, tracked, "monitor_initialized");
            notifier.notify(&format!("{} monitor initialized", kind.title()));
            TickOutcome::Initialized { tracked }
        }
        Ok(outcome) => outcome,
        Err(err) => {
            terminate(monitor, notifier, tick, &err);
            TickOutcome::Terminated
        }
    }
}

fn purged<M: Monitor>(
    monitor: &mut M,
    notifier: &mut impl Notifier,
    tick: u32,
    result: Result<bool, MonitorError>,
) -> bool {
    match result {
        Ok(purged) => purged,
        Err(err) => {
            terminate(monitor, notifier, tick, &err);
            false
        }
    }
}

fn terminate<M: Monitor>(
    monitor: &mut M,
    notifier: &mut impl Notifier,
    tick: u32,
    err: &MonitorError,
) {
    let kind = monitor.kind();
    error!(monitor = %kind, tick, error = %err, "monitor_terminated");
    monitor.terminate();
    notifier.notify(&format!("{} monitor terminated: {err}", kind.title()));
}

fn emit_report<M: Monitor>(monitor: &mut M, paused: bool) {
    if let Some(report) = monitor.paused_report(paused) {
        info!(monitor = %monitor.kind(), report = %report, "category_report");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MonitorToggles;
    use crate::sandbox::{SandboxCapacities, SandboxSimulation};
    use crate::taxonomy::{AnimalCategory, VehicleCategory};

    #[derive(Debug, Default)]
    struct RecordingNotifier {
        messages: Vec<String>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&mut self, message: &str) {
            self.messages.push(message.to_string());
        }
    }

    fn sandbox() -> SandboxSimulation {
        SandboxSimulation::new(SandboxCapacities {
            buildings: 8,
            vehicles: 8,
            citizen_instances: 8,
        })
    }

    fn config(enable: MonitorToggles) -> OverwatchConfig {
        OverwatchConfig {
            enable,
            building_frames: 2,
            vehicle_frames: 2,
            ..OverwatchConfig::default()
        }
    }

    fn step(
        overwatch: &mut Overwatch<RecordingNotifier>,
        sim: &mut SandboxSimulation,
    ) -> TickSummary {
        overwatch.before_simulation_tick(&*sim);
        sim.advance();
        overwatch.on_update(&*sim)
    }

    #[test]
    fn first_tick_initializes_enabled_monitors_only() {
        let mut sim = sandbox();
        let enable = MonitorToggles {
            vehicle: true,
            ..MonitorToggles::default()
        };
        let mut overwatch = Overwatch::with_notifier(config(enable), RecordingNotifier::default());

        let summary = step(&mut overwatch, &mut sim);

        assert_eq!(summary.buildings, TickOutcome::Disabled);
        assert_eq!(summary.vehicles, TickOutcome::Initialized { tracked: 0 });
        assert_eq!(summary.animals, TickOutcome::Disabled);
        assert_eq!(overwatch.notifier().messages, vec!["Vehicle monitor initialized"]);
        assert_eq!(overwatch.state(EntityKind::Building), MonitorState::Uninitialized);
    }

    #[test]
    fn animals_bring_buildings_along() {
        let mut sim = sandbox();
        let enable = MonitorToggles {
            animal: true,
            ..MonitorToggles::default()
        };
        let mut overwatch = Overwatch::with_notifier(config(enable), RecordingNotifier::default());

        let summary = step(&mut overwatch, &mut sim);

        assert!(overwatch.config().enable.building);
        assert!(matches!(summary.buildings, TickOutcome::Initialized { .. }));
        assert!(matches!(summary.animals, TickOutcome::Initialized { .. }));
        assert_eq!(
            overwatch.notifier().messages,
            vec!["Building monitor initialized", "Animal monitor initialized"]
        );
    }

    #[test]
    fn failing_building_monitor_terminates_and_starves_animals() {
        let mut sim = sandbox();
        let mut config = config(MonitorToggles::all());
        config.building_frames = 3;
        let mut overwatch = Overwatch::with_notifier(config, RecordingNotifier::default());

        let summary = step(&mut overwatch, &mut sim);
        assert_eq!(summary.buildings, TickOutcome::Terminated);
        assert_eq!(summary.animals, TickOutcome::Idle);
        assert!(matches!(summary.vehicles, TickOutcome::Initialized { .. }));
        assert!(overwatch
            .notifier()
            .messages
            .iter()
            .any(|message| message.starts_with("Building monitor terminated")));

        let summary = step(&mut overwatch, &mut sim);
        assert_eq!(summary.buildings, TickOutcome::Terminated);
        assert_eq!(summary.animals, TickOutcome::Idle);
        assert_eq!(overwatch.state(EntityKind::Building), MonitorState::Terminated);
        assert_eq!(overwatch.state(EntityKind::Animal), MonitorState::Uninitialized);
    }

    #[test]
    fn whole_pipeline_tracks_a_seagull_through_its_building() {
        let mut sim = sandbox();
        let park = sim
            .building_prefabs()
            .prefab_id_by_name("Park")
            .expect("park");
        let seagull = sim
            .citizen_prefabs()
            .prefab_id_by_name("Seagull")
            .expect("seagull");
        let mut overwatch =
            Overwatch::with_notifier(config(MonitorToggles::all()), RecordingNotifier::default());
        sim.place_building(EntityId(5), park);
        step(&mut overwatch, &mut sim);

        sim.spawn_citizen_instance(EntityId(4), seagull);
        sim.attach_to_building(EntityId(5), EntityId(4));
        sim.mark_building_updated(EntityId(5));
        step(&mut overwatch, &mut sim);

        let animals = overwatch.animals();
        assert!(animals.changes().added().contains(&EntityId(4)));
        assert!(animals.categories().contains(AnimalCategory::Seagulls, EntityId(4)));
    }

    #[test]
    fn request_removal_is_routed_by_kind() {
        let mut sim = sandbox();
        let bus = sim
            .vehicle_prefabs()
            .prefab_id_by_name("Bus")
            .expect("bus");
        sim.spawn_vehicle(EntityId(6), bus);
        let mut overwatch =
            Overwatch::with_notifier(config(MonitorToggles::all()), RecordingNotifier::default());
        step(&mut overwatch, &mut sim);

        sim.despawn_vehicle(EntityId(6));
        assert!(!overwatch.request_removal(&sim, EntityKind::Building, EntityId(6)));
        assert!(overwatch.request_removal(&sim, EntityKind::Vehicle, EntityId(6)));
        assert!(!overwatch
            .vehicles()
            .categories()
            .contains(VehicleCategory::Buses, EntityId(6)));
    }

    #[test]
    fn out_of_range_removal_terminates_only_that_monitor() {
        let mut sim = sandbox();
        let mut overwatch =
            Overwatch::with_notifier(config(MonitorToggles::all()), RecordingNotifier::default());
        step(&mut overwatch, &mut sim);

        assert!(!overwatch.request_removal(&sim, EntityKind::Vehicle, EntityId(99)));

        assert_eq!(overwatch.state(EntityKind::Vehicle), MonitorState::Terminated);
        assert_eq!(overwatch.state(EntityKind::Building), MonitorState::Steady);
    }

    #[test]
    fn release_returns_every_monitor_to_uninitialized() {
        let mut sim = sandbox();
        let mut overwatch =
            Overwatch::with_notifier(config(MonitorToggles::all()), RecordingNotifier::default());
        step(&mut overwatch, &mut sim);

        overwatch.on_release();

        for kind in [EntityKind::Building, EntityKind::Vehicle, EntityKind::Animal] {
            assert_eq!(overwatch.state(kind), MonitorState::Uninitialized);
        }
        let summary = step(&mut overwatch, &mut sim);
        assert!(matches!(summary.buildings, TickOutcome::Initialized { .. }));
    }
}
