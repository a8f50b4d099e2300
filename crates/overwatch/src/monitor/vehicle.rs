use crate::classify::ClassificationTable;
use crate::host::{Simulation, VehicleSlot};
use crate::prefab::{Prefab, PrefabCatalog};
use crate::probe;
use crate::taxonomy::{VehicleAi, VehicleCategory, VEHICLE_TABLE};
use crate::EntityKind;

use super::ScanKind;

#[derive(Debug, Default)]
pub struct Vehicles;

impl ScanKind for Vehicles {
    type Tag = VehicleAi;
    type Category = VehicleCategory;
    type Slot = VehicleSlot;

    const KIND: EntityKind = EntityKind::Vehicle;
    const TOP: VehicleCategory = VehicleCategory::All;

    fn slots(sim: &dyn Simulation) -> &[VehicleSlot] {
        sim.vehicles()
    }

    fn catalog(sim: &dyn Simulation) -> &PrefabCatalog<VehicleAi> {
        sim.vehicle_prefabs()
    }

    fn probe<'c>(
        slot: &VehicleSlot,
        catalog: &'c PrefabCatalog<VehicleAi>,
    ) -> Option<&'c Prefab<VehicleAi>> {
        probe::vehicle(slot, catalog)
    }

    fn table() -> &'static ClassificationTable<VehicleAi, VehicleCategory> {
        &VEHICLE_TABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::monitor::{Monitor, MonitorState, TickOutcome, VehicleMonitor};
    use crate::prefab::PrefabId;
    use crate::sandbox::{SandboxCapacities, SandboxSimulation};
    use crate::EntityId;

    fn sandbox(vehicles: usize) -> SandboxSimulation {
        SandboxSimulation::new(SandboxCapacities {
            buildings: 4,
            vehicles,
            citizen_instances: 4,
        })
    }

    fn prefab(sim: &SandboxSimulation, name: &str) -> PrefabId {
        sim.vehicle_prefabs()
            .prefab_id_by_name(name)
            .expect("stock vehicle prefab")
    }

    fn ids(set: &std::collections::BTreeSet<EntityId>) -> Vec<u16> {
        set.iter().map(|id| id.0).collect()
    }

    #[test]
    fn two_frame_window_reports_updates_then_removal() {
        let mut sim = sandbox(4);
        let bus = prefab(&sim, "Bus");
        sim.spawn_vehicle(EntityId(0), bus);
        sim.spawn_vehicle(EntityId(1), bus);

        sim.set_frame_index(1);
        let mut monitor = VehicleMonitor::new(2, Vec::new());
        monitor.update(&sim).expect("initialize");

        // frame 0: both live
        sim.advance();
        monitor.update(&sim).expect("tick");
        assert_eq!(ids(monitor.changes().updated()), vec![0, 1]);
        assert!(monitor.changes().removed().is_empty());

        // frame 1: slots 2 and 3 were never seen
        sim.advance();
        monitor.update(&sim).expect("tick");
        assert!(monitor.changes().updated().is_empty());
        assert!(monitor.changes().removed().is_empty());

        // frame 0 again: vehicle 0 is gone
        sim.despawn_vehicle(EntityId(0));
        sim.advance();
        monitor.update(&sim).expect("tick");
        assert_eq!(ids(monitor.changes().removed()), vec![0]);
        assert_eq!(ids(monitor.changes().updated()), vec![1]);
        assert_eq!(ids(monitor.categories().members(VehicleCategory::Buses)), vec![1]);
    }

    #[test]
    fn one_cycle_covers_every_slot_exactly_once() {
        let mut sim = sandbox(16);
        let ship = prefab(&sim, "Ship");
        for index in 0..16 {
            sim.spawn_vehicle(EntityId(index), ship);
        }
        let mut monitor = VehicleMonitor::new(4, Vec::new());
        monitor.update(&sim).expect("initialize");

        let mut visits = [0u32; 16];
        for _ in 0..4 {
            sim.advance();
            monitor.update(&sim).expect("tick");
            for id in monitor.changes().updated() {
                visits[id.index()] += 1;
            }
        }

        assert!(visits.iter().all(|count| *count == 1));
    }

    #[test]
    fn paused_ticks_defer_without_losing_frames() {
        let mut sim = sandbox(8);
        let bus = prefab(&sim, "Bus");
        let mut monitor = VehicleMonitor::new(4, Vec::new());
        monitor.update(&sim).expect("initialize");
        for index in 0..8 {
            sim.spawn_vehicle(EntityId(index), bus);
        }

        sim.set_paused(true);
        assert_eq!(monitor.update(&sim).expect("paused"), TickOutcome::Idle);
        assert!(monitor.changes().is_empty());

        sim.set_paused(false);
        sim.set_frame_index(3);
        let outcome = monitor.update(&sim).expect("catch up");

        assert_eq!(
            outcome,
            TickOutcome::Scanned {
                frames: 3,
                visited: 6
            }
        );
        assert_eq!(ids(monitor.changes().added()), vec![2, 3, 4, 5, 6, 7]);
        assert_eq!(monitor.update(&sim).expect("same frame"), TickOutcome::Idle);
    }

    #[test]
    fn trailers_and_unspawned_vehicles_are_not_tracked() {
        let mut sim = sandbox(4);
        let car = prefab(&sim, "CarOther");
        sim.spawn_vehicle(EntityId(0), car);
        sim.spawn_vehicle(EntityId(1), car).leading_vehicle = Some(EntityId(0));
        sim.spawn_vehicle(EntityId(2), car).spawned = false;

        let mut monitor = VehicleMonitor::new(1, Vec::new());
        monitor.update(&sim).expect("initialize");

        assert_eq!(ids(monitor.categories().members(VehicleCategory::All)), vec![0]);
    }

    #[test]
    fn membership_matches_classification_after_slot_reuse() {
        let mut sim = sandbox(4);
        let hearse = prefab(&sim, "Hearse");
        let metro = prefab(&sim, "MetroTrain");
        sim.spawn_vehicle(EntityId(3), hearse);
        let mut monitor = VehicleMonitor::new(2, Vec::new());
        monitor.update(&sim).expect("initialize");

        sim.spawn_vehicle(EntityId(3), metro);
        sim.advance();
        monitor.update(&sim).expect("tick");

        assert_eq!(
            monitor.categories().categories_of(EntityId(3)),
            vec![
                VehicleCategory::All,
                VehicleCategory::Trains,
                VehicleCategory::MetroTrains
            ]
        );
        assert!(monitor.changes().added().contains(&EntityId(3)));
        assert!(monitor.changes().added().is_disjoint(monitor.changes().removed()));
    }

    #[test]
    fn terminated_monitor_ignores_ticks_until_release() {
        let mut sim = sandbox(4);
        let bus = prefab(&sim, "Bus");
        sim.spawn_vehicle(EntityId(0), bus);
        let mut monitor = VehicleMonitor::new(2, Vec::new());
        monitor.update(&sim).expect("initialize");

        monitor.terminate();
        sim.advance();
        assert_eq!(monitor.update(&sim).expect("noop"), TickOutcome::Terminated);
        assert_eq!(monitor.state(), MonitorState::Terminated);

        monitor.release();
        assert_eq!(monitor.state(), MonitorState::Uninitialized);
        assert!(monitor.scheduler().is_none());
        assert!(monitor.cache().is_empty());
        for category in VehicleCategory::ALL {
            assert!(monitor.categories().members(*category).is_empty());
        }

        let outcome = monitor.update(&sim).expect("reinitialize");
        assert_eq!(outcome, TickOutcome::Initialized { tracked: 1 });
    }
}
