use std::collections::VecDeque;

use overwatch::{EntityId, PrefabId, SandboxCapacities, SandboxSimulation, Simulation};
use serde::Serialize;

const SLOT_STRIDE: usize = 7_919;
const PAUSE_START: u32 = 480;
const PAUSE_STEPS: u32 = 24;
const GARBAGE_PILE: u32 = 3_000;

// Butterflies are never rendered and residents are not animals; both are
// spawned so the sandbox exercises the probe rejecting them.
const CITIZEN_NAMES: [&str; 11] = [
    "Seagull",
    "Pigeon",
    "Cow",
    "Pig",
    "Dog",
    "Wolf",
    "Bear",
    "MooseMale",
    "MooseFemale",
    "Butterfly",
    "Resident",
];

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct ScenarioStats {
    pub(crate) buildings_placed: u32,
    pub(crate) buildings_demolished: u32,
    pub(crate) buildings_abandoned: u32,
    pub(crate) vehicles_spawned: u32,
    pub(crate) vehicles_despawned: u32,
    pub(crate) arrivals: u32,
    pub(crate) departures: u32,
    pub(crate) paused_steps: u32,
}

/// Walks a slot array with a stride coprime to its capacity, visiting every
/// slot once per lap.
#[derive(Debug)]
struct SlotCursor {
    capacity: usize,
    next: usize,
}

impl SlotCursor {
    fn new(capacity: usize) -> Self {
        Self { capacity, next: 0 }
    }

    fn advance(&mut self) -> Option<EntityId> {
        if self.capacity == 0 {
            return None;
        }
        let id = EntityId::from_index(self.next);
        self.next = (self.next + SLOT_STRIDE) % self.capacity;
        id
    }
}

#[derive(Debug)]
pub(crate) struct Scenario {
    building_pool: usize,
    vehicle_pool: usize,
    animal_pool: usize,
    building_slots: SlotCursor,
    vehicle_slots: SlotCursor,
    citizen_slots: SlotCursor,
    buildings: VecDeque<EntityId>,
    vehicles: VecDeque<EntityId>,
    /// (citizen instance, building it targets)
    citizens: VecDeque<(EntityId, EntityId)>,
    citizen_prefabs: Vec<PrefabId>,
    stats: ScenarioStats,
}

impl Scenario {
    pub(crate) fn new(capacities: SandboxCapacities, sim: &SandboxSimulation) -> Self {
        let citizen_prefabs = CITIZEN_NAMES
            .iter()
            .filter_map(|name| sim.citizen_prefabs().prefab_id_by_name(name))
            .collect();
        Self {
            building_pool: (capacities.buildings / 4).min(48),
            vehicle_pool: (capacities.vehicles / 4).min(96),
            animal_pool: (capacities.citizen_instances / 4).min(64),
            building_slots: SlotCursor::new(capacities.buildings),
            vehicle_slots: SlotCursor::new(capacities.vehicles),
            citizen_slots: SlotCursor::new(capacities.citizen_instances),
            buildings: VecDeque::new(),
            vehicles: VecDeque::new(),
            citizens: VecDeque::new(),
            citizen_prefabs,
            stats: ScenarioStats::default(),
        }
    }

    pub(crate) fn stats(&self) -> ScenarioStats {
        self.stats
    }

    /// Applies the host changes scripted for `step`. Nothing moves while the
    /// host is paused.
    pub(crate) fn apply(&mut self, step: u32, sim: &mut SandboxSimulation) {
        let paused = (PAUSE_START..PAUSE_START + PAUSE_STEPS).contains(&step);
        sim.set_paused(paused);
        if paused {
            self.stats.paused_steps += 1;
            return;
        }

        if step % 2 == 0 {
            self.place_building(step, sim);
        }
        if step % 5 == 0 && self.buildings.len() > self.building_pool {
            self.demolish_oldest(sim);
        }
        if step % 11 == 0 {
            self.abandon_one(step, sim);
        }

        self.spawn_vehicle(step, sim);
        if self.vehicles.len() > self.vehicle_pool {
            self.despawn_oldest_vehicle(sim);
        }

        if step % 3 == 0 {
            self.citizen_arrives(step, sim);
        }
        if step % 4 == 0 && self.citizens.len() > self.animal_pool {
            self.citizen_departs(sim);
        }
    }

    fn place_building(&mut self, step: u32, sim: &mut SandboxSimulation) {
        let Some(id) = self.building_slots.advance() else {
            return;
        };
        let kinds = sim.building_prefabs().len();
        if kinds == 0 || sim.buildings()[id.index()].created {
            return;
        }

        let prefab = PrefabId(((step as usize / 2) % kinds) as u32);
        let slot = sim.place_building(id, prefab);
        slot.problems.crime = step % 9 == 0;
        if step % 7 == 0 {
            slot.garbage_amount = GARBAGE_PILE;
        }
        self.buildings.push_back(id);
        self.stats.buildings_placed += 1;
    }

    fn demolish_oldest(&mut self, sim: &mut SandboxSimulation) {
        let Some(id) = self.buildings.pop_front() else {
            return;
        };
        let (evicted, staying): (Vec<_>, Vec<_>) =
            self.citizens.drain(..).partition(|(_, home)| *home == id);
        self.citizens = staying.into();
        for (citizen, _) in evicted {
            sim.despawn_citizen_instance(citizen);
            self.stats.departures += 1;
        }
        sim.demolish_building(id);
        self.stats.buildings_demolished += 1;
    }

    fn abandon_one(&mut self, step: u32, sim: &mut SandboxSimulation) {
        if self.buildings.is_empty() {
            return;
        }
        let id = self.buildings[step as usize % self.buildings.len()];
        let slot = sim.building_mut(id);
        if slot.abandoned {
            return;
        }
        slot.abandoned = true;
        sim.mark_building_updated(id);
        self.stats.buildings_abandoned += 1;
    }

    fn spawn_vehicle(&mut self, step: u32, sim: &mut SandboxSimulation) {
        let Some(id) = self.vehicle_slots.advance() else {
            return;
        };
        let kinds = sim.vehicle_prefabs().len();
        if kinds == 0 || sim.vehicles()[id.index()].created {
            return;
        }

        let prefab = PrefabId((step as usize % kinds) as u32);
        // every ninth vehicle hitches onto the previous one
        let leader = if step % 9 == 0 {
            self.vehicles.back().copied()
        } else {
            None
        };
        sim.spawn_vehicle(id, prefab).leading_vehicle = leader;
        self.vehicles.push_back(id);
        self.stats.vehicles_spawned += 1;
    }

    fn despawn_oldest_vehicle(&mut self, sim: &mut SandboxSimulation) {
        if let Some(id) = self.vehicles.pop_front() {
            sim.despawn_vehicle(id);
            self.stats.vehicles_despawned += 1;
        }
    }

    fn citizen_arrives(&mut self, step: u32, sim: &mut SandboxSimulation) {
        if self.buildings.is_empty() || self.citizen_prefabs.is_empty() {
            return;
        }
        let Some(id) = self.citizen_slots.advance() else {
            return;
        };
        if sim.citizen_instances()[id.index()].created {
            return;
        }

        let home = self.buildings[step as usize % self.buildings.len()];
        let prefab = self.citizen_prefabs[(step / 3) as usize % self.citizen_prefabs.len()];
        sim.spawn_citizen_instance(id, prefab);
        sim.attach_to_building(home, id);
        sim.mark_building_updated(home);
        self.citizens.push_back((id, home));
        self.stats.arrivals += 1;
    }

    fn citizen_departs(&mut self, sim: &mut SandboxSimulation) {
        if let Some((id, home)) = self.citizens.pop_front() {
            sim.despawn_citizen_instance(id);
            sim.mark_building_updated(home);
            self.stats.departures += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use overwatch::{
        AnimalCategory, BuildingCategory, EntityKind, Monitor, MonitorState, Overwatch,
        OverwatchConfig, VehicleCategory,
    };

    use super::*;

    fn capacities() -> SandboxCapacities {
        SandboxCapacities {
            buildings: 256,
            vehicles: 64,
            citizen_instances: 256,
        }
    }

    fn step(overwatch: &mut Overwatch, sim: &mut SandboxSimulation) {
        overwatch.before_simulation_tick(&*sim);
        sim.advance();
        overwatch.on_update(&*sim);
    }

    fn live_buildings(sim: &SandboxSimulation) -> BTreeSet<EntityId> {
        sim.buildings()
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.created)
            .filter_map(|(index, _)| EntityId::from_index(index))
            .collect()
    }

    fn live_vehicles(sim: &SandboxSimulation) -> BTreeSet<EntityId> {
        sim.vehicles()
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                slot.created
                    && slot.spawned
                    && slot.leading_vehicle.is_none()
                    && slot.cargo_parent.is_none()
            })
            .filter_map(|(index, _)| EntityId::from_index(index))
            .collect()
    }

    fn live_animals(sim: &SandboxSimulation) -> BTreeSet<EntityId> {
        let catalog = sim.citizen_prefabs();
        sim.citizen_instances()
            .iter()
            .enumerate()
            .filter(|(_, slot)| {
                slot.created
                    && slot
                        .prefab
                        .and_then(|id| catalog.prefab(id))
                        .is_some_and(|prefab| prefab.tag.is_animal() && prefab.is_rendered())
            })
            .filter_map(|(index, _)| EntityId::from_index(index))
            .collect()
    }

    #[test]
    fn slot_cursor_visits_every_slot_once_per_lap() {
        let mut cursor = SlotCursor::new(256);
        let lap: BTreeSet<_> = (0..256).filter_map(|_| cursor.advance()).collect();

        assert_eq!(lap.len(), 256);
        assert_eq!(cursor.advance(), Some(EntityId(0)));
        assert_eq!(SlotCursor::new(0).advance(), None);
    }

    #[test]
    fn pause_window_freezes_the_host() {
        let mut sim = SandboxSimulation::new(capacities());
        let mut scenario = Scenario::new(capacities(), &sim);
        for step in 0..PAUSE_START {
            scenario.apply(step, &mut sim);
            sim.advance();
        }
        let before = scenario.stats();

        scenario.apply(PAUSE_START, &mut sim);
        assert!(sim.is_paused());
        assert_eq!(scenario.stats().paused_steps, 1);
        assert_eq!(scenario.stats().buildings_placed, before.buildings_placed);

        scenario.apply(PAUSE_START + PAUSE_STEPS, &mut sim);
        assert!(!sim.is_paused());
    }

    #[test]
    fn monitors_converge_on_host_state_once_churn_stops() {
        let mut sim = SandboxSimulation::new(capacities());
        let mut overwatch = Overwatch::new(OverwatchConfig {
            building_frames: 4,
            vehicle_frames: 4,
            ..OverwatchConfig::all_enabled()
        });
        let mut scenario = Scenario::new(capacities(), &sim);

        for index in 0..600 {
            scenario.apply(index, &mut sim);
            step(&mut overwatch, &mut sim);
        }
        // two quiet laps of the slowest layout
        for _ in 0..8 {
            step(&mut overwatch, &mut sim);
        }

        let stats = scenario.stats();
        assert!(stats.buildings_demolished > 0);
        assert!(stats.vehicles_despawned > 0);
        assert!(stats.departures > 0);

        for kind in [EntityKind::Building, EntityKind::Vehicle, EntityKind::Animal] {
            assert_eq!(overwatch.state(kind), MonitorState::Steady);
        }
        assert_eq!(
            overwatch.buildings().categories().members(BuildingCategory::All),
            &live_buildings(&sim)
        );
        assert_eq!(
            overwatch.vehicles().categories().members(VehicleCategory::All),
            &live_vehicles(&sim)
        );
        assert_eq!(
            overwatch.animals().categories().members(AnimalCategory::All),
            &live_animals(&sim)
        );
        assert_eq!(overwatch.animals().tracked_count(), live_animals(&sim).len());
    }
}
