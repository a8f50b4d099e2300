use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use tracing::debug;

use crate::category::CategoryRegistry;
use crate::changeset::Changeset;
use crate::classify::CategorizationCache;
use crate::host::Simulation;
use crate::prefab::TrackedPrefabs;
use crate::probe::{self, slot_at};
use crate::scheduler::FrameLayout;
use crate::taxonomy::{AnimalCategory, BuildingCategory, ANIMAL_TABLE};
use crate::{EntityId, EntityKind};

use super::roster::{Roster, Visit};
use super::{BuildingMonitor, Monitor, MonitorError, MonitorState, PauseThrottle, TickOutcome};

/// Finds animals through the occupant lists of updated or removed buildings.
///
/// An animal whose building is never reported again stays tracked until
/// release.
#[derive(Debug)]
pub struct AnimalMonitor {
    state: MonitorState,
    tracked_names: Vec<String>,
    roster: Roster<AnimalCategory>,
    /// Tracked animals last seen in each building's occupant list.
    residents: BTreeMap<EntityId, BTreeSet<EntityId>>,
    throttle: PauseThrottle,
}

impl AnimalMonitor {
    pub fn new(tracked_names: Vec<String>) -> Self {
        Self {
            state: MonitorState::Uninitialized,
            tracked_names,
            roster: Roster::new(AnimalCategory::All),
            residents: BTreeMap::new(),
            throttle: PauseThrottle::default(),
        }
    }

    /// Runs one tick against the building monitor's output for the same tick.
    ///
    /// Initialization waits for a steady building monitor; `None` means the
    /// building monitor is unavailable and nothing is scanned.
    pub fn update(
        &mut self,
        sim: &dyn Simulation,
        buildings: Option<&BuildingMonitor>,
    ) -> Result<TickOutcome, MonitorError> {
        let buildings = buildings.filter(|monitor| monitor.state() == MonitorState::Steady);
        match self.state {
            MonitorState::Terminated => Ok(TickOutcome::Terminated),
            MonitorState::Uninitialized | MonitorState::Initializing => match buildings {
                Some(buildings) => self.initialize(sim, buildings),
                None => Ok(TickOutcome::Idle),
            },
            MonitorState::Steady if sim.is_paused() => Ok(TickOutcome::Idle),
            MonitorState::Steady => {
                self.roster.begin_tick();
                match buildings {
                    Some(buildings) => self.follow_buildings(sim, buildings.changes()),
                    None => Ok(TickOutcome::Idle),
                }
            }
        }
    }

    fn initialize(
        &mut self,
        sim: &dyn Simulation,
        buildings: &BuildingMonitor,
    ) -> Result<TickOutcome, MonitorError> {
        self.state = MonitorState::Initializing;
        let capacity = sim.citizen_instances().len();
        let layout = FrameLayout::new(1, capacity).map_err(|source| MonitorError::Layout {
            kind: EntityKind::Animal,
            source,
        })?;

        let tracked_prefabs = TrackedPrefabs::resolve(sim.citizen_prefabs(), &self.tracked_names);
        self.roster.reset(capacity, tracked_prefabs);
        self.residents.clear();

        for id in layout.all_ids() {
            self.visit(sim, id)?;
        }
        for &building in buildings.categories().members(BuildingCategory::All) {
            let attached: BTreeSet<EntityId> = self
                .occupants(sim, building)?
                .into_iter()
                .filter(|id| self.roster.is_tracked(*id))
                .collect();
            if !attached.is_empty() {
                self.residents.insert(building, attached);
            }
        }

        self.state = MonitorState::Steady;
        debug!(
            monitor = %EntityKind::Animal,
            capacity,
            tracked = self.roster.tracked_count(),
            buildings_with_animals = self.residents.len(),
            "full_scan_complete"
        );
        Ok(TickOutcome::Initialized {
            tracked: self.roster.tracked_count(),
        })
    }

    fn follow_buildings(
        &mut self,
        sim: &dyn Simulation,
        buildings: &Changeset,
    ) -> Result<TickOutcome, MonitorError> {
        if buildings.updated().is_empty() && buildings.removed().is_empty() {
            return Ok(TickOutcome::Idle);
        }

        let mut visited = 0;
        let mut departed = Vec::new();
        for &building in buildings.updated() {
            let mut attached = BTreeSet::new();
            for id in self.occupants(sim, building)? {
                let visit = self.visit(sim, id)?;
                visit.record(id, &mut self.roster.changes);
                visited += 1;
                if visit.is_live() {
                    attached.insert(id);
                }
            }

            let previous = if attached.is_empty() {
                self.residents.remove(&building)
            } else {
                self.residents.insert(building, attached.clone())
            };
            departed.extend(previous.unwrap_or_default().difference(&attached).copied());
        }

        // after every walk, so an animal that moved between two updated
        // buildings is seen at its new one first
        for id in departed {
            self.drop_unseen(id);
        }
        for building in buildings.removed() {
            for animal in self.residents.remove(building).unwrap_or_default() {
                self.drop_unseen(animal);
            }
        }

        Ok(TickOutcome::Scanned {
            frames: 0,
            visited,
        })
    }

    /// Removes an animal that lost its building, unless it already showed up
    /// live elsewhere this tick.
    fn drop_unseen(&mut self, id: EntityId) {
        let changes = &self.roster.changes;
        if changes.updated().contains(&id) || changes.removed().contains(&id) {
            return;
        }
        if self.roster.forget(id) {
            self.roster.changes.record_removed(id);
        }
    }

    /// Citizen instances heading to `building`, in list order.
    fn occupants(
        &self,
        sim: &dyn Simulation,
        building: EntityId,
    ) -> Result<Vec<EntityId>, MonitorError> {
        let slot = slot_at(sim.buildings(), EntityKind::Building, building)?;
        let instances = sim.citizen_instances();
        let limit = instances.len();

        let mut occupants = Vec::new();
        let mut next = slot.target_citizens;
        while let Some(id) = next {
            if occupants.len() >= limit {
                return Err(MonitorError::OccupantCycle { building, limit });
            }
            next = slot_at(instances, EntityKind::Animal, id)?.next_target_instance;
            occupants.push(id);
        }
        Ok(occupants)
    }

    fn visit(&mut self, sim: &dyn Simulation, id: EntityId) -> Result<Visit, MonitorError> {
        let slot = slot_at(sim.citizen_instances(), EntityKind::Animal, id)?;
        Ok(match probe::animal(slot, sim.citizen_prefabs()) {
            Some(prefab) => self.roster.admit(id, prefab, &ANIMAL_TABLE),
            None => {
                if self.roster.forget(id) {
                    Visit::Removed
                } else {
                    Visit::Absent
                }
            }
        })
    }

    /// Probes `id` outside any building walk; purges it if it is no longer a
    /// live animal. Published with the next tick's changes.
    pub fn request_removal(
        &mut self,
        sim: &dyn Simulation,
        id: EntityId,
    ) -> Result<bool, MonitorError> {
        if self.state != MonitorState::Steady {
            return Ok(false);
        }
        let slot = slot_at(sim.citizen_instances(), EntityKind::Animal, id)?;
        if probe::animal(slot, sim.citizen_prefabs()).is_some() {
            return Ok(false);
        }
        if self.roster.forget(id) {
            self.roster.pending.record_removed(id);
            return Ok(true);
        }
        Ok(false)
    }

    pub fn categories(&self) -> &CategoryRegistry<AnimalCategory> {
        &self.roster.categories
    }

    pub fn cache(&self) -> &CategorizationCache<AnimalCategory> {
        &self.roster.cache
    }

    pub fn tracked_prefabs(&self) -> &TrackedPrefabs {
        &self.roster.tracked_prefabs
    }

    pub fn is_tracked(&self, id: EntityId) -> bool {
        self.roster.is_tracked(id)
    }

    pub fn residents_of(&self, building: EntityId) -> Option<&BTreeSet<EntityId>> {
        self.residents.get(&building)
    }
}

impl Monitor for AnimalMonitor {
    fn kind(&self) -> EntityKind {
        EntityKind::Animal
    }

    fn state(&self) -> MonitorState {
        self.state
    }

    fn changes(&self) -> &Changeset {
        &self.roster.changes
    }

    fn tracked_count(&self) -> usize {
        self.roster.tracked_count()
    }

    fn terminate(&mut self) {
        self.state = MonitorState::Terminated;
    }

    fn release(&mut self) {
        self.roster.release();
        self.residents.clear();
        self.throttle.reset();
        self.state = MonitorState::Uninitialized;
    }

    fn write_report(&self, out: &mut String) {
        let _ = writeln!(out, "{} monitor", EntityKind::Animal.title());
        self.roster.categories.write_report(out);
        self.roster.changes.write_report(out);
    }

    fn throttle(&mut self) -> &mut PauseThrottle {
        &mut self.throttle
    }
}
