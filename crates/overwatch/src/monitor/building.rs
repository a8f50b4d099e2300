use crate::category::CategoryRegistry;
use crate::classify::ClassificationTable;
use crate::host::{updated_building_ids, BuildingSlot, Simulation};
use crate::prefab::{Prefab, PrefabCatalog};
use crate::probe;
use crate::taxonomy::{BuildingAi, BuildingCategory, BuildingCondition, BUILDING_TABLE};
use crate::{EntityId, EntityKind};

use super::roster::Visit;
use super::{MonitorError, MonitorState, PopulationMonitor, ScanKind};

/// Garbage above this amount puts a building in `WithGarbage`.
pub const GARBAGE_THRESHOLD: u32 = 2500;

/// Buildings carry instance conditions next to their prefab categories.
#[derive(Debug, Default)]
pub struct Buildings {
    conditions: CategoryRegistry<BuildingCondition>,
}

impl Buildings {
    pub fn conditions(&self) -> &CategoryRegistry<BuildingCondition> {
        &self.conditions
    }
}

impl ScanKind for Buildings {
    type Tag = BuildingAi;
    type Category = BuildingCategory;
    type Slot = BuildingSlot;

    const KIND: EntityKind = EntityKind::Building;
    const TOP: BuildingCategory = BuildingCategory::All;

    fn slots(sim: &dyn Simulation) -> &[BuildingSlot] {
        sim.buildings()
    }

    fn catalog(sim: &dyn Simulation) -> &PrefabCatalog<BuildingAi> {
        sim.building_prefabs()
    }

    fn probe<'c>(
        slot: &BuildingSlot,
        catalog: &'c PrefabCatalog<BuildingAi>,
    ) -> Option<&'c Prefab<BuildingAi>> {
        probe::building(slot, catalog)
    }

    fn table() -> &'static ClassificationTable<BuildingAi, BuildingCategory> {
        &BUILDING_TABLE
    }

    fn refresh(&mut self, id: EntityId, slot: &BuildingSlot, prefab: &Prefab<BuildingAi>) {
        use BuildingCondition as C;
        let conditions = &mut self.conditions;

        // Abandoned wins over burned down; either one clears everything else.
        if slot.abandoned || slot.burned_down {
            conditions.remove_everywhere(id);
            let ruin = if slot.abandoned {
                C::Abandoned
            } else {
                C::BurnedDown
            };
            conditions.insert(ruin, id);
            return;
        }

        conditions.remove(C::Abandoned, id);
        conditions.remove(C::BurnedDown, id);
        conditions.assign(C::WithDead, id, slot.death_problem_timer > 0);
        conditions.assign(
            C::WithGarbage,
            id,
            slot.garbage_amount > GARBAGE_THRESHOLD && prefab.tag != BuildingAi::LandfillSite,
        );
        conditions.assign(C::WithFire, id, slot.problems.fire);
        conditions.assign(C::WithCrime, id, slot.problems.crime);
        conditions.assign(C::WithIllness, id, slot.problems.illness());
        conditions.assign(C::CapacityStep1, id, slot.capacity_step1);
        conditions.assign(C::CapacityStep2, id, slot.capacity_step2);
        conditions.assign(C::CapacityFull, id, slot.capacity_full);
    }

    fn forget(&mut self, id: EntityId) {
        self.conditions.remove_everywhere(id);
    }

    fn clear(&mut self) {
        self.conditions.clear();
    }

    fn write_report(&self, out: &mut String) {
        self.conditions.write_report(out);
    }
}

impl PopulationMonitor<Buildings> {
    pub fn conditions(&self) -> &CategoryRegistry<BuildingCondition> {
        self.kind.conditions()
    }

    /// Re-evaluates every building the host flagged since its last tick.
    ///
    /// Flagged buildings are purged and probed again at once. Live ones are
    /// queued as added and updated, vanished ones as removed; the queue is
    /// published with the next tick's changes. Returns the number of
    /// buildings processed.
    pub fn before_simulation_tick(&mut self, sim: &dyn Simulation) -> Result<usize, MonitorError> {
        if self.state != MonitorState::Steady {
            return Ok(0);
        }

        let mut processed = 0;
        for id in updated_building_ids(sim.updated_buildings()) {
            let was_tracked = self.forget(id);
            let visit = self.visit(sim, id)?;
            if visit.is_live() {
                Visit::Admitted.record(id, &mut self.roster.pending);
            } else if was_tracked {
                self.roster.pending.record_removed(id);
            }
            processed += 1;
        }
        Ok(processed)
    }
}
