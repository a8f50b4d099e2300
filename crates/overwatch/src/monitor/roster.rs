use crate::category::{Category, CategoryRegistry};
use crate::changeset::Changeset;
use crate::classify::{CategorizationCache, ClassificationTable};
use crate::prefab::{Prefab, PrefabId, TrackedPrefabs};
use crate::EntityId;

/// Membership bookkeeping shared by every monitor: category sets, the prefab
/// cache feeding them, and the tick's changesets.
#[derive(Debug)]
pub(crate) struct Roster<C: Category> {
    top: C,
    pub(crate) categories: CategoryRegistry<C>,
    pub(crate) cache: CategorizationCache<C>,
    pub(crate) tracked_prefabs: TrackedPrefabs,
    pub(crate) changes: Changeset,
    /// Changes reported between ticks, published at the start of the next one.
    pub(crate) pending: Changeset,
    /// Prefab each slot was admitted with, to catch slot reuse.
    admitted_as: Vec<Option<PrefabId>>,
}

/// What a single probe of one id did to the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Visit {
    Admitted,
    Refreshed,
    Removed,
    Absent,
}

impl Visit {
    pub(crate) fn record(self, id: EntityId, changes: &mut Changeset) {
        match self {
            Self::Admitted => {
                changes.record_added(id);
                changes.record_updated(id);
            }
            Self::Refreshed => changes.record_updated(id),
            Self::Removed => changes.record_removed(id),
            Self::Absent => {}
        }
    }

    pub(crate) fn is_live(self) -> bool {
        matches!(self, Self::Admitted | Self::Refreshed)
    }
}

impl<C: Category> Roster<C> {
    pub(crate) fn new(top: C) -> Self {
        Self {
            top,
            categories: CategoryRegistry::new(),
            cache: CategorizationCache::new(),
            tracked_prefabs: TrackedPrefabs::default(),
            changes: Changeset::default(),
            pending: Changeset::default(),
            admitted_as: Vec::new(),
        }
    }

    pub(crate) fn reset(&mut self, capacity: usize, tracked_prefabs: TrackedPrefabs) {
        self.release();
        self.tracked_prefabs = tracked_prefabs;
        self.admitted_as = vec![None; capacity];
    }

    pub(crate) fn release(&mut self) {
        self.categories.clear();
        self.cache.clear();
        self.tracked_prefabs = TrackedPrefabs::default();
        self.changes.clear();
        self.pending.clear();
        self.admitted_as.clear();
    }

    pub(crate) fn is_tracked(&self, id: EntityId) -> bool {
        self.categories.contains(self.top, id)
    }

    pub(crate) fn tracked_count(&self) -> usize {
        self.categories.len(self.top)
    }

    /// Adds a live `id` to every category of `prefab`. A slot that now holds a
    /// different prefab than the one it was admitted with is forgotten first,
    /// so membership always equals the current prefab's classification.
    pub(crate) fn admit<T: PartialEq>(
        &mut self,
        id: EntityId,
        prefab: &Prefab<T>,
        table: &ClassificationTable<T, C>,
    ) -> Visit {
        let previous = self.admitted_as.get(id.index()).copied().flatten();
        let replaced = previous.is_some_and(|previous| previous != prefab.id) && self.forget(id);
        let was_tracked = self.is_tracked(id);

        let categories = self.cache.classify(prefab, table, &self.tracked_prefabs);
        self.categories.insert_all(categories, id);
        if let Some(entry) = self.admitted_as.get_mut(id.index()) {
            *entry = Some(prefab.id);
        }

        // a prefab that classifies into nothing is not tracked
        match (was_tracked, self.is_tracked(id)) {
            (true, true) => Visit::Refreshed,
            (false, true) => Visit::Admitted,
            (_, false) if replaced => Visit::Removed,
            (_, false) => Visit::Absent,
        }
    }

    /// Drops `id` from every category. Returns whether it was tracked.
    pub(crate) fn forget(&mut self, id: EntityId) -> bool {
        let was_tracked = self.is_tracked(id);
        self.categories.remove_everywhere(id);
        if let Some(entry) = self.admitted_as.get_mut(id.index()) {
            *entry = None;
        }
        was_tracked
    }

    pub(crate) fn begin_tick(&mut self) {
        self.changes.clear();
        self.changes.absorb(&mut self.pending);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefab::PrefabCatalog;
    use crate::taxonomy::{VehicleAi, VehicleCategory, VEHICLE_TABLE};

    fn catalog() -> PrefabCatalog<VehicleAi> {
        PrefabCatalog::from_prefabs(vec![Prefab::new(VehicleAi::Bus), Prefab::new(VehicleAi::Ship)])
    }

    #[test]
    fn admit_reports_first_sighting_only() {
        let catalog = catalog();
        let bus = catalog.prefab(PrefabId(0)).expect("bus");
        let mut roster = Roster::new(VehicleCategory::All);
        roster.reset(8, TrackedPrefabs::default());

        assert_eq!(roster.admit(EntityId(2), bus, &VEHICLE_TABLE), Visit::Admitted);
        assert_eq!(roster.admit(EntityId(2), bus, &VEHICLE_TABLE), Visit::Refreshed);
        assert_eq!(roster.cache.evaluations(), 1);
    }

    #[test]
    fn reused_slot_loses_its_old_categories() {
        let catalog = catalog();
        let bus = catalog.prefab(PrefabId(0)).expect("bus");
        let ship = catalog.prefab(PrefabId(1)).expect("ship");
        let mut roster = Roster::new(VehicleCategory::All);
        roster.reset(8, TrackedPrefabs::default());

        roster.admit(EntityId(5), bus, &VEHICLE_TABLE);
        let visit = roster.admit(EntityId(5), ship, &VEHICLE_TABLE);

        assert_eq!(visit, Visit::Admitted);
        assert_eq!(
            roster.categories.categories_of(EntityId(5)),
            vec![VehicleCategory::All, VehicleCategory::Ships]
        );
    }

    #[test]
    fn pending_changes_are_published_once() {
        let mut roster = Roster::new(VehicleCategory::All);
        roster.pending.record_removed(EntityId(1));

        roster.begin_tick();
        assert!(roster.changes.removed().contains(&EntityId(1)));

        roster.begin_tick();
        assert!(roster.changes.is_empty());
    }
}
