use std::fmt;

use serde::{Deserialize, Serialize};

pub mod category;
pub mod changeset;
pub mod classify;
pub mod config;
pub mod driver;
pub mod host;
pub mod monitor;
pub mod prefab;
pub mod probe;
pub mod sandbox;
pub mod scheduler;
pub mod taxonomy;

pub use category::{Category, CategoryRegistry};
pub use changeset::Changeset;
pub use classify::{CategorizationCache, ClassificationTable, NamedRule, TagRule};
pub use config::{ConfigError, MonitorToggles, OverwatchConfig, CONFIG_ENV_VAR};
pub use driver::{LogNotifier, Notifier, Overwatch, TickSummary};
pub use host::{
    updated_building_ids, BuildingProblems, BuildingSlot, CitizenInstanceSlot, Simulation,
    VehicleSlot,
};
pub use monitor::{
    AnimalMonitor, BuildingMonitor, Buildings, Monitor, MonitorError, MonitorState,
    PopulationMonitor, ScanKind, TickOutcome, VehicleMonitor, Vehicles,
};
pub use prefab::{Prefab, PrefabCatalog, PrefabId, TrackedPrefabs};
pub use sandbox::{SandboxCapacities, SandboxSimulation};
pub use scheduler::{FrameLayout, FrameScheduler, LayoutError, MAX_CAPACITY};
pub use taxonomy::{
    AnimalCategory, BuildingAi, BuildingCategory, BuildingCondition, CitizenAi, VehicleAi,
    VehicleCategory, ANIMAL_TABLE, BUILDING_TABLE, VEHICLE_TABLE,
};

/// Index into one of the host's fixed-capacity slot arrays.
///
/// An id names a slot, not an entity: the host recycles slots, so the same id
/// can refer to unrelated entities over the lifetime of a session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityId(pub u16);

impl EntityId {
    pub fn from_index(index: usize) -> Option<Self> {
        u16::try_from(index).ok().map(Self)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Building,
    Vehicle,
    Animal,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Vehicle => "vehicle",
            Self::Animal => "animal",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Building => "Building",
            Self::Vehicle => "Vehicle",
            Self::Animal => "Animal",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_from_index_rejects_values_past_u16() {
        assert_eq!(EntityId::from_index(0), Some(EntityId(0)));
        assert_eq!(EntityId::from_index(65_535), Some(EntityId(u16::MAX)));
        assert_eq!(EntityId::from_index(65_536), None);
    }

    #[test]
    fn entity_kind_labels_are_lowercase() {
        assert_eq!(EntityKind::Building.to_string(), "building");
        assert_eq!(EntityKind::Animal.title(), "Animal");
    }
}
