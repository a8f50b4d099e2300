use crate::prefab::{PrefabCatalog, PrefabId};
use crate::taxonomy::{BuildingAi, CitizenAi, VehicleAi};
use crate::EntityId;

pub trait Simulation {
    /// Monotonic tick counter; wraps at `u32::MAX` and holds still while paused.
    fn frame_index(&self) -> u32;
    fn is_paused(&self) -> bool;
    fn buildings(&self) -> &[BuildingSlot];
    fn vehicles(&self) -> &[VehicleSlot];
    fn citizen_instances(&self) -> &[CitizenInstanceSlot];
    fn building_prefabs(&self) -> &PrefabCatalog<BuildingAi>;
    fn vehicle_prefabs(&self) -> &PrefabCatalog<VehicleAi>;
    fn citizen_prefabs(&self) -> &PrefabCatalog<CitizenAi>;
    /// Buildings the host touched since the previous simulation tick, as a
    /// bitset of 64-bit words.
    fn updated_buildings(&self) -> &[u64];
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildingProblems {
    pub fire: bool,
    pub crime: bool,
    pub dirty_water: bool,
    pub pollution: bool,
    pub noise: bool,
}

impl BuildingProblems {
    pub fn illness(&self) -> bool {
        self.dirty_water || self.pollution || self.noise
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildingSlot {
    pub prefab: Option<PrefabId>,
    pub created: bool,
    pub abandoned: bool,
    pub burned_down: bool,
    pub capacity_step1: bool,
    pub capacity_step2: bool,
    pub capacity_full: bool,
    pub problems: BuildingProblems,
    pub death_problem_timer: u8,
    pub garbage_amount: u32,
    /// Head of the linked list of citizen instances targeting this building.
    pub target_citizens: Option<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleSlot {
    pub prefab: Option<PrefabId>,
    pub created: bool,
    pub spawned: bool,
    pub leading_vehicle: Option<EntityId>,
    pub cargo_parent: Option<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitizenInstanceSlot {
    pub prefab: Option<PrefabId>,
    pub created: bool,
    pub next_target_instance: Option<EntityId>,
}

/// Decodes the host's updated-buildings bitset: bit `j` of word `i` names
/// building `i * 64 + j`.
pub fn updated_building_ids(words: &[u64]) -> impl Iterator<Item = EntityId> + '_ {
    words
        .iter()
        .enumerate()
        .filter(|(_, word)| **word != 0)
        .flat_map(|(word_index, word)| {
            (0..64usize)
                .filter(move |bit| word & (1u64 << bit) != 0)
                .filter_map(move |bit| EntityId::from_index(word_index << 6 | bit))
        })
}

/// Sets the bit for `id`, growing `words` as needed.
pub fn mark_building_updated(words: &mut Vec<u64>, id: EntityId) {
    let word_index = id.index() >> 6;
    if words.len() <= word_index {
        words.resize(word_index + 1, 0);
    }
    words[word_index] |= 1u64 << (id.index() & 63);
}
