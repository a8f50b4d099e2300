use crate::host::{
    mark_building_updated, BuildingSlot, CitizenInstanceSlot, Simulation, VehicleSlot,
};
use crate::prefab::{Prefab, PrefabCatalog, PrefabId};
use crate::taxonomy::{BuildingAi, CitizenAi, VehicleAi};
use crate::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SandboxCapacities {
    pub buildings: usize,
    pub vehicles: usize,
    pub citizen_instances: usize,
}

impl Default for SandboxCapacities {
    fn default() -> Self {
        Self {
            buildings: 49_152,
            vehicles: 16_384,
            citizen_instances: 65_536,
        }
    }
}

/// In-memory host. Mutators index slots directly and panic on an id past
/// capacity.
#[derive(Debug, Clone)]
pub struct SandboxSimulation {
    frame_index: u32,
    paused: bool,
    buildings: Vec<BuildingSlot>,
    vehicles: Vec<VehicleSlot>,
    citizen_instances: Vec<CitizenInstanceSlot>,
    building_prefabs: PrefabCatalog<BuildingAi>,
    vehicle_prefabs: PrefabCatalog<VehicleAi>,
    citizen_prefabs: PrefabCatalog<CitizenAi>,
    updated_buildings: Vec<u64>,
}

impl SandboxSimulation {
    pub fn new(capacities: SandboxCapacities) -> Self {
        Self::with_catalogs(
            capacities,
            stock_building_prefabs(),
            stock_vehicle_prefabs(),
            stock_citizen_prefabs(),
        )
    }

    pub fn with_catalogs(
        capacities: SandboxCapacities,
        building_prefabs: PrefabCatalog<BuildingAi>,
        vehicle_prefabs: PrefabCatalog<VehicleAi>,
        citizen_prefabs: PrefabCatalog<CitizenAi>,
    ) -> Self {
        Self {
            frame_index: 0,
            paused: false,
            buildings: vec![BuildingSlot::default(); capacities.buildings],
            vehicles: vec![VehicleSlot::default(); capacities.vehicles],
            citizen_instances: vec![CitizenInstanceSlot::default(); capacities.citizen_instances],
            building_prefabs,
            vehicle_prefabs,
            citizen_prefabs,
            updated_buildings: vec![0; capacities.buildings.div_ceil(64)],
        }
    }

    /// Ends a simulation step: the frame counter moves unless paused and the
    /// updated-buildings flags are consumed.
    pub fn advance(&mut self) {
        if !self.paused {
            self.frame_index = self.frame_index.wrapping_add(1);
        }
        self.clear_updated_buildings();
    }

    pub fn set_frame_index(&mut self, frame_index: u32) {
        self.frame_index = frame_index;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn clear_updated_buildings(&mut self) {
        self.updated_buildings.fill(0);
    }

    pub fn mark_building_updated(&mut self, id: EntityId) {
        mark_building_updated(&mut self.updated_buildings, id);
    }

    /// Creates a building in `id`, replacing whatever the slot held.
    pub fn place_building(&mut self, id: EntityId, prefab: PrefabId) -> &mut BuildingSlot {
        self.mark_building_updated(id);
        let slot = &mut self.buildings[id.index()];
        *slot = BuildingSlot {
            prefab: Some(prefab),
            created: true,
            ..BuildingSlot::default()
        };
        slot
    }

    /// Releases the slot. Occupants keep their links, as on a real host.
    pub fn demolish_building(&mut self, id: EntityId) {
        self.mark_building_updated(id);
        self.buildings[id.index()] = BuildingSlot::default();
    }

    pub fn building_mut(&mut self, id: EntityId) -> &mut BuildingSlot {
        &mut self.buildings[id.index()]
    }

    pub fn spawn_vehicle(&mut self, id: EntityId, prefab: PrefabId) -> &mut VehicleSlot {
        let slot = &mut self.vehicles[id.index()];
        *slot = VehicleSlot {
            prefab: Some(prefab),
            created: true,
            spawned: true,
            ..VehicleSlot::default()
        };
        slot
    }

    pub fn despawn_vehicle(&mut self, id: EntityId) {
        self.vehicles[id.index()] = VehicleSlot::default();
    }

    pub fn vehicle_mut(&mut self, id: EntityId) -> &mut VehicleSlot {
        &mut self.vehicles[id.index()]
    }

    pub fn spawn_citizen_instance(
        &mut self,
        id: EntityId,
        prefab: PrefabId,
    ) -> &mut CitizenInstanceSlot {
        let slot = &mut self.citizen_instances[id.index()];
        *slot = CitizenInstanceSlot {
            prefab: Some(prefab),
            created: true,
            next_target_instance: None,
        };
        slot
    }

    /// Unlinks the instance from every occupant list, then frees its slot.
    pub fn despawn_citizen_instance(&mut self, id: EntityId) {
        for index in 0..self.buildings.len() {
            if let Some(building) = EntityId::from_index(index) {
                self.detach_from_building(building, id);
            }
        }
        self.citizen_instances[id.index()] = CitizenInstanceSlot::default();
    }

    pub fn citizen_instance_mut(&mut self, id: EntityId) -> &mut CitizenInstanceSlot {
        &mut self.citizen_instances[id.index()]
    }

    /// Pushes `citizen` onto the front of the building's occupant list.
    pub fn attach_to_building(&mut self, building: EntityId, citizen: EntityId) {
        let head = self.buildings[building.index()].target_citizens.replace(citizen);
        self.citizen_instances[citizen.index()].next_target_instance = head;
    }

    pub fn detach_from_building(&mut self, building: EntityId, citizen: EntityId) -> bool {
        let mut previous: Option<EntityId> = None;
        let mut cursor = self.buildings[building.index()].target_citizens;
        let limit = self.citizen_instances.len();

        for _ in 0..limit {
            let Some(current) = cursor else {
                return false;
            };
            let next = self.citizen_instances[current.index()].next_target_instance;
            if current == citizen {
                match previous {
                    Some(previous) => {
                        self.citizen_instances[previous.index()].next_target_instance = next;
                    }
                    None => self.buildings[building.index()].target_citizens = next,
                }
                self.citizen_instances[current.index()].next_target_instance = None;
                return true;
            }
            previous = Some(current);
            cursor = next;
        }
        false
    }

    pub fn building_occupants(&self, building: EntityId) -> Vec<EntityId> {
        let mut occupants = Vec::new();
        let mut cursor = self.buildings[building.index()].target_citizens;
        while let Some(current) = cursor {
            if occupants.len() >= self.citizen_instances.len() {
                break;
            }
            occupants.push(current);
            cursor = self.citizen_instances[current.index()].next_target_instance;
        }
        occupants
    }
}

impl Simulation for SandboxSimulation {
    fn frame_index(&self) -> u32 {
        self.frame_index
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn buildings(&self) -> &[BuildingSlot] {
        &self.buildings
    }

    fn vehicles(&self) -> &[VehicleSlot] {
        &self.vehicles
    }

    fn citizen_instances(&self) -> &[CitizenInstanceSlot] {
        &self.citizen_instances
    }

    fn building_prefabs(&self) -> &PrefabCatalog<BuildingAi> {
        &self.building_prefabs
    }

    fn vehicle_prefabs(&self) -> &PrefabCatalog<VehicleAi> {
        &self.vehicle_prefabs
    }

    fn citizen_prefabs(&self) -> &PrefabCatalog<CitizenAi> {
        &self.citizen_prefabs
    }

    fn updated_buildings(&self) -> &[u64] {
        &self.updated_buildings
    }
}

/// One prefab per building tag, named after the tag.
pub fn stock_building_prefabs() -> PrefabCatalog<BuildingAi> {
    use BuildingAi::*;
    let tags = [
        (Cemetery, "Cemetery"),
        (LandfillSite, "LandfillSite"),
        (FireStation, "FireStation"),
        (PoliceStation, "PoliceStation"),
        (Hospital, "Hospital"),
        (Park, "Park"),
        (PowerPlant, "PowerPlant"),
        (PlayerOther, "PlayerOther"),
        (Residential, "Residential"),
        (Commercial, "Commercial"),
        (Industrial, "Industrial"),
        (Office, "Office"),
        (PrivateOther, "PrivateOther"),
        (Other, "Other"),
    ];
    PrefabCatalog::from_prefabs(
        tags.into_iter()
            .map(|(tag, name)| Prefab::new(tag).named(name))
            .collect(),
    )
}

/// One prefab per vehicle tag, named after the tag.
pub fn stock_vehicle_prefabs() -> PrefabCatalog<VehicleAi> {
    use VehicleAi::*;
    let tags = [
        (CarTrailer, "CarTrailer"),
        (Hearse, "Hearse"),
        (GarbageTruck, "GarbageTruck"),
        (FireTruck, "FireTruck"),
        (PoliceCar, "PoliceCar"),
        (Ambulance, "Ambulance"),
        (Bus, "Bus"),
        (CarOther, "CarOther"),
        (PassengerTrain, "PassengerTrain"),
        (MetroTrain, "MetroTrain"),
        (CargoTrain, "CargoTrain"),
        (TrainOther, "TrainOther"),
        (Aircraft, "Aircraft"),
        (Ship, "Ship"),
        (Other, "Other"),
    ];
    PrefabCatalog::from_prefabs(
        tags.into_iter()
            .map(|(tag, name)| Prefab::new(tag).named(name))
            .collect(),
    )
}

pub fn stock_citizen_prefabs() -> PrefabCatalog<CitizenAi> {
    PrefabCatalog::from_prefabs(vec![
        Prefab::new(CitizenAi::Bird).named("Seagull"),
        Prefab::new(CitizenAi::Bird).named("Pigeon"),
        Prefab::new(CitizenAi::Livestock).named("Cow"),
        Prefab::new(CitizenAi::Livestock).named("Pig"),
        Prefab::new(CitizenAi::Pet).named("Dog"),
        Prefab::new(CitizenAi::Wildlife).named("Wolf"),
        Prefab::new(CitizenAi::Wildlife).named("Bear"),
        Prefab::new(CitizenAi::Wildlife).named("MooseMale"),
        Prefab::new(CitizenAi::Wildlife).named("MooseFemale"),
        Prefab::new(CitizenAi::AnimalOther).named("Butterfly").hidden(),
        Prefab::new(CitizenAi::Resident).named("Resident"),
        Prefab::new(CitizenAi::Tourist).named("Tourist"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::updated_building_ids;

    fn small() -> SandboxSimulation {
        SandboxSimulation::new(SandboxCapacities {
            buildings: 128,
            vehicles: 8,
            citizen_instances: 8,
        })
    }

    #[test]
    fn advance_holds_the_frame_while_paused_and_drops_flags() {
        let mut sim = small();
        sim.mark_building_updated(EntityId(70));
        sim.set_paused(true);

        sim.advance();

        assert_eq!(sim.frame_index(), 0);
        assert_eq!(updated_building_ids(sim.updated_buildings()).count(), 0);

        sim.set_paused(false);
        sim.advance();
        assert_eq!(sim.frame_index(), 1);
    }

    #[test]
    fn placing_a_building_flags_it() {
        let mut sim = small();
        sim.place_building(EntityId(65), PrefabId(0));

        let flagged: Vec<EntityId> = updated_building_ids(sim.updated_buildings()).collect();
        assert_eq!(flagged, vec![EntityId(65)]);
    }

    #[test]
    fn occupant_list_is_last_in_first_out() {
        let mut sim = small();
        for id in [1u16, 2, 3] {
            sim.spawn_citizen_instance(EntityId(id), PrefabId(0));
            sim.attach_to_building(EntityId(0), EntityId(id));
        }

        assert_eq!(
            sim.building_occupants(EntityId(0)),
            vec![EntityId(3), EntityId(2), EntityId(1)]
        );

        assert!(sim.detach_from_building(EntityId(0), EntityId(2)));
        assert!(!sim.detach_from_building(EntityId(0), EntityId(2)));
        assert_eq!(
            sim.building_occupants(EntityId(0)),
            vec![EntityId(3), EntityId(1)]
        );

        sim.despawn_citizen_instance(EntityId(3));
        assert_eq!(sim.building_occupants(EntityId(0)), vec![EntityId(1)]);
    }

    #[test]
    fn stock_catalogs_cover_every_tag() {
        assert_eq!(stock_building_prefabs().len(), 14);
        assert_eq!(stock_vehicle_prefabs().len(), 15);
        let citizens = stock_citizen_prefabs();
        let butterfly = citizens
            .prefab_id_by_name("Butterfly")
            .and_then(|id| citizens.prefab(id))
            .expect("butterfly");
        assert!(!butterfly.is_rendered());
    }
}
