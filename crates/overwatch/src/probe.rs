use crate::host::{BuildingSlot, CitizenInstanceSlot, VehicleSlot};
use crate::monitor::MonitorError;
use crate::prefab::{Prefab, PrefabCatalog};
use crate::taxonomy::{BuildingAi, CitizenAi, VehicleAi};
use crate::{EntityId, EntityKind};

pub fn building<'c>(
    slot: &BuildingSlot,
    catalog: &'c PrefabCatalog<BuildingAi>,
) -> Option<&'c Prefab<BuildingAi>> {
    if !slot.created {
        return None;
    }
    catalog.prefab(slot.prefab?)
}

/// Trailers and cargo attached to another vehicle are part of their leader.
pub fn vehicle<'c>(
    slot: &VehicleSlot,
    catalog: &'c PrefabCatalog<VehicleAi>,
) -> Option<&'c Prefab<VehicleAi>> {
    if slot.leading_vehicle.is_some() || slot.cargo_parent.is_some() {
        return None;
    }
    if !slot.created || !slot.spawned {
        return None;
    }
    catalog.prefab(slot.prefab?)
}

pub fn animal<'c>(
    slot: &CitizenInstanceSlot,
    catalog: &'c PrefabCatalog<CitizenAi>,
) -> Option<&'c Prefab<CitizenAi>> {
    if !slot.created {
        return None;
    }
    let prefab = catalog.prefab(slot.prefab?)?;
    if !prefab.tag.is_animal() || !prefab.is_rendered() {
        return None;
    }
    Some(prefab)
}

pub(crate) fn slot_at<S>(slots: &[S], kind: EntityKind, id: EntityId) -> Result<&S, MonitorError> {
    slots.get(id.index()).ok_or(MonitorError::SlotOutOfRange {
        kind,
        id,
        capacity: slots.len(),
    })
}
