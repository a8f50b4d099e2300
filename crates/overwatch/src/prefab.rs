use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrefabId(pub u32);

/// Immutable template shared by every entity instance built from it.
#[derive(Debug, Clone, PartialEq)]
pub struct Prefab<T> {
    pub id: PrefabId,
    pub tag: T,
    pub display_name: Option<String>,
    /// Negative infinity marks a prefab the host never renders.
    pub max_render_distance: f32,
}

impl<T> Prefab<T> {
    pub fn new(tag: T) -> Self {
        Self {
            id: PrefabId(0),
            tag,
            display_name: None,
            max_render_distance: f32::INFINITY,
        }
    }

    pub fn named(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.max_render_distance = f32::NEG_INFINITY;
        self
    }

    pub fn is_rendered(&self) -> bool {
        self.max_render_distance != f32::NEG_INFINITY
    }
}

#[derive(Debug, Clone)]
pub struct PrefabCatalog<T> {
    prefabs: Vec<Prefab<T>>,
    ids_by_name: HashMap<String, PrefabId>,
}

impl<T> Default for PrefabCatalog<T> {
    fn default() -> Self {
        Self {
            prefabs: Vec::new(),
            ids_by_name: HashMap::new(),
        }
    }
}

impl<T> PrefabCatalog<T> {
    /// Assigns ids by position. When several prefabs share a display name the
    /// first one owns the name.
    pub fn from_prefabs(mut prefabs: Vec<Prefab<T>>) -> Self {
        let mut ids_by_name = HashMap::with_capacity(prefabs.len());
        for (idx, prefab) in prefabs.iter_mut().enumerate() {
            let id = PrefabId(idx as u32);
            prefab.id = id;
            if let Some(name) = prefab.display_name.as_ref().filter(|name| !name.is_empty()) {
                ids_by_name.entry(name.clone()).or_insert(id);
            }
        }
        Self {
            prefabs,
            ids_by_name,
        }
    }

    pub fn prefab(&self, id: PrefabId) -> Option<&Prefab<T>> {
        self.prefabs.get(id.0 as usize)
    }

    pub fn prefab_id_by_name(&self, name: &str) -> Option<PrefabId> {
        self.ids_by_name.get(name).copied()
    }

    pub fn prefabs(&self) -> &[Prefab<T>] {
        &self.prefabs
    }

    pub fn len(&self) -> usize {
        self.prefabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefabs.is_empty()
    }
}

/// Configured display names resolved against a catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedPrefabs {
    ids_by_name: HashMap<String, PrefabId>,
}

impl TrackedPrefabs {
    /// Names absent from the catalog are dropped.
    pub fn resolve<T>(catalog: &PrefabCatalog<T>, names: &[String]) -> Self {
        let ids_by_name = names
            .iter()
            .filter_map(|name| {
                catalog
                    .prefab_id_by_name(name)
                    .map(|id| (name.clone(), id))
            })
            .collect();
        Self { ids_by_name }
    }

    pub fn is_tracked(&self, name: &str, id: PrefabId) -> bool {
        self.ids_by_name.get(name) == Some(&id)
    }

    pub fn len(&self) -> usize {
        self.ids_by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids_by_name.is_empty()
    }
}
