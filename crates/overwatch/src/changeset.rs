use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::Serialize;

use crate::EntityId;

/// Per-tick diff of one kind's membership.
///
/// The last event recorded for an id wins: a removal withdraws the id from
/// `added` and `updated`, and an addition or update withdraws it from
/// `removed`. This keeps `added` and `removed` disjoint and every `updated` id
/// live as of the end of the tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Changeset {
    added: BTreeSet<EntityId>,
    updated: BTreeSet<EntityId>,
    removed: BTreeSet<EntityId>,
}

impl Changeset {
    pub fn record_added(&mut self, id: EntityId) {
        self.removed.remove(&id);
        self.added.insert(id);
    }

    pub fn record_updated(&mut self, id: EntityId) {
        self.removed.remove(&id);
        self.updated.insert(id);
    }

    pub fn record_removed(&mut self, id: EntityId) {
        self.added.remove(&id);
        self.updated.remove(&id);
        self.removed.insert(id);
    }

    pub fn added(&self) -> &BTreeSet<EntityId> {
        &self.added
    }

    pub fn updated(&self) -> &BTreeSet<EntityId> {
        &self.updated
    }

    pub fn removed(&self) -> &BTreeSet<EntityId> {
        &self.removed
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Replays `other` on top of this changeset, in added, updated, removed
    /// order, then empties `other`.
    pub fn absorb(&mut self, other: &mut Changeset) {
        for id in std::mem::take(&mut other.added) {
            self.record_added(id);
        }
        for id in std::mem::take(&mut other.updated) {
            self.record_updated(id);
        }
        for id in std::mem::take(&mut other.removed) {
            self.record_removed(id);
        }
    }

    pub fn clear(&mut self) {
        self.added.clear();
        self.updated.clear();
        self.removed.clear();
    }

    pub fn write_report(&self, out: &mut String) {
        for (label, set) in [
            ("Added", &self.added),
            ("Updated", &self.updated),
            ("Removed", &self.removed),
        ] {
            let _ = writeln!(out, "{:>6}   {label}", set.len());
        }
    }
}
