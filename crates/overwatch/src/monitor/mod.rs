mod animal;
mod building;
mod roster;
mod vehicle;

use std::fmt::{self, Write as _};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::category::{Category, CategoryRegistry};
use crate::changeset::Changeset;
use crate::classify::{CategorizationCache, ClassificationTable};
use crate::host::Simulation;
use crate::prefab::{Prefab, PrefabCatalog, TrackedPrefabs};
use crate::probe::slot_at;
use crate::scheduler::{FrameLayout, FrameScheduler, LayoutError};
use crate::{EntityId, EntityKind};

pub use animal::AnimalMonitor;
pub use building::Buildings;
pub use vehicle::Vehicles;

use roster::{Roster, Visit};

pub type BuildingMonitor = PopulationMonitor<Buildings>;
pub type VehicleMonitor = PopulationMonitor<Vehicles>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    #[default]
    Uninitialized,
    Initializing,
    Steady,
    Terminated,
}

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("{kind} slot {id} is outside the slot array (capacity {capacity})")]
    SlotOutOfRange {
        kind: EntityKind,
        id: EntityId,
        capacity: usize,
    },
    #[error("invalid {kind} frame layout: {source}")]
    Layout {
        kind: EntityKind,
        #[source]
        source: LayoutError,
    },
    #[error("occupant list of building {building} runs past {limit} entries")]
    OccupantCycle { building: EntityId, limit: usize },
}

/// What one `update` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TickOutcome {
    Disabled,
    /// Nothing to do this tick: paused, no due frames or no trigger.
    Idle,
    Initialized { tracked: usize },
    Scanned { frames: u32, visited: usize },
    Terminated,
}

/// Lets a report through once per pause.
#[derive(Debug, Clone, Copy, Default)]
pub struct PauseThrottle {
    dumped: bool,
}

impl PauseThrottle {
    pub fn should_report(&mut self, paused: bool) -> bool {
        if !paused {
            self.dumped = false;
            return false;
        }
        !std::mem::replace(&mut self.dumped, true)
    }

    pub fn reset(&mut self) {
        self.dumped = false;
    }
}

/// Lifecycle surface the driver needs from every monitor.
pub trait Monitor {
    fn kind(&self) -> EntityKind;
    fn state(&self) -> MonitorState;
    fn changes(&self) -> &Changeset;
    fn tracked_count(&self) -> usize;
    /// Stops all further work until [`Monitor::release`].
    fn terminate(&mut self);
    fn release(&mut self);
    fn write_report(&self, out: &mut String);
    fn throttle(&mut self) -> &mut PauseThrottle;

    /// Cardinality report, produced at most once per pause of a steady monitor.
    fn paused_report(&mut self, paused: bool) -> Option<String> {
        if self.state() != MonitorState::Steady {
            return None;
        }
        if !self.throttle().should_report(paused) {
            return None;
        }
        let mut out = String::new();
        self.write_report(&mut out);
        Some(out)
    }
}

/// Per-kind plumbing for [`PopulationMonitor`].
///
/// The hook methods let a kind keep instance-derived state alongside the
/// prefab-derived categories; they default to doing nothing.
pub trait ScanKind: Default + fmt::Debug {
    type Tag: PartialEq + 'static;
    type Category: Category;
    type Slot;

    const KIND: EntityKind;
    /// Category every tracked entity of the kind belongs to.
    const TOP: Self::Category;

    fn slots(sim: &dyn Simulation) -> &[Self::Slot];
    fn catalog(sim: &dyn Simulation) -> &PrefabCatalog<Self::Tag>;
    fn probe<'c>(
        slot: &Self::Slot,
        catalog: &'c PrefabCatalog<Self::Tag>,
    ) -> Option<&'c Prefab<Self::Tag>>;
    fn table() -> &'static ClassificationTable<Self::Tag, Self::Category>;

    fn refresh(&mut self, _id: EntityId, _slot: &Self::Slot, _prefab: &Prefab<Self::Tag>) {}
    fn forget(&mut self, _id: EntityId) {}
    fn clear(&mut self) {}
    fn write_report(&self, _out: &mut String) {}
}

/// Frame-sliced monitor for one entity kind.
#[derive(Debug)]
pub struct PopulationMonitor<K: ScanKind> {
    kind: K,
    state: MonitorState,
    frame_count: u32,
    tracked_names: Vec<String>,
    roster: Roster<K::Category>,
    scheduler: Option<FrameScheduler>,
    throttle: PauseThrottle,
}

impl<K: ScanKind> PopulationMonitor<K> {
    pub fn new(frame_count: u32, tracked_names: Vec<String>) -> Self {
        Self {
            kind: K::default(),
            state: MonitorState::Uninitialized,
            frame_count,
            tracked_names,
            roster: Roster::new(K::TOP),
            scheduler: None,
            throttle: PauseThrottle::default(),
        }
    }

    /// Runs one tick: the full scan on first call, then due frame windows.
    ///
    /// An error leaves the monitor mid-tick; the caller is expected to
    /// [`terminate`](Monitor::terminate) it.
    pub fn update(&mut self, sim: &dyn Simulation) -> Result<TickOutcome, MonitorError> {
        match self.state {
            MonitorState::Terminated => Ok(TickOutcome::Terminated),
            MonitorState::Uninitialized | MonitorState::Initializing => self.initialize(sim),
            MonitorState::Steady if sim.is_paused() => Ok(TickOutcome::Idle),
            MonitorState::Steady => self.scan_due_frames(sim),
        }
    }

    fn initialize(&mut self, sim: &dyn Simulation) -> Result<TickOutcome, MonitorError> {
        self.state = MonitorState::Initializing;
        let layout = FrameLayout::new(self.frame_count, K::slots(sim).len()).map_err(|source| {
            MonitorError::Layout {
                kind: K::KIND,
                source,
            }
        })?;

        let tracked_prefabs = TrackedPrefabs::resolve(K::catalog(sim), &self.tracked_names);
        self.roster.reset(layout.capacity(), tracked_prefabs);
        self.kind.clear();
        self.scheduler = None;

        for id in layout.all_ids() {
            self.visit(sim, id)?;
        }

        self.scheduler = Some(FrameScheduler::new(layout, sim.frame_index()));
        self.state = MonitorState::Steady;
        debug!(
            monitor = %K::KIND,
            capacity = layout.capacity(),
            frame_count = layout.frame_count(),
            tracked = self.roster.tracked_count(),
            prefabs_classified = self.roster.cache.evaluations(),
            "full_scan_complete"
        );
        Ok(TickOutcome::Initialized {
            tracked: self.roster.tracked_count(),
        })
    }

    fn scan_due_frames(&mut self, sim: &dyn Simulation) -> Result<TickOutcome, MonitorError> {
        self.roster.begin_tick();
        let Some(scheduler) = self.scheduler.as_mut() else {
            return Ok(TickOutcome::Idle);
        };
        let layout = scheduler.layout();
        let frames: Vec<u32> = scheduler.due_frames(sim.frame_index()).collect();
        if frames.is_empty() {
            return Ok(TickOutcome::Idle);
        }

        let mut visited = 0;
        for &frame in &frames {
            for id in layout.frame_ids(frame) {
                let visit = self.visit(sim, id)?;
                visit.record(id, &mut self.roster.changes);
                visited += 1;
            }
        }
        Ok(TickOutcome::Scanned {
            frames: frames.len() as u32,
            visited,
        })
    }

    /// Probes one slot and brings the roster in line with it.
    fn visit(&mut self, sim: &dyn Simulation, id: EntityId) -> Result<Visit, MonitorError> {
        let slot = slot_at(K::slots(sim), K::KIND, id)?;
        match K::probe(slot, K::catalog(sim)) {
            Some(prefab) => {
                let visit = self.roster.admit(id, prefab, K::table());
                if visit.is_live() {
                    self.kind.refresh(id, slot, prefab);
                } else {
                    self.kind.forget(id);
                }
                Ok(visit)
            }
            None => Ok(if self.forget(id) {
                Visit::Removed
            } else {
                Visit::Absent
            }),
        }
    }

    /// Removes `id` from every set of the kind. Returns whether it was tracked.
    pub fn forget(&mut self, id: EntityId) -> bool {
        self.kind.forget(id);
        self.roster.forget(id)
    }

    /// Probes `id` outside its scan window and purges it if the slot no longer
    /// holds a live entity. The removal is published with the next tick's
    /// changes. Returns whether anything was purged.
    pub fn request_removal(
        &mut self,
        sim: &dyn Simulation,
        id: EntityId,
    ) -> Result<bool, MonitorError> {
        if self.state != MonitorState::Steady {
            return Ok(false);
        }
        let slot = slot_at(K::slots(sim), K::KIND, id)?;
        if K::probe(slot, K::catalog(sim)).is_some() {
            return Ok(false);
        }
        if self.forget(id) {
            self.roster.pending.record_removed(id);
            return Ok(true);
        }
        Ok(false)
    }

    pub fn categories(&self) -> &CategoryRegistry<K::Category> {
        &self.roster.categories
    }

    pub fn cache(&self) -> &CategorizationCache<K::Category> {
        &self.roster.cache
    }

    pub fn tracked_prefabs(&self) -> &TrackedPrefabs {
        &self.roster.tracked_prefabs
    }

    pub fn scheduler(&self) -> Option<&FrameScheduler> {
        self.scheduler.as_ref()
    }

    pub fn is_tracked(&self, id: EntityId) -> bool {
        self.roster.is_tracked(id)
    }

    pub fn scan_kind(&self) -> &K {
        &self.kind
    }
}

impl<K: ScanKind> Monitor for PopulationMonitor<K> {
    fn kind(&self) -> EntityKind {
        K::KIND
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
        self.kind.clear();
        self.scheduler = None;
        self.throttle.reset();
        self.state = MonitorState::Uninitialized;
    }

    fn write_report(&self, out: &mut String) {
        let _ = writeln!(out, "{} monitor", K::KIND.title());
        self.roster.categories.write_report(out);
        self.kind.write_report(out);
        self.roster.changes.write_report(out);
    }

    fn throttle(&mut self) -> &mut PauseThrottle {
        &mut self.throttle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn throttle_reports_once_per_pause() {
        let mut throttle = PauseThrottle::default();

        assert!(!throttle.should_report(false));
        assert!(throttle.should_report(true));
        assert!(!throttle.should_report(true));
        assert!(!throttle.should_report(false));
        assert!(throttle.should_report(true));
    }
}
