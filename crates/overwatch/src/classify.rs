use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::category::Category;
use crate::prefab::{Prefab, PrefabId, TrackedPrefabs};

/// Maps one type tag to its category chain, most general first.
#[derive(Debug)]
pub struct TagRule<T: 'static, C: 'static> {
    pub tag: T,
    pub categories: &'static [C],
}

/// Adds `category` to a prefab already classified under `parent` when the
/// prefab is the tracked prefab for `display_name`.
#[derive(Debug)]
pub struct NamedRule<C: 'static> {
    pub parent: C,
    pub display_name: &'static str,
    pub category: C,
}

#[derive(Debug)]
pub struct ClassificationTable<T: 'static, C: 'static> {
    pub rules: &'static [TagRule<T, C>],
    pub named: &'static [NamedRule<C>],
}

impl<T: PartialEq, C: Category> ClassificationTable<T, C> {
    /// Appends the categories of `prefab` to `out`. Tags without a rule add
    /// nothing.
    pub fn categorize(&self, prefab: &Prefab<T>, tracked: &TrackedPrefabs, out: &mut Vec<C>) {
        let Some(rule) = self.rules.iter().find(|rule| rule.tag == prefab.tag) else {
            return;
        };
        out.extend_from_slice(rule.categories);

        for named in self.named {
            if out.contains(&named.parent)
                && !out.contains(&named.category)
                && tracked.is_tracked(named.display_name, prefab.id)
            {
                out.push(named.category);
            }
        }
    }

    /// Tags that appear in more than one rule; only the first would ever match.
    pub fn shadowed_tags(&self) -> Vec<&T> {
        self.rules
            .iter()
            .enumerate()
            .filter(|(idx, rule)| self.rules[..*idx].iter().any(|prior| prior.tag == rule.tag))
            .map(|(_, rule)| &rule.tag)
            .collect()
    }
}

/// Per-session memo of prefab classifications.
#[derive(Debug, Clone)]
pub struct CategorizationCache<C> {
    records: HashMap<PrefabId, Vec<C>>,
    evaluations: u64,
}

impl<C> Default for CategorizationCache<C> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            evaluations: 0,
        }
    }
}

impl<C: Category> CategorizationCache<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the categories of every instance of `prefab`.
    ///
    /// The record is created blank before the table is consulted, so a prefab
    /// matching nothing is still remembered and never evaluated again.
    pub fn classify<T: PartialEq>(
        &mut self,
        prefab: &Prefab<T>,
        table: &ClassificationTable<T, C>,
        tracked: &TrackedPrefabs,
    ) -> &[C] {
        let record = match self.records.entry(prefab.id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.evaluations = self.evaluations.saturating_add(1);
                let record = entry.insert(Vec::new());
                table.categorize(prefab, tracked, record);
                record
            }
        };
        record.as_slice()
    }

    pub fn get(&self, prefab: PrefabId) -> Option<&[C]> {
        self.records.get(&prefab).map(Vec::as_slice)
    }

    /// How many times the table has been consulted since the last clear.
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.evaluations = 0;
    }
}
