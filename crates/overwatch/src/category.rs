use std::collections::BTreeSet;
use std::fmt::{self, Write as _};
use std::hash::Hash;
use std::marker::PhantomData;

use crate::EntityId;

/// A closed set of categories for one entity kind.
///
/// `index` must be dense and agree with the position of the variant in `ALL`;
/// [`CategoryRegistry`] relies on it to address its sets.
pub trait Category: Copy + Eq + Hash + Ord + fmt::Debug + 'static {
    const ALL: &'static [Self];

    fn index(self) -> usize;

    fn label(self) -> &'static str;

    /// Nesting level used when rendering reports; 0 is the top of the kind.
    fn depth(self) -> usize {
        0
    }
}

macro_rules! category_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => ($label:literal, $depth:literal)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize,
        )]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::category::Category for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn index(self) -> usize {
                self as usize
            }

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label),+
                }
            }

            fn depth(self) -> usize {
                match self {
                    $(Self::$variant => $depth),+
                }
            }
        }
    };
}

pub(crate) use category_enum;

/// One ordered id set per category of `C`, addressed by category index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRegistry<C: Category> {
    sets: Vec<BTreeSet<EntityId>>,
    _category: PhantomData<C>,
}

impl<C: Category> Default for CategoryRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Category> CategoryRegistry<C> {
    pub fn new() -> Self {
        Self {
            sets: vec![BTreeSet::new(); C::ALL.len()],
            _category: PhantomData,
        }
    }

    pub fn insert(&mut self, category: C, id: EntityId) -> bool {
        self.sets[category.index()].insert(id)
    }

    pub fn insert_all(&mut self, categories: &[C], id: EntityId) {
        for &category in categories {
            self.insert(category, id);
        }
    }

    pub fn remove(&mut self, category: C, id: EntityId) -> bool {
        self.sets[category.index()].remove(&id)
    }

    /// Sets `id`'s membership in `category` to `present`.
    pub fn assign(&mut self, category: C, id: EntityId, present: bool) -> bool {
        if present {
            self.insert(category, id);
        } else {
            self.remove(category, id);
        }
        present
    }

    /// Drops `id` from every set, whether or not it was recorded there.
    /// Returns true if any set held it.
    pub fn remove_everywhere(&mut self, id: EntityId) -> bool {
        let mut removed = false;
        for set in &mut self.sets {
            removed |= set.remove(&id);
        }
        removed
    }

    pub fn contains(&self, category: C, id: EntityId) -> bool {
        self.sets[category.index()].contains(&id)
    }

    pub fn members(&self, category: C) -> &BTreeSet<EntityId> {
        &self.sets[category.index()]
    }

    pub fn len(&self, category: C) -> usize {
        self.sets[category.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.iter().all(BTreeSet::is_empty)
    }

    /// Categories currently holding `id`, in declaration order.
    pub fn categories_of(&self, id: EntityId) -> Vec<C> {
        C::ALL
            .iter()
            .copied()
            .filter(|category| self.contains(*category, id))
            .collect()
    }

    pub fn counts(&self) -> impl Iterator<Item = (C, usize)> + '_ {
        C::ALL
            .iter()
            .map(move |category| (*category, self.len(*category)))
    }

    pub fn clear(&mut self) {
        for set in &mut self.sets {
            set.clear();
        }
    }

    pub fn write_report(&self, out: &mut String) {
        for (category, count) in self.counts() {
            let indent = " =>  ".repeat(category.depth().saturating_sub(1));
            let _ = writeln!(out, "{indent}{count:>6}   {}", category.label());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    category_enum! {
        enum Shape {
            All => ("Total", 0),
            Round => ("Round", 1),
            Circle => ("Circle", 2),
        }
    }

    #[test]
    fn index_matches_position_in_all() {
        for (position, shape) in Shape::ALL.iter().enumerate() {
            assert_eq!(shape.index(), position);
        }
    }

    #[test]
    fn remove_everywhere_clears_every_set_and_is_idempotent() {
        let mut registry = CategoryRegistry::<Shape>::new();
        registry.insert_all(&[Shape::All, Shape::Circle], EntityId(4));

        assert!(registry.remove_everywhere(EntityId(4)));
        assert!(!registry.remove_everywhere(EntityId(4)));
        for shape in Shape::ALL {
            assert!(!registry.contains(*shape, EntityId(4)));
        }
    }

    #[test]
    fn assign_toggles_membership() {
        let mut registry = CategoryRegistry::<Shape>::new();
        assert!(registry.assign(Shape::Round, EntityId(1), true));
        assert!(registry.contains(Shape::Round, EntityId(1)));
        assert!(!registry.assign(Shape::Round, EntityId(1), false));
        assert!(!registry.contains(Shape::Round, EntityId(1)));
    }

    #[test]
    fn categories_of_lists_in_declaration_order() {
        let mut registry = CategoryRegistry::<Shape>::new();
        registry.insert(Shape::Circle, EntityId(2));
        registry.insert(Shape::All, EntityId(2));

        assert_eq!(registry.categories_of(EntityId(2)), vec![Shape::All, Shape::Circle]);
    }

    #[test]
    fn report_indents_nested_categories() {
        let mut registry = CategoryRegistry::<Shape>::new();
        registry.insert_all(&[Shape::All, Shape::Round, Shape::Circle], EntityId(0));
        registry.insert_all(&[Shape::All, Shape::Round], EntityId(1));

        let mut out = String::new();
        registry.write_report(&mut out);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines[0], "     2   Total");
        assert_eq!(lines[1], "     2   Round");
        assert_eq!(lines[2], " =>       1   Circle");
    }
}
