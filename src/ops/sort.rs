//! Integer-gap sorting with optional re-parenting.
//!
//! Siblings are ordered by an integer sort key. Placing an item computes a
//! key strictly between its new neighbors, so normally only the moved item
//! changes. When the neighbors are adjacent integers (or equal) there is no
//! room left, and the whole sibling run is renumbered at a fixed density.

use tracing::debug;

use crate::model::config::SORT_INTEGER_DENSITY;
use crate::model::item::Sortable;

/// Parent assignment carried by a sort update
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ParentChange {
    /// Leave the parent as it is
    #[default]
    Keep,
    /// Move under this parent (`None` = root)
    Set(Option<String>),
}

/// Where and how to place the moved item
#[derive(Debug, Clone)]
pub struct SortOptions {
    /// Insert before the target (otherwise after it)
    pub sort_before: bool,
    /// Key increment used at the extremities and when renumbering
    pub density: i64,
    /// Parent to assign to the moved item
    pub parent: ParentChange,
}

impl Default for SortOptions {
    fn default() -> Self {
        SortOptions {
            sort_before: true,
            density: SORT_INTEGER_DENSITY,
            parent: ParentChange::Keep,
        }
    }
}

/// A single key (and maybe parent) change produced by a placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortUpdate {
    pub id: String,
    pub sort: i64,
    pub parent: ParentChange,
}

/// Compute the updates that place `moved` relative to `target` among
/// `siblings` (the items sharing the destination parent).
///
/// `target = None` appends after the last sibling. Returns `None` when the
/// move is rejected: dropping an item onto itself, making an item its own
/// parent, or naming a target that is not one of the siblings.
///
/// The moved item is always part of the result exactly once. Renumbered
/// siblings are reported only when their key actually changes.
pub fn place_item<T: Sortable>(
    moved: &T,
    target: Option<&T>,
    siblings: &[&T],
    options: &SortOptions,
) -> Option<Vec<SortUpdate>> {
    if target.is_some_and(|t| t.id() == moved.id()) {
        debug!(id = moved.id(), "rejected: dropped onto itself");
        return None;
    }
    if let ParentChange::Set(Some(parent)) = &options.parent
        && parent == moved.id()
    {
        debug!(id = moved.id(), "rejected: own parent");
        return None;
    }

    let density = options.density.max(1);
    let mut ordered: Vec<&T> = siblings
        .iter()
        .copied()
        .filter(|s| s.id() != moved.id())
        .collect();
    // stable: equal keys keep their input order
    ordered.sort_by_key(|s| s.sort_key());

    // Index the moved item ends up at once inserted into `ordered`
    let (slot, min, max) = match target {
        None => (ordered.len(), ordered.last().map(|s| s.sort_key()), None),
        Some(target) => {
            let Some(idx) = ordered.iter().position(|s| s.id() == target.id()) else {
                debug!(target = target.id(), "rejected: target is not a sibling");
                return None;
            };
            if options.sort_before {
                let min = idx.checked_sub(1).map(|i| ordered[i].sort_key());
                (idx, min, Some(ordered[idx].sort_key()))
            } else {
                let max = ordered.get(idx + 1).map(|s| s.sort_key());
                (idx + 1, Some(ordered[idx].sort_key()), max)
            }
        }
    };

    let moved_update = |sort: i64| SortUpdate {
        id: moved.id().to_string(),
        sort,
        parent: options.parent.clone(),
    };

    // None when the gap has no free integer, including past either end of i64
    let key = match (min, max) {
        (None, None) => Some(density),
        (None, Some(max)) => max.checked_sub(density),
        (Some(min), None) => min.checked_add(density),
        (Some(min), Some(max)) if i128::from(max) - i128::from(min) > 1 => {
            Some(midpoint(min, max))
        }
        _ => None,
    };
    if let Some(key) = key {
        debug!(id = moved.id(), key, "placed in gap");
        return Some(vec![moved_update(key)]);
    }

    // No integer left between the neighbors: renumber the run
    debug!(
        id = moved.id(),
        siblings = ordered.len(),
        "gap exhausted, renumbering siblings"
    );
    let mut updates = Vec::new();
    let mut sequence: Vec<Option<&T>> = ordered.into_iter().map(Some).collect();
    sequence.insert(slot, None);
    for (i, entry) in sequence.into_iter().enumerate() {
        let sort = density.saturating_mul(i as i64 + 1);
        match entry {
            None => updates.push(moved_update(sort)),
            Some(sibling) if sibling.sort_key() != sort => updates.push(SortUpdate {
                id: sibling.id().to_string(),
                sort,
                parent: ParentChange::Keep,
            }),
            Some(_) => {}
        }
    }
    Some(updates)
}

/// Apply placement updates to a flat list of items.
/// Updates naming ids that are not in `items` are ignored.
pub fn apply_updates<T: Sortable>(items: &mut [T], updates: &[SortUpdate]) {
    for update in updates {
        if let Some(item) = items.iter_mut().find(|i| i.id() == update.id) {
            item.set_sort_key(update.sort);
            if let ParentChange::Set(parent) = &update.parent {
                item.set_parent_id(parent.clone());
            }
        }
    }
}

/// Sort key that places a new item last among `siblings`
pub fn next_sort_key<T: Sortable>(siblings: &[&T], density: i64) -> i64 {
    siblings
        .iter()
        .map(|s| s.sort_key())
        .max()
        .map_or(density, |max| max.saturating_add(density))
}

/// Integer midpoint, halves rounding toward positive infinity
fn midpoint(min: i64, max: i64) -> i64 {
    let sum = min as i128 + max as i128 + 1;
    sum.div_euclid(2) as i64
}
