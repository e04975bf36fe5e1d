//! Reference-counted cache
//!
//! Arena of nodes keyed by id, each slot with an explicit reference count.
//! Slots are kept in render order: re-adding a node moves it to the end,
//! so the most recent registration wins positionally.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::{CacheError, Changes, Container};

/// Arena slot
struct Slot<T> {
    node: T,
    /// Live registrations, never 0 while the slot exists
    count: usize,
}

/// Insertion-ordered, reference-counted collection of nodes
pub struct Cache<T> {
    /// id -> slot, in render order
    slots: IndexMap<String, Slot<T>>,
    /// Bumped whenever the visible composition changes
    change_id: u64,
    /// Optional listener for top-level changes
    changes: Option<Arc<dyn Changes<T>>>,
}

impl<T: Container> Cache<T> {
    pub fn new() -> Self {
        Self {
            slots: IndexMap::new(),
            change_id: 0,
            changes: None,
        }
    }

    /// Create a cache that reports its changes to `changes`
    pub fn with_changes(changes: Arc<dyn Changes<T>>) -> Self {
        Self {
            changes: Some(changes),
            ..Self::new()
        }
    }

    pub fn changes(&self) -> Option<&Arc<dyn Changes<T>>> {
        self.changes.as_ref()
    }

    pub fn set_changes(&mut self, changes: Option<Arc<dyn Changes<T>>>) {
        self.changes = changes;
    }

    /// Composition change counter
    pub fn change_id(&self) -> u64 {
        self.change_id
    }

    /// Number of distinct nodes
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.slots.get(id).map(|slot| &slot.node)
    }

    /// Reference count for `id` (0 when absent)
    pub fn count(&self, id: &str) -> usize {
        self.slots.get(id).map_or(0, |slot| slot.count)
    }

    /// Ids in render order
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.slots.keys().map(String::as_str)
    }

    /// Nodes in render order
    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.values().map(|slot| &slot.node)
    }

    /// Fail if adding `node` would collide here or in any nested cache.
    /// Nothing is modified.
    pub fn check(&self, node: &T) -> Result<(), CacheError> {
        let Some(slot) = self.slots.get(node.id()) else {
            return Ok(());
        };

        if slot.node.identifier() != node.identifier() {
            let error = CacheError::Collision {
                incoming: node.styles(),
                existing: slot.node.styles(),
            };
            tracing::error!(id = node.id(), "{}", error);
            return Err(error);
        }

        if slot.node.kind().is_cache() && node.kind().is_cache() {
            slot.node.check_children(node)?;
        }
        Ok(())
    }

    /// Fail if merging `other` would collide anywhere
    pub fn check_merge(&self, other: &Cache<T>) -> Result<(), CacheError> {
        other.values().try_for_each(|node| self.check(node))
    }

    /// Add a node, returning the canonical copy held by this cache.
    ///
    /// A new id is cloned in at the end. A known id gains a reference,
    /// moves to the end, and has its children merged when both sides are
    /// caches. Equal ids with different identifiers at any depth fail with
    /// [`CacheError::Collision`] and leave the cache untouched.
    pub fn add(&mut self, node: &T) -> Result<&T, CacheError> {
        self.check(node)?;
        let id = node.id();

        let Some(old_index) = self.slots.get_index_of(id) else {
            let (index, _) = self.slots.insert_full(
                id.to_owned(),
                Slot {
                    node: node.clone(),
                    count: 1,
                },
            );
            self.change_id += 1;

            tracing::trace!(id, index, "cache add");
            let slot = &self.slots[index];
            if let Some(changes) = &self.changes {
                changes.add(&slot.node, index);
            }
            return Ok(&slot.node);
        };

        let prev_change_id = self.change_id;
        let slot = &mut self.slots[old_index];
        if slot.node.kind().is_cache() && node.kind().is_cache() {
            let nested = slot.node.change_id();
            slot.node.merge_children(node)?;
            if slot.node.change_id() != nested {
                self.change_id += 1;
            }
        }
        slot.count += 1;

        let new_index = self.slots.len() - 1;
        if old_index != new_index {
            self.slots.move_index(old_index, new_index);
            self.change_id += 1;
        }

        let slot = &self.slots[new_index];
        if self.change_id != prev_change_id {
            tracing::trace!(id, old_index, new_index, "cache change");
            if let Some(changes) = &self.changes {
                changes.change(&slot.node, old_index, new_index);
            }
        }
        Ok(&slot.node)
    }

    /// Drop one reference to `node`.
    ///
    /// The last reference removes the node; otherwise nested children of
    /// `node` are retracted. Unknown nodes are ignored.
    pub fn remove(&mut self, node: &T) {
        let id = node.id();
        let Some((index, _, slot)) = self.slots.get_full_mut(id) else {
            return;
        };

        if slot.count > 1 {
            slot.count -= 1;
            if slot.node.kind().is_cache() && node.kind().is_cache() {
                let nested = slot.node.change_id();
                slot.node.unmerge_children(node);
                if slot.node.change_id() != nested {
                    self.change_id += 1;
                    tracing::trace!(id, index, "cache change");
                    if let Some(changes) = &self.changes {
                        changes.change(&slot.node, index, index);
                    }
                }
            }
            return;
        }

        if let Some(slot) = self.slots.shift_remove(id) {
            self.change_id += 1;
            tracing::trace!(id, index, "cache remove");
            if let Some(changes) = &self.changes {
                changes.remove(&slot.node, index);
            }
        }
    }

    /// Add every node of `other`, in its order. On a collision nothing is
    /// merged.
    pub fn merge(&mut self, other: &Cache<T>) -> Result<(), CacheError> {
        self.check_merge(other)?;
        for node in other.values() {
            self.add(node)?;
        }
        Ok(())
    }

    /// Remove every node of `other`, in its order
    pub fn unmerge(&mut self, other: &Cache<T>) {
        for node in other.values() {
            self.remove(node);
        }
    }
}

impl<T: Container> Default for Cache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Same as merging into an empty cache: every node is deep-cloned with a
/// single reference. Listeners are not carried over.
impl<T: Container> Clone for Cache<T> {
    fn clone(&self) -> Self {
        let slots: IndexMap<String, Slot<T>> = self
            .slots
            .iter()
            .map(|(id, slot)| {
                let slot = Slot {
                    node: slot.node.clone(),
                    count: 1,
                };
                (id.clone(), slot)
            })
            .collect();

        Self {
            change_id: slots.len() as u64,
            slots,
            changes: None,
        }
    }
}

impl<T> fmt::Debug for Cache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries: Vec<(&str, usize)> = self
            .slots
            .iter()
            .map(|(id, slot)| (id.as_str(), slot.count))
            .collect();

        f.debug_struct("Cache")
            .field("entries", &entries)
            .field("change_id", &self.change_id)
            .field("listening", &self.changes.is_some())
            .finish()
    }
}
