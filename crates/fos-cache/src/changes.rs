//! Cache change notifications
//!
//! A listener attached to a cache hears about every change to its
//! top-level composition, with the positions involved. Hosts use this to
//! patch a live stylesheet in place instead of re-rendering everything.

/// Listener for top-level cache changes
pub trait Changes<T>: Send + Sync {
    /// `item` was inserted at `index`
    fn add(&self, item: &T, index: usize);

    /// `item` moved from `old_index` to `new_index`, or its children
    /// changed (the indexes are then equal)
    fn change(&self, item: &T, old_index: usize, new_index: usize);

    /// `item` was dropped from `index`
    fn remove(&self, item: &T, index: usize);
}
