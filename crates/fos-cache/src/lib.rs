//! fOS Cache
//!
//! Content-addressed, reference-counted node containers.
//!
//! Every node carries an id derived from its content. A [`Cache`] holds at
//! most one node per id and counts how many times that node was added, so
//! the same node can be registered from many places and retracted by any of
//! them without disturbing the others. Nodes that are themselves caches are
//! merged recursively.
//!
//! # Threading
//!
//! Mutation takes `&mut self`. A cache shared between threads must be
//! serialized by the caller (wrap it in a `Mutex` or `RwLock`); concurrent
//! rendering through `&self` is fine as long as nothing mutates at the same
//! time.

mod cache;
mod changes;

pub use cache::Cache;
pub use changes::Changes;

use std::borrow::Cow;

/// Kind of a node stored in a cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Leaf selector text
    Selector,
    /// Declaration block owning selectors
    Style,
    /// At-rule or generated block owning styles and rules
    Rule,
    /// Top-level sheet
    Root,
}

impl NodeKind {
    /// Whether nodes of this kind own a nested cache
    pub fn is_cache(self) -> bool {
        !matches!(self, NodeKind::Selector)
    }
}

/// Capabilities shared by every node kind
pub trait Container: Clone {
    /// Content-derived id, the key used by a parent cache
    fn id(&self) -> &str;

    fn kind(&self) -> NodeKind;

    /// Full content identity. Two nodes with equal ids but different
    /// identifiers are a hash collision.
    fn identifier(&self) -> Cow<'_, str>;

    /// Render this node and its children
    fn styles(&self) -> String;

    /// Change counter of the nested cache, 0 for leaves
    fn change_id(&self) -> u64 {
        0
    }

    /// Fail if merging the children of `other` would collide. Checked
    /// before [`merge_children`](Container::merge_children) so a failed add
    /// changes nothing.
    fn check_children(&self, _other: &Self) -> Result<(), CacheError> {
        Ok(())
    }

    /// Merge the children of `other` into this node's nested cache.
    ///
    /// Only called when both nodes report a cache kind.
    fn merge_children(&mut self, _other: &Self) -> Result<(), CacheError> {
        Ok(())
    }

    /// Retract the children of `other` from this node's nested cache.
    fn unmerge_children(&mut self, _other: &Self) {}
}

/// Cache error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("Hash collision: {incoming} === {existing}")]
    Collision { incoming: String, existing: String },
}
