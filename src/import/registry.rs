//! Name to entity registry filled during instantiation.

use std::collections::HashMap;

use smallvec::SmallVec;
use tracing::warn;

use crate::scene::{EntityKind, Handle};

/// Named entities of one import run, grouped by kind.
///
/// Names are unique within a kind; the first registration wins. The same
/// name may exist under several kinds, in which case [`Registry::resolve`]
/// picks by [`EntityKind::RESOLUTION_ORDER`].
#[derive(Clone, Debug, Default)]
pub struct Registry {
    by_kind: HashMap<EntityKind, HashMap<String, Handle>>,
    by_name: HashMap<String, SmallVec<[Handle; 2]>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entity under its name. Returns false for a duplicate.
    pub fn register(&mut self, name: &str, handle: Handle) -> bool {
        let names = self.by_kind.entry(handle.kind).or_default();
        if names.contains_key(name) {
            warn!(name, kind = %handle.kind, "duplicate entity name; keeping the first");
            return false;
        }
        names.insert(name.to_string(), handle);
        self.by_name.entry(name.to_string()).or_default().push(handle);
        true
    }

    /// Entity of one kind by exact name.
    pub fn get(&self, kind: EntityKind, name: &str) -> Option<Handle> {
        self.by_kind.get(&kind)?.get(name).copied()
    }

    /// Every entity carrying `name`, in registration order.
    pub fn named(&self, name: &str) -> &[Handle] {
        self.by_name.get(name).map(|h| h.as_slice()).unwrap_or_default()
    }

    /// First entity named `name` among `accepts`, in priority order.
    ///
    /// An empty `accepts` searches every kind.
    pub fn resolve(&self, name: &str, accepts: &[EntityKind]) -> Option<Handle> {
        EntityKind::RESOLUTION_ORDER
            .iter()
            .filter(|k| accepts.is_empty() || accepts.contains(k))
            .find_map(|&k| self.get(k, name))
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.by_kind.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
