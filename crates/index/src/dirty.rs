//! Which index slots changed since the last publish.

use std::collections::{BTreeMap, BTreeSet};

/// A (component, architecture) pair within one release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    pub component: String,
    pub architecture: String,
}

impl SlotKey {
    pub fn new(component: impl Into<String>, architecture: impl Into<String>) -> Self {
        Self { component: component.into(), architecture: architecture.into() }
    }

    /// `main/binary-amd64/Packages`
    pub fn index_base(&self) -> String {
        format!("{}/binary-{}/Packages", self.component, self.architecture)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DirtySlots {
    releases: BTreeMap<String, BTreeSet<SlotKey>>,
}

impl DirtySlots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, release: &str, component: &str, architecture: &str) {
        tracing::trace!(release, component, architecture, "slot marked dirty");
        self.releases
            .entry(release.to_string())
            .or_default()
            .insert(SlotKey::new(component, architecture));
    }

    pub fn is_dirty(&self, release: &str) -> bool {
        self.releases.get(release).is_some_and(|slots| !slots.is_empty())
    }

    pub fn slots(&self, release: &str) -> Option<&BTreeSet<SlotKey>> {
        self.releases.get(release)
    }

    pub fn is_empty(&self) -> bool {
        self.releases.values().all(BTreeSet::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marking_is_idempotent_per_slot() {
        let mut dirty = DirtySlots::new();
        assert!(dirty.is_empty());
        dirty.mark("unstable", "main", "amd64");
        dirty.mark("unstable", "main", "amd64");
        dirty.mark("unstable", "contrib", "all");
        assert!(dirty.is_dirty("unstable"));
        assert!(!dirty.is_dirty("testing"));
        assert_eq!(dirty.slots("unstable").unwrap().len(), 2);
    }

    #[test]
    fn index_base() {
        assert_eq!(SlotKey::new("main", "amd64").index_base(), "main/binary-amd64/Packages");
    }
}
