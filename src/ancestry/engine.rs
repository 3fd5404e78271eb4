use ahash::{AHashMap, AHashSet};

use crate::error::McpError;
use crate::model::{Ancestry, AncestryPath, LocationId, Parentage, ParentageId};

/// Holds the direct edges and every `AncestryPath` that currently witnesses
/// a transitive relationship, and keeps both consistent as edges are added
/// and removed. `Ancestry(a, c)` itself is never stored: it exists iff at
/// least one path has `parent == a, child == c`.
#[derive(Debug, Default)]
pub struct AncestryEngine {
    parentages: Vec<Parentage>,
    paths: Vec<AncestryPath>,
    next_parentage_id: u32,
}

impl AncestryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parentages(&self) -> &[Parentage] {
        &self.parentages
    }

    pub fn paths(&self) -> &[AncestryPath] {
        &self.paths
    }

    /// All `Ancestry` pairs currently witnessed by at least one path.
    pub fn ancestries(&self) -> AHashSet<Ancestry> {
        let mut set = AHashSet::default();
        for path in &self.paths {
            set.insert(path.ancestry());
        }
        set
    }

    /// Every path currently witnessing `Ancestry(a, child)` for any `a`.
    pub fn paths_ending_at(&self, child: LocationId) -> impl Iterator<Item = &AncestryPath> {
        self.paths.iter().filter(move |p| p.child == child)
    }

    /// Every path currently witnessing `Ancestry(parent, d)` for any `d`.
    pub fn paths_starting_at(&self, parent: LocationId) -> impl Iterator<Item = &AncestryPath> {
        self.paths.iter().filter(move |p| p.parent == parent)
    }

    pub fn ancestry_exists(&self, parent: LocationId, child: LocationId) -> bool {
        self.paths.iter().any(|p| p.parent == parent && p.child == child)
    }

    fn fresh_parentage_id(&mut self) -> ParentageId {
        self.next_parentage_id += 1;
        ParentageId(self.next_parentage_id)
    }

    /// Adds `parent` as a parent of `child`. Idempotent: re-adding an
    /// already-present direct edge is a no-op. Rejects edges that would
    /// create an `Ancestry(x, x)` ( bug fix: this must be rejected
    /// atomically, never partially applied).
    pub fn add_parent(&mut self, parent: LocationId, child: LocationId) -> Result<(), McpError> {
        if parent == child {
            return Err(McpError::CircularHierarchy { parent, child });
        }
        if self.parentages.iter().any(|p| p.parent == parent && p.child == child) {
            return Ok(());
        }
        // child already reaches parent: adding parent->child would close a cycle.
        if self.ancestry_exists(child, parent) {
            return Err(McpError::CircularHierarchy { parent, child });
        }

        let pid = self.fresh_parentage_id();

        let ending_at_parent: Vec<AncestryPath> = self.paths_ending_at(parent).cloned().collect();
        let starting_at_child: Vec<AncestryPath> = self.paths_starting_at(child).cloned().collect();

        let mut new_paths = Vec::with_capacity(1 + ending_at_parent.len() + starting_at_child.len());

        // direct
        new_paths.push(AncestryPath { parent, child, through: vec![pid] });

        // inherited_down: (a, parent) + (parent, child) => (a, child)
        for existing in &ending_at_parent {
            let mut through = existing.through.clone();
            through.push(pid);
            new_paths.push(AncestryPath { parent: existing.parent, child, through });
        }

        // inherited_up: (parent, child) + (child, d) => (parent, d)
        for existing in &starting_at_child {
            let mut through = vec![pid];
            through.extend(existing.through.iter().copied());
            new_paths.push(AncestryPath { parent, child: existing.child, through });
        }

        // cartesian: (a, parent) + (parent, child) + (child, d) => (a, d)
        for up in &ending_at_parent {
            for down in &starting_at_child {
                let mut through = up.through.clone();
                through.push(pid);
                through.extend(down.through.iter().copied());
                new_paths.push(AncestryPath { parent: up.parent, child: down.child, through });
            }
        }

        for path in &new_paths {
            if path.parent == path.child {
                return Err(McpError::CircularHierarchy { parent: path.parent, child: path.child });
            }
        }

        self.parentages.push(Parentage { id: pid, parent, child });
        self.paths.extend(new_paths);
        Ok(())
    }

    /// Removes the direct `parent -> child` edge, along with every path
    /// that was witnessed through it. A no-op if the edge isn't present.
    pub fn remove_parent(&mut self, parent: LocationId, child: LocationId) {
        let removed_ids: Vec<ParentageId> = self
            .parentages
            .iter()
            .filter(|p| p.parent == parent && p.child == child)
            .map(|p| p.id)
            .collect();
        if removed_ids.is_empty() {
            return;
        }
        self.parentages.retain(|p| !(p.parent == parent && p.child == child));
        self.paths.retain(|path| !path.through.iter().any(|pid| removed_ids.contains(pid)));
    }

    /// Removes every parent edge of `child`.
    pub fn clear_parents(&mut self, child: LocationId) {
        let parents: Vec<LocationId> = self
            .parentages
            .iter()
            .filter(|p| p.child == child)
            .map(|p| p.parent)
            .collect();
        for parent in parents {
            self.remove_parent(parent, child);
        }
    }

    /// Removes every child edge of `parent`.
    pub fn clear_children(&mut self, parent: LocationId) {
        let children: Vec<LocationId> = self
            .parentages
            .iter()
            .filter(|p| p.parent == parent)
            .map(|p| p.child)
            .collect();
        for child in children {
            self.remove_parent(parent, child);
        }
    }

    /// Rebuilds the transitive closure from `self.parentages` alone and
    /// compares the resulting `(parent, child)` pair set against what's
    /// currently stored. Does not check path multiplicities, only that
    /// every reachable pair has at least one witness and nothing stale
    /// lingers.
    pub fn validate_all(&self) -> Result<(), String> {
        let mut adjacency: AHashMap<LocationId, Vec<LocationId>> = AHashMap::default();
        for p in &self.parentages {
            adjacency.entry(p.parent).or_default().push(p.child);
        }

        let mut expected: AHashSet<(LocationId, LocationId)> = AHashSet::default();
        for &start in adjacency.keys() {
            let mut visited = AHashSet::default();
            let mut stack = vec![start];
            while let Some(node) = stack.pop() {
                if let Some(children) = adjacency.get(&node) {
                    for &child in children {
                        if visited.insert(child) {
                            expected.insert((start, child));
                            stack.push(child);
                        }
                    }
                }
            }
        }

        let actual: AHashSet<(LocationId, LocationId)> =
        self.ancestries().into_iter().map(|a| (a.parent, a.child)).collect();

        if expected == actual {
            return Ok(());
        }

        let missing: Vec<_> = expected.difference(&actual).collect();
        let extra: Vec<_> = actual.difference(&expected).collect();
        Err(format!(
                "ancestry closure mismatch: {} missing, {} stale (e.g. missing={:?} extra={:?})",
                missing.len(),
                extra.len(),
                missing.first(),
                extra.first()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LocationId;

    fn loc(id: u32) -> LocationId {
        LocationId(id)
    }

    #[test]
    fn test_simple_add_parent() {
        let mut e = AncestryEngine::new();
        e.add_parent(loc(1), loc(2)).unwrap();
        assert!(e.ancestry_exists(loc(1), loc(2)));
    }

    #[test]
    fn test_simple_add_child() {
        let mut e = AncestryEngine::new();
        e.add_parent(loc(1), loc(2)).unwrap();
        assert!(e.paths_starting_at(loc(1)).any(|p| p.child == loc(2)));
    }

    #[test]
    fn test_simple_remove_parent() {
        let mut e = AncestryEngine::new();
        e.add_parent(loc(1), loc(2)).unwrap();
        e.remove_parent(loc(1), loc(2));
        assert!(!e.ancestry_exists(loc(1), loc(2)));
    }

    #[test]
    fn test_simple_remove_child() {
        let mut e = AncestryEngine::new();
        e.add_parent(loc(1), loc(2)).unwrap();
        e.add_parent(loc(1), loc(3)).unwrap();
        e.remove_parent(loc(1), loc(3));
        assert!(e.ancestry_exists(loc(1), loc(2)));
        assert!(!e.ancestry_exists(loc(1), loc(3)));
    }

    #[test]
    fn test_simple_clear_parents() {
        let mut e = AncestryEngine::new();
        e.add_parent(loc(1), loc(3)).unwrap();
        e.add_parent(loc(2), loc(3)).unwrap();
        e.clear_parents(loc(3));
        assert!(!e.ancestry_exists(loc(1), loc(3)));
        assert!(!e.ancestry_exists(loc(2), loc(3)));
    }

    #[test]
    fn test_simple_clear_children() {
        let mut e = AncestryEngine::new();
        e.add_parent(loc(1), loc(2)).unwrap();
        e.add_parent(loc(1), loc(3)).unwrap();
        e.clear_children(loc(1));
        assert!(e.parentages().is_empty());
        assert!(e.ancestries().is_empty());
    }

    #[test]
    fn test_add_multiple_parents() {
        let mut e = AncestryEngine::new();
        e.add_parent(loc(1), loc(3)).unwrap();
        e.add_parent(loc(2), loc(3)).unwrap();
        assert!(e.ancestry_exists(loc(1), loc(3)));
        assert!(e.ancestry_exists(loc(2), loc(3)));
    }

    #[test]
    fn test_add_multiple_children() {
        let mut e = AncestryEngine::new();
        e.add_parent(loc(1), loc(2)).unwrap();
        e.add_parent(loc(1), loc(3)).unwrap();
        assert!(e.ancestry_exists(loc(1), loc(2)));
        assert!(e.ancestry_exists(loc(1), loc(3)));
    }

    #[test]
    fn test_add_downwards_tree_by_parent() {
        let mut e = AncestryEngine::new();
        e.add_parent(loc(1), loc(2)).unwrap();
        e.add_parent(loc(2), loc(3)).unwrap();
        e.add_parent(loc(3), loc(4)).unwrap();
        assert!(e.ancestry_exists(loc(1), loc(4)));
        assert!(e.ancestry_exists(loc(1), loc(3)));
        assert!(e.ancestry_exists(loc(2), loc(4)));
    }

    #[test]
    fn test_add_upwards_tree_by_child() {
        let mut e = AncestryEngine::new();
        e.add_parent(loc(3), loc(4)).unwrap();
        e.add_parent(loc(2), loc(3)).unwrap();
        e.add_parent(loc(1), loc(2)).unwrap();
        assert!(e.ancestry_exists(loc(1), loc(4)));
        assert!(e.ancestry_exists(loc(1), loc(3)));
        assert!(e.ancestry_exists(loc(2), loc(4)));
    }

    #[test]
    fn test_circular_fails() {
        let mut e = AncestryEngine::new();
        e.add_parent(loc(1), loc(2)).unwrap();
        e.add_parent(loc(2), loc(3)).unwrap();
        let err = e.add_parent(loc(3), loc(1));
        assert!(err.is_err());
        assert!(e.ancestry_exists(loc(1), loc(3)));
    }

    #[test]
    fn test_self_parent_fails() {
        let mut e = AncestryEngine::new();
        assert!(e.add_parent(loc(1), loc(1)).is_err());
    }

    /// S5: diamond via a duplicate edge plus a shortcut edge, then
    /// remove one leg of the diamond.
    #[test]
    fn s5_diamond_then_remove_one_leg() {
        let mut e = AncestryEngine::new();
        e.add_parent(loc(1), loc(2)).unwrap();
        e.add_parent(loc(2), loc(3)).unwrap();
        e.add_parent(loc(2), loc(3)).unwrap(); // duplicate, no-op
        e.add_parent(loc(1), loc(3)).unwrap(); // shortcut

        let paths_1_3: Vec<_> = e.paths().iter().filter(|p| p.parent == loc(1) && p.child == loc(3)).collect();
        assert_eq!(paths_1_3.len(), 2, "direct edge + one path via node 2");

        e.remove_parent(loc(1), loc(2));

        let paths_1_3: Vec<_> = e.paths().iter().filter(|p| p.parent == loc(1) && p.child == loc(3)).collect();
        assert_eq!(paths_1_3.len(), 1, "only the direct edge survives");
        assert_eq!(paths_1_3[0].through.len(), 1);
    }

    #[test]
    fn validate_all_matches_freshly_built_closure() {
        let mut e = AncestryEngine::new();
        e.add_parent(loc(1), loc(2)).unwrap();
        e.add_parent(loc(2), loc(3)).unwrap();
        e.add_parent(loc(4), loc(2)).unwrap();
        assert_eq!(e.validate_all(), Ok(()));
        e.remove_parent(loc(2), loc(3));
        assert_eq!(e.validate_all(), Ok(()));
    }
}
