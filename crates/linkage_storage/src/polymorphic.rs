//! Entity-keyed relation maps for connections spanning class hierarchies.
//!
//! When a relation is declared on a base class, children (or parents) of
//! the same connection can belong to different concrete classes, so slots
//! alone no longer identify them. These maps key on full entity ids.

use std::collections::HashMap;

use indexmap::IndexSet;
use linkage_foundation::{ChildEntityId, Error, ParentEntityId, Result};

/// Child -> parent map that remembers the link order of each parent's children.
///
/// Used for one-to-abstract-many connections: [`keys_by_value`] yields the
/// children of a parent in the order they were linked. Every operation
/// touches only the edges of the parents involved.
///
/// [`keys_by_value`]: LinkedBidirectionalMap::keys_by_value
#[derive(Clone, Debug, Default)]
pub struct LinkedBidirectionalMap {
    child_to_parent: HashMap<ChildEntityId, ParentEntityId>,
    parent_to_children: HashMap<ParentEntityId, IndexSet<ChildEntityId>>,
}

impl LinkedBidirectionalMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parent of `child`.
    #[must_use]
    pub fn get(&self, child: ChildEntityId) -> Option<ParentEntityId> {
        self.child_to_parent.get(&child).copied()
    }

    /// Returns true if `child` has a parent.
    #[must_use]
    pub fn contains_key(&self, child: ChildEntityId) -> bool {
        self.child_to_parent.contains_key(&child)
    }

    /// Returns true if `parent` has at least one child.
    #[must_use]
    pub fn contains_value(&self, parent: ParentEntityId) -> bool {
        self.parent_to_children.contains_key(&parent)
    }

    /// Children of `parent` in link order.
    pub fn keys_by_value(&self, parent: ParentEntityId) -> impl Iterator<Item = ChildEntityId> + '_ {
        self.parent_to_children
            .get(&parent)
            .into_iter()
            .flat_map(|children| children.iter().copied())
    }

    /// Links `child` to `parent`, returning the previous parent.
    ///
    /// A child moved to another parent goes to the end of that parent's
    /// children; re-linking to the same parent keeps its position.
    pub fn insert(&mut self, child: ChildEntityId, parent: ParentEntityId) -> Option<ParentEntityId> {
        let previous = self.child_to_parent.insert(child, parent);
        match previous {
            Some(old) if old == parent => return previous,
            Some(old) => self.detach(child, old),
            None => {}
        }
        self.parent_to_children.entry(parent).or_default().insert(child);
        previous
    }

    /// Unlinks `child`, returning its former parent.
    pub fn remove(&mut self, child: ChildEntityId) -> Option<ParentEntityId> {
        let parent = self.child_to_parent.remove(&child)?;
        self.detach(child, parent);
        Some(parent)
    }

    /// Removes the edge `child -> parent` if it exists.
    pub fn remove_pair(&mut self, child: ChildEntityId, parent: ParentEntityId) -> bool {
        if self.get(child) != Some(parent) {
            return false;
        }
        self.remove(child);
        true
    }

    /// Unlinks every child of `parent`, returning them in link order.
    pub fn remove_value(&mut self, parent: ParentEntityId) -> Vec<ChildEntityId> {
        let Some(children) = self.parent_to_children.remove(&parent) else {
            return Vec::new();
        };
        for child in &children {
            self.child_to_parent.remove(child);
        }
        children.into_iter().collect()
    }

    /// All `(child, parent)` edges, grouped by parent, each group in link order.
    pub fn iter(&self) -> impl Iterator<Item = (ChildEntityId, ParentEntityId)> + '_ {
        self.parent_to_children
            .iter()
            .flat_map(|(&parent, children)| children.iter().map(move |&child| (child, parent)))
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.child_to_parent.len()
    }

    /// Returns true if there are no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.child_to_parent.is_empty()
    }

    fn detach(&mut self, child: ChildEntityId, parent: ParentEntityId) {
        if let Some(children) = self.parent_to_children.get_mut(&parent) {
            children.shift_remove(&child);
            if children.is_empty() {
                self.parent_to_children.remove(&parent);
            }
        }
    }
}

impl PartialEq for LinkedBidirectionalMap {
    /// Equal when both maps hold the same edges with the same child order
    /// under every parent.
    fn eq(&self, other: &Self) -> bool {
        self.child_to_parent == other.child_to_parent
            && self.parent_to_children.len() == other.parent_to_children.len()
            && self.parent_to_children.iter().all(|(parent, children)| {
                other
                    .parent_to_children
                    .get(parent)
                    .is_some_and(|theirs| children.iter().eq(theirs.iter()))
            })
    }
}

impl Eq for LinkedBidirectionalMap {}

impl FromIterator<(ChildEntityId, ParentEntityId)> for LinkedBidirectionalMap {
    fn from_iter<I: IntoIterator<Item = (ChildEntityId, ParentEntityId)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (child, parent) in iter {
            map.insert(child, parent);
        }
        map
    }
}

/// Injective child <-> parent map for abstract one-to-one connections.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityBiMap {
    forward: HashMap<ChildEntityId, ParentEntityId>,
    backward: HashMap<ParentEntityId, ChildEntityId>,
}

impl EntityBiMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parent of `child`.
    #[must_use]
    pub fn get(&self, child: ChildEntityId) -> Option<ParentEntityId> {
        self.forward.get(&child).copied()
    }

    /// Returns true if `child` has a parent.
    #[must_use]
    pub fn contains_key(&self, child: ChildEntityId) -> bool {
        self.forward.contains_key(&child)
    }

    /// Returns true if `parent` has a child.
    #[must_use]
    pub fn contains_value(&self, parent: ParentEntityId) -> bool {
        self.backward.contains_key(&parent)
    }

    /// Parent-keyed view of this map.
    #[must_use]
    pub fn inverse(&self) -> Inverse<'_> {
        Inverse(&self.backward)
    }

    /// Links `child` to `parent`, replacing the previous parent of `child`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::OneToOneViolation`](linkage_foundation::ErrorKind::OneToOneViolation)
    /// if `parent` is already linked to a different child.
    pub fn insert(&mut self, child: ChildEntityId, parent: ParentEntityId) -> Result<Option<ParentEntityId>> {
        if self.backward.get(&parent).is_some_and(|&bound| bound != child) {
            return Err(Error::one_to_one_violation(child, parent));
        }
        Ok(self.link(child, parent))
    }

    /// Links `child` to `parent`, dropping whatever either side was linked to.
    pub fn force_insert(&mut self, child: ChildEntityId, parent: ParentEntityId) -> Option<ParentEntityId> {
        self.remove_value(parent);
        self.link(child, parent)
    }

    fn link(&mut self, child: ChildEntityId, parent: ParentEntityId) -> Option<ParentEntityId> {
        let previous = self.forward.insert(child, parent);
        if let Some(old) = previous {
            self.backward.remove(&old);
        }
        self.backward.insert(parent, child);
        previous
    }

    /// Unlinks `child`, returning its former parent.
    pub fn remove(&mut self, child: ChildEntityId) -> Option<ParentEntityId> {
        let parent = self.forward.remove(&child)?;
        self.backward.remove(&parent);
        Some(parent)
    }

    /// Unlinks `parent`, returning its former child.
    pub fn remove_value(&mut self, parent: ParentEntityId) -> Option<ChildEntityId> {
        let child = self.backward.remove(&parent)?;
        self.forward.remove(&child);
        Some(child)
    }

    /// Removes the edge `child -> parent` if it exists.
    pub fn remove_pair(&mut self, child: ChildEntityId, parent: ParentEntityId) -> bool {
        if self.get(child) != Some(parent) {
            return false;
        }
        self.remove(child);
        true
    }

    /// All `(child, parent)` edges, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (ChildEntityId, ParentEntityId)> + '_ {
        self.forward.iter().map(|(&child, &parent)| (child, parent))
    }

    /// Number of edges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Returns true if there are no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

impl FromIterator<(ChildEntityId, ParentEntityId)> for EntityBiMap {
    fn from_iter<I: IntoIterator<Item = (ChildEntityId, ParentEntityId)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (child, parent) in iter {
            map.force_insert(child, parent);
        }
        map
    }
}

/// Read-only parent -> child view of an [`EntityBiMap`].
#[derive(Clone, Copy, Debug)]
pub struct Inverse<'a>(&'a HashMap<ParentEntityId, ChildEntityId>);

impl Inverse<'_> {
    /// Child of `parent`.
    #[must_use]
    pub fn get(&self, parent: ParentEntityId) -> Option<ChildEntityId> {
        self.0.get(&parent).copied()
    }

    /// Returns true if `parent` has a child.
    #[must_use]
    pub fn contains_key(&self, parent: ParentEntityId) -> bool {
        self.0.contains_key(&parent)
    }

    /// All `(parent, child)` edges, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (ParentEntityId, ChildEntityId)> + '_ {
        self.0.iter().map(|(&parent, &child)| (parent, child))
    }
}
