//! Slot-indexed relation maps for concrete classes.
//!
//! When both sides of a relation are concrete classes, an entity is fully
//! identified by its slot, so forward lookups index straight into an array.
//! Each map comes in a mutable flavour (growable vectors) and an immutable
//! one (compacted boxed slices); conversion between the two is explicit.

// Slots are u32 and arrays are indexed by them; we target 64-bit systems
#![allow(clippy::cast_possible_truncation)]

use std::collections::HashMap;
use std::sync::Arc;

use linkage_foundation::{Error, Result};

/// Read access to a child -> parent map with ordered parent -> children inverse.
pub trait OneToManyView {
    /// Parent slot of `child`.
    fn get(&self, child: u32) -> Option<u32>;

    /// Children of `parent` in insertion order; empty if none.
    fn keys(&self, parent: u32) -> &[u32];

    /// Number of edges.
    fn len(&self) -> usize;

    /// All `(child, parent)` edges, ordered by child slot.
    fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_;

    /// Returns true if `child` has a parent.
    fn contains_key(&self, child: u32) -> bool {
        self.get(child).is_some()
    }

    /// Returns true if `parent` has at least one child.
    fn contains_value(&self, parent: u32) -> bool {
        !self.keys(parent).is_empty()
    }

    /// Returns true if there are no edges.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read access to an injective child <-> parent map.
pub trait OneToOneView {
    /// Parent slot of `child`.
    fn get(&self, child: u32) -> Option<u32>;

    /// Child slot of `parent`.
    fn get_key(&self, parent: u32) -> Option<u32>;

    /// Number of edges.
    fn len(&self) -> usize;

    /// All `(child, parent)` edges, ordered by child slot.
    fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_;

    /// Returns true if `child` has a parent.
    fn contains_key(&self, child: u32) -> bool {
        self.get(child).is_some()
    }

    /// Returns true if `parent` has a child.
    fn contains_value(&self, parent: u32) -> bool {
        self.get_key(parent).is_some()
    }

    /// Returns true if there are no edges.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: OneToManyView> OneToManyView for Arc<T> {
    fn get(&self, child: u32) -> Option<u32> {
        (**self).get(child)
    }

    fn keys(&self, parent: u32) -> &[u32] {
        (**self).keys(parent)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (**self).iter()
    }
}

impl<T: OneToOneView> OneToOneView for Arc<T> {
    fn get(&self, child: u32) -> Option<u32> {
        (**self).get(child)
    }

    fn get_key(&self, parent: u32) -> Option<u32> {
        (**self).get_key(parent)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (**self).iter()
    }
}

fn slot(array: &[Option<u32>], index: u32) -> Option<u32> {
    array.get(index as usize).copied().flatten()
}

fn set_slot(array: &mut Vec<Option<u32>>, index: u32, value: Option<u32>) {
    let index = index as usize;
    if index >= array.len() {
        if value.is_none() {
            return;
        }
        array.resize(index + 1, None);
    }
    array[index] = value;
}

fn occupied(array: &[Option<u32>]) -> impl Iterator<Item = (u32, u32)> + '_ {
    array
        .iter()
        .enumerate()
        .filter_map(|(index, value)| value.map(|value| (index as u32, value)))
}

/// Drops trailing empty slots so equal contents compare equal.
fn compact(mut array: Vec<Option<u32>>) -> Box<[Option<u32>]> {
    while array.last() == Some(&None) {
        array.pop();
    }
    array.into_boxed_slice()
}

// =============================================================================
// One-to-many
// =============================================================================

/// Mutable child -> parent map with an ordered inverse.
#[derive(Clone, Debug, Default)]
pub struct MutableOneToManyMap {
    child_to_parent: Vec<Option<u32>>,
    parent_to_children: HashMap<u32, Vec<u32>>,
    len: usize,
}

impl MutableOneToManyMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Links `child` to `parent`, moving it away from any previous parent.
    ///
    /// Re-linking a child to its current parent keeps its position.
    pub fn put(&mut self, child: u32, parent: u32) {
        match slot(&self.child_to_parent, child) {
            Some(current) if current == parent => return,
            Some(_) => {
                self.remove_key(child);
            }
            None => {}
        }
        set_slot(&mut self.child_to_parent, child, Some(parent));
        self.parent_to_children.entry(parent).or_default().push(child);
        self.len += 1;
    }

    /// Makes `children` the children of `parent`, in order.
    ///
    /// Prior children of `parent` are unlinked first. Children linked to
    /// another parent are moved.
    pub fn put_all(&mut self, children: &[u32], parent: u32) {
        self.remove_value(parent);
        for &child in children {
            self.put(child, parent);
        }
    }

    /// Unlinks `child`, returning its former parent.
    pub fn remove_key(&mut self, child: u32) -> Option<u32> {
        let parent = slot(&self.child_to_parent, child)?;
        set_slot(&mut self.child_to_parent, child, None);
        if let Some(children) = self.parent_to_children.get_mut(&parent) {
            if let Some(position) = children.iter().position(|&c| c == child) {
                children.remove(position);
            }
            if children.is_empty() {
                self.parent_to_children.remove(&parent);
            }
        }
        self.len -= 1;
        Some(parent)
    }

    /// Unlinks every child of `parent`, returning them in order.
    pub fn remove_value(&mut self, parent: u32) -> Vec<u32> {
        let children = self.parent_to_children.remove(&parent).unwrap_or_default();
        for &child in &children {
            set_slot(&mut self.child_to_parent, child, None);
        }
        self.len -= children.len();
        children
    }

    /// Removes the edge `child -> parent` if it exists.
    pub fn remove(&mut self, child: u32, parent: u32) -> bool {
        if slot(&self.child_to_parent, child) != Some(parent) {
            return false;
        }
        self.remove_key(child);
        true
    }

    /// Freezes into the compact read-only form.
    #[must_use]
    pub fn into_immutable(self) -> ImmutableOneToManyMap {
        ImmutableOneToManyMap {
            child_to_parent: compact(self.child_to_parent),
            parent_to_children: self
                .parent_to_children
                .into_iter()
                .map(|(parent, children)| (parent, children.into_boxed_slice()))
                .collect(),
            len: self.len,
        }
    }
}

impl OneToManyView for MutableOneToManyMap {
    fn get(&self, child: u32) -> Option<u32> {
        slot(&self.child_to_parent, child)
    }

    fn keys(&self, parent: u32) -> &[u32] {
        self.parent_to_children
            .get(&parent)
            .map_or(&[][..], Vec::as_slice)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        occupied(&self.child_to_parent)
    }
}

/// Read-only child -> parent map with an ordered inverse.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImmutableOneToManyMap {
    child_to_parent: Box<[Option<u32>]>,
    parent_to_children: HashMap<u32, Box<[u32]>>,
    len: usize,
}

impl ImmutableOneToManyMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies into a mutable map.
    #[must_use]
    pub fn to_mutable(&self) -> MutableOneToManyMap {
        MutableOneToManyMap {
            child_to_parent: self.child_to_parent.to_vec(),
            parent_to_children: self
                .parent_to_children
                .iter()
                .map(|(&parent, children)| (parent, children.to_vec()))
                .collect(),
            len: self.len,
        }
    }
}

impl OneToManyView for ImmutableOneToManyMap {
    fn get(&self, child: u32) -> Option<u32> {
        slot(&self.child_to_parent, child)
    }

    fn keys(&self, parent: u32) -> &[u32] {
        self.parent_to_children
            .get(&parent)
            .map_or(&[][..], |children| &children[..])
    }

    fn len(&self) -> usize {
        self.len
    }

    fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        occupied(&self.child_to_parent)
    }
}

// =============================================================================
// One-to-one
// =============================================================================

/// Mutable injective child <-> parent map.
#[derive(Clone, Debug, Default)]
pub struct MutableOneToOneMap {
    child_to_parent: Vec<Option<u32>>,
    parent_to_child: Vec<Option<u32>>,
    len: usize,
}

impl MutableOneToOneMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Links `child` to `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::OneToOneViolation`](linkage_foundation::ErrorKind::OneToOneViolation) if either side is already
    /// linked to something else. Re-inserting an existing edge is a no-op.
    pub fn put(&mut self, child: u32, parent: u32) -> Result<()> {
        let current_parent = slot(&self.child_to_parent, child);
        if current_parent == Some(parent) {
            return Ok(());
        }
        if current_parent.is_some() || slot(&self.parent_to_child, parent).is_some() {
            return Err(Error::one_to_one_violation(child, parent));
        }
        self.link(child, parent);
        Ok(())
    }

    /// Links `child` to `parent`, dropping whatever either side was linked to.
    pub fn put_force(&mut self, child: u32, parent: u32) {
        self.remove_key(child);
        self.remove_value(parent);
        self.link(child, parent);
    }

    fn link(&mut self, child: u32, parent: u32) {
        set_slot(&mut self.child_to_parent, child, Some(parent));
        set_slot(&mut self.parent_to_child, parent, Some(child));
        self.len += 1;
    }

    /// Unlinks `child`, returning its former parent.
    pub fn remove_key(&mut self, child: u32) -> Option<u32> {
        let parent = slot(&self.child_to_parent, child)?;
        set_slot(&mut self.child_to_parent, child, None);
        set_slot(&mut self.parent_to_child, parent, None);
        self.len -= 1;
        Some(parent)
    }

    /// Unlinks `parent`, returning its former child.
    pub fn remove_value(&mut self, parent: u32) -> Option<u32> {
        let child = slot(&self.parent_to_child, parent)?;
        set_slot(&mut self.parent_to_child, parent, None);
        set_slot(&mut self.child_to_parent, child, None);
        self.len -= 1;
        Some(child)
    }

    /// Removes the edge `child -> parent` if it exists.
    pub fn remove(&mut self, child: u32, parent: u32) -> bool {
        if slot(&self.child_to_parent, child) != Some(parent) {
            return false;
        }
        self.remove_key(child);
        true
    }

    /// Freezes into the compact read-only form.
    #[must_use]
    pub fn into_immutable(self) -> ImmutableOneToOneMap {
        ImmutableOneToOneMap {
            child_to_parent: compact(self.child_to_parent),
            parent_to_child: compact(self.parent_to_child),
            len: self.len,
        }
    }
}

impl OneToOneView for MutableOneToOneMap {
    fn get(&self, child: u32) -> Option<u32> {
        slot(&self.child_to_parent, child)
    }

    fn get_key(&self, parent: u32) -> Option<u32> {
        slot(&self.parent_to_child, parent)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        occupied(&self.child_to_parent)
    }
}

/// Read-only injective child <-> parent map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImmutableOneToOneMap {
    child_to_parent: Box<[Option<u32>]>,
    parent_to_child: Box<[Option<u32>]>,
    len: usize,
}

impl ImmutableOneToOneMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies into a mutable map.
    #[must_use]
    pub fn to_mutable(&self) -> MutableOneToOneMap {
        MutableOneToOneMap {
            child_to_parent: self.child_to_parent.to_vec(),
            parent_to_child: self.parent_to_child.to_vec(),
            len: self.len,
        }
    }
}

impl OneToOneView for ImmutableOneToOneMap {
    fn get(&self, child: u32) -> Option<u32> {
        slot(&self.child_to_parent, child)
    }

    fn get_key(&self, parent: u32) -> Option<u32> {
        slot(&self.parent_to_child, parent)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        occupied(&self.child_to_parent)
    }
}
