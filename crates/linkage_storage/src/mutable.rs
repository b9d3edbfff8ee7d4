//! Mutable relation tables.
//!
//! A [`MutableRefsTable`] is built over an immutable [`RefsTable`] and
//! shares all of its containers. The first write to a connection clones
//! that connection's container; every other container stays shared and is
//! handed back as-is by [`MutableRefsTable::into_immutable`].
//!
//! Dense containers sit in a [`DenseEntry`] that keeps the base container
//! until the first write swaps in a private copy. Polymorphic containers
//! keep their `Arc` and are tracked in a per-kind copied set instead.

use std::collections::HashSet;
use std::sync::Arc;

use linkage_foundation::{ChildEntityId, Error, ErrorContext, ParentEntityId, Result};
use tracing::{debug, trace};

use crate::config::RefsConfig;
use crate::connection::{ConnectionId, ConnectionKind};
use crate::dense::{
    ImmutableOneToManyMap, ImmutableOneToOneMap, MutableOneToManyMap, MutableOneToOneMap,
    OneToManyView, OneToOneView,
};
use crate::polymorphic::{EntityBiMap, LinkedBidirectionalMap};
use crate::query::RefsRead;
use crate::table::RefsTable;

/// A dense container inside a mutable table.
///
/// Reads go to the private copy once there is one, and to the base
/// snapshot's container before that.
#[derive(Clone, Debug)]
pub struct DenseEntry<I, M> {
    shared: Arc<I>,
    private: Option<M>,
}

impl<I, M> DenseEntry<I, M> {
    fn shared(map: &Arc<I>) -> Self {
        Self {
            shared: Arc::clone(map),
            private: None,
        }
    }

    fn private(map: M) -> Self
    where
        I: Default,
    {
        Self {
            shared: Arc::default(),
            private: Some(map),
        }
    }

    /// Whether this entry has been cloned.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.private.is_some()
    }

    fn make_private(&mut self, thaw: impl FnOnce(&I) -> M) -> &mut M {
        let shared = &self.shared;
        self.private.get_or_insert_with(|| thaw(shared))
    }

    fn freeze(self, freeze: impl FnOnce(M) -> I) -> Arc<I> {
        match self.private {
            Some(map) => Arc::new(freeze(map)),
            None => self.shared,
        }
    }
}

impl<I: OneToManyView, M: OneToManyView> OneToManyView for DenseEntry<I, M> {
    fn get(&self, child: u32) -> Option<u32> {
        match &self.private {
            Some(map) => OneToManyView::get(map, child),
            None => OneToManyView::get(&*self.shared, child),
        }
    }

    fn keys(&self, parent: u32) -> &[u32] {
        match &self.private {
            Some(map) => OneToManyView::keys(map, parent),
            None => OneToManyView::keys(&*self.shared, parent),
        }
    }

    fn len(&self) -> usize {
        match &self.private {
            Some(map) => OneToManyView::len(map),
            None => OneToManyView::len(&*self.shared),
        }
    }

    fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let (shared, private) = match &self.private {
            Some(map) => (None, Some(OneToManyView::iter(map))),
            None => (Some(OneToManyView::iter(&*self.shared)), None),
        };
        shared.into_iter().flatten().chain(private.into_iter().flatten())
    }
}

impl<I: OneToOneView, M: OneToOneView> OneToOneView for DenseEntry<I, M> {
    fn get(&self, child: u32) -> Option<u32> {
        match &self.private {
            Some(map) => OneToOneView::get(map, child),
            None => OneToOneView::get(&*self.shared, child),
        }
    }

    fn get_key(&self, parent: u32) -> Option<u32> {
        match &self.private {
            Some(map) => OneToOneView::get_key(map, parent),
            None => OneToOneView::get_key(&*self.shared, parent),
        }
    }

    fn len(&self) -> usize {
        match &self.private {
            Some(map) => OneToOneView::len(map),
            None => OneToOneView::len(&*self.shared),
        }
    }

    fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let (shared, private) = match &self.private {
            Some(map) => (None, Some(OneToOneView::iter(map))),
            None => (Some(OneToOneView::iter(&*self.shared)), None),
        };
        shared.into_iter().flatten().chain(private.into_iter().flatten())
    }
}

type OneToManyEntry = DenseEntry<ImmutableOneToManyMap, MutableOneToManyMap>;
type OneToOneEntry = DenseEntry<ImmutableOneToOneMap, MutableOneToOneMap>;

/// A relation table open for writing.
///
/// Single writer; build one per edit session from a shared snapshot and
/// consume it with [`into_immutable`](Self::into_immutable).
#[derive(Debug)]
pub struct MutableRefsTable {
    one_to_many: im::HashMap<ConnectionId, OneToManyEntry>,
    one_to_one: im::HashMap<ConnectionId, OneToOneEntry>,
    one_to_abstract_many: im::HashMap<ConnectionId, Arc<LinkedBidirectionalMap>>,
    abstract_one_to_one: im::HashMap<ConnectionId, Arc<EntityBiMap>>,
    one_to_abstract_many_copied: HashSet<ConnectionId>,
    abstract_one_to_one_copied: HashSet<ConnectionId>,
    config: RefsConfig,
}

impl From<&RefsTable> for MutableRefsTable {
    fn from(base: &RefsTable) -> Self {
        Self {
            one_to_many: base
                .one_to_many
                .iter()
                .map(|(&connection, map)| (connection, DenseEntry::shared(map)))
                .collect(),
            one_to_one: base
                .one_to_one
                .iter()
                .map(|(&connection, map)| (connection, DenseEntry::shared(map)))
                .collect(),
            one_to_abstract_many: base.one_to_abstract_many.clone(),
            abstract_one_to_one: base.abstract_one_to_one.clone(),
            one_to_abstract_many_copied: HashSet::new(),
            abstract_one_to_one_copied: HashSet::new(),
            config: base.config,
        }
    }
}

impl MutableRefsTable {
    // ========================================================================
    // Copy-on-write access
    // ========================================================================

    fn one_to_many_mut(&mut self, connection: ConnectionId) -> &mut MutableOneToManyMap {
        self.one_to_many
            .entry(connection)
            .or_insert_with(|| DenseEntry::private(MutableOneToManyMap::new()))
            .make_private(|shared| {
                trace!(kind = "one_to_many", %connection, "copying container");
                shared.to_mutable()
            })
    }

    fn one_to_many_existing(&mut self, connection: ConnectionId) -> Option<&mut MutableOneToManyMap> {
        if self.one_to_many.contains_key(&connection) {
            Some(self.one_to_many_mut(connection))
        } else {
            None
        }
    }

    fn one_to_one_mut(&mut self, connection: ConnectionId) -> &mut MutableOneToOneMap {
        self.one_to_one
            .entry(connection)
            .or_insert_with(|| DenseEntry::private(MutableOneToOneMap::new()))
            .make_private(|shared| {
                trace!(kind = "one_to_one", %connection, "copying container");
                shared.to_mutable()
            })
    }

    fn one_to_one_existing(&mut self, connection: ConnectionId) -> Option<&mut MutableOneToOneMap> {
        if self.one_to_one.contains_key(&connection) {
            Some(self.one_to_one_mut(connection))
        } else {
            None
        }
    }

    fn one_to_abstract_many_mut(&mut self, connection: ConnectionId) -> &mut LinkedBidirectionalMap {
        let map = self.one_to_abstract_many.entry(connection).or_insert_with(Default::default);
        if self.one_to_abstract_many_copied.insert(connection) {
            trace!(kind = "one_to_abstract_many", %connection, "copying container");
            *map = Arc::new(map.iter().collect());
        }
        Arc::make_mut(map)
    }

    fn one_to_abstract_many_existing(
        &mut self,
        connection: ConnectionId,
    ) -> Option<&mut LinkedBidirectionalMap> {
        if self.one_to_abstract_many.contains_key(&connection) {
            Some(self.one_to_abstract_many_mut(connection))
        } else {
            None
        }
    }

    fn abstract_one_to_one_mut(&mut self, connection: ConnectionId) -> &mut EntityBiMap {
        let map = self.abstract_one_to_one.entry(connection).or_insert_with(Default::default);
        if self.abstract_one_to_one_copied.insert(connection) {
            trace!(kind = "abstract_one_to_one", %connection, "copying container");
            *map = Arc::new(map.iter().collect());
        }
        Arc::make_mut(map)
    }

    fn abstract_one_to_one_existing(&mut self, connection: ConnectionId) -> Option<&mut EntityBiMap> {
        if self.abstract_one_to_one.contains_key(&connection) {
            Some(self.abstract_one_to_one_mut(connection))
        } else {
            None
        }
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Removes every child of `parent` in `connection`.
    pub fn remove_refs_by_parent(&mut self, connection: ConnectionId, parent: ParentEntityId) {
        match connection.kind() {
            ConnectionKind::OneToMany => {
                if let Some(map) = self.one_to_many_existing(connection) {
                    map.remove_value(parent.slot());
                }
            }
            ConnectionKind::OneToOne => {
                if let Some(map) = self.one_to_one_existing(connection) {
                    map.remove_value(parent.slot());
                }
            }
            ConnectionKind::OneToAbstractMany => {
                if let Some(map) = self.one_to_abstract_many_existing(connection) {
                    map.remove_value(parent);
                }
            }
            ConnectionKind::AbstractOneToOne => {
                if let Some(map) = self.abstract_one_to_one_existing(connection) {
                    map.remove_value(parent);
                }
            }
        }
    }

    /// Removes the single edge `parent -> child` if present.
    pub fn remove_parent_to_child_ref(
        &mut self,
        connection: ConnectionId,
        parent: ParentEntityId,
        child: ChildEntityId,
    ) {
        match connection.kind() {
            ConnectionKind::OneToMany => {
                if let Some(map) = self.one_to_many_existing(connection) {
                    map.remove(child.slot(), parent.slot());
                }
            }
            ConnectionKind::OneToOne => {
                if let Some(map) = self.one_to_one_existing(connection) {
                    map.remove(child.slot(), parent.slot());
                }
            }
            ConnectionKind::OneToAbstractMany => {
                if let Some(map) = self.one_to_abstract_many_existing(connection) {
                    map.remove_pair(child, parent);
                }
            }
            ConnectionKind::AbstractOneToOne => {
                if let Some(map) = self.abstract_one_to_one_existing(connection) {
                    map.remove_pair(child, parent);
                }
            }
        }
    }

    /// Unbinds the child of `parent` in a dense one-to-one connection.
    pub fn remove_one_to_one_ref_by_parent(&mut self, connection: ConnectionId, parent: ParentEntityId) {
        debug_assert_eq!(connection.kind(), ConnectionKind::OneToOne);
        if let Some(map) = self.one_to_one_existing(connection) {
            map.remove_value(parent.slot());
        }
    }

    /// Unbinds the parent of `child` in a dense one-to-one connection.
    pub fn remove_one_to_one_ref_by_child(&mut self, connection: ConnectionId, child: ChildEntityId) {
        debug_assert_eq!(connection.kind(), ConnectionKind::OneToOne);
        if let Some(map) = self.one_to_one_existing(connection) {
            map.remove_key(child.slot());
        }
    }

    /// Unbinds the child of `parent` in a polymorphic one-to-one connection.
    pub fn remove_one_to_abstract_one_ref_by_parent(
        &mut self,
        connection: ConnectionId,
        parent: ParentEntityId,
    ) {
        debug_assert_eq!(connection.kind(), ConnectionKind::AbstractOneToOne);
        if let Some(map) = self.abstract_one_to_one_existing(connection) {
            map.remove_value(parent);
        }
    }

    /// Unbinds the parent of `child` in a polymorphic one-to-one connection.
    pub fn remove_one_to_abstract_one_ref_by_child(
        &mut self,
        connection: ConnectionId,
        child: ChildEntityId,
    ) {
        debug_assert_eq!(connection.kind(), ConnectionKind::AbstractOneToOne);
        if let Some(map) = self.abstract_one_to_one_existing(connection) {
            map.remove(child);
        }
    }

    /// Detaches `child` from its parent in a dense one-to-many connection.
    pub fn remove_one_to_many_refs_by_child(&mut self, connection: ConnectionId, child: ChildEntityId) {
        debug_assert_eq!(connection.kind(), ConnectionKind::OneToMany);
        if let Some(map) = self.one_to_many_existing(connection) {
            map.remove_key(child.slot());
        }
    }

    /// Detaches `child` from its parent in a polymorphic one-to-many connection.
    pub fn remove_one_to_abstract_many_refs_by_child(
        &mut self,
        connection: ConnectionId,
        child: ChildEntityId,
    ) {
        debug_assert_eq!(connection.kind(), ConnectionKind::OneToAbstractMany);
        if let Some(map) = self.one_to_abstract_many_existing(connection) {
            map.remove(child);
        }
    }

    // ========================================================================
    // Replacement
    // ========================================================================

    /// Replaces all children of `parent` with `new_children`, in order.
    ///
    /// Children that belonged to another parent are moved.
    ///
    /// # Errors
    ///
    /// Fails without touching the table if `new_children` repeats a child,
    /// or holds more than one child for a one-to-one connection.
    pub fn replace_children_of_parent(
        &mut self,
        connection: ConnectionId,
        parent: ParentEntityId,
        new_children: &[ChildEntityId],
    ) -> Result<()> {
        check_children("replace_children_of_parent", connection, parent, new_children)?;

        match connection.kind() {
            ConnectionKind::OneToMany => {
                self.one_to_many_mut(connection)
                    .put_all(&slots(new_children), parent.slot());
            }
            ConnectionKind::OneToOne => {
                let map = self.one_to_one_mut(connection);
                map.remove_value(parent.slot());
                if let [child] = new_children {
                    map.put_force(child.slot(), parent.slot());
                }
            }
            ConnectionKind::OneToAbstractMany => {
                relink_children(self.one_to_abstract_many_mut(connection), parent, new_children);
            }
            ConnectionKind::AbstractOneToOne => {
                let map = self.abstract_one_to_one_mut(connection);
                map.remove_value(parent);
                if let [child] = new_children {
                    map.force_insert(*child, parent);
                }
            }
        }
        Ok(())
    }

    /// Makes `parent` the only parent of `child`.
    pub fn replace_parent_of_child(
        &mut self,
        connection: ConnectionId,
        child: ChildEntityId,
        parent: ParentEntityId,
    ) {
        match connection.kind() {
            ConnectionKind::OneToMany => self.replace_one_to_many_parent_of_child(connection, child, parent),
            ConnectionKind::OneToOne => self.replace_one_to_one_parent_of_child(connection, child, parent),
            ConnectionKind::OneToAbstractMany => {
                self.replace_one_to_abstract_many_parent_of_child(connection, child, parent);
            }
            ConnectionKind::AbstractOneToOne => {
                self.replace_one_to_abstract_one_parent_of_child(connection, child, parent);
            }
        }
    }

    /// Binds `child` to `parent` in a dense one-to-one connection,
    /// unbinding the previous child of `parent`.
    pub fn replace_one_to_one_child_of_parent(
        &mut self,
        connection: ConnectionId,
        parent: ParentEntityId,
        child: ChildEntityId,
    ) {
        debug_assert_eq!(connection.kind(), ConnectionKind::OneToOne);
        let map = self.one_to_one_mut(connection);
        map.remove_value(parent.slot());
        map.put_force(child.slot(), parent.slot());
    }

    /// Binds `child` to `parent` in a dense one-to-one connection,
    /// unbinding the previous parent of `child`.
    pub fn replace_one_to_one_parent_of_child(
        &mut self,
        connection: ConnectionId,
        child: ChildEntityId,
        parent: ParentEntityId,
    ) {
        debug_assert_eq!(connection.kind(), ConnectionKind::OneToOne);
        let map = self.one_to_one_mut(connection);
        map.remove_key(child.slot());
        map.put_force(child.slot(), parent.slot());
    }

    /// Binds `child` to `parent` in a polymorphic one-to-one connection,
    /// unbinding the previous parent of `child`.
    pub fn replace_one_to_abstract_one_parent_of_child(
        &mut self,
        connection: ConnectionId,
        child: ChildEntityId,
        parent: ParentEntityId,
    ) {
        debug_assert_eq!(connection.kind(), ConnectionKind::AbstractOneToOne);
        let map = self.abstract_one_to_one_mut(connection);
        map.remove(child);
        map.force_insert(child, parent);
    }

    /// Binds `child` to `parent` in a polymorphic one-to-one connection,
    /// unbinding the previous child of `parent`.
    pub fn replace_one_to_abstract_one_child_of_parent(
        &mut self,
        connection: ConnectionId,
        parent: ParentEntityId,
        child: ChildEntityId,
    ) {
        debug_assert_eq!(connection.kind(), ConnectionKind::AbstractOneToOne);
        let map = self.abstract_one_to_one_mut(connection);
        map.remove_value(parent);
        map.force_insert(child, parent);
    }

    /// Replaces the children of `parent` in a dense one-to-many connection.
    ///
    /// # Errors
    ///
    /// Fails without touching the table if `new_children` repeats a child.
    pub fn replace_one_to_many_children_of_parent(
        &mut self,
        connection: ConnectionId,
        parent: ParentEntityId,
        new_children: &[ChildEntityId],
    ) -> Result<()> {
        debug_assert_eq!(connection.kind(), ConnectionKind::OneToMany);
        check_children("replace_one_to_many_children_of_parent", connection, parent, new_children)?;
        self.one_to_many_mut(connection)
            .put_all(&slots(new_children), parent.slot());
        Ok(())
    }

    /// Replaces the children of `parent` in a polymorphic one-to-many connection.
    ///
    /// # Errors
    ///
    /// Fails without touching the table if `new_children` repeats a child.
    pub fn replace_one_to_abstract_many_children_of_parent(
        &mut self,
        connection: ConnectionId,
        parent: ParentEntityId,
        new_children: &[ChildEntityId],
    ) -> Result<()> {
        debug_assert_eq!(connection.kind(), ConnectionKind::OneToAbstractMany);
        check_children(
            "replace_one_to_abstract_many_children_of_parent",
            connection,
            parent,
            new_children,
        )?;
        relink_children(self.one_to_abstract_many_mut(connection), parent, new_children);
        Ok(())
    }

    /// Moves `child` under `parent` in a polymorphic one-to-many connection.
    pub fn replace_one_to_abstract_many_parent_of_child(
        &mut self,
        connection: ConnectionId,
        child: ChildEntityId,
        parent: ParentEntityId,
    ) {
        debug_assert_eq!(connection.kind(), ConnectionKind::OneToAbstractMany);
        let map = self.one_to_abstract_many_mut(connection);
        map.remove(child);
        map.insert(child, parent);
    }

    /// Moves `child` under `parent` in a dense one-to-many connection.
    ///
    /// The child is appended to the end of `parent`'s children.
    pub fn replace_one_to_many_parent_of_child(
        &mut self,
        connection: ConnectionId,
        child: ChildEntityId,
        parent: ParentEntityId,
    ) {
        debug_assert_eq!(connection.kind(), ConnectionKind::OneToMany);
        let map = self.one_to_many_mut(connection);
        map.remove_key(child.slot());
        map.put(child.slot(), parent.slot());
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Connections whose container this table has cloned so far.
    #[must_use]
    pub fn copied_connections(&self) -> Vec<ConnectionId> {
        let mut copied: Vec<_> = self
            .one_to_many
            .iter()
            .filter(|(_, entry)| entry.is_private())
            .map(|(&connection, _)| connection)
            .chain(
                self.one_to_one
                    .iter()
                    .filter(|(_, entry)| entry.is_private())
                    .map(|(&connection, _)| connection),
            )
            .chain(self.one_to_abstract_many_copied.iter().copied())
            .chain(self.abstract_one_to_one_copied.iter().copied())
            .collect();
        copied.sort();
        copied
    }

    /// Freezes this table into a snapshot.
    ///
    /// Containers this table never wrote to are returned unchanged, still
    /// shared with the base snapshot.
    #[must_use]
    pub fn into_immutable(self) -> RefsTable {
        debug!(
            copied = self.copied_connections().len(),
            connections = self.connections().len(),
            "freezing relation table"
        );
        RefsTable {
            one_to_many: self
                .one_to_many
                .into_iter()
                .map(|(connection, entry)| (connection, entry.freeze(MutableOneToManyMap::into_immutable)))
                .collect(),
            one_to_one: self
                .one_to_one
                .into_iter()
                .map(|(connection, entry)| (connection, entry.freeze(MutableOneToOneMap::into_immutable)))
                .collect(),
            one_to_abstract_many: self.one_to_abstract_many,
            abstract_one_to_one: self.abstract_one_to_one,
            config: self.config,
        }
    }
}

impl RefsRead for MutableRefsTable {
    type OneToMany = OneToManyEntry;
    type OneToOne = OneToOneEntry;

    fn config(&self) -> &RefsConfig {
        &self.config
    }

    fn one_to_many_container(&self) -> &im::HashMap<ConnectionId, Self::OneToMany> {
        &self.one_to_many
    }

    fn one_to_one_container(&self) -> &im::HashMap<ConnectionId, Self::OneToOne> {
        &self.one_to_one
    }

    fn one_to_abstract_many_container(
        &self,
    ) -> &im::HashMap<ConnectionId, Arc<LinkedBidirectionalMap>> {
        &self.one_to_abstract_many
    }

    fn abstract_one_to_one_container(&self) -> &im::HashMap<ConnectionId, Arc<EntityBiMap>> {
        &self.abstract_one_to_one
    }
}

/// Rejects `children` if it repeats a child, or holds several children for
/// a one-to-one connection. The error names `operation` and `connection`.
fn check_children(
    operation: &'static str,
    connection: ConnectionId,
    parent: ParentEntityId,
    children: &[ChildEntityId],
) -> Result<()> {
    let mut seen = HashSet::with_capacity(children.len());
    let error = if children.iter().any(|child| !seen.insert(*child)) {
        Error::duplicate_children(parent, children.to_vec())
    } else if connection.is_one_to_one() && children.len() > 1 {
        Error::too_many_children(connection.to_string(), children.len())
    } else {
        return Ok(());
    };
    Err(error.with_context(
        ErrorContext::new()
            .with_operation(operation)
            .with_connection(connection),
    ))
}

fn slots(children: &[ChildEntityId]) -> Vec<u32> {
    children.iter().map(|child| child.slot()).collect()
}

fn relink_children(map: &mut LinkedBidirectionalMap, parent: ParentEntityId, children: &[ChildEntityId]) {
    map.remove_value(parent);
    for &child in children {
        map.remove(child);
        map.insert(child, parent);
    }
}
