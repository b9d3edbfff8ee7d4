//! Read-only queries shared by immutable and mutable relation tables.
//!
//! A table exposes its four containers through [`RefsRead`]; every query
//! below is written once against that trait.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use linkage_foundation::{
    ChildEntityId, ClassHierarchy, ClassId, EntityId, Error, ParentEntityId, Result,
};

use crate::config::{ConflictPolicy, RefsConfig};
use crate::connection::ConnectionId;
use crate::dense::{OneToManyView, OneToOneView};
use crate::polymorphic::{EntityBiMap, LinkedBidirectionalMap};

/// Read access to the four relation containers of a table.
pub trait RefsRead {
    /// Container type of dense one-to-many connections.
    type OneToMany: OneToManyView + Clone;
    /// Container type of dense one-to-one connections.
    type OneToOne: OneToOneView + Clone;

    /// Configuration of this table.
    fn config(&self) -> &RefsConfig;

    /// Dense one-to-many containers by connection.
    fn one_to_many_container(&self) -> &im::HashMap<ConnectionId, Self::OneToMany>;

    /// Dense one-to-one containers by connection.
    fn one_to_one_container(&self) -> &im::HashMap<ConnectionId, Self::OneToOne>;

    /// Polymorphic one-to-many containers by connection.
    fn one_to_abstract_many_container(&self)
    -> &im::HashMap<ConnectionId, Arc<LinkedBidirectionalMap>>;

    /// Polymorphic one-to-one containers by connection.
    fn abstract_one_to_one_container(&self) -> &im::HashMap<ConnectionId, Arc<EntityBiMap>>;

    /// Every connection with storage in this table, in a stable order.
    fn connections(&self) -> Vec<ConnectionId> {
        let mut connections: Vec<_> = self
            .one_to_many_container()
            .keys()
            .chain(self.one_to_one_container().keys())
            .chain(self.one_to_abstract_many_container().keys())
            .chain(self.abstract_one_to_one_container().keys())
            .copied()
            .collect();
        connections.sort();
        connections
    }

    /// Finds the connection linking `parent_class` to `child_class`.
    ///
    /// Dense connections must match both classes exactly and are searched
    /// first (one-to-many, then one-to-one); polymorphic connections match
    /// when both classes are assignable to the declared ones.
    ///
    /// # Errors
    ///
    /// Returns an error if a class is unknown to `classes`.
    fn find_connection_id(
        &self,
        parent_class: ClassId,
        child_class: ClassId,
        classes: &impl ClassHierarchy,
    ) -> Result<Option<ConnectionId>> {
        let exact = |c: &&ConnectionId| c.parent_class() == parent_class && c.child_class() == child_class;

        if let Some(&found) = self.one_to_many_container().keys().filter(exact).min() {
            return Ok(Some(found));
        }
        if let Some(&found) = self.one_to_one_container().keys().filter(exact).min() {
            return Ok(Some(found));
        }

        let polymorphic = [
            sorted(self.one_to_abstract_many_container().keys()),
            sorted(self.abstract_one_to_one_container().keys()),
        ];
        for connection in polymorphic.into_iter().flatten() {
            if classes.is_assignable_from(connection.parent_class(), parent_class)?
                && classes.is_assignable_from(connection.child_class(), child_class)?
            {
                return Ok(Some(connection));
            }
        }
        Ok(None)
    }

    /// Parents of `child` across every connection whose child side matches it.
    ///
    /// # Errors
    ///
    /// Returns an error if a class is unknown to `classes`, or on a
    /// conflicting reference under [`ConflictPolicy::Fail`].
    fn get_parent_refs_of_child(
        &self,
        child: ChildEntityId,
        classes: &impl ClassHierarchy,
    ) -> Result<HashMap<ConnectionId, ParentEntityId>> {
        let mut refs = HashMap::new();
        let policy = self.config().on_conflict;

        for (&connection, map) in self.one_to_many_container() {
            if connection.child_class() != child.class() {
                continue;
            }
            if let Some(parent) = map.get(child.slot()) {
                let parent = EntityId::new(connection.parent_class(), parent).as_parent();
                claim(policy, &mut refs, connection, parent, child.id())?;
            }
        }
        collect_one_to_one_parents(self, child, classes, &mut refs)?;
        for (&connection, map) in self.one_to_abstract_many_container() {
            if !classes.is_assignable_from(connection.child_class(), child.class())? {
                continue;
            }
            if let Some(parent) = map.get(child) {
                claim(policy, &mut refs, connection, parent, child.id())?;
            }
        }
        Ok(refs)
    }

    /// Like [`get_parent_refs_of_child`](Self::get_parent_refs_of_child),
    /// restricted to one-to-one connections.
    ///
    /// # Errors
    ///
    /// Same as [`get_parent_refs_of_child`](Self::get_parent_refs_of_child).
    fn get_parent_one_to_one_refs_of_child(
        &self,
        child: ChildEntityId,
        classes: &impl ClassHierarchy,
    ) -> Result<HashMap<ConnectionId, ParentEntityId>> {
        let mut refs = HashMap::new();
        collect_one_to_one_parents(self, child, classes, &mut refs)?;
        Ok(refs)
    }

    /// Children of `parent` across every connection whose parent side
    /// matches it, each list in link order.
    ///
    /// # Errors
    ///
    /// Returns an error if a class is unknown to `classes`, or on a
    /// conflicting reference under [`ConflictPolicy::Fail`].
    fn get_children_refs_of_parent_by(
        &self,
        parent: ParentEntityId,
        classes: &impl ClassHierarchy,
    ) -> Result<HashMap<ConnectionId, Vec<ChildEntityId>>> {
        let mut refs = HashMap::new();
        let policy = self.config().on_conflict;

        for (&connection, map) in self.one_to_many_container() {
            if connection.parent_class() != parent.class() {
                continue;
            }
            let keys = map.keys(parent.slot());
            if keys.is_empty() {
                continue;
            }
            let children = keys
                .iter()
                .map(|&slot| EntityId::new(connection.child_class(), slot).as_child())
                .collect();
            claim(policy, &mut refs, connection, children, parent.id())?;
        }
        for (connection, child) in self.get_children_one_to_one_refs_of_parent_by(parent, classes)? {
            claim(policy, &mut refs, connection, vec![child], parent.id())?;
        }
        for (&connection, map) in self.one_to_abstract_many_container() {
            if !classes.is_assignable_from(connection.parent_class(), parent.class())? {
                continue;
            }
            let children: Vec<_> = map.keys_by_value(parent).collect();
            if !children.is_empty() {
                claim(policy, &mut refs, connection, children, parent.id())?;
            }
        }
        Ok(refs)
    }

    /// The child of `parent` in each matching one-to-one connection.
    ///
    /// # Errors
    ///
    /// Same as [`get_children_refs_of_parent_by`](Self::get_children_refs_of_parent_by).
    fn get_children_one_to_one_refs_of_parent_by(
        &self,
        parent: ParentEntityId,
        classes: &impl ClassHierarchy,
    ) -> Result<HashMap<ConnectionId, ChildEntityId>> {
        let mut refs = HashMap::new();
        let policy = self.config().on_conflict;

        for (&connection, map) in self.one_to_one_container() {
            if connection.parent_class() != parent.class() {
                continue;
            }
            if let Some(child) = map.get_key(parent.slot()) {
                let child = EntityId::new(connection.child_class(), child).as_child();
                claim(policy, &mut refs, connection, child, parent.id())?;
            }
        }
        for (&connection, map) in self.abstract_one_to_one_container() {
            if !classes.is_assignable_from(connection.parent_class(), parent.class())? {
                continue;
            }
            if let Some(child) = map.inverse().get(parent) {
                claim(policy, &mut refs, connection, child, parent.id())?;
            }
        }
        Ok(refs)
    }

    /// Child slots of `parent` in a dense one-to-many connection, in link order.
    fn get_one_to_many_children(&self, connection: ConnectionId, parent: u32) -> Option<&[u32]> {
        let keys = self.one_to_many_container().get(&connection)?.keys(parent);
        (!keys.is_empty()).then_some(keys)
    }

    /// Children of `parent` in a polymorphic one-to-many connection, in link order.
    fn get_one_to_abstract_many_children(
        &self,
        connection: ConnectionId,
        parent: ParentEntityId,
    ) -> Option<Vec<ChildEntityId>> {
        let children: Vec<_> = self
            .one_to_abstract_many_container()
            .get(&connection)?
            .keys_by_value(parent)
            .collect();
        (!children.is_empty()).then_some(children)
    }

    /// Child of `parent` in a polymorphic one-to-one connection.
    fn get_abstract_one_to_one_children(
        &self,
        connection: ConnectionId,
        parent: ParentEntityId,
    ) -> Option<ChildEntityId> {
        self.abstract_one_to_one_container()
            .get(&connection)?
            .inverse()
            .get(parent)
    }

    /// Parent of `child` in a polymorphic one-to-one connection.
    fn get_one_to_abstract_one_parent(
        &self,
        connection: ConnectionId,
        child: ChildEntityId,
    ) -> Option<ParentEntityId> {
        self.abstract_one_to_one_container().get(&connection)?.get(child)
    }

    /// Parent of `child` in a polymorphic one-to-many connection.
    fn get_one_to_abstract_many_parent(
        &self,
        connection: ConnectionId,
        child: ChildEntityId,
    ) -> Option<ParentEntityId> {
        self.one_to_abstract_many_container().get(&connection)?.get(child)
    }

    /// Child slot of `parent` in a dense one-to-one connection.
    fn get_one_to_one_child(&self, connection: ConnectionId, parent: u32) -> Option<u32> {
        self.one_to_one_container().get(&connection)?.get_key(parent)
    }

    /// Parent slot of `child` in a dense one-to-one connection.
    fn get_one_to_one_parent(&self, connection: ConnectionId, child: u32) -> Option<u32> {
        self.one_to_one_container().get(&connection)?.get(child)
    }

    /// Parent slot of `child` in a dense one-to-many connection.
    fn get_one_to_many_parent(&self, connection: ConnectionId, child: u32) -> Option<u32> {
        self.one_to_many_container().get(&connection)?.get(child)
    }
}

/// Parents of `child` in one-to-one connections, dense then polymorphic.
fn collect_one_to_one_parents<T: RefsRead + ?Sized>(
    table: &T,
    child: ChildEntityId,
    classes: &impl ClassHierarchy,
    refs: &mut HashMap<ConnectionId, ParentEntityId>,
) -> Result<()> {
    let policy = table.config().on_conflict;
    for (&connection, map) in table.one_to_one_container() {
        if connection.child_class() != child.class() {
            continue;
        }
        if let Some(parent) = map.get(child.slot()) {
            let parent = EntityId::new(connection.parent_class(), parent).as_parent();
            claim(policy, refs, connection, parent, child.id())?;
        }
    }
    for (&connection, map) in table.abstract_one_to_one_container() {
        if !classes.is_assignable_from(connection.child_class(), child.class())? {
            continue;
        }
        if let Some(parent) = map.get(child) {
            claim(policy, refs, connection, parent, child.id())?;
        }
    }
    Ok(())
}

fn sorted<'a>(connections: impl Iterator<Item = &'a ConnectionId>) -> Vec<ConnectionId> {
    let mut connections: Vec<_> = connections.copied().collect();
    connections.sort();
    connections
}

/// Records `value` for `connection` unless a value is already present.
fn claim<V>(
    policy: ConflictPolicy,
    refs: &mut HashMap<ConnectionId, V>,
    connection: ConnectionId,
    value: V,
    entity: EntityId,
) -> Result<()> {
    match refs.entry(connection) {
        Entry::Vacant(slot) => {
            slot.insert(value);
            Ok(())
        }
        Entry::Occupied(_) => match policy {
            ConflictPolicy::Log => {
                tracing::error!(%connection, %entity, "reference already recorded for connection");
                Ok(())
            }
            ConflictPolicy::Fail => Err(Error::conflicting_reference(connection.to_string())),
        },
    }
}
