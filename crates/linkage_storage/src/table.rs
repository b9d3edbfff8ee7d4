//! Immutable relation table snapshots.

use std::sync::Arc;

use crate::config::RefsConfig;
use crate::connection::{ConnectionId, ConnectionKind};
use crate::dense::{ImmutableOneToManyMap, ImmutableOneToOneMap};
use crate::mutable::MutableRefsTable;
use crate::polymorphic::{EntityBiMap, LinkedBidirectionalMap};
use crate::query::RefsRead;

/// An immutable snapshot of every parent-child relation.
///
/// Containers are held behind `Arc`, so cloning a table, or freezing a
/// mutable table that only touched a few connections, shares the rest.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RefsTable {
    pub(crate) one_to_many: im::HashMap<ConnectionId, Arc<ImmutableOneToManyMap>>,
    pub(crate) one_to_one: im::HashMap<ConnectionId, Arc<ImmutableOneToOneMap>>,
    pub(crate) one_to_abstract_many: im::HashMap<ConnectionId, Arc<LinkedBidirectionalMap>>,
    pub(crate) abstract_one_to_one: im::HashMap<ConnectionId, Arc<EntityBiMap>>,
    pub(crate) config: RefsConfig,
}

impl RefsTable {
    /// Creates an empty table with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty table with the given configuration.
    #[must_use]
    pub fn with_config(config: RefsConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Starts a mutable table over this snapshot.
    #[must_use]
    pub fn to_mutable(&self) -> MutableRefsTable {
        MutableRefsTable::from(self)
    }

    /// Whether `self` and `other` hold the very same container for `connection`.
    ///
    /// False when either table has no container for it.
    #[must_use]
    pub fn shares_storage(&self, other: &Self, connection: ConnectionId) -> bool {
        match connection.kind() {
            ConnectionKind::OneToMany => same(&self.one_to_many, &other.one_to_many, connection),
            ConnectionKind::OneToOne => same(&self.one_to_one, &other.one_to_one, connection),
            ConnectionKind::OneToAbstractMany => same(
                &self.one_to_abstract_many,
                &other.one_to_abstract_many,
                connection,
            ),
            ConnectionKind::AbstractOneToOne => same(
                &self.abstract_one_to_one,
                &other.abstract_one_to_one,
                connection,
            ),
        }
    }
}

fn same<T>(
    left: &im::HashMap<ConnectionId, Arc<T>>,
    right: &im::HashMap<ConnectionId, Arc<T>>,
    connection: ConnectionId,
) -> bool {
    match (left.get(&connection), right.get(&connection)) {
        (Some(left), Some(right)) => Arc::ptr_eq(left, right),
        _ => false,
    }
}

impl RefsRead for RefsTable {
    type OneToMany = Arc<ImmutableOneToManyMap>;
    type OneToOne = Arc<ImmutableOneToOneMap>;

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
