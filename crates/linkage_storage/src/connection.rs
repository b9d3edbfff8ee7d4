//! Interned relation-type descriptors.
//!
//! A [`ConnectionId`] names one relation type: parent class, child class,
//! kind and parent nullability. Equal descriptors are interned into a single
//! process-wide table, so connection ids compare and hash by address.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use linkage_foundation::{ClassHierarchy, ClassId, ClassRegistry, Result};
use parking_lot::Mutex;

/// Kind of a relation between parent and child entities.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ConnectionKind {
    /// One parent, one child; both classes concrete.
    OneToOne,
    /// One parent, many children; both classes concrete.
    OneToMany,
    /// One parent, many children; classes matched by subtype.
    OneToAbstractMany,
    /// One parent, one child; classes matched by subtype.
    AbstractOneToOne,
}

impl ConnectionKind {
    /// Returns true for the one-to-one kinds.
    #[must_use]
    pub const fn is_one_to_one(self) -> bool {
        matches!(self, Self::OneToOne | Self::AbstractOneToOne)
    }

    /// Returns true for kinds whose classes are matched by subtype.
    #[must_use]
    pub const fn is_polymorphic(self) -> bool {
        matches!(self, Self::OneToAbstractMany | Self::AbstractOneToOne)
    }
}

#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct ConnectionInfo {
    parent_class: ClassId,
    child_class: ClassId,
    kind: ConnectionKind,
    is_parent_nullable: bool,
}

/// Canonical identity of a relation type.
///
/// Only [`ConnectionId::create`] builds these, and it hands out one shared
/// instance per field tuple. Interned descriptors live for the rest of the
/// process; their number is bounded by the relation types in the model.
#[derive(Copy, Clone)]
pub struct ConnectionId(&'static ConnectionInfo);

static INTERNER: LazyLock<Mutex<HashSet<&'static ConnectionInfo>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

impl ConnectionId {
    /// Returns the canonical connection id for the given descriptor.
    ///
    /// Safe to call from any thread; interning is serialized by a single
    /// process-wide lock. Reading the fields of an id never locks.
    #[must_use]
    pub fn create(
        parent_class: ClassId,
        child_class: ClassId,
        kind: ConnectionKind,
        is_parent_nullable: bool,
    ) -> Self {
        let info = ConnectionInfo {
            parent_class,
            child_class,
            kind,
            is_parent_nullable,
        };

        let mut interned = INTERNER.lock();
        if let Some(&existing) = interned.get(&info) {
            return Self(existing);
        }
        let leaked: &'static ConnectionInfo = Box::leak(Box::new(info));
        interned.insert(leaked);
        Self(leaked)
    }

    /// Class of the parent side.
    #[must_use]
    pub fn parent_class(self) -> ClassId {
        self.0.parent_class
    }

    /// Class of the child side.
    #[must_use]
    pub fn child_class(self) -> ClassId {
        self.0.child_class
    }

    /// Kind of the relation.
    #[must_use]
    pub fn kind(self) -> ConnectionKind {
        self.0.kind
    }

    /// Whether a child may exist without a parent.
    #[must_use]
    pub fn is_parent_nullable(self) -> bool {
        self.0.is_parent_nullable
    }

    /// Returns true if removing the parent of a child is allowed, i.e. the
    /// parent is optional for the child.
    #[must_use]
    pub fn can_remove_parent(self) -> bool {
        self.0.is_parent_nullable
    }

    /// Returns true for one-to-one relations, dense or polymorphic.
    #[must_use]
    pub fn is_one_to_one(self) -> bool {
        self.0.kind.is_one_to_one()
    }

    /// Multi-line description with class names resolved through `classes`.
    ///
    /// # Errors
    ///
    /// Returns an error if either class is not registered.
    pub fn describe(self, classes: &ClassRegistry) -> Result<String> {
        Ok(format!(
            "ConnectionId info:\n  - Parent class: {}\n  - Child class: {}\n  - Connection type: {:?}\n  - Parent of child is nullable: {}",
            classes.name(self.parent_class())?,
            classes.name(self.child_class())?,
            self.kind(),
            self.is_parent_nullable(),
        ))
    }
}

impl PartialEq for ConnectionId {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl Eq for ConnectionId {}

impl Hash for ConnectionId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(self.0, state);
    }
}

impl PartialOrd for ConnectionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConnectionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(other.0)
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Connection(parent={} child={} {:?})",
            self.0.parent_class.index(),
            self.0.child_class.index(),
            self.0.kind
        )
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Checks whether an entity class sits on a connection side.
///
/// Dense kinds require the exact class; polymorphic kinds accept any class
/// assignable to the declared one.
///
/// # Errors
///
/// Returns an error if the hierarchy does not know one of the classes.
pub fn same_class(
    connection_class: ClassId,
    entity_class: ClassId,
    kind: ConnectionKind,
    classes: &impl ClassHierarchy,
) -> Result<bool> {
    if kind.is_polymorphic() {
        classes.is_assignable_from(connection_class, entity_class)
    } else {
        Ok(connection_class == entity_class)
    }
}
