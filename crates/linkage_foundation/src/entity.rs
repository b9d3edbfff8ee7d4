//! Entity identifiers and their role-tagged wrappers.

use std::fmt;

/// Identifier of an entity class.
///
/// Class ids are small integers handed out by a class registry. This crate
/// treats them as opaque; only a [`ClassHierarchy`](crate::ClassHierarchy)
/// can tell how two classes relate.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClassId(pub(crate) u32);

impl ClassId {
    /// Creates a class id from its raw index.
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index of this class.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

/// Identity of one entity within a snapshot.
///
/// # Layout
/// - `class`: the concrete class of the entity
/// - `slot`: index of the entity among the entities of that class
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct EntityId {
    /// Concrete class of the entity.
    pub class: ClassId,
    /// Slot index within the class storage.
    pub slot: u32,
}

impl EntityId {
    /// Creates a new entity id.
    #[must_use]
    pub const fn new(class: ClassId, slot: u32) -> Self {
        Self { class, slot }
    }

    /// Tags this id as the child side of a relation.
    #[must_use]
    pub const fn as_child(self) -> ChildEntityId {
        ChildEntityId(self)
    }

    /// Tags this id as the parent side of a relation.
    #[must_use]
    pub const fn as_parent(self) -> ParentEntityId {
        ParentEntityId(self)
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}:{})", self.class.0, self.slot)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}:{})", self.class.0, self.slot)
    }
}

/// An [`EntityId`] playing the child role of a relation.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ChildEntityId(EntityId);

impl ChildEntityId {
    /// Returns the untagged entity id.
    #[must_use]
    pub const fn id(self) -> EntityId {
        self.0
    }

    /// Class of the child entity.
    #[must_use]
    pub const fn class(self) -> ClassId {
        self.0.class
    }

    /// Slot of the child entity.
    #[must_use]
    pub const fn slot(self) -> u32 {
        self.0.slot
    }
}

impl fmt::Debug for ChildEntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChildEntityId(id={:?})", self.0)
    }
}

/// An [`EntityId`] playing the parent role of a relation.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ParentEntityId(EntityId);

impl ParentEntityId {
    /// Returns the untagged entity id.
    #[must_use]
    pub const fn id(self) -> EntityId {
        self.0
    }

    /// Class of the parent entity.
    #[must_use]
    pub const fn class(self) -> ClassId {
        self.0.class
    }

    /// Slot of the parent entity.
    #[must_use]
    pub const fn slot(self) -> u32 {
        self.0.slot
    }
}

impl fmt::Debug for ParentEntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParentEntityId(id={:?})", self.0)
    }
}
