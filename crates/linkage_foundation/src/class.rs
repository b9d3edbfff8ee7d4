//! Class registry and subtype queries.
//!
//! Entity classes are interned to small [`ClassId`]s. Polymorphic relations
//! are declared on a base class and match every class assignable to it, so
//! the registry also records the supertypes of each class.

use std::collections::HashMap;
use std::sync::Arc;

use crate::entity::ClassId;
use crate::error::{Error, ErrorKind, Result};

/// Subtype queries over entity classes.
///
/// Relation tables never encode the class hierarchy themselves; they ask an
/// implementation of this trait when matching polymorphic connections.
pub trait ClassHierarchy {
    /// Returns true if `derived` is `base` or one of its (transitive) subtypes.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownClass`] if either id was never registered.
    fn is_assignable_from(&self, base: ClassId, derived: ClassId) -> Result<bool>;
}

#[derive(Clone, Debug)]
struct ClassInfo {
    name: Arc<str>,
    supertypes: Vec<ClassId>,
}

/// Interner for entity classes.
///
/// Maps class names to unique ids and back, and keeps the direct supertypes
/// of each class. It is not thread-safe; use external synchronization if
/// needed.
#[derive(Clone, Debug, Default)]
pub struct ClassRegistry {
    classes: Vec<ClassInfo>,
    by_name: HashMap<Arc<str>, ClassId>,
}

impl ClassRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class with its direct supertypes.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already registered or a supertype is
    /// unknown.
    ///
    /// # Panics
    ///
    /// Panics if the number of registered classes exceeds `u32::MAX`.
    pub fn register(&mut self, name: &str, supertypes: &[ClassId]) -> Result<ClassId> {
        if self.by_name.contains_key(name) {
            return Err(Error::new(ErrorKind::DuplicateClass(name.to_string())));
        }
        for &supertype in supertypes {
            self.info(supertype)?;
        }

        let id = ClassId(u32::try_from(self.classes.len()).expect("too many classes"));
        let name: Arc<str> = name.into();
        self.classes.push(ClassInfo {
            name: name.clone(),
            supertypes: supertypes.to_vec(),
        });
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Looks up a class by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<ClassId> {
        self.by_name.get(name).copied()
    }

    /// Gets the name of a class.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownClass`] if the id was never registered.
    pub fn name(&self, id: ClassId) -> Result<&str> {
        self.info(id).map(|info| info.name.as_ref())
    }

    /// Gets the direct supertypes of a class.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownClass`] if the id was never registered.
    pub fn supertypes(&self, id: ClassId) -> Result<&[ClassId]> {
        self.info(id).map(|info| info.supertypes.as_slice())
    }

    /// Returns the number of registered classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if no class is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    fn info(&self, id: ClassId) -> Result<&ClassInfo> {
        self.classes
            .get(id.0 as usize)
            .ok_or_else(|| Error::unknown_class(id))
    }
}

impl ClassHierarchy for ClassRegistry {
    fn is_assignable_from(&self, base: ClassId, derived: ClassId) -> Result<bool> {
        self.info(base)?;
        // Supertype graphs are small; a plain DFS beats caching here.
        let mut pending = vec![derived];
        let mut seen = Vec::new();
        while let Some(class) = pending.pop() {
            if class == base {
                return Ok(true);
            }
            if seen.contains(&class) {
                continue;
            }
            seen.push(class);
            pending.extend_from_slice(self.supertypes(class)?);
        }
        Ok(false)
    }
}
