//! Error types for the Linkage system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.

use std::fmt;

use thiserror::Error;

use crate::entity::{ChildEntityId, ClassId, ParentEntityId};

/// The main error type for Linkage operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an unknown class error.
    #[must_use]
    pub fn unknown_class(class: ClassId) -> Self {
        Self::new(ErrorKind::UnknownClass(class))
    }

    /// Creates a duplicate children error.
    #[must_use]
    pub fn duplicate_children(parent: ParentEntityId, children: Vec<ChildEntityId>) -> Self {
        Self::new(ErrorKind::DuplicateChildren { parent, children })
    }

    /// Creates an error for a one-to-one connection given several children.
    #[must_use]
    pub fn too_many_children(connection: impl Into<String>, count: usize) -> Self {
        Self::new(ErrorKind::TooManyChildren {
            connection: connection.into(),
            count,
        })
    }

    /// Creates a one-to-one violation error for the rejected edge.
    #[must_use]
    pub fn one_to_one_violation(child: impl fmt::Debug, parent: impl fmt::Debug) -> Self {
        Self::new(ErrorKind::OneToOneViolation {
            child: format!("{child:?}"),
            parent: format!("{parent:?}"),
        })
    }

    /// Creates a conflicting reference error.
    #[must_use]
    pub fn conflicting_reference(connection: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConflictingReference {
            connection: connection.into(),
        })
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A class id that was never registered.
    #[error("unknown class: {0:?}")]
    UnknownClass(ClassId),

    /// A class name registered twice.
    #[error("class already registered: {0}")]
    DuplicateClass(String),

    /// Replacement children of a parent contain the same child twice.
    #[error("children have duplicates: {children:?} for {parent:?}")]
    DuplicateChildren {
        /// The parent whose children were being replaced.
        parent: ParentEntityId,
        /// The offending child list.
        children: Vec<ChildEntityId>,
    },

    /// More than one child supplied for a one-to-one connection.
    #[error("trying to add {count} children to one-to-one connection {connection}")]
    TooManyChildren {
        /// Description of the connection.
        connection: String,
        /// Number of children supplied.
        count: usize,
    },

    /// A strict one-to-one insert hit an existing binding.
    #[error("one-to-one violation: {child} or {parent} already bound")]
    OneToOneViolation {
        /// Child key of the rejected edge.
        child: String,
        /// Parent value of the rejected edge.
        parent: String,
    },

    /// Two containers claimed the same connection during an aggregation query.
    #[error("conflicting references for connection {connection}")]
    ConflictingReference {
        /// Description of the connection.
        connection: String,
    },
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Operation that failed, e.g. `replace_children_of_parent`.
    pub operation: Option<String>,
    /// Connection the operation was applied to.
    pub connection: Option<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the failing operation.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Sets the connection being edited.
    #[must_use]
    pub fn with_connection(mut self, connection: impl fmt::Display) -> Self {
        self.connection = Some(connection.to_string());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(operation) = &self.operation {
            write!(f, "in {operation}")?;
        }
        if let Some(connection) = &self.connection {
            if self.operation.is_some() {
                write!(f, " ")?;
            }
            write!(f, "on {connection}")?;
        }
        Ok(())
    }
}

/// Result type alias using the Linkage error type.
pub type Result<T> = std::result::Result<T, Error>;
