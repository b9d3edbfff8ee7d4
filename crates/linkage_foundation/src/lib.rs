//! Core identifier and error types for Linkage.
//!
//! This crate provides:
//! - [`EntityId`] - Class + slot entity identity, with [`ChildEntityId`] and
//!   [`ParentEntityId`] role wrappers
//! - [`ClassRegistry`] - Class interning and subtype queries via [`ClassHierarchy`]
//! - [`Error`] - Rich error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod class;
pub mod entity;
pub mod error;

pub use class::{ClassHierarchy, ClassRegistry};
pub use entity::{ChildEntityId, ClassId, EntityId, ParentEntityId};
pub use error::{Error, ErrorContext, ErrorKind, Result};
