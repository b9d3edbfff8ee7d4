//! Connection registry, relation containers, and relation tables for Linkage.
//!
//! This crate provides:
//! - [`ConnectionId`] - Interned identity of a parent-child relation
//! - Dense containers ([`ImmutableOneToManyMap`], [`MutableOneToOneMap`], ...)
//!   for connections between two concrete classes
//! - Polymorphic containers ([`LinkedBidirectionalMap`], [`EntityBiMap`]) for
//!   connections declared on base classes
//! - [`RefsTable`] - Immutable snapshot of every relation
//! - [`MutableRefsTable`] - Copy-on-write edit session over a snapshot
//! - [`RefsRead`] - Queries shared by both table kinds

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod connection;
pub mod dense;
pub mod mutable;
pub mod polymorphic;
pub mod query;
pub mod table;

pub use config::{ConflictPolicy, RefsConfig};
pub use connection::{ConnectionId, ConnectionKind, same_class};
pub use dense::{
    ImmutableOneToManyMap, ImmutableOneToOneMap, MutableOneToManyMap, MutableOneToOneMap,
    OneToManyView, OneToOneView,
};
pub use mutable::{DenseEntry, MutableRefsTable};
pub use polymorphic::{EntityBiMap, Inverse, LinkedBidirectionalMap};
pub use query::RefsRead;
pub use table::RefsTable;
