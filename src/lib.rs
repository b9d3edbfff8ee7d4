//! Linkage - Copy-on-write bidirectional relation index
//!
//! This crate re-exports all layers of the Linkage system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 1: linkage_storage    - Connection registry, relation containers, tables
//! Layer 0: linkage_foundation - Core types (EntityId, ClassId, Error)
//! ```

pub use linkage_foundation as foundation;
pub use linkage_storage as storage;
