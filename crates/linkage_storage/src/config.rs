//! Configuration for relation tables.

/// What aggregation queries do when two containers claim the same connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// Log the conflict at `error` level and keep the first match.
    #[default]
    Log,
    /// Fail the query with `ErrorKind::ConflictingReference`.
    Fail,
}

/// Configuration for relation tables.
///
/// Carried by every table; a mutable table inherits the configuration of
/// the snapshot it was built from and hands it on when frozen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RefsConfig {
    /// Handling of conflicting references in aggregation queries.
    pub on_conflict: ConflictPolicy,
}

impl RefsConfig {
    /// Creates a configuration that fails queries on conflicting references.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            on_conflict: ConflictPolicy::Fail,
        }
    }

    /// Builder method to set the conflict policy.
    #[must_use]
    pub fn with_on_conflict(mut self, policy: ConflictPolicy) -> Self {
        self.on_conflict = policy;
        self
    }
}
