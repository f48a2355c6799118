use crate::contracts::error::SequenceError;

/// Generates integer ids per namespace.
///
/// # Invariants
/// - No two successful calls return the same value for the same namespace
/// - Values for a namespace strictly increase in store-write order
/// - Namespaces never influence each other
pub trait SequenceGenerator: Send + Sync {
    /// Returns the next unused value for `namespace`.
    /// `initial_value` seeds the counter only when the namespace has no record yet,
    /// so the first call returns `initial_value + 1`.
    fn next_value(&self, namespace: &str, initial_value: u64) -> Result<u64, SequenceError>;

    /// Returns the last value handed out for `namespace` without incrementing.
    fn current_value(&self, namespace: &str) -> Result<Option<u64>, SequenceError>;
}
