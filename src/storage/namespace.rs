use crate::contracts::SequenceError;

/// Longest namespace accepted, in bytes.
pub const MAX_NAMESPACE_LEN: usize = 255;

/// Separator used in store keys; not allowed inside a namespace.
pub(crate) const KEY_SEPARATOR: char = ':';

/// Validates a namespace before it reaches the store.
pub fn validate_namespace(namespace: &str) -> Result<(), SequenceError> {
    if namespace.is_empty() {
        return Err(SequenceError::InvalidNamespace(
            "namespace must not be empty".into(),
        ));
    }
    if namespace.len() > MAX_NAMESPACE_LEN {
        return Err(SequenceError::InvalidNamespace(format!(
            "namespace is {} bytes, limit is {}",
            namespace.len(),
            MAX_NAMESPACE_LEN
        )));
    }
    if namespace.contains(KEY_SEPARATOR) {
        return Err(SequenceError::InvalidNamespace(format!(
            "namespace {:?} contains '{}'",
            namespace, KEY_SEPARATOR
        )));
    }
    if namespace.chars().any(|c| c.is_ascii_control()) {
        return Err(SequenceError::InvalidNamespace(format!(
            "namespace {:?} contains control characters",
            namespace
        )));
    }
    Ok(())
}
