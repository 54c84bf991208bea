use schemasync_types::RecordKind;

/// Common surface of desired-state documents.
///
/// Implemented by the three document kinds. The reconciler uses it to name
/// documents in reports and to reject malformed input before touching the
/// store.
pub trait Definition {
    /// The record kind this document reconciles into.
    const KIND: RecordKind;

    /// The stable identity key (namespace URI or label).
    fn identity(&self) -> &str;

    /// Structural validation. Return every problem found, not just the first.
    fn validate(&self) -> Result<(), Vec<String>> {
        Ok(())
    }
}

/// Checks an identity key. Keys are matched exactly, so surrounding
/// whitespace would make a document miss the record it names.
pub(crate) fn check_identity(name: &str, value: &str, errors: &mut Vec<String>) {
    if value.trim().is_empty() {
        errors.push(format!("{name} is required"));
    } else if value.trim() != value {
        errors.push(format!("{name} may not start or end with whitespace: {value:?}"));
    }
}
