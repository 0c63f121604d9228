/// Errors that can occur when using a `TypeRegistry`
///
/// A missing entry is not an error: lookups report absence as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Failed to acquire the lock on the registry (a writer panicked while holding it)
    #[error("Failed to acquire lock")]
    LockError,
    /// A value's runtime type does not match the type its key names
    ///
    /// Typed operations make this unreachable: the key's type parameter and the
    /// value's type are checked by the compiler. It is produced by
    /// `insert_boxed`, which takes type-erased values, and is kept on the
    /// typed read paths so a corrupted entry is reported instead of being
    /// passed off as absent.
    #[error("Type mismatch for the requested key: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}
