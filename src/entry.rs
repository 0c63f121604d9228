use crate::error::RegistryError;
use crate::token::TypeIdentity;
use std::any::Any;

/// Reported as the found type of a boxed value: a `dyn Any` has a `TypeId`
/// but no type name.
pub(crate) const UNNAMED_DYN_ANY: &str = "dyn Any (type name unavailable)";

/// A type-erased value together with the identity it was stored under
#[derive(Debug)]
pub(crate) struct Entry {
    ty: TypeIdentity,
    value: Box<dyn Any + Send + Sync>,
}

impl Entry {
    pub(crate) fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            ty: TypeIdentity::of::<T>(),
            value: Box::new(value),
        }
    }

    /// Wraps an already-boxed value, rejecting it if its runtime type is not `ty`
    pub(crate) fn from_boxed(
        ty: TypeIdentity,
        value: Box<dyn Any + Send + Sync>,
    ) -> Result<Self, RegistryError> {
        // Deref first: `Box<dyn Any>` is itself `Any`.
        let found_id = (*value).type_id();
        if found_id != ty.id() {
            tracing::warn!(
                expected = ty.name(),
                expected_id = ?ty.id(),
                found_id = ?found_id,
                "boxed value has a different TypeId than its key"
            );
            return Err(RegistryError::TypeMismatch {
                expected: ty.name(),
                found: UNNAMED_DYN_ANY,
            });
        }
        Ok(Self { ty, value })
    }

    pub(crate) fn type_identity(&self) -> TypeIdentity {
        self.ty
    }

    pub(crate) fn downcast_ref<T: Any>(&self) -> Result<&T, RegistryError> {
        let found = self.ty.name();
        self.value
            .downcast_ref::<T>()
            .ok_or_else(|| mismatch::<T>(found))
    }

    pub(crate) fn downcast_mut<T: Any>(&mut self) -> Result<&mut T, RegistryError> {
        let found = self.ty.name();
        self.value
            .downcast_mut::<T>()
            .ok_or_else(|| mismatch::<T>(found))
    }

    /// Moves the value out, handing the entry back untouched on mismatch
    pub(crate) fn into_inner<T: Any>(self) -> Result<T, Self> {
        let ty = self.ty;
        match self.value.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(value) => Err(Self { ty, value }),
        }
    }
}

pub(crate) fn mismatch<T: Any>(found: &'static str) -> RegistryError {
    let expected = std::any::type_name::<T>();
    tracing::warn!(expected, found, "type mismatch in registry entry");
    RegistryError::TypeMismatch { expected, found }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_records_identity() {
        let entry = Entry::new(42u16);
        assert!(entry.type_identity().is::<u16>());
        assert_eq!(entry.downcast_ref::<u16>(), Ok(&42));
    }

    #[test]
    fn test_wrong_downcast_is_mismatch() {
        let mut entry = Entry::new("text".to_string());
        assert!(matches!(
            entry.downcast_ref::<i32>(),
            Err(RegistryError::TypeMismatch { .. })
        ));
        assert!(matches!(
            entry.downcast_mut::<i32>(),
            Err(RegistryError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_into_inner_returns_entry_on_mismatch() {
        let entry = Entry::new(vec![1u8, 2, 3]);
        let entry = entry.into_inner::<Vec<i8>>().unwrap_err();
        assert_eq!(entry.into_inner::<Vec<u8>>().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_from_boxed_checks_eagerly() {
        let ok = Entry::from_boxed(TypeIdentity::of::<u8>(), Box::new(1u8));
        assert!(ok.is_ok());

        let err = Entry::from_boxed(TypeIdentity::of::<u8>(), Box::new(1u32)).unwrap_err();
        assert_eq!(
            err,
            RegistryError::TypeMismatch {
                expected: "u8",
                found: UNNAMED_DYN_ANY,
            }
        );
    }
}
