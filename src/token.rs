use std::any::{self, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// The erased identity of a type: its `TypeId`, plus its name for diagnostics.
///
/// Equality, ordering and hashing only look at the `TypeId`. Two types with
/// the same layout (`struct Meters(f64)` and `struct Feet(f64)`) have
/// different identities, and the name never takes part in a comparison.
#[derive(Clone, Copy)]
pub struct TypeIdentity {
    id: TypeId,
    name: &'static str,
}

impl TypeIdentity {
    /// Returns the identity of `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
        }
    }

    /// Returns the underlying `TypeId`
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The compiler-provided name of the type. Only meant for messages.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true if this identity denotes `T`
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeIdentity {}

impl PartialOrd for TypeIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for TypeIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeIdentity({})", self.name)
    }
}

impl fmt::Display for TypeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A first-class value naming the type `T`
///
/// Tokens are zero-sized and `Copy`, and are `Send + Sync` whatever `T` is.
/// Because they are built on `TypeId`, a token captures the full
/// parameterization of a generic type:
///
/// ```
/// use sovran_typeregistry::TypeToken;
///
/// let ints = TypeToken::<Vec<i32>>::new();
/// let strings = TypeToken::<Vec<String>>::new();
/// assert_ne!(ints.identity(), strings.identity());
/// ```
///
/// Only `'static` types have tokens. Types that differ only in a lifetime
/// parameter (`&'a str` vs `&'static str`) cannot be named at all, so they
/// cannot be confused with each other either.
pub struct TypeToken<T: ?Sized + 'static> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: ?Sized + 'static> TypeToken<T> {
    /// Creates the token for `T`
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// Returns the erased identity of `T`
    pub fn identity(&self) -> TypeIdentity {
        TypeIdentity::of::<T>()
    }

    /// Returns the compiler-provided name of `T`
    pub fn name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

// Manual impls: derives would wrongly demand the same traits from `T`.
impl<T: ?Sized + 'static> Clone for TypeToken<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized + 'static> Copy for TypeToken<T> {}

impl<T: ?Sized + 'static> Default for TypeToken<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> PartialEq for TypeToken<T> {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl<T: ?Sized + 'static> Eq for TypeToken<T> {}

impl<T: ?Sized + 'static> Hash for TypeToken<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        TypeId::of::<T>().hash(state);
    }
}

impl<T: ?Sized + 'static> fmt::Debug for TypeToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeToken<{}>", self.name())
    }
}

impl<T: ?Sized + 'static> From<TypeToken<T>> for TypeIdentity {
    fn from(token: TypeToken<T>) -> Self {
        token.identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    struct Meters(#[allow(dead_code)] f64);
    struct Feet(#[allow(dead_code)] f64);

    #[test]
    fn test_identity_is_by_type_not_layout() {
        assert_ne!(TypeIdentity::of::<Meters>(), TypeIdentity::of::<Feet>());
        assert_eq!(TypeIdentity::of::<Meters>(), TypeIdentity::of::<Meters>());
    }

    #[test]
    fn test_generic_parameters_are_distinguished() {
        let ints = TypeToken::<Vec<i32>>::new().identity();
        let strings = TypeToken::<Vec<String>>::new().identity();
        assert_ne!(ints, strings);
        assert!(ints.is::<Vec<i32>>());
        assert!(!ints.is::<Vec<String>>());
    }

    #[test]
    fn test_identity_hashes_consistently() {
        let mut seen = HashSet::new();
        assert!(seen.insert(TypeIdentity::of::<u32>()));
        assert!(seen.insert(TypeIdentity::of::<i32>()));
        assert!(!seen.insert(TypeIdentity::of::<u32>()));
    }

    #[test]
    fn test_token_is_zero_sized_and_copy() {
        let token = TypeToken::<String>::new();
        let copy = token;
        assert_eq!(std::mem::size_of::<TypeToken<String>>(), 0);
        assert_eq!(token, copy);
        assert_eq!(TypeIdentity::from(copy), TypeIdentity::of::<String>());
    }

    #[test]
    fn test_unsized_tokens() {
        let token = TypeToken::<dyn Fn() + Send>::new();
        assert!(token.name().contains("Fn"));
        assert_ne!(token.identity(), TypeIdentity::of::<str>());
    }

    #[test]
    fn test_display_uses_type_name() {
        assert_eq!(TypeIdentity::of::<u8>().to_string(), "u8");
        assert_eq!(format!("{:?}", TypeToken::<u8>::new()), "TypeToken<u8>");
    }
}
