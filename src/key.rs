use crate::token::{TypeIdentity, TypeToken};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A typed key: a `TypeToken<T>` plus an optional discriminator
///
/// `Key::of()` names "the" value of type `T`. `Key::named(q)` names one of
/// several values of type `T`, told apart by `q`. The unqualified key and
/// every qualified key are distinct slots.
///
/// # Examples
///
/// ```
/// use sovran_typeregistry::{Key, TypeRegistry, RegistryError};
///
/// let registry = TypeRegistry::<String>::new();
/// let nickname = Key::<String>::named("nickname");
/// let title = Key::<String>::named("title");
///
/// registry.put(&nickname, "Ace".to_string())?;
/// registry.put(&title, "Captain".to_string())?;
///
/// assert_eq!(registry.get(&nickname)?, Some("Ace".to_string()));
/// assert_eq!(registry.get(&Key::<String>::of())?, None);
/// # Ok::<(), RegistryError>(())
/// ```
pub struct Key<T: 'static, Q = String> {
    token: TypeToken<T>,
    discriminator: Option<Q>,
}

impl<T: 'static, Q> Key<T, Q> {
    /// The unqualified key for `T`
    pub const fn of() -> Self {
        Self {
            token: TypeToken::new(),
            discriminator: None,
        }
    }

    /// A key for `T` qualified by `discriminator`
    pub fn named(discriminator: impl Into<Q>) -> Self {
        Self {
            token: TypeToken::new(),
            discriminator: Some(discriminator.into()),
        }
    }

    /// Returns the token naming `T`
    pub fn token(&self) -> TypeToken<T> {
        self.token
    }

    /// Returns the discriminator, or `None` for the unqualified key
    pub fn discriminator(&self) -> Option<&Q> {
        self.discriminator.as_ref()
    }

    /// Returns true if this key carries a discriminator
    pub fn is_qualified(&self) -> bool {
        self.discriminator.is_some()
    }
}

impl<T: 'static, Q: Clone> Key<T, Q> {
    /// Drops the static type, keeping its identity
    pub fn erase(&self) -> ErasedKey<Q> {
        ErasedKey {
            ty: self.token.identity(),
            discriminator: self.discriminator.clone(),
        }
    }
}

impl<T: 'static> TypeToken<T> {
    /// The unqualified key for this token's type
    pub fn key<Q>(self) -> Key<T, Q> {
        Key {
            token: self,
            discriminator: None,
        }
    }

    /// A key for this token's type qualified by `discriminator`
    pub fn qualified<Q>(self, discriminator: impl Into<Q>) -> Key<T, Q> {
        Key {
            token: self,
            discriminator: Some(discriminator.into()),
        }
    }
}

impl<T: 'static, Q> From<TypeToken<T>> for Key<T, Q> {
    fn from(token: TypeToken<T>) -> Self {
        token.key()
    }
}

impl<T: 'static, Q> Default for Key<T, Q> {
    fn default() -> Self {
        Self::of()
    }
}

impl<T: 'static, Q: Clone> Clone for Key<T, Q> {
    fn clone(&self) -> Self {
        Self {
            token: self.token,
            discriminator: self.discriminator.clone(),
        }
    }
}

impl<T: 'static, Q: PartialEq> PartialEq for Key<T, Q> {
    fn eq(&self, other: &Self) -> bool {
        self.discriminator == other.discriminator
    }
}

impl<T: 'static, Q: Eq> Eq for Key<T, Q> {}

impl<T: 'static, Q: Hash> Hash for Key<T, Q> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.token.hash(state);
        self.discriminator.hash(state);
    }
}

impl<T: 'static, Q: fmt::Debug> fmt::Debug for Key<T, Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("type", &self.token.name())
            .field("discriminator", &self.discriminator)
            .finish()
    }
}

/// A key whose type is only known at runtime
///
/// This is what the registry stores entries under and what `keys()` yields.
/// It compares by type identity and discriminator.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct ErasedKey<Q = String> {
    ty: TypeIdentity,
    discriminator: Option<Q>,
}

impl<Q> ErasedKey<Q> {
    /// Creates an erased key from a type identity and optional discriminator
    pub fn new(ty: TypeIdentity, discriminator: Option<Q>) -> Self {
        Self { ty, discriminator }
    }

    /// The unqualified erased key for `T`
    pub fn of<T: 'static>() -> Self {
        Self::new(TypeIdentity::of::<T>(), None)
    }

    /// Returns the identity of the key's type
    pub fn type_identity(&self) -> TypeIdentity {
        self.ty
    }

    /// Returns the discriminator, or `None` for an unqualified key
    pub fn discriminator(&self) -> Option<&Q> {
        self.discriminator.as_ref()
    }

    /// Returns true if this key carries a discriminator
    pub fn is_qualified(&self) -> bool {
        self.discriminator.is_some()
    }

    /// Returns true if this key's type is `T`
    pub fn is<T: 'static>(&self) -> bool {
        self.ty.is::<T>()
    }

    /// Recovers the typed key if this key's type is `T`
    pub fn downcast<T: 'static>(self) -> Option<Key<T, Q>> {
        if !self.is::<T>() {
            return None;
        }
        Some(Key {
            token: TypeToken::new(),
            discriminator: self.discriminator,
        })
    }
}

impl<T: 'static, Q: Clone> From<&Key<T, Q>> for ErasedKey<Q> {
    fn from(key: &Key<T, Q>) -> Self {
        key.erase()
    }
}

impl<T: 'static, Q> From<Key<T, Q>> for ErasedKey<Q> {
    fn from(key: Key<T, Q>) -> Self {
        Self::new(key.token.identity(), key.discriminator)
    }
}

impl<Q: fmt::Display> fmt::Display for ErasedKey<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.discriminator {
            Some(q) => write!(f, "{}[{}]", self.ty, q),
            None => write!(f, "{}", self.ty),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unqualified_and_qualified_keys_differ() {
        let plain = Key::<String>::of().erase();
        let named = Key::<String>::named("nickname").erase();
        assert_ne!(plain, named);
        assert!(!plain.is_qualified());
        assert_eq!(named.discriminator().map(String::as_str), Some("nickname"));
    }

    #[test]
    fn test_same_discriminator_different_types_differ() {
        let a = Key::<String>::named("x").erase();
        let b = Key::<i32>::named("x").erase();
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_builders_match_key_constructors() {
        let token = TypeToken::<u64>::new();
        assert_eq!(token.key::<String>(), Key::<u64>::of());
        assert_eq!(token.qualified::<String>("id"), Key::<u64>::named("id"));
        assert_eq!(Key::<u64, String>::from(token), Key::default());
    }

    #[test]
    fn test_downcast_round_trips_type() {
        let erased = ErasedKey::from(Key::<Vec<u8>, u32>::named(7u32));
        assert!(erased.clone().downcast::<Vec<i8>>().is_none());
        let typed = erased.downcast::<Vec<u8>>().unwrap();
        assert_eq!(typed.discriminator(), Some(&7));
    }

    #[test]
    fn test_display() {
        assert_eq!(ErasedKey::<String>::of::<u8>().to_string(), "u8");
        let named: ErasedKey<String> = Key::<u8>::named("small").into();
        assert_eq!(named.to_string(), "u8[small]");
    }

    #[test]
    fn test_custom_discriminator_type() {
        #[derive(Clone, PartialEq, Eq, Hash, Debug)]
        enum Slot {
            Primary,
            Fallback,
        }

        let primary = Key::<i32, Slot>::named(Slot::Primary);
        let fallback = Key::<i32, Slot>::named(Slot::Fallback);
        assert_ne!(primary.erase(), fallback.erase());
        assert_eq!(primary.discriminator(), Some(&Slot::Primary));
    }
}
