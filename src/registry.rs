use crate::entry::{mismatch, Entry};
use crate::error::RegistryError;
use crate::key::{ErasedKey, Key};
use std::any::Any;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::iter::FusedIterator;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};

type Slots<Q> = HashMap<ErasedKey<Q>, Entry>;

/// A thread-safe heterogeneous registry keyed by type identity
///
/// Every entry is stored under a `(type, discriminator)` pair, and every
/// typed operation takes a [`Key<T, Q>`], so the compiler checks that the
/// value put under a key has the key's type. Values of unrelated types live
/// side by side; at most one value exists per key and a later `put` replaces
/// the earlier one.
///
/// The registry synchronizes internally with a read-write lock: lookups may
/// run concurrently, writes are exclusive. Cloning a registry yields another
/// handle onto the same storage, which is how one registry is shared between
/// the components that were given it.
///
/// # Examples
///
/// ```
/// use sovran_typeregistry::{Key, TypeRegistry, RegistryError};
///
/// let registry = TypeRegistry::<String>::new();
///
/// registry.put(&Key::of(), "hello".to_string())?;
/// registry.put(&Key::of(), 42i32)?;
/// registry.put(&Key::of(), "hello2".to_string())?;
///
/// assert_eq!(registry.get(&Key::<String>::of())?, Some("hello2".to_string()));
/// assert_eq!(registry.get(&Key::<i32>::of())?, Some(42));
/// assert_eq!(registry.keys()?.count(), 2);
/// # Ok::<(), RegistryError>(())
/// ```
#[derive(Clone, Debug)]
pub struct TypeRegistry<Q = String>
where
    Q: Clone + Eq + Hash + Debug,
{
    entries: Arc<RwLock<Slots<Q>>>,
}

impl<Q> TypeRegistry<Q>
where
    Q: Clone + Eq + Hash + Debug,
{
    /// Creates a new, empty registry
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates an empty registry with room for `capacity` entries
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::with_capacity(capacity))),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Slots<Q>>, RegistryError> {
        self.entries.read().map_err(|_| RegistryError::LockError)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Slots<Q>>, RegistryError> {
        self.entries.write().map_err(|_| RegistryError::LockError)
    }

    /// Stores `value` under `key`, discarding any previous value
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockError` if the internal lock cannot be acquired.
    pub fn put<T>(&self, key: &Key<T, Q>, value: T) -> Result<(), RegistryError>
    where
        T: Any + Send + Sync,
    {
        let erased = key.erase();
        let mut store = self.write()?;
        let replaced = store.insert(erased, Entry::new(value)).is_some();
        trace!(key = ?key, replaced, "put registry entry");
        Ok(())
    }

    /// Stores the value produced by `f` under `key`
    ///
    /// `f` runs before the lock is taken, so it may itself read the registry.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockError` if the internal lock cannot be acquired.
    pub fn set_with<T, F>(&self, key: &Key<T, Q>, f: F) -> Result<(), RegistryError>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        let value = f();
        self.put(key, value)
    }

    /// Stores a type-erased value under `key`
    ///
    /// The value's runtime type is checked against the key's type before
    /// anything is stored, so a mismatched pair never reaches the registry.
    ///
    /// # Errors
    ///
    /// - Returns `RegistryError::TypeMismatch` if `value` is not of the key's type
    /// - Returns `RegistryError::LockError` if the internal lock cannot be acquired
    pub fn insert_boxed(
        &self,
        key: ErasedKey<Q>,
        value: Box<dyn Any + Send + Sync>,
    ) -> Result<(), RegistryError> {
        let entry = Entry::from_boxed(key.type_identity(), value).inspect_err(|_| {
            debug!(key = ?key, "rejected boxed value of the wrong type");
        })?;
        let mut store = self.write()?;
        let replaced = store.insert(key, entry).is_some();
        trace!(replaced, "put boxed registry entry");
        Ok(())
    }

    /// Retrieves a clone of the value stored under `key`
    ///
    /// Returns `Ok(None)` when nothing is stored under `key`.
    ///
    /// # Errors
    ///
    /// - Returns `RegistryError::LockError` if the internal lock cannot be acquired
    /// - Returns `RegistryError::TypeMismatch` if the stored entry is not a `T`.
    ///   Typed `put` rules this out; it is reported rather than treated as absent.
    pub fn get<T>(&self, key: &Key<T, Q>) -> Result<Option<T>, RegistryError>
    where
        T: Any + Clone,
    {
        self.with(key, T::clone)
    }

    /// Runs `f` with a shared reference to the value stored under `key`
    ///
    /// The reference cannot escape the closure, so it can never outlive a
    /// later removal. Returns `Ok(None)` without calling `f` when the key is
    /// absent.
    ///
    /// The read lock is held while `f` runs, so `f` must not touch the
    /// registry.
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_typeregistry::{Key, TypeRegistry, RegistryError};
    ///
    /// let registry = TypeRegistry::<String>::new();
    /// let numbers = Key::<Vec<i32>>::named("numbers");
    /// registry.put(&numbers, vec![1, 2, 3])?;
    ///
    /// let sum = registry.with(&numbers, |v| v.iter().sum::<i32>())?;
    /// assert_eq!(sum, Some(6));
    /// # Ok::<(), RegistryError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Same as [`TypeRegistry::get`].
    pub fn with<T, F, R>(&self, key: &Key<T, Q>, f: F) -> Result<Option<R>, RegistryError>
    where
        T: Any,
        F: FnOnce(&T) -> R,
    {
        let erased = key.erase();
        let store = self.read()?;
        match store.get(&erased) {
            Some(entry) => Ok(Some(f(entry.downcast_ref::<T>()?))),
            None => Ok(None),
        }
    }

    /// Runs `f` with a mutable reference to the value stored under `key`
    ///
    /// The write lock is held while `f` runs, so `f` must not touch the
    /// registry. If `f` panics the lock is poisoned and every later call on
    /// this registry, and on its clones, returns `RegistryError::LockError`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sovran_typeregistry::{Key, TypeRegistry, RegistryError};
    ///
    /// let registry = TypeRegistry::<String>::new();
    /// let visits = Key::<u64>::named("visits");
    /// registry.put(&visits, 0)?;
    ///
    /// registry.with_mut(&visits, |n| *n += 1)?;
    /// assert_eq!(registry.get(&visits)?, Some(1));
    /// # Ok::<(), RegistryError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// - Returns `RegistryError::LockError` if the internal lock cannot be
    ///   acquired, including after an earlier `with_mut` closure panicked
    /// - Returns `RegistryError::TypeMismatch` if the stored entry is not a `T`
    pub fn with_mut<T, F, R>(&self, key: &Key<T, Q>, f: F) -> Result<Option<R>, RegistryError>
    where
        T: Any,
        F: FnOnce(&mut T) -> R,
    {
        let erased = key.erase();
        let mut store = self.write()?;
        match store.get_mut(&erased) {
            Some(entry) => Ok(Some(f(entry.downcast_mut::<T>()?))),
            None => Ok(None),
        }
    }

    /// Returns a clone of the value under `key`, storing `f()` there first if absent
    ///
    /// `f` runs with no lock held, so it may itself read or write the
    /// registry. When two callers race on an absent key both may run their
    /// initializer, but only the first insert is kept and both see that value.
    ///
    /// # Errors
    ///
    /// Same as [`TypeRegistry::get`].
    pub fn get_or_insert_with<T, F>(&self, key: &Key<T, Q>, f: F) -> Result<T, RegistryError>
    where
        T: Any + Send + Sync + Clone,
        F: FnOnce() -> T,
    {
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }

        let value = f();
        let erased = key.erase();
        let mut store = self.write()?;
        let entry = store.entry(erased).or_insert_with(|| {
            trace!(key = ?key, "initializing registry entry");
            Entry::new(value)
        });
        entry.downcast_ref::<T>().cloned()
    }

    /// Removes the value stored under `key` and returns it
    ///
    /// Returns `Ok(None)` and leaves the registry unchanged when the key is absent.
    ///
    /// # Errors
    ///
    /// - Returns `RegistryError::LockError` if the internal lock cannot be acquired
    /// - Returns `RegistryError::TypeMismatch` if the stored entry is not a `T`;
    ///   the entry is left in place.
    pub fn remove<T>(&self, key: &Key<T, Q>) -> Result<Option<T>, RegistryError>
    where
        T: Any,
    {
        let erased = key.erase();
        let mut store = self.write()?;
        let Some(entry) = store.remove(&erased) else {
            return Ok(None);
        };
        match entry.into_inner::<T>() {
            Ok(value) => {
                trace!(key = ?key, "removed registry entry");
                Ok(Some(value))
            }
            Err(entry) => {
                let found = entry.type_identity().name();
                store.insert(erased, entry);
                Err(mismatch::<T>(found))
            }
        }
    }

    /// Removes whatever is stored under `key`
    ///
    /// Returns `Ok(true)` if the key was present and removed, `Ok(false)` if not present.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockError` if the internal lock cannot be acquired.
    pub fn remove_key(&self, key: &ErasedKey<Q>) -> Result<bool, RegistryError> {
        let mut store = self.write()?;
        let removed = store.remove(key).is_some();
        if removed {
            trace!(key = ?key, "removed registry entry");
        }
        Ok(removed)
    }

    /// Returns true if a value is stored under `key`
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockError` if the internal lock cannot be acquired.
    pub fn contains<T>(&self, key: &Key<T, Q>) -> Result<bool, RegistryError>
    where
        T: Any,
    {
        self.contains_key(&key.erase())
    }

    /// Returns true if a value is stored under the erased `key`
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockError` if the internal lock cannot be acquired.
    pub fn contains_key(&self, key: &ErasedKey<Q>) -> Result<bool, RegistryError> {
        let store = self.read()?;
        Ok(store.contains_key(key))
    }

    /// Returns every key currently stored
    ///
    /// The keys are copied out under the read lock, so the iterator is a
    /// snapshot: it holds no lock, later writes do not show up in it, and
    /// each call starts a fresh one. Iteration order is unspecified.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockError` if the internal lock cannot be acquired.
    pub fn keys(&self) -> Result<Keys<Q>, RegistryError> {
        let store = self.read()?;
        Ok(Keys::new(store.keys().cloned().collect()))
    }

    /// Returns a snapshot of the keys whose type is `T`
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockError` if the internal lock cannot be acquired.
    pub fn keys_of<T: Any>(&self) -> Result<Keys<Q>, RegistryError> {
        let store = self.read()?;
        Ok(Keys::new(
            store.keys().filter(|key| key.is::<T>()).cloned().collect(),
        ))
    }

    /// Returns the number of entries in the registry
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockError` if the internal lock cannot be acquired.
    pub fn len(&self) -> Result<usize, RegistryError> {
        let store = self.read()?;
        Ok(store.len())
    }

    /// Returns true if the registry contains no entries
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockError` if the internal lock cannot be acquired.
    pub fn is_empty(&self) -> Result<bool, RegistryError> {
        let store = self.read()?;
        Ok(store.is_empty())
    }

    /// Drops every entry
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::LockError` if the internal lock cannot be acquired.
    pub fn clear(&self) -> Result<(), RegistryError> {
        let mut store = self.write()?;
        let dropped = store.len();
        store.clear();
        debug!(dropped, "cleared registry");
        Ok(())
    }
}

impl<Q> Default for TypeRegistry<Q>
where
    Q: Clone + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of registry keys, returned by [`TypeRegistry::keys`]
#[derive(Clone, Debug)]
pub struct Keys<Q> {
    inner: std::vec::IntoIter<ErasedKey<Q>>,
}

impl<Q> Keys<Q> {
    fn new(keys: Vec<ErasedKey<Q>>) -> Self {
        Self {
            inner: keys.into_iter(),
        }
    }
}

impl<Q> Iterator for Keys<Q> {
    type Item = ErasedKey<Q>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<Q> ExactSizeIterator for Keys<Q> {}

impl<Q> FusedIterator for Keys<Q> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TypeIdentity;

    #[test]
    fn test_put_get_round_trip() -> Result<(), RegistryError> {
        let registry = TypeRegistry::<String>::new();
        registry.put(&Key::of(), 42i32)?;
        assert_eq!(registry.get(&Key::<i32>::of())?, Some(42));
        Ok(())
    }

    #[test]
    fn test_remove_after_put() -> Result<(), RegistryError> {
        let registry = TypeRegistry::<String>::new();
        let key = Key::<String>::named("greeting");
        registry.put(&key, "hi".to_string())?;

        assert_eq!(registry.remove(&key)?, Some("hi".to_string()));
        assert_eq!(registry.get(&key)?, None);
        assert_eq!(registry.remove(&key)?, None);
        Ok(())
    }

    #[test]
    fn test_boxed_insert_is_typed_afterwards() -> Result<(), RegistryError> {
        let registry = TypeRegistry::<String>::new();
        registry.insert_boxed(ErasedKey::of::<u32>(), Box::new(7u32))?;
        assert_eq!(registry.get(&Key::<u32>::of())?, Some(7));
        Ok(())
    }

    #[test]
    fn test_boxed_insert_rejects_mismatch_without_storing() -> Result<(), RegistryError> {
        let registry = TypeRegistry::<String>::new();
        let result = registry.insert_boxed(ErasedKey::of::<u32>(), Box::new(7i64));

        assert!(matches!(result, Err(RegistryError::TypeMismatch { .. })));
        assert!(registry.is_empty()?);
        Ok(())
    }

    // Plants an entry whose identity disagrees with its key, which no public
    // operation can do, to check the read paths report it.
    fn corrupted() -> TypeRegistry<String> {
        let registry = TypeRegistry::<String>::new();
        registry
            .entries
            .write()
            .unwrap()
            .insert(ErasedKey::new(TypeIdentity::of::<u32>(), None), Entry::new("oops"));
        registry
    }

    #[test]
    fn test_corrupted_entry_surfaces_as_mismatch() {
        let registry = corrupted();
        let key = Key::<u32>::of();

        assert!(matches!(
            registry.get(&key),
            Err(RegistryError::TypeMismatch { .. })
        ));
        assert!(matches!(
            registry.with_mut(&key, |n| *n += 1),
            Err(RegistryError::TypeMismatch { .. })
        ));
        assert!(registry.contains(&key).unwrap());
    }

    #[test]
    fn test_remove_mismatch_keeps_entry() {
        let registry = corrupted();
        let key = Key::<u32>::of();

        let err = registry.remove(&key).unwrap_err();
        assert_eq!(
            err,
            RegistryError::TypeMismatch {
                expected: "u32",
                found: "&str",
            }
        );
        assert_eq!(registry.len().unwrap(), 1);
    }

    #[test]
    fn test_poisoned_lock_is_lock_error() {
        let registry = TypeRegistry::<String>::new();
        let handle = registry.clone();
        let _ = std::thread::spawn(move || {
            let _guard = handle.entries.write().unwrap();
            panic!("poison the registry lock");
        })
        .join();

        assert_eq!(registry.len(), Err(RegistryError::LockError));
        assert_eq!(
            registry.put(&Key::of(), 1u8),
            Err(RegistryError::LockError)
        );
    }

    #[test]
    fn test_boxed_mismatch_reports_expected_name_only() {
        let registry = TypeRegistry::<String>::new();
        let err = registry
            .insert_boxed(ErasedKey::of::<u32>(), Box::new("seven"))
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::TypeMismatch {
                expected: "u32",
                found: crate::entry::UNNAMED_DYN_ANY,
            }
        );
    }

    #[test]
    fn test_keys_size_hint_is_exact() -> Result<(), RegistryError> {
        let registry = TypeRegistry::<String>::with_capacity(4);
        registry.put(&Key::of(), 1u8)?;
        registry.put(&Key::named("a"), 2u8)?;

        let mut keys = registry.keys()?;
        assert_eq!(keys.len(), 2);
        keys.next();
        assert_eq!(keys.len(), 1);
        Ok(())
    }
}
