//! # sovran-typeregistry
//!
//! A thread-safe registry that stores values of many unrelated types, keyed by
//! type identity and an optional discriminator.
//!
//! Where a plain type map holds at most one value per type, `TypeRegistry`
//! keys each entry by a `(type, discriminator)` pair. The unqualified key
//! names "the" value of a type; qualified keys let several values of the same
//! type live side by side under different names.
//!
//! ## Key Features
//!
//! - **Statically typed**: every typed operation takes a [`Key<T, Q>`], so the
//!   compiler checks that a value matches the key it is stored under
//! - **Identity, not layout**: `struct Meters(f64)` and `struct Feet(f64)`
//!   never collide, and `Vec<i32>` is a different key from `Vec<String>`
//! - **Absence is not an error**: lookups return `Ok(None)` for missing keys
//! - **Thread-safe**: built on `Arc<RwLock<_>>`; readers run concurrently,
//!   writers are exclusive
//! - **Dynamic insertion**: [`TypeRegistry::insert_boxed`] accepts type-erased
//!   values and checks their type before storing them
//!
//! ## Usage Examples
//!
//! ### Basic Usage
//!
//! ```rust
//! use sovran_typeregistry::{Key, TypeRegistry, RegistryError};
//!
//! fn main() -> Result<(), RegistryError> {
//!     let registry = TypeRegistry::<String>::new();
//!
//!     // One value per type
//!     registry.put(&Key::of(), 42i32)?;
//!     registry.put(&Key::of(), "Hello, world!".to_string())?;
//!
//!     // More values of the same type, told apart by name
//!     registry.put(&Key::named("nickname"), "Ace".to_string())?;
//!     registry.put(&Key::named("title"), "Captain".to_string())?;
//!
//!     assert_eq!(registry.get(&Key::<i32>::of())?, Some(42));
//!     assert_eq!(
//!         registry.get(&Key::<String>::named("title"))?,
//!         Some("Captain".to_string())
//!     );
//!
//!     // Missing keys are reported as absent
//!     assert_eq!(registry.get(&Key::<bool>::of())?, None);
//!
//!     // Each key's type is known again when walking the registry
//!     let strings = registry.keys_of::<String>()?.count();
//!     assert_eq!(strings, 3);
//!
//!     Ok(())
//! }
//! ```
//!
//! ### Sharing a Registry Between Components
//!
//! Registries are handed to the components that need them; cloning a
//! registry shares its storage.
//!
//! ```rust
//! use sovran_typeregistry::{Key, TypeRegistry, RegistryError};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Settings {
//!     verbose: bool,
//! }
//!
//! struct Reporter {
//!     registry: TypeRegistry,
//! }
//!
//! impl Reporter {
//!     fn is_verbose(&self) -> Result<bool, RegistryError> {
//!         let verbose = self.registry.with(&Key::<Settings>::of(), |s| s.verbose)?;
//!         Ok(verbose.unwrap_or(false))
//!     }
//! }
//!
//! let registry = TypeRegistry::<String>::new();
//! let reporter = Reporter { registry: registry.clone() };
//!
//! assert!(!reporter.is_verbose()?);
//! registry.put(&Key::of(), Settings { verbose: true })?;
//! assert!(reporter.is_verbose()?);
//! # Ok::<(), RegistryError>(())
//! ```
//!
//! ### Error Handling
//!
//! Typed operations can only fail on a poisoned lock. Type mismatches are
//! caught at compile time, except for [`TypeRegistry::insert_boxed`], which
//! rejects a mismatched value before storing it:
//!
//! ```rust
//! use sovran_typeregistry::{ErasedKey, TypeRegistry, RegistryError};
//!
//! let registry = TypeRegistry::<String>::new();
//!
//! match registry.insert_boxed(ErasedKey::of::<u32>(), Box::new("not a number")) {
//!     Ok(()) => println!("stored"),
//!     Err(RegistryError::TypeMismatch { expected, .. }) => println!("expected a {}", expected),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! assert!(registry.is_empty().unwrap());
//! ```

mod entry;
mod error;
mod key;
mod registry;
mod token;

pub use error::RegistryError;
pub use key::{ErasedKey, Key};
pub use registry::{Keys, TypeRegistry};
pub use token::{TypeIdentity, TypeToken};

// Re-export std::any for convenience
pub use std::any::{Any, TypeId};
