//! # Run-scoped shared context.
//!
//! [`Context`] is the mapping every task body of one run reads and writes to
//! exchange data. It is a cheap handle: clones point at the same map, which is
//! how nested subtask lists share their parent's context.
//!
//! ## Rules
//! - Values are stored as `Arc<dyn Any + Send + Sync>` and read back by type.
//! - Concurrent writers to the same key race; last write wins.
//! - The lock is held only for the duration of a single call.
//!
//! ## Example
//! ```rust
//! use taskline::Context;
//!
//! let ctx = Context::new();
//! ctx.insert("version", String::from("1.2.3"));
//! assert_eq!(ctx.get::<String>("version").as_deref(), Some("1.2.3"));
//! assert_eq!(ctx.get::<u32>("version"), None); // wrong type
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

type Value = Arc<dyn Any + Send + Sync>;

/// Shared, type-erased key/value map passed to every task of a run.
#[derive(Clone, Default)]
pub struct Context {
    values: Arc<Mutex<HashMap<String, Value>>>,
}

impl Context {
    /// Creates a new empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn insert<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) {
        self.values.lock().insert(key.into(), Arc::new(value));
    }

    /// Returns a clone of the value under `key` if it exists and has type `T`.
    pub fn get<T: Any + Send + Sync + Clone>(&self, key: &str) -> Option<T> {
        self.get_arc::<T>(key).map(|v| T::clone(&v))
    }

    /// Returns the shared value under `key` if it exists and has type `T`.
    pub fn get_arc<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        let value = self.values.lock().get(key).cloned()?;
        value.downcast::<T>().ok()
    }

    /// Removes `key`; returns `true` if it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.values.lock().remove(key).is_some()
    }

    /// Returns `true` if `key` is present (of any type).
    pub fn contains(&self, key: &str) -> bool {
        self.values.lock().contains_key(key)
    }

    /// Sorted list of keys currently stored.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.lock().keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }

    /// Returns `true` if both handles point at the same map.
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("keys", &self.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_map() {
        let a = Context::new();
        let b = a.clone();
        b.insert("n", 7u32);

        assert!(a.ptr_eq(&b));
        assert_eq!(a.get::<u32>("n"), Some(7));
        assert!(!a.ptr_eq(&Context::new()));
    }

    #[test]
    fn typed_access() {
        let ctx = Context::new();
        ctx.insert("flag", true);
        ctx.insert("name", "release");

        assert_eq!(ctx.get::<bool>("flag"), Some(true));
        assert_eq!(ctx.get::<&str>("name"), Some("release"));
        assert_eq!(ctx.get::<String>("name"), None);
        assert_eq!(ctx.keys(), vec!["flag".to_string(), "name".to_string()]);

        assert!(ctx.remove("flag"));
        assert!(!ctx.contains("flag"));
        assert_eq!(ctx.len(), 1);
    }
}
