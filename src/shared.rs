//! Shared variables: persistent tensors identified by opaque id.
//!
//! The core stores only id, shape and dtype — values live with the backend.
//! A process-wide registry hands out unique ids; tests can create isolated
//! registries so they run in parallel without id collisions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex};

use crate::core::DType;

/// A shared variable is like a static variable, synchronized between
/// evaluations. Its id, shape and dtype are immutable for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedVariable {
    pub id: usize,
    pub name: String,
    /// Concrete dimensions; shared variables always have a known size.
    pub shape: [i64; 4],
    pub dtype: DType,
}

/// Handle to a shared variable.
pub type SharedRef = Arc<SharedVariable>;

/// Hands out process-unique shared-variable ids and keeps the table of all
/// variables it created.
#[derive(Debug, Default)]
pub struct SharedRegistry {
    next_id: AtomicUsize,
    variables: Mutex<Vec<SharedRef>>,
}

/// The process-wide registry.
static REGISTRY: LazyLock<Arc<SharedRegistry>> = LazyLock::new(Arc::default);

impl SharedRegistry {
    /// A fresh, isolated registry. Ids are unique only within it.
    pub fn new() -> Arc<Self> {
        Arc::default()
    }

    /// The process-wide registry.
    ///
    /// # Panics
    ///
    /// Never panics; the registry is created on first use.
    pub fn global() -> Arc<Self> {
        Arc::clone(&REGISTRY)
    }

    /// Registers a new shared variable.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    pub fn make(&self, name: impl Into<String>, shape: [i64; 4], dtype: DType) -> SharedRef {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let var = Arc::new(SharedVariable {
            id,
            name: name.into(),
            shape,
            dtype,
        });
        self.variables
            .lock()
            .expect("Shared variable registry poisoned")
            .push(Arc::clone(&var));
        var
    }

    /// Looks up a variable by id.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    pub fn get(&self, id: usize) -> Option<SharedRef> {
        self.variables
            .lock()
            .expect("Shared variable registry poisoned")
            .iter()
            .find(|v| v.id == id)
            .cloned()
    }

    /// The number of variables registered so far.
    ///
    /// # Panics
    ///
    /// Panics if the registry lock is poisoned.
    pub fn len(&self) -> usize {
        self.variables
            .lock()
            .expect("Shared variable registry poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isolated_registries_do_not_share_ids() {
        let r1 = SharedRegistry::new();
        let r2 = SharedRegistry::new();
        let a = r1.make("w", [2, 2, 1, 1], DType::f32);
        let b = r2.make("w", [2, 2, 1, 1], DType::f32);
        assert_eq!(a.id, 0);
        assert_eq!(b.id, 0);
        assert_eq!(r1.len(), 1);
    }

    #[test]
    fn lookup_by_id() {
        let registry = SharedRegistry::new();
        let v = registry.make("bias", [10, 1, 1, 1], DType::f64);
        assert_eq!(registry.get(v.id), Some(v));
        assert_eq!(registry.get(999), None);
    }
}
