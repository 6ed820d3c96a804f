//! GlobalStore - 関数呼び出し間で共有されるグローバル値
//!
//! A store is created once per invocation chain (process start, cold start,
//! test) and handed to every `Function::call`. Cloning a store shares it.
//!
//! # 保証
//! - a lazy initializer runs at most once per key, even under concurrent `get`
//!   and even when the caller that started it is cancelled
//! - no map lock is held while an initializer runs, so initializers may read
//!   other keys
//! - a failing initializer leaves the key pending for a later retry
//! - an initializer that (directly or through another key) reads its own key
//!   fails with `GlobalResolution` instead of waiting on itself
//!
//! Resolution spawns onto the current tokio runtime.

mod lazy;

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use futures::FutureExt;

use self::lazy::LazyGlobal;
pub use self::lazy::Initializer;
use crate::domain::{FunctionError, Value};
use crate::observability::StoreCounts;

/// Global seeded by `Function::populate_globals` with the function's name.
pub const FUNCTION_NAME_KEY: &str = "function_name";
/// Global seeded by `Function::populate_globals` with the function's kind.
pub const FUNCTION_TYPE_KEY: &str = "function_type";

#[derive(Default)]
struct StoreInner {
    entries: DashMap<String, Arc<LazyGlobal>>,
    frozen: AtomicBool,
}

#[derive(Clone, Default)]
pub struct GlobalStore {
    inner: Arc<StoreInner>,
}

impl GlobalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an already computed value, replacing any previous entry.
    pub fn set(&self, key: impl Into<String>, value: Value) -> Result<(), FunctionError> {
        let key = key.into();
        self.ensure_writable(&key)?;
        self.inner
            .entries
            .insert(key, Arc::new(LazyGlobal::resolved(value)));
        Ok(())
    }

    /// Register an initializer computed on first `get`.
    ///
    /// ```ignore
    /// store.set_lazy("client", || async { Ok(Value::new(Client::connect()?)) })?;
    /// ```
    pub fn set_lazy<F, Fut>(&self, key: impl Into<String>, initializer: F) -> Result<(), FunctionError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FunctionError>> + Send + 'static,
    {
        let initializer: Initializer = Arc::new(move || initializer().boxed());
        self.set_initializer(key, initializer)
    }

    /// Same as [`set_lazy`](Self::set_lazy) for an already boxed initializer.
    pub fn set_initializer(
        &self,
        key: impl Into<String>,
        initializer: Initializer,
    ) -> Result<(), FunctionError> {
        let key = key.into();
        self.ensure_writable(&key)?;
        self.inner
            .entries
            .insert(key, Arc::new(LazyGlobal::pending(initializer)));
        Ok(())
    }

    /// Read a global, resolving it first if it is still pending.
    ///
    /// Absent keys yield `Ok(None)`.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, FunctionError> {
        // DashMap の guard はこの文で drop される
        let entry = self.inner.entries.get(key).map(|e| Arc::clone(e.value()));
        match entry {
            Some(entry) => LazyGlobal::resolve(&entry, key).await.map(Some),
            None => Ok(None),
        }
    }

    /// Typed read. A value of another type is a `TypeMismatch`.
    pub async fn get_as<T: Any + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<Arc<T>>, FunctionError> {
        let Some(value) = self.get(key).await? else {
            return Ok(None);
        };
        value
            .downcast::<T>()
            .map(Some)
            .ok_or_else(|| FunctionError::TypeMismatch {
                what: format!("global `{key}`"),
                expected: std::any::type_name::<T>(),
                found: value.type_name(),
            })
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.entries.contains_key(key)
    }

    /// True when `key` holds a computed value (eager, or lazy and already run).
    pub fn is_resolved(&self, key: &str) -> bool {
        self.inner
            .entries
            .get(key)
            .is_some_and(|e| e.value().is_resolved())
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Forbid further writes. Pending entries can still be resolved.
    pub fn freeze(&self) {
        self.inner.frozen.store(true, Ordering::Release);
        tracing::debug!(globals = self.len(), "global store frozen");
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.frozen.load(Ordering::Acquire)
    }

    pub fn counts(&self) -> StoreCounts {
        let mut counts = StoreCounts::default();
        for entry in self.inner.entries.iter() {
            if entry.value().is_resolved() {
                counts.resolved += 1;
            } else {
                counts.pending += 1;
            }
        }
        counts
    }

    /// Same underlying store.
    pub fn ptr_eq(&self, other: &GlobalStore) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn ensure_writable(&self, key: &str) -> Result<(), FunctionError> {
        if self.is_frozen() {
            return Err(FunctionError::FrozenGlobals(key.to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for GlobalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalStore")
            .field("keys", &self.keys())
            .field("frozen", &self.is_frozen())
            .finish()
    }
}
