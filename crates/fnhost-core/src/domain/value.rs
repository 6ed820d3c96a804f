//! Opaque values passed through the core.
//!
//! Requests, responses and globals are all `Value`s. The core never looks
//! inside one; callers downcast to whatever concrete type they agreed on.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A cheaply clonable, thread-safe, type-erased value.
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Value {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Wrap an existing `Arc` without reallocating.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            inner: value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// The "no value" marker, handed to one-parameter logic called without
    /// an argument.
    pub fn nil() -> Self {
        Self::new(())
    }

    pub fn is_nil(&self) -> bool {
        self.is::<()>()
    }

    pub fn is<T: Any>(&self) -> bool {
        (*self.inner).is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.inner).downcast_ref::<T>()
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.inner).downcast::<T>().ok()
    }

    pub fn cloned<T: Any + Clone>(&self) -> Option<T> {
        self.downcast_ref::<T>().cloned()
    }

    /// Convenience for string payloads (`String` or `&'static str`).
    pub fn as_str(&self) -> Option<&str> {
        self.downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| self.downcast_ref::<&'static str>().copied())
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Same underlying allocation.
    pub fn ptr_eq(&self, other: &Value) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => f.debug_tuple("Value").field(&s).finish(),
            None => f.debug_struct("Value").field("type", &self.type_name).finish(),
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Client {
        endpoint: String,
    }

    #[test]
    fn downcasts_to_the_stored_type_only() {
        let v = Value::new(Client {
            endpoint: "db:5432".into(),
        });
        assert!(v.is::<Client>());
        assert!(!v.is::<String>());
        assert_eq!(v.downcast_ref::<Client>().unwrap().endpoint, "db:5432");
        assert!(v.downcast::<String>().is_none());
        assert!(v.type_name().ends_with("Client"));
    }

    #[test]
    fn clones_share_the_allocation() {
        let v = Value::from("hello");
        let w = v.clone();
        assert!(v.ptr_eq(&w));
        assert_eq!(w.as_str(), Some("hello"));
    }

    #[test]
    fn nil_is_unit() {
        assert!(Value::nil().is_nil());
        assert!(!Value::from("x").is_nil());
    }

    #[test]
    fn static_str_reads_as_str() {
        let v = Value::new("static");
        assert_eq!(v.as_str(), Some("static"));
    }
}
