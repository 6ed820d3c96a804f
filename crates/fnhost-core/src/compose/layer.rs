//! CapabilityLayer - 後付けできる振る舞いの束

use std::collections::BTreeMap;

use crate::callable::Logic;

/// Name of the behaviour every function dispatches on `Function::call`.
pub const CALL: &str = "call";

/// A named set of behaviours that can be stacked onto a function.
///
/// # 使用例
/// ```ignore
/// let shout = CapabilityLayer::new("shout").with_behavior(
///     CALL,
///     Logic::unary(|cx, request| async move {
///         let inner = cx.call_next(Some(request)).await?;
///         Ok(Value::new(inner.as_str().unwrap_or_default().to_uppercase()))
///     }),
/// );
/// function.include(shout)?;
/// ```
#[derive(Clone, Debug)]
pub struct CapabilityLayer {
    name: String,
    behaviors: BTreeMap<String, Logic>,
}

impl CapabilityLayer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behaviors: BTreeMap::new(),
        }
    }

    /// Define (or redefine) a behaviour on this layer.
    pub fn with_behavior(mut self, method: impl Into<String>, logic: Logic) -> Self {
        self.behaviors.insert(method.into(), logic);
        self
    }

    /// Shorthand for `with_behavior(CALL, logic)`.
    pub fn on_call(self, logic: Logic) -> Self {
        self.with_behavior(CALL, logic)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn defines(&self, method: &str) -> bool {
        self.behaviors.contains_key(method)
    }

    pub fn behavior(&self, method: &str) -> Option<&Logic> {
        self.behaviors.get(method)
    }

    pub fn behavior_names(&self) -> Vec<&str> {
        self.behaviors.keys().map(String::as_str).collect()
    }
}
