//! CapabilityComposer - 関数ごとのレイヤー列
//!
//! Each `Function` owns exactly one composer, so layers never leak between
//! functions even when they were built from the same logic or instance.
//! The chain is published as an immutable snapshot; `compose` swaps in a
//! new one and calls already dispatched keep the one they started with.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use super::layer::CapabilityLayer;
use crate::domain::FunctionError;

/// Layers from bottom (index 0, the resolved callable) to top.
pub type LayerChain = Arc<[Arc<CapabilityLayer>]>;

pub struct CapabilityComposer {
    owner: String,
    chain: RwLock<LayerChain>,
    sealed: AtomicBool,
}

impl CapabilityComposer {
    pub fn new(owner: impl Into<String>, base: Arc<CapabilityLayer>) -> Self {
        let chain: LayerChain = Arc::from(vec![base]);
        Self {
            owner: owner.into(),
            chain: RwLock::new(chain),
            sealed: AtomicBool::new(false),
        }
    }

    /// Push `layer` on top of the chain. Returns its depth.
    ///
    /// Composing the same layer twice stacks it twice.
    pub fn compose(&self, layer: impl Into<Arc<CapabilityLayer>>) -> Result<usize, FunctionError> {
        let layer = layer.into();
        let mut chain = self.chain.write().unwrap_or_else(PoisonError::into_inner);
        // seal() も write lock の下で立てるので、ここでの判定は race しない
        if self.sealed.load(Ordering::Acquire) {
            return Err(FunctionError::Composition {
                function: self.owner.clone(),
                reason: format!("function is sealed; cannot include `{}`", layer.name()),
            });
        }

        let mut next: Vec<Arc<CapabilityLayer>> = chain.iter().cloned().collect();
        next.push(Arc::clone(&layer));
        let depth = next.len() - 1;
        *chain = Arc::from(next);

        tracing::debug!(function = %self.owner, layer = layer.name(), depth, "capability layer composed");
        Ok(depth)
    }

    /// Current chain. Cheap: clones one `Arc`.
    pub fn snapshot(&self) -> LayerChain {
        Arc::clone(&self.chain.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Forbid further composition.
    pub fn seal(&self) {
        let _guard = self.chain.write().unwrap_or_else(PoisonError::into_inner);
        self.sealed.store(true, Ordering::Release);
        tracing::debug!(function = %self.owner, "capability chain sealed");
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Layer names, bottom first.
    pub fn layer_names(&self) -> Vec<String> {
        self.snapshot().iter().map(|l| l.name().to_string()).collect()
    }

    pub fn depth(&self) -> usize {
        self.snapshot().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::Logic;
    use crate::domain::ErrorKind;

    fn layer(name: &str) -> CapabilityLayer {
        CapabilityLayer::new(name).on_call(Logic::unary_sync(|_, v| Ok(v)))
    }

    #[test]
    fn compose_appends_on_top() {
        let c = CapabilityComposer::new("f", Arc::new(layer("base")));
        assert_eq!(c.compose(layer("a")).unwrap(), 1);
        assert_eq!(c.compose(layer("b")).unwrap(), 2);
        assert_eq!(c.layer_names(), vec!["base", "a", "b"]);
    }

    #[test]
    fn same_layer_twice_yields_two_entries() {
        let c = CapabilityComposer::new("f", Arc::new(layer("base")));
        let twice = Arc::new(layer("twice"));
        c.compose(Arc::clone(&twice)).unwrap();
        c.compose(twice).unwrap();
        assert_eq!(c.depth(), 3);
    }

    #[test]
    fn snapshots_are_unaffected_by_later_composition() {
        let c = CapabilityComposer::new("f", Arc::new(layer("base")));
        let before = c.snapshot();
        c.compose(layer("a")).unwrap();
        assert_eq!(before.len(), 1);
        assert_eq!(c.snapshot().len(), 2);
    }

    #[test]
    fn sealed_chain_rejects_composition() {
        let c = CapabilityComposer::new("f", Arc::new(layer("base")));
        c.seal();
        let err = c.compose(layer("late")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Composition);
        assert!(err.to_string().contains("late"));
        assert_eq!(c.depth(), 1);
    }
}
