//! CallContext - レイヤー列を解釈する呼び出しコンテキスト
//!
//! Every behaviour receives a `CallContext`. It knows which layer the
//! behaviour lives on, so `call_next` can continue the lookup strictly below
//! it, and `invoke` can restart a lookup from the top (self-dispatch).
//! Lookups walk the chain snapshot taken when `Function::call` started.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use ulid::Ulid;

use super::composer::LayerChain;
use crate::callable::{ArityAdapter, Callable};
use crate::domain::{FunctionError, FunctionType, Value};
use crate::function::Function;
use crate::globals::GlobalStore;

/// State shared by every behaviour of one `Function::call`.
pub(crate) struct Frame {
    pub(crate) function: Function,
    pub(crate) chain: LayerChain,
    pub(crate) globals: GlobalStore,
    pub(crate) receiver: Option<Arc<dyn Callable>>,
    pub(crate) invocation_id: Ulid,
}

#[derive(Clone)]
pub struct CallContext {
    frame: Arc<Frame>,
    method: Arc<str>,
    depth: usize,
}

impl CallContext {
    /// Dispatch `method` from the top of the frame's chain.
    pub(crate) fn dispatch(
        frame: Arc<Frame>,
        method: &str,
        argument: Option<Value>,
    ) -> BoxFuture<'static, Result<Value, FunctionError>> {
        let top = frame.chain.len();
        Self::dispatch_below(frame, Arc::from(method), top, argument)
    }

    /// Run the topmost definition of `method` among layers `[0, below)`.
    fn dispatch_below(
        frame: Arc<Frame>,
        method: Arc<str>,
        below: usize,
        argument: Option<Value>,
    ) -> BoxFuture<'static, Result<Value, FunctionError>> {
        let found = frame.chain[..below]
            .iter()
            .enumerate()
            .rev()
            .find_map(|(depth, layer)| layer.behavior(&method).map(|logic| (depth, logic.clone())));

        match found {
            Some((depth, logic)) => {
                let cx = CallContext {
                    frame,
                    method,
                    depth,
                };
                ArityAdapter::invoke(&logic, cx, argument)
            }
            None => {
                let layer = frame
                    .chain
                    .get(below)
                    .map_or_else(|| "<top>".to_string(), |l| l.name().to_string());
                futures::future::ready(Err(FunctionError::MissingBehavior {
                    method: method.to_string(),
                    layer,
                }))
                .boxed()
            }
        }
    }

    /// Call the same behaviour as defined by the next layer down.
    pub fn call_next(&self, argument: Option<Value>) -> BoxFuture<'static, Result<Value, FunctionError>> {
        Self::dispatch_below(
            Arc::clone(&self.frame),
            Arc::clone(&self.method),
            self.depth,
            argument,
        )
    }

    /// Whether some lower layer defines the current behaviour.
    pub fn has_next(&self) -> bool {
        self.frame.chain[..self.depth]
            .iter()
            .any(|layer| layer.defines(&self.method))
    }

    /// Dispatch any behaviour from the top of the chain.
    pub fn invoke(
        &self,
        method: &str,
        argument: Option<Value>,
    ) -> BoxFuture<'static, Result<Value, FunctionError>> {
        Self::dispatch(Arc::clone(&self.frame), method, argument)
    }

    pub fn responds_to(&self, method: &str) -> bool {
        self.frame.chain.iter().any(|layer| layer.defines(method))
    }

    /// Behaviour currently running.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Layer the running behaviour was found on.
    pub fn layer_name(&self) -> &str {
        self.frame.chain[self.depth].name()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn function(&self) -> &Function {
        &self.frame.function
    }

    pub fn function_name(&self) -> Option<&str> {
        self.frame.function.name()
    }

    pub fn function_type(&self) -> FunctionType {
        self.frame.function.function_type()
    }

    /// Unique per `Function::call`; shared by every behaviour of that call.
    pub fn invocation_id(&self) -> Ulid {
        self.frame.invocation_id
    }

    pub fn globals(&self) -> &GlobalStore {
        &self.frame.globals
    }

    pub async fn global(&self, key: &str) -> Result<Option<Value>, FunctionError> {
        self.frame.globals.get(key).await
    }

    pub async fn global_as<T: Any + Send + Sync>(
        &self,
        key: &str,
    ) -> Result<Option<Arc<T>>, FunctionError> {
        self.frame.globals.get_as::<T>(key).await
    }

    pub fn set_global(&self, key: impl Into<String>, value: Value) -> Result<(), FunctionError> {
        self.frame.globals.set(key, value)
    }

    pub fn set_lazy_global<F, Fut>(&self, key: impl Into<String>, initializer: F) -> Result<(), FunctionError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FunctionError>> + Send + 'static,
    {
        self.frame.globals.set_lazy(key, initializer)
    }

    /// Receiver instantiated for this call (instance and type sources).
    pub(crate) fn receiver(&self) -> Result<Arc<dyn Callable>, FunctionError> {
        self.frame
            .receiver
            .clone()
            .ok_or_else(|| FunctionError::MissingBehavior {
                method: self.method.to_string(),
                layer: self.layer_name().to_string(),
            })
    }
}

impl std::fmt::Debug for CallContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallContext")
            .field("function", &self.function_name())
            .field("method", &self.method)
            .field("layer", &self.layer_name())
            .field("invocation_id", &self.frame.invocation_id)
            .finish()
    }
}
