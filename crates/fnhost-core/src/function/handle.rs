//! Function - 名前・種類・呼び出し可能型をまとめた集約
//!
//! # ライフサイクル
//! Defined → (include*) → call / include interleaved, for the life of the
//! process. There is no disposal.

use std::sync::Arc;

use tracing::Instrument;
use ulid::Ulid;

use super::definition::FunctionDef;
use crate::callable::{CallableResolver, CallableType};
use crate::compose::context::Frame;
use crate::compose::{CALL, CallContext, CapabilityComposer, CapabilityLayer};
use crate::domain::{FunctionError, FunctionType, Value};
use crate::globals::{FUNCTION_NAME_KEY, FUNCTION_TYPE_KEY, GlobalStore};
use crate::observability::FunctionSummary;
use crate::typed::{RequestClass, ResponseClass};

struct Inner {
    name: Option<String>,
    function_type: FunctionType,
    request_class: Option<RequestClass>,
    response_class: Option<ResponseClass>,
    callable: CallableType,
    composer: CapabilityComposer,
}

/// A defined function. Cloning yields another handle to the same function
/// (same layers); defining twice yields independent functions.
#[derive(Clone)]
pub struct Function {
    inner: Arc<Inner>,
}

impl Function {
    /// Define a function of any kind.
    ///
    /// All validation happens here; a `Function` that exists is callable.
    pub fn define(
        kind: FunctionType,
        name: Option<String>,
        mut def: FunctionDef,
    ) -> Result<Self, FunctionError> {
        let name = name.filter(|n| !n.trim().is_empty());
        if kind.requires_name() && name.is_none() {
            return Err(FunctionError::configuration(format!(
                "{kind} functions need a non-empty name"
            )));
        }

        let source = def.take_source()?;
        let callable = CallableResolver::resolve(
            kind,
            source,
            def.request_class.as_ref(),
            def.response_class.as_ref(),
        )?;

        if kind != FunctionType::Typed {
            def.request_class = None;
            def.response_class = None;
        }

        let label = name.clone().unwrap_or_else(|| kind.to_string());
        let composer = CapabilityComposer::new(label, Arc::clone(callable.base_layer()));
        if def.sealed {
            composer.seal();
        }

        tracing::debug!(
            function = name.as_deref().unwrap_or("<anonymous>"),
            kind = %kind,
            source = ?callable.source_kind(),
            "function defined"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                name,
                function_type: kind,
                request_class: def.request_class,
                response_class: def.response_class,
                callable,
                composer,
            }),
        })
    }

    pub fn http(name: impl Into<String>, def: FunctionDef) -> Result<Self, FunctionError> {
        Self::define(FunctionType::Http, Some(name.into()), def)
    }

    pub fn cloud_event(name: impl Into<String>, def: FunctionDef) -> Result<Self, FunctionError> {
        Self::define(FunctionType::CloudEvent, Some(name.into()), def)
    }

    pub fn typed(name: impl Into<String>, def: FunctionDef) -> Result<Self, FunctionError> {
        Self::define(FunctionType::Typed, Some(name.into()), def)
    }

    pub fn startup_task(def: FunctionDef) -> Result<Self, FunctionError> {
        Self::define(FunctionType::StartupTask, None, def)
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn function_type(&self) -> FunctionType {
        self.inner.function_type
    }

    pub fn request_class(&self) -> Option<&RequestClass> {
        self.inner.request_class.as_ref()
    }

    pub fn response_class(&self) -> Option<&ResponseClass> {
        self.inner.response_class.as_ref()
    }

    pub fn callable_type(&self) -> &CallableType {
        &self.inner.callable
    }

    /// Layer names, bottom (resolved callable) first.
    pub fn layer_names(&self) -> Vec<String> {
        self.inner.composer.layer_names()
    }

    /// Stack a capability layer on this function only.
    ///
    /// Calls dispatched afterwards see it; calls already running do not.
    pub fn include(&self, layer: CapabilityLayer) -> Result<(), FunctionError> {
        self.inner.composer.compose(layer).map(|_| ())
    }

    /// Forbid further `include`s.
    pub fn seal(&self) {
        self.inner.composer.seal();
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.composer.is_sealed()
    }

    /// Invoke the function.
    ///
    /// For startup tasks `request` is the function under initialisation and
    /// may be nil; every other kind requires a non-nil request. Errors from
    /// user logic are returned exactly as raised.
    pub async fn call(&self, request: Value, globals: &GlobalStore) -> Result<Value, FunctionError> {
        if self.function_type().requires_request() && request.is_nil() {
            return Err(FunctionError::MissingRequest(self.label().to_string()));
        }

        let chain = self.inner.composer.snapshot();
        let receiver = self.inner.callable.instantiate(globals)?;
        let invocation_id = Ulid::new();
        let span = tracing::debug_span!(
            "function.call",
            function = self.label(),
            kind = %self.function_type(),
            invocation = %invocation_id,
            layers = chain.len(),
        );

        let frame = Arc::new(Frame {
            function: self.clone(),
            chain,
            globals: globals.clone(),
            receiver,
            invocation_id,
        });
        CallContext::dispatch(frame, CALL, Some(request))
            .instrument(span)
            .await
    }

    /// Run this startup task for `target`.
    pub async fn run_startup(
        &self,
        target: &Function,
        globals: &GlobalStore,
    ) -> Result<Value, FunctionError> {
        self.call(Value::new(target.clone()), globals).await
    }

    /// Build a ready store for calling this function.
    ///
    /// Seeds `function_name` / `function_type`; a startup task is also run
    /// against itself so whatever it sets up lands in the store.
    pub async fn populate_globals(
        &self,
        globals: Option<GlobalStore>,
    ) -> Result<GlobalStore, FunctionError> {
        let globals = globals.unwrap_or_default();
        if let Some(name) = self.name() {
            globals.set(FUNCTION_NAME_KEY, Value::from(name))?;
        }
        globals.set(FUNCTION_TYPE_KEY, Value::new(self.function_type()))?;

        if self.function_type() == FunctionType::StartupTask {
            self.run_startup(self, &globals).await?;
        }
        Ok(globals)
    }

    pub fn summary(&self) -> FunctionSummary {
        FunctionSummary {
            name: self.inner.name.clone(),
            function_type: self.function_type(),
            source_kind: self.inner.callable.source_kind(),
            type_name: self.inner.callable.type_name().to_string(),
            layers: self.layer_names(),
            sealed: self.is_sealed(),
        }
    }

    /// Same function (not merely same definition).
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn label(&self) -> &str {
        self.inner
            .name
            .as_deref()
            .unwrap_or_else(|| self.inner.function_type.as_str())
    }
}

impl std::fmt::Debug for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.inner.name)
            .field("type", &self.inner.function_type)
            .field("callable", &self.inner.callable)
            .field("layers", &self.layer_names())
            .finish()
    }
}
