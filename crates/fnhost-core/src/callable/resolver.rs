//! CallableResolver - 供給元を一つの正規表現 (CallableType) に揃える
//!
//! Whatever the source, the result is a base `CapabilityLayer` whose `call`
//! behaviour runs the user's logic, plus the recipe for the receiver object
//! (none, one shared instance, or one per call).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::source::{Callable, CallableClass, CallableSource, Logic};
use crate::compose::{CALL, CapabilityLayer};
use crate::domain::{FunctionError, FunctionType};
use crate::globals::GlobalStore;
use crate::typed::{RequestClass, ResponseClass};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Inline,
    Instance,
    Type,
}

#[derive(Clone)]
enum Receiver {
    None,
    Shared(Arc<dyn Callable>),
    PerCall(CallableClass),
}

/// Canonical form of a function's logic.
#[derive(Clone)]
pub struct CallableType {
    source_kind: SourceKind,
    type_name: String,
    base: Arc<CapabilityLayer>,
    receiver: Receiver,
}

impl CallableType {
    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Bottom layer of every chain built from this type.
    pub fn base_layer(&self) -> &Arc<CapabilityLayer> {
        &self.base
    }

    /// Receiver for one call: the shared instance, a fresh instance built
    /// from `globals`, or nothing for inline logic.
    pub fn instantiate(
        &self,
        globals: &GlobalStore,
    ) -> Result<Option<Arc<dyn Callable>>, FunctionError> {
        match &self.receiver {
            Receiver::None => Ok(None),
            Receiver::Shared(callable) => Ok(Some(Arc::clone(callable))),
            Receiver::PerCall(class) => class.construct(globals).map(Some),
        }
    }
}

impl std::fmt::Debug for CallableType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallableType")
            .field("source_kind", &self.source_kind)
            .field("type_name", &self.type_name)
            .finish()
    }
}

pub struct CallableResolver;

impl CallableResolver {
    /// Resolve `source` for a function of `kind`.
    ///
    /// # 検証 (Fail-fast)
    /// - typed: request class must decode, response class must encode
    /// - request/response classes on other kinds are ignored
    pub fn resolve(
        kind: FunctionType,
        source: CallableSource,
        request_class: Option<&RequestClass>,
        response_class: Option<&ResponseClass>,
    ) -> Result<CallableType, FunctionError> {
        Self::validate_classes(kind, request_class, response_class)?;

        let resolved = match source {
            CallableSource::Inline(logic) => CallableType {
                source_kind: SourceKind::Inline,
                type_name: "inline".to_string(),
                base: Arc::new(CapabilityLayer::new("inline").with_behavior(CALL, logic)),
                receiver: Receiver::None,
            },
            CallableSource::Instance(callable) => {
                let type_name = callable.type_name().to_string();
                CallableType {
                    source_kind: SourceKind::Instance,
                    base: Arc::new(Self::delegating_layer(&type_name)),
                    type_name,
                    receiver: Receiver::Shared(callable),
                }
            }
            CallableSource::Type(class) => {
                let type_name = class.name().to_string();
                CallableType {
                    source_kind: SourceKind::Type,
                    base: Arc::new(Self::delegating_layer(&type_name)),
                    type_name,
                    receiver: Receiver::PerCall(class),
                }
            }
        };
        Ok(resolved)
    }

    fn validate_classes(
        kind: FunctionType,
        request_class: Option<&RequestClass>,
        response_class: Option<&ResponseClass>,
    ) -> Result<(), FunctionError> {
        if kind != FunctionType::Typed {
            if request_class.is_some() || response_class.is_some() {
                tracing::warn!(
                    kind = %kind,
                    "request/response classes only apply to typed functions; ignoring them"
                );
            }
            return Ok(());
        }

        if let Some(class) = request_class.filter(|c| !c.can_decode()) {
            return Err(FunctionError::configuration(format!(
                "request class `{}` cannot be decoded from the wire",
                class.name()
            )));
        }
        if let Some(class) = response_class.filter(|c| !c.can_encode()) {
            return Err(FunctionError::configuration(format!(
                "response class `{}` cannot be encoded to the wire",
                class.name()
            )));
        }
        Ok(())
    }

    /// Base layer whose `call` forwards to the receiver built for the call.
    fn delegating_layer(type_name: &str) -> CapabilityLayer {
        CapabilityLayer::new(type_name).with_behavior(
            CALL,
            Logic::unary(|cx, request| async move {
                let receiver = cx.receiver()?;
                receiver.call(&cx, request).await
            }),
        )
    }
}
