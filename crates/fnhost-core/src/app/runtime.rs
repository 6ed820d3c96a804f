//! Runtime - 名前による関数の実行
//!
//! What a server adapter holds on to: it looks functions up by name and
//! invokes them against the app's shared global store.

use std::sync::Arc;

use super::registry::FunctionRegistry;
use crate::domain::{FunctionError, FunctionType, Value};
use crate::function::Function;
use crate::globals::GlobalStore;
use crate::typed::WireCodec;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("no function named `{0}` is registered")]
    FunctionNotFound(String),

    #[error("function `{name}` is {kind}, not typed; it has no wire codec")]
    NotTyped { name: String, kind: FunctionType },

    #[error(transparent)]
    Function(#[from] FunctionError),
}

/// Cheap to clone; every clone shares the registry and the store.
#[derive(Debug, Clone)]
pub struct Runtime {
    registry: Arc<FunctionRegistry>,
    globals: GlobalStore,
}

impl Runtime {
    pub fn new(registry: Arc<FunctionRegistry>, globals: GlobalStore) -> Self {
        Self { registry, globals }
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn globals(&self) -> &GlobalStore {
        &self.globals
    }

    pub async fn execute(&self, name: &str, request: Value) -> Result<Value, RuntimeError> {
        let function = self.lookup(name)?;
        Ok(function.call(request, &self.globals).await?)
    }

    /// Decode `body`, invoke the typed function `name`, encode its response.
    pub async fn execute_wire(&self, name: &str, body: &[u8]) -> Result<Vec<u8>, RuntimeError> {
        let function = self.lookup(name)?;
        call_wire(function, body, &self.globals).await
    }

    fn lookup(&self, name: &str) -> Result<&Function, RuntimeError> {
        self.registry
            .get(name)
            .ok_or_else(|| RuntimeError::FunctionNotFound(name.to_string()))
    }
}

pub(crate) async fn call_wire(
    function: &Function,
    body: &[u8],
    globals: &GlobalStore,
) -> Result<Vec<u8>, RuntimeError> {
    if function.function_type() != FunctionType::Typed {
        return Err(RuntimeError::NotTyped {
            name: function.name().unwrap_or_default().to_string(),
            kind: function.function_type(),
        });
    }
    let codec = WireCodec::for_function(function);
    let request = codec.decode_request(body)?;
    let response = function.call(request, globals).await?;
    Ok(codec.encode_response(&response)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::Logic;
    use crate::function::FunctionDef;

    fn runtime() -> Runtime {
        let mut registry = FunctionRegistry::new();
        registry
            .add_http(
                "hello",
                FunctionDef::from_logic(Logic::nullary_sync(|_cx| Ok(Value::from("hello")))),
            )
            .unwrap();
        registry
            .add_typed(
                "shout",
                FunctionDef::from_logic(Logic::unary_sync(|_cx, req| {
                    let json = req
                        .downcast_ref::<serde_json::Value>()
                        .and_then(|v| v.as_str())
                        .unwrap_or_default();
                    Ok(Value::from(json.to_uppercase()))
                })),
            )
            .unwrap();
        Runtime::new(Arc::new(registry), GlobalStore::new())
    }

    #[tokio::test]
    async fn runtime_executes_registered_function() {
        let out = runtime()
            .execute("hello", Value::from("the-request"))
            .await
            .unwrap();
        assert_eq!(out.as_str(), Some("hello"));
    }

    #[tokio::test]
    async fn runtime_errors_when_function_missing() {
        let err = runtime()
            .execute("missing", Value::from("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::FunctionNotFound(name) if name == "missing"));
    }

    #[tokio::test]
    async fn wire_calls_pass_json_through_typed_functions() {
        let out = runtime().execute_wire("shout", br#""hey""#).await.unwrap();
        assert_eq!(out, br#""HEY""#);
    }

    #[tokio::test]
    async fn wire_calls_reject_untyped_functions() {
        let err = runtime().execute_wire("hello", b"{}").await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::NotTyped {
                kind: FunctionType::Http,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn bad_wire_body_is_a_codec_error() {
        let err = runtime().execute_wire("shout", b"{").await.unwrap_err();
        assert!(matches!(err, RuntimeError::Function(FunctionError::Codec { .. })));
    }
}
