//! TypedHandler trait - 型付き関数のハンドラ
//!
//! # 二層構造
//! - **表層**: `TypedHandler<Req>`: takes a concrete request type
//! - **内部**: `TypedCallable<Req, H>`: type-erased `Callable` the core
//!   dispatches through the capability chain

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::codec::{RequestClass, ResponseClass};
use crate::callable::{Callable, CallableSource};
use crate::compose::CallContext;
use crate::domain::{FunctionError, Value};
use crate::function::{Function, FunctionDef};

/// Handles one decoded request type.
///
/// # 使用例
/// ```ignore
/// struct Adder;
///
/// #[async_trait]
/// impl TypedHandler<AddRequest> for Adder {
///     type Response = AddResponse;
///
///     async fn handle(&self, _cx: &CallContext, req: AddRequest) -> Result<AddResponse, FunctionError> {
///         Ok(AddResponse { sum: req.a + req.b })
///     }
/// }
///
/// let f = typed::define("add", Adder)?;
/// ```
#[async_trait]
pub trait TypedHandler<Req: Send + 'static>: Send + Sync + 'static {
    type Response: Serialize + Send + Sync + 'static;

    async fn handle(&self, cx: &CallContext, request: Req) -> Result<Self::Response, FunctionError>;
}

pub struct TypedCallable<Req, H> {
    handler: H,
    _marker: PhantomData<fn() -> Req>,
}

impl<Req, H> TypedCallable<Req, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<Req, H> Callable for TypedCallable<Req, H>
where
    Req: Clone + Send + Sync + 'static,
    H: TypedHandler<Req>,
{
    async fn call(&self, cx: &CallContext, request: Value) -> Result<Value, FunctionError> {
        let typed = request
            .cloned::<Req>()
            .ok_or_else(|| FunctionError::TypeMismatch {
                what: "typed request".to_string(),
                expected: std::any::type_name::<Req>(),
                found: request.type_name(),
            })?;
        let response = self.handler.handle(cx, typed).await?;
        Ok(Value::new(response))
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<H>()
    }
}

/// Define a typed function whose request/response classes follow the
/// handler's types.
pub fn define<Req, H>(name: impl Into<String>, handler: H) -> Result<Function, FunctionError>
where
    Req: DeserializeOwned + Clone + Send + Sync + 'static,
    H: TypedHandler<Req>,
{
    let def = FunctionDef::from_callable(CallableSource::instance(TypedCallable::new(handler)))
        .request_class(RequestClass::of::<Req>())
        .response_class(ResponseClass::of::<H::Response>());
    Function::typed(name, def)
}
