//! CallableSource - 関数ロジックの供給元
//!
//! A function's logic can be supplied three ways:
//! - **Inline**: a closure (`Logic`)
//! - **Instance**: one shared object implementing `Callable`
//! - **Type**: a `Callable` type constructed from the store on every call

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;

use super::arity::Arity;
use crate::compose::CallContext;
use crate::domain::{FunctionError, Value};
use crate::globals::GlobalStore;

type NullaryFn =
    Arc<dyn Fn(CallContext) -> BoxFuture<'static, Result<Value, FunctionError>> + Send + Sync>;
type UnaryFn = Arc<
    dyn Fn(CallContext, Value) -> BoxFuture<'static, Result<Value, FunctionError>> + Send + Sync,
>;

#[derive(Clone)]
pub(crate) enum Body {
    Nullary(NullaryFn),
    Unary(UnaryFn),
}

/// A unit of inline logic with a declared arity.
///
/// # 使用例
/// ```ignore
/// let hello = Logic::unary(|_cx, _request| async { Ok(Value::from("hello")) });
/// let warmup = Logic::nullary(|cx| async move {
///     cx.set_global("foo", Value::from("bar"))?;
///     Ok(Value::nil())
/// });
/// ```
#[derive(Clone)]
pub struct Logic {
    pub(crate) body: Body,
}

impl Logic {
    /// Logic that takes no argument.
    pub fn nullary<F, Fut>(f: F) -> Self
    where
        F: Fn(CallContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FunctionError>> + Send + 'static,
    {
        Self {
            body: Body::Nullary(Arc::new(move |cx| f(cx).boxed())),
        }
    }

    /// Logic that takes the request (or startup target) as its argument.
    pub fn unary<F, Fut>(f: F) -> Self
    where
        F: Fn(CallContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FunctionError>> + Send + 'static,
    {
        Self {
            body: Body::Unary(Arc::new(move |cx, arg| f(cx, arg).boxed())),
        }
    }

    pub fn nullary_sync<F>(f: F) -> Self
    where
        F: Fn(&CallContext) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        Self {
            body: Body::Nullary(Arc::new(move |cx| futures::future::ready(f(&cx)).boxed())),
        }
    }

    pub fn unary_sync<F>(f: F) -> Self
    where
        F: Fn(&CallContext, Value) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        Self {
            body: Body::Unary(Arc::new(move |cx, arg| {
                futures::future::ready(f(&cx, arg)).boxed()
            })),
        }
    }

    /// Logic whose parameter count is only known at runtime (e.g. reported
    /// by a loader). More than one parameter is rejected here, at definition
    /// time.
    pub fn declared<F, Fut>(params: usize, f: F) -> Result<Self, FunctionError>
    where
        F: Fn(CallContext, Option<Value>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, FunctionError>> + Send + 'static,
    {
        let logic = match Arity::try_from(params)? {
            Arity::Nullary => Self::nullary(move |cx| f(cx, None)),
            Arity::Unary => Self::unary(move |cx, arg| f(cx, Some(arg))),
        };
        Ok(logic)
    }

    pub fn arity(&self) -> Arity {
        match self.body {
            Body::Nullary(_) => Arity::Nullary,
            Body::Unary(_) => Arity::Unary,
        }
    }
}

impl std::fmt::Debug for Logic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logic").field("arity", &self.arity()).finish()
    }
}

/// A type that can be invoked with a request.
///
/// `cx` gives access to the store and to the rest of the capability chain.
#[async_trait]
pub trait Callable: Send + Sync + 'static {
    async fn call(&self, cx: &CallContext, request: Value) -> Result<Value, FunctionError>;

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Store-accepting constructor of a `Callable` type.
pub trait FromGlobals: Sized {
    fn from_globals(globals: &GlobalStore) -> Result<Self, FunctionError>;
}

type Constructor =
    Arc<dyn Fn(&GlobalStore) -> Result<Arc<dyn Callable>, FunctionError> + Send + Sync>;

/// A `Callable` type together with the way to build it from a store.
#[derive(Clone)]
pub struct CallableClass {
    name: &'static str,
    construct: Constructor,
}

impl CallableClass {
    pub fn of<T: Callable + FromGlobals>() -> Self {
        Self::with_constructor(T::from_globals)
    }

    pub fn with_constructor<T, F>(construct: F) -> Self
    where
        T: Callable,
        F: Fn(&GlobalStore) -> Result<T, FunctionError> + Send + Sync + 'static,
    {
        Self {
            name: std::any::type_name::<T>(),
            construct: Arc::new(move |globals| {
                let callable: Arc<dyn Callable> = Arc::new(construct(globals)?);
                Ok(callable)
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn construct(&self, globals: &GlobalStore) -> Result<Arc<dyn Callable>, FunctionError> {
        (self.construct)(globals)
    }
}

#[derive(Clone)]
pub enum CallableSource {
    Inline(Logic),
    Instance(Arc<dyn Callable>),
    Type(CallableClass),
}

impl CallableSource {
    pub fn instance<T: Callable>(callable: T) -> Self {
        Self::Instance(Arc::new(callable))
    }

    /// Share one instance between several functions.
    pub fn shared(callable: Arc<dyn Callable>) -> Self {
        Self::Instance(callable)
    }

    pub fn class<T: Callable + FromGlobals>() -> Self {
        Self::Type(CallableClass::of::<T>())
    }
}

impl From<Logic> for CallableSource {
    fn from(logic: Logic) -> Self {
        Self::Inline(logic)
    }
}

impl std::fmt::Debug for CallableSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Inline(logic) => f.debug_tuple("Inline").field(logic).finish(),
            Self::Instance(callable) => f.debug_tuple("Instance").field(&callable.type_name()).finish(),
            Self::Type(class) => f.debug_tuple("Type").field(&class.name()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_record_arity() {
        assert_eq!(
            Logic::nullary(|_cx| async { Ok(Value::nil()) }).arity(),
            Arity::Nullary
        );
        assert_eq!(
            Logic::unary(|_cx, req| async move { Ok(req) }).arity(),
            Arity::Unary
        );
        assert_eq!(
            Logic::unary_sync(|_cx, req| Ok(req)).arity(),
            Arity::Unary
        );
    }

    #[test]
    fn declared_arity_is_checked_at_definition() {
        let ok = Logic::declared(1, |_cx, arg| async move { Ok(arg.unwrap_or_else(Value::nil)) });
        assert_eq!(ok.unwrap().arity(), Arity::Unary);

        let err = Logic::declared(2, |_cx, _arg| async { Ok(Value::nil()) }).unwrap_err();
        assert!(err.is_definition_error());
    }

    struct Echo;

    #[async_trait]
    impl Callable for Echo {
        async fn call(&self, _cx: &CallContext, request: Value) -> Result<Value, FunctionError> {
            Ok(request)
        }
    }

    impl FromGlobals for Echo {
        fn from_globals(_globals: &GlobalStore) -> Result<Self, FunctionError> {
            Ok(Echo)
        }
    }

    #[test]
    fn class_constructs_from_store() {
        let class = CallableClass::of::<Echo>();
        assert!(class.name().ends_with("Echo"));
        let callable = class.construct(&GlobalStore::new()).unwrap();
        assert!(callable.type_name().ends_with("Echo"));
    }
}
