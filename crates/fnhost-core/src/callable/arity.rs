//! Arity - 宣言された引数の数に合わせた呼び出し
//!
//! The declared parameter count is fixed when a `Logic` is built and read
//! here on every dispatch; nothing is reflected on at call time.

use futures::future::BoxFuture;

use super::source::{Body, Logic};
use crate::compose::CallContext;
use crate::domain::{FunctionError, Value};

/// Number of formal parameters a unit of logic declares (besides its
/// context).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Nullary,
    Unary,
}

impl Arity {
    pub fn params(&self) -> usize {
        match self {
            Self::Nullary => 0,
            Self::Unary => 1,
        }
    }
}

impl TryFrom<usize> for Arity {
    type Error = FunctionError;

    fn try_from(params: usize) -> Result<Self, Self::Error> {
        match params {
            0 => Ok(Self::Nullary),
            1 => Ok(Self::Unary),
            n => Err(FunctionError::configuration(format!(
                "logic declares {n} parameters; at most 1 is supported"
            ))),
        }
    }
}

pub struct ArityAdapter;

impl ArityAdapter {
    /// Invoke `logic` with or without `argument` depending on its arity.
    ///
    /// One-parameter logic called without an argument receives `Value::nil()`.
    pub fn invoke(
        logic: &Logic,
        cx: CallContext,
        argument: Option<Value>,
    ) -> BoxFuture<'static, Result<Value, FunctionError>> {
        match &logic.body {
            Body::Nullary(f) => f(cx),
            Body::Unary(f) => f(cx, argument.unwrap_or_else(Value::nil)),
        }
    }
}
