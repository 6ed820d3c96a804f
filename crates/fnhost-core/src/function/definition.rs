//! FunctionDef - 関数定義の入力

use crate::callable::{CallableSource, Logic};
use crate::domain::FunctionError;
use crate::typed::{RequestClass, ResponseClass};

/// Everything a function is defined from, besides its kind and name.
///
/// Exactly one of `callable` / `logic` must be set.
#[derive(Debug, Clone, Default)]
pub struct FunctionDef {
    pub(crate) callable: Option<CallableSource>,
    pub(crate) logic: Option<Logic>,
    pub(crate) request_class: Option<RequestClass>,
    pub(crate) response_class: Option<ResponseClass>,
    pub(crate) sealed: bool,
}

impl FunctionDef {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_logic(logic: Logic) -> Self {
        Self::new().logic(logic)
    }

    pub fn from_callable(callable: CallableSource) -> Self {
        Self::new().callable(callable)
    }

    pub fn logic(mut self, logic: Logic) -> Self {
        self.logic = Some(logic);
        self
    }

    pub fn callable(mut self, callable: CallableSource) -> Self {
        self.callable = Some(callable);
        self
    }

    pub fn request_class(mut self, class: RequestClass) -> Self {
        self.request_class = Some(class);
        self
    }

    pub fn response_class(mut self, class: ResponseClass) -> Self {
        self.response_class = Some(class);
        self
    }

    /// Define the function with composition already forbidden.
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }

    /// The single callable source this definition names.
    pub(crate) fn take_source(&mut self) -> Result<CallableSource, FunctionError> {
        match (self.callable.take(), self.logic.take()) {
            (Some(_), Some(_)) => Err(FunctionError::configuration(
                "both a callable and inline logic were given",
            )),
            (Some(callable), None) => Ok(callable),
            (None, Some(logic)) => Ok(CallableSource::Inline(logic)),
            (None, None) => Err(FunctionError::configuration(
                "no callable or inline logic was given",
            )),
        }
    }
}
