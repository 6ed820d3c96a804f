//! Errors - エラー型と分類
//!
//! Definition-time problems (`Configuration`, `Composition`) surface
//! synchronously where the function is built or extended. Failures raised by
//! user logic travel back to the caller untouched.

use std::sync::Arc;

use thiserror::Error;

/// Boxed error produced by user logic.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// ErrorKind は FunctionError の運用分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid definition: bad request class, unsupported arity, missing logic.
    Configuration,
    /// Illegal post-hoc capability addition.
    Composition,
    /// Anything raised while a function runs.
    Invocation,
    /// A lazy global initializer failed.
    GlobalResolution,
    /// Wire decode/encode failure for typed functions.
    Codec,
}

#[derive(Debug, Error)]
pub enum FunctionError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cannot compose onto function `{function}`: {reason}")]
    Composition { function: String, reason: String },

    #[error("{0}")]
    Invocation(BoxError),

    #[error("global `{key}` failed to resolve: {source}")]
    GlobalResolution {
        key: String,
        /// Shared by every caller that waited on the same run.
        #[source]
        source: Arc<FunctionError>,
    },

    #[error("no behavior `{method}` defined below layer `{layer}`")]
    MissingBehavior { method: String, layer: String },

    #[error("{what}: expected {expected}, found {found}")]
    TypeMismatch {
        what: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("function `{0}` requires a request argument")]
    MissingRequest(String),

    #[error("codec error ({class}): {message}")]
    Codec { class: String, message: String },

    #[error("globals are frozen; cannot set `{0}`")]
    FrozenGlobals(String),
}

impl FunctionError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Wrap an arbitrary error raised by user logic.
    pub fn invocation(err: impl Into<BoxError>) -> Self {
        Self::Invocation(err.into())
    }

    /// Shorthand for a user failure carrying only a message.
    pub fn failed(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self::Invocation(message.into())
    }

    pub fn codec(class: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Codec {
            class: class.into(),
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) | Self::FrozenGlobals(_) => ErrorKind::Configuration,
            Self::Composition { .. } => ErrorKind::Composition,
            Self::GlobalResolution { .. } => ErrorKind::GlobalResolution,
            Self::Codec { .. } => ErrorKind::Codec,
            Self::Invocation(_)
            | Self::MissingBehavior { .. }
            | Self::TypeMismatch { .. }
            | Self::MissingRequest(_) => ErrorKind::Invocation,
        }
    }

    /// True for errors that can only come from a bad definition.
    pub fn is_definition_error(&self) -> bool {
        matches!(self.kind(), ErrorKind::Configuration | ErrorKind::Composition)
    }
}
