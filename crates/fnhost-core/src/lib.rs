//! fnhost-core
//!
//! Function-invocation core for a serverless-function host.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（FunctionType, Value, CloudEvent, errors）
//! - **globals**: 遅延初期化付きの共有 GlobalStore
//! - **callable**: ロジックの供給方法の解決（inline / instance / type）と arity 適応
//! - **compose**: capability layer の合成と呼び出しチェーン
//! - **function**: Function 集約（define, call, include, populate_globals）
//! - **typed**: 型付き関数 API（TypedHandler, RequestClass, ResponseClass, WireCodec）
//! - **app**: FunctionRegistry, AppBuilder, Runtime
//! - **config**: 環境変数からの RuntimeConfig
//! - **observability**: シリアライズ可能な状態ビュー

pub mod app;
pub mod callable;
pub mod compose;
pub mod config;
pub mod domain;
pub mod function;
pub mod globals;
pub mod observability;
pub mod typed;

pub use crate::app::{App, AppBuilder, BuildError, FunctionRegistry, RegistryError, Runtime, RuntimeError};
pub use crate::callable::{Callable, CallableClass, CallableSource, FromGlobals, Logic};
pub use crate::compose::{CallContext, CapabilityLayer};
pub use crate::config::RuntimeConfig;
pub use crate::domain::{CloudEvent, ErrorKind, FunctionError, FunctionType, Value};
pub use crate::function::{Function, FunctionDef};
pub use crate::globals::GlobalStore;
pub use crate::typed::{RequestClass, ResponseClass, TypedHandler, WireCodec};
