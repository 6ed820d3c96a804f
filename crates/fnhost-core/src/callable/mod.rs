//! Callable - 関数ロジックの解決と呼び出し
//!
//! - **source**: how logic is supplied (`Logic`, `Callable`, `CallableClass`)
//! - **resolver**: turns a source into a `CallableType`
//! - **arity**: calls logic with zero or one argument

pub mod arity;
pub mod resolver;
pub mod source;

pub use self::arity::{Arity, ArityAdapter};
pub use self::resolver::{CallableResolver, CallableType, SourceKind};
pub use self::source::{Callable, CallableClass, CallableSource, FromGlobals, Logic};
