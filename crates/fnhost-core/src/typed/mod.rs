//! Typed - 型付き関数 API
//!
//! - **codec**: request/response classes and the adapter-facing `WireCodec`
//! - **handler**: `TypedHandler<Req>` and its type-erased `Callable` wrapper

pub mod codec;
pub mod handler;

pub use self::codec::{RequestClass, ResponseClass, WireCodec};
pub use self::handler::{TypedCallable, TypedHandler, define};
