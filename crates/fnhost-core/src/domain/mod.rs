//! Domain model (function kinds, opaque values, events, errors).

pub mod errors;
pub mod event;
pub mod function_type;
pub mod value;

pub use self::errors::{BoxError, ErrorKind, FunctionError};
pub use self::event::CloudEvent;
pub use self::function_type::FunctionType;
pub use self::value::Value;
