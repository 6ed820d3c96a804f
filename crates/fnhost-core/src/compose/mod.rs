//! Compose - 関数への振る舞いの後付け
//!
//! - **layer**: `CapabilityLayer`, a named bundle of behaviours
//! - **composer**: the per-function ordered chain of layers
//! - **context**: `CallContext`, the interpreter walking that chain

pub mod composer;
pub mod context;
pub mod layer;

pub use self::composer::{CapabilityComposer, LayerChain};
pub use self::context::CallContext;
pub use self::layer::{CALL, CapabilityLayer};
