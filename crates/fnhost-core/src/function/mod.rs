//! Function - 定義・合成・呼び出しの表面

pub mod definition;
pub mod handle;

pub use self::definition::FunctionDef;
pub use self::handle::Function;
