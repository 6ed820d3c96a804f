//! App - アプリケーション層
//!
//! # 主要コンポーネント
//! - **FunctionRegistry**: 名前付き関数と startup task の登録
//! - **AppBuilder**: 起動時検証と startup task の実行
//! - **Runtime**: 名前による関数の実行（server adapter 向け）

pub mod builder;
pub mod registry;
pub mod runtime;

pub use self::builder::{App, AppBuilder, BuildError};
pub use self::registry::{FunctionRegistry, RegistryError};
pub use self::runtime::{Runtime, RuntimeError};
