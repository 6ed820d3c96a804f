//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - startup task を実行してから global store を凍結

use std::sync::Arc;

use super::registry::{FunctionRegistry, RegistryError};
use super::runtime::{self, Runtime, RuntimeError};
use crate::config::RuntimeConfig;
use crate::domain::{FunctionError, FunctionType, Value};
use crate::function::Function;
use crate::globals::GlobalStore;
use crate::observability::AppDescription;

/// AppBuilder はアプリケーションを構築
///
/// # 使用例
/// ```ignore
/// let app = AppBuilder::new()
///     .register(hello)?
///     .register(warm_cache)?
///     .with_config(RuntimeConfig::from_env()?)
///     .build()
///     .await?;
/// ```
///
/// # Fail-fast 設計
/// - build() 時に target が登録済みかチェック
/// - signature type が設定されていれば target の種類と一致するかチェック
/// - startup task の失敗は BuildError::Startup
pub struct AppBuilder {
    registry: FunctionRegistry,
    config: RuntimeConfig,
}

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("target function `{target}` is not registered; registered: {registered:?}")]
    MissingTarget {
        target: String,
        registered: Vec<String>,
    },

    #[error("target `{target}` is {found}, but the signature type is {expected}")]
    SignatureMismatch {
        target: String,
        expected: FunctionType,
        found: FunctionType,
    },

    #[error("startup failed: {0}")]
    Startup(#[source] FunctionError),
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            registry: FunctionRegistry::new(),
            config: RuntimeConfig::default(),
        }
    }

    /// Register a defined function (startup tasks included).
    pub fn register(mut self, function: Function) -> Result<Self, RegistryError> {
        self.registry.add(function)?;
        Ok(self)
    }

    /// Start from an already populated registry.
    pub fn with_registry(mut self, registry: FunctionRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn target(mut self, name: impl Into<String>) -> Self {
        self.config.target = name.into();
        self
    }

    pub fn signature_type(mut self, kind: FunctionType) -> Self {
        self.config.signature_type = Some(kind);
        self
    }

    pub fn freeze_globals(mut self, freeze: bool) -> Self {
        self.config.freeze_globals = freeze;
        self
    }

    /// AppBuilder を構築して App を生成
    ///
    /// # 検証
    /// - target が未登録なら BuildError::MissingTarget
    /// - 種類が signature type と違えば BuildError::SignatureMismatch
    /// - startup task は登録順に一度だけ実行
    pub async fn build(self) -> Result<App, BuildError> {
        let Self { registry, config } = self;

        let target = registry
            .get(&config.target)
            .cloned()
            .ok_or_else(|| BuildError::MissingTarget {
                target: config.target.clone(),
                registered: registry.names(),
            })?;

        if let Some(expected) = config
            .signature_type
            .filter(|kind| *kind != target.function_type())
        {
            return Err(BuildError::SignatureMismatch {
                target: config.target.clone(),
                expected,
                found: target.function_type(),
            });
        }

        let globals = target
            .populate_globals(None)
            .await
            .map_err(BuildError::Startup)?;
        registry
            .run_startup_tasks(&target, &globals)
            .await
            .map_err(BuildError::Startup)?;
        if config.freeze_globals {
            globals.freeze();
        }

        tracing::info!(
            function = %config.target,
            kind = %target.function_type(),
            startup_tasks = registry.startup_tasks().len(),
            frozen = config.freeze_globals,
            "app ready"
        );

        Ok(App {
            target,
            runtime: Runtime::new(Arc::new(registry), globals),
            config,
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// App は起動済みのアプリケーション
///
/// Holds the target function, the shared store its startup tasks filled,
/// and a `Runtime` over every registered function.
#[derive(Debug, Clone)]
pub struct App {
    target: Function,
    runtime: Runtime,
    config: RuntimeConfig,
}

impl App {
    pub fn target(&self) -> &Function {
        &self.target
    }

    pub fn globals(&self) -> &GlobalStore {
        self.runtime.globals()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Invoke the target.
    pub async fn call(&self, request: Value) -> Result<Value, FunctionError> {
        self.target.call(request, self.globals()).await
    }

    /// Invoke a typed target with a wire body.
    pub async fn call_wire(&self, body: &[u8]) -> Result<Vec<u8>, RuntimeError> {
        runtime::call_wire(&self.target, body, self.globals()).await
    }

    pub fn describe(&self) -> AppDescription {
        let registry = self.runtime.registry();
        AppDescription {
            target: self.target.summary(),
            functions: registry
                .names()
                .iter()
                .filter_map(|name| registry.get(name))
                .map(Function::summary)
                .collect(),
            startup_tasks: registry.startup_tasks().len(),
            globals: self.globals().counts(),
            globals_frozen: self.globals().is_frozen(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::Logic;
    use crate::function::FunctionDef;
    use crate::globals::FUNCTION_NAME_KEY;
    use rstest::rstest;

    fn hello() -> Function {
        Function::http(
            "hello",
            FunctionDef::from_logic(Logic::nullary_sync(|_cx| Ok(Value::from("hello")))),
        )
        .unwrap()
    }

    fn set_foo() -> Function {
        Function::startup_task(FunctionDef::from_logic(Logic::nullary_sync(|cx| {
            cx.set_global("foo", Value::from("bar"))?;
            Ok(Value::nil())
        })))
        .unwrap()
    }

    #[tokio::test]
    async fn test_build_success() {
        let app = AppBuilder::new()
            .register(hello())
            .unwrap()
            .register(set_foo())
            .unwrap()
            .target("hello")
            .build()
            .await
            .unwrap();

        assert_eq!(app.target().name(), Some("hello"));
        let out = app.call(Value::from("the-request")).await.unwrap();
        assert_eq!(out.as_str(), Some("hello"));

        let foo = app.globals().get("foo").await.unwrap().unwrap();
        assert_eq!(foo.as_str(), Some("bar"));
        let name = app.globals().get(FUNCTION_NAME_KEY).await.unwrap().unwrap();
        assert_eq!(name.as_str(), Some("hello"));
    }

    #[tokio::test]
    async fn test_build_missing_target() {
        let result = AppBuilder::new()
            .register(hello())
            .unwrap()
            .build()
            .await;
        assert!(matches!(
            result,
            Err(BuildError::MissingTarget { target, registered })
                if target == "function" && registered == vec!["hello".to_string()]
        ));
    }

    #[rstest]
    #[case::matches(FunctionType::Http, true)]
    #[case::mismatch(FunctionType::CloudEvent, false)]
    #[tokio::test]
    async fn test_build_checks_signature_type(#[case] kind: FunctionType, #[case] ok: bool) {
        let result = AppBuilder::new()
            .register(hello())
            .unwrap()
            .target("hello")
            .signature_type(kind)
            .build()
            .await;
        assert_eq!(result.is_ok(), ok);
    }

    #[tokio::test]
    async fn test_failing_startup_task_aborts_build() {
        let failing = Function::startup_task(FunctionDef::from_logic(Logic::nullary_sync(|_cx| {
            Err(FunctionError::failed("cache unreachable"))
        })))
        .unwrap();
        let result = AppBuilder::new()
            .register(hello())
            .unwrap()
            .register(failing)
            .unwrap()
            .target("hello")
            .build()
            .await;
        assert!(matches!(result, Err(BuildError::Startup(e)) if e.to_string() == "cache unreachable"));
    }

    #[rstest]
    #[case::frozen(true)]
    #[case::writable(false)]
    #[tokio::test]
    async fn test_freeze_globals_after_startup(#[case] freeze: bool) {
        let app = AppBuilder::new()
            .register(hello())
            .unwrap()
            .register(set_foo())
            .unwrap()
            .target("hello")
            .freeze_globals(freeze)
            .build()
            .await
            .unwrap();

        assert_eq!(app.globals().is_frozen(), freeze);
        assert_eq!(app.globals().set("late", Value::nil()).is_err(), freeze);
    }

    #[tokio::test]
    async fn test_describe() {
        let app = AppBuilder::new()
            .register(hello())
            .unwrap()
            .register(set_foo())
            .unwrap()
            .with_config(RuntimeConfig {
                target: "hello".to_string(),
                ..RuntimeConfig::default()
            })
            .build()
            .await
            .unwrap();

        let d = app.describe();
        assert_eq!(d.target.name.as_deref(), Some("hello"));
        assert_eq!(d.functions.len(), 1);
        assert_eq!(d.startup_tasks, 1);
        assert!(d.globals_frozen);
        // function_name, function_type, foo
        assert_eq!(d.globals.resolved, 3);
    }
}
