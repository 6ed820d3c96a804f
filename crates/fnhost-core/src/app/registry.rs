//! FunctionRegistry - 関数の登録と管理
//!
//! # 学習ポイント
//! - 名前付き関数は名前で一意、startup task は定義順の列
//! - 登録時に重複を拒否（Fail-fast）

use std::collections::HashMap;

use crate::domain::{FunctionError, FunctionType};
use crate::function::{Function, FunctionDef};
use crate::globals::GlobalStore;

/// RegistryError は FunctionRegistry の操作エラー
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("function `{0}` is already registered")]
    AlreadyRegistered(String),

    #[error(transparent)]
    Function(#[from] FunctionError),
}

/// Named functions plus the startup tasks to run before serving.
///
/// # 使用例
/// ```ignore
/// let mut registry = FunctionRegistry::new();
/// registry.add_http("hello", FunctionDef::from_logic(hello))?;
/// registry.add_startup_task(FunctionDef::from_logic(warm_cache))?;
///
/// let f = registry.get("hello").unwrap();
/// ```
///
/// Built during initialization (mutable), then shared read-only.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Function>,
    startup_tasks: Vec<Function>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an already defined function.
    pub fn add(&mut self, function: Function) -> Result<(), RegistryError> {
        if function.function_type() == FunctionType::StartupTask {
            self.startup_tasks.push(function);
            return Ok(());
        }
        let name = function
            .name()
            .ok_or_else(|| FunctionError::configuration("named function without a name"))?
            .to_string();
        if self.functions.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        self.functions.insert(name, function);
        Ok(())
    }

    pub fn add_http(
        &mut self,
        name: impl Into<String>,
        def: FunctionDef,
    ) -> Result<Function, RegistryError> {
        self.define_and_add(Function::http(name, def)?)
    }

    pub fn add_cloud_event(
        &mut self,
        name: impl Into<String>,
        def: FunctionDef,
    ) -> Result<Function, RegistryError> {
        self.define_and_add(Function::cloud_event(name, def)?)
    }

    pub fn add_typed(
        &mut self,
        name: impl Into<String>,
        def: FunctionDef,
    ) -> Result<Function, RegistryError> {
        self.define_and_add(Function::typed(name, def)?)
    }

    pub fn add_startup_task(&mut self, def: FunctionDef) -> Result<Function, RegistryError> {
        self.define_and_add(Function::startup_task(def)?)
    }

    fn define_and_add(&mut self, function: Function) -> Result<Function, RegistryError> {
        self.add(function.clone())?;
        Ok(function)
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    /// In definition order.
    pub fn startup_tasks(&self) -> &[Function] {
        &self.startup_tasks
    }

    pub fn len(&self) -> usize {
        self.functions.len() + self.startup_tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run every startup task for `target`, in order; the first failure
    /// stops the rest.
    pub async fn run_startup_tasks(
        &self,
        target: &Function,
        globals: &GlobalStore,
    ) -> Result<(), FunctionError> {
        for (index, task) in self.startup_tasks.iter().enumerate() {
            tracing::info!(
                task = index,
                function = target.name().unwrap_or_default(),
                "running startup task"
            );
            task.run_startup(target, globals).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::Logic;
    use crate::domain::Value;

    fn echo() -> FunctionDef {
        FunctionDef::from_logic(Logic::unary(|_cx, req| async move { Ok(req) }))
    }

    fn push(tag: &'static str) -> FunctionDef {
        FunctionDef::from_logic(Logic::nullary(move |cx| async move {
            let so_far = cx
                .global("order")
                .await?
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            cx.set_global("order", Value::new(format!("{so_far}{tag}")))?;
            Ok(Value::nil())
        }))
    }

    #[test]
    fn register_and_get() {
        let mut registry = FunctionRegistry::new();
        registry.add_http("hello", echo()).unwrap();

        let f = registry.get("hello").unwrap();
        assert_eq!(f.function_type(), FunctionType::Http);
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn double_registration() {
        let mut registry = FunctionRegistry::new();
        registry.add_http("hello", echo()).unwrap();
        let result = registry.add_cloud_event("hello", echo());
        assert!(matches!(result, Err(RegistryError::AlreadyRegistered(name)) if name == "hello"));
    }

    #[test]
    fn definition_errors_surface_through_the_registry() {
        let mut registry = FunctionRegistry::new();
        let result = registry.add_http("hello", FunctionDef::new());
        assert!(matches!(
            result,
            Err(RegistryError::Function(FunctionError::Configuration(_)))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn names_are_sorted_and_startup_tasks_never_collide() {
        let mut registry = FunctionRegistry::new();
        registry.add_typed("zeta", echo()).unwrap();
        registry.add_http("alpha", echo()).unwrap();
        registry.add_startup_task(echo()).unwrap();
        registry.add_startup_task(echo()).unwrap();

        assert_eq!(registry.names(), vec!["alpha", "zeta"]);
        assert_eq!(registry.startup_tasks().len(), 2);
        assert_eq!(registry.len(), 4);
    }

    #[tokio::test]
    async fn startup_tasks_run_in_definition_order() {
        let mut registry = FunctionRegistry::new();
        let target = registry.add_http("hello", echo()).unwrap();
        registry.add_startup_task(push("a")).unwrap();
        registry.add_startup_task(push("b")).unwrap();

        let globals = GlobalStore::new();
        registry.run_startup_tasks(&target, &globals).await.unwrap();

        let order = globals.get("order").await.unwrap().unwrap();
        assert_eq!(order.as_str(), Some("ab"));
    }

    #[tokio::test]
    async fn first_failing_startup_task_stops_the_rest() {
        let mut registry = FunctionRegistry::new();
        let target = registry.add_http("hello", echo()).unwrap();
        registry.add_startup_task(push("a")).unwrap();
        registry
            .add_startup_task(FunctionDef::from_logic(Logic::nullary(|_cx| async {
                Err::<Value, _>(FunctionError::failed("no database"))
            })))
            .unwrap();
        registry.add_startup_task(push("c")).unwrap();

        let globals = GlobalStore::new();
        let err = registry
            .run_startup_tasks(&target, &globals)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no database");

        let order = globals.get("order").await.unwrap().unwrap();
        assert_eq!(order.as_str(), Some("a"));
    }
}
