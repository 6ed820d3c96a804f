use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use fnhost_core::config::TARGET_ENV;
use fnhost_core::typed;
use fnhost_core::{
    AppBuilder, CallContext, CapabilityLayer, CloudEvent, FunctionDef, FunctionError,
    FunctionRegistry, FunctionType, Logic, RuntimeConfig, TypedHandler, Value,
};

#[derive(Debug, Clone, Deserialize)]
struct AddRequest {
    a: i64,
    b: i64,
}

#[derive(Debug, Serialize)]
struct AddResponse {
    sum: i64,
}

struct Adder;

#[async_trait]
impl TypedHandler<AddRequest> for Adder {
    type Response = AddResponse;

    async fn handle(&self, _cx: &CallContext, req: AddRequest) -> Result<AddResponse, FunctionError> {
        Ok(AddResponse { sum: req.a + req.b })
    }
}

/// 登録：http / cloud_event / typed の関数と startup task
fn registry() -> Result<FunctionRegistry, Box<dyn std::error::Error>> {
    let mut registry = FunctionRegistry::new();

    // greeting は startup task が遅延初期化する
    let hello = registry.add_http(
        "hello",
        FunctionDef::from_logic(Logic::unary(|cx, req| async move {
            let greeting = cx
                .global("greeting")
                .await?
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| "hello".to_string());
            let who = req.as_str().unwrap_or("world").to_string();
            Ok(Value::new(format!("{greeting}, {who}")))
        })),
    )?;
    hello.include(CapabilityLayer::new("shout").on_call(Logic::unary(|cx, req| async move {
        let inner = cx.call_next(Some(req)).await?;
        Ok(Value::new(format!("{}!", inner.as_str().unwrap_or_default())))
    })))?;

    registry.add_cloud_event(
        "on_event",
        FunctionDef::from_logic(Logic::unary_sync(|cx, event| {
            let event = event.downcast_ref::<CloudEvent>().ok_or_else(|| {
                FunctionError::failed(format!("expected a CloudEvent, got {}", event.type_name()))
            })?;
            tracing::info!(
                invocation = %cx.invocation_id(),
                id = %event.id,
                source = %event.source,
                "event received"
            );
            Ok(Value::nil())
        })),
    )?;

    registry.add(typed::define("add", Adder)?)?;

    registry.add_startup_task(FunctionDef::from_logic(Logic::unary_sync(|cx, target| {
        let target_name = target
            .downcast_ref::<fnhost_core::Function>()
            .and_then(|f| f.name().map(str::to_string))
            .unwrap_or_default();
        cx.set_lazy_global("greeting", move || {
            let target_name = target_name.clone();
            async move { Ok(Value::new(format!("hello from {target_name}"))) }
        })?;
        Ok(Value::nil())
    })))?;

    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // (A) 設定：FUNCTION_TARGET が無ければ hello を使う
    let mut config = RuntimeConfig::from_env()?;
    if std::env::var_os(TARGET_ENV).is_none() {
        config.target = "hello".to_string();
    }

    // (B) 構築（startup task はここで一度だけ走る）
    let app = AppBuilder::new()
        .with_registry(registry()?)
        .with_config(config)
        .build()
        .await?;

    // (C) target を呼ぶ
    let arg = std::env::args().nth(1);
    match app.target().function_type() {
        FunctionType::Typed => {
            let body = arg.unwrap_or_else(|| r#"{"a":2,"b":40}"#.to_string());
            let out = app.call_wire(body.as_bytes()).await?;
            println!("response: {}", String::from_utf8_lossy(&out));
        }
        FunctionType::CloudEvent => {
            let event = CloudEvent::new("1", "fnhost-cli", "demo.triggered")
                .with_data(serde_json::json!({ "arg": arg }));
            app.call(Value::new(event)).await?;
            println!("event delivered");
        }
        FunctionType::Http | FunctionType::StartupTask => {
            let out = app.call(Value::new(arg.unwrap_or_else(|| "world".to_string()))).await?;
            println!("response: {}", out.as_str().unwrap_or("<non-string response>"));
        }
    }

    // (D) 状態を表示
    println!("{}", serde_json::to_string_pretty(&app.describe())?);
    Ok(())
}
