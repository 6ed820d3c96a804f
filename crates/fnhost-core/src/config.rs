//! Config - 実行時設定
//!
//! The host reads which function to serve and how from the environment:
//!
//! | variable | field | default |
//! |---|---|---|
//! | `FUNCTION_TARGET` | `target` | `function` |
//! | `FUNCTION_SIGNATURE_TYPE` | `signature_type` | none |
//! | `FUNCTION_FREEZE_GLOBALS` | `freeze_globals` | `true` |

use serde::{Deserialize, Serialize};

use crate::domain::{FunctionError, FunctionType};

pub const TARGET_ENV: &str = "FUNCTION_TARGET";
pub const SIGNATURE_TYPE_ENV: &str = "FUNCTION_SIGNATURE_TYPE";
pub const FREEZE_GLOBALS_ENV: &str = "FUNCTION_FREEZE_GLOBALS";

pub const DEFAULT_TARGET: &str = "function";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Name of the function to serve.
    pub target: String,
    /// Expected kind of the target, if the deployment pins one.
    pub signature_type: Option<FunctionType>,
    /// Freeze the global store once startup tasks have run.
    pub freeze_globals: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            signature_type: None,
            freeze_globals: true,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, FunctionError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset and blank values fall back to
    /// defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, FunctionError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(target) = read(TARGET_ENV) {
            config.target = target;
        }
        if let Some(kind) = read(SIGNATURE_TYPE_ENV) {
            config.signature_type = Some(kind.parse().map_err(|_| {
                FunctionError::configuration(format!("{SIGNATURE_TYPE_ENV}: unknown function type `{kind}`"))
            })?);
        }
        if let Some(flag) = read(FREEZE_GLOBALS_ENV) {
            config.freeze_globals = parse_bool(&flag).ok_or_else(|| {
                FunctionError::configuration(format!("{FREEZE_GLOBALS_ENV}: expected a boolean, got `{flag}`"))
            })?;
        }
        Ok(config)
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
