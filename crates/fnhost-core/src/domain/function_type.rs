//! FunctionType - 関数の種類
//!
//! The kind decides what a function receives: an HTTP request, a decoded
//! CloudEvent, a typed request value, or (for startup tasks) the function
//! being initialised.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::FunctionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionType {
    Http,
    CloudEvent,
    Typed,
    StartupTask,
}

impl FunctionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::CloudEvent => "cloud_event",
            Self::Typed => "typed",
            Self::StartupTask => "startup_task",
        }
    }

    /// Request-serving kinds must be called with a request.
    pub fn requires_request(&self) -> bool {
        !matches!(self, Self::StartupTask)
    }

    /// Request-serving kinds are addressed by name.
    pub fn requires_name(&self) -> bool {
        !matches!(self, Self::StartupTask)
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FunctionType {
    type Err = FunctionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "cloud_event" | "cloudevent" => Ok(Self::CloudEvent),
            "typed" => Ok(Self::Typed),
            "startup_task" => Ok(Self::StartupTask),
            other => Err(FunctionError::configuration(format!(
                "unknown function type `{other}`"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::http("http", FunctionType::Http)]
    #[case::cloud_event("cloud_event", FunctionType::CloudEvent)]
    #[case::cloudevent_alias("cloudevent", FunctionType::CloudEvent)]
    #[case::typed("typed", FunctionType::Typed)]
    #[case::startup("startup_task", FunctionType::StartupTask)]
    #[case::mixed_case(" HTTP ", FunctionType::Http)]
    fn parses_known_types(#[case] raw: &str, #[case] expected: FunctionType) {
        assert_eq!(raw.parse::<FunctionType>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_type() {
        let err = "grpc".parse::<FunctionType>().unwrap_err();
        assert!(err.is_definition_error());
    }

    #[test]
    fn serializes_as_snake_case() {
        let s = serde_json::to_string(&FunctionType::CloudEvent).unwrap();
        assert_eq!(s, "\"cloud_event\"");
        assert_eq!(FunctionType::StartupTask.to_string(), "startup_task");
    }
}
