//! Observability - 状態のスナップショット
//!
//! Serializable views for logs, health endpoints and the CLI's `describe`
//! output. Nothing here mutates state.

use serde::{Deserialize, Serialize};

use crate::callable::SourceKind;
use crate::domain::FunctionType;

/// Resolved vs. still-pending entries in a `GlobalStore`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreCounts {
    pub resolved: usize,
    pub pending: usize,
}

impl StoreCounts {
    pub fn total(&self) -> usize {
        self.resolved + self.pending
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSummary {
    pub name: Option<String>,
    pub function_type: FunctionType,
    pub source_kind: SourceKind,
    pub type_name: String,
    /// Bottom first.
    pub layers: Vec<String>,
    pub sealed: bool,
}

/// What an `App` serves, as reported by `App::describe`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDescription {
    pub target: FunctionSummary,
    /// Every named function, sorted by name.
    pub functions: Vec<FunctionSummary>,
    pub startup_tasks: usize,
    pub globals: StoreCounts,
    pub globals_frozen: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_total() {
        let c = StoreCounts {
            resolved: 2,
            pending: 3,
        };
        assert_eq!(c.total(), 5);
    }

    #[test]
    fn summary_serializes_with_snake_case_kinds() {
        let s = FunctionSummary {
            name: Some("hello".to_string()),
            function_type: FunctionType::CloudEvent,
            source_kind: SourceKind::Inline,
            type_name: "inline".to_string(),
            layers: vec!["inline".to_string()],
            sealed: false,
        };
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["function_type"], "cloud_event");
        assert_eq!(json["source_kind"], "inline");
        assert_eq!(json["layers"], serde_json::json!(["inline"]));
    }
}
