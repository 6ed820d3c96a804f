//! CloudEvent - cloud_event 関数に渡されるイベント
//!
//! Only the decoded shape lives here. Turning structured or binary wire
//! payloads into a `CloudEvent` is the server adapter's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudEvent {
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default = "default_spec_version")]
    pub specversion: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

fn default_spec_version() -> String {
    "1.0".to_string()
}

impl CloudEvent {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            event_type: event_type.into(),
            specversion: default_spec_version(),
            subject: None,
            time: None,
            datacontenttype: None,
            data: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.datacontenttype = Some("application/json".to_string());
        self.data = Some(data);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_json_uses_type_attribute() {
        let ev = CloudEvent::new("1", "//storage", "object.finalize")
            .with_data(serde_json::json!({"bucket": "b"}));
        let v = serde_json::to_value(&ev).unwrap();
        assert_eq!(v["type"], "object.finalize");
        assert_eq!(v["specversion"], "1.0");
        assert_eq!(v["data"]["bucket"], "b");
        assert!(v.get("subject").is_none());
    }

    #[test]
    fn specversion_defaults_when_missing() {
        let ev: CloudEvent = serde_json::from_value(serde_json::json!({
            "id": "42",
            "source": "//pubsub",
            "type": "message.published",
            "time": "2024-05-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(ev.specversion, "1.0");
        assert!(ev.time.is_some());
        assert!(ev.data.is_none());
    }
}
