use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

/// Body of the backend's `POST /process` and `POST /process-plan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub message: String,
    #[serde(rename = "sessionId")]
    pub session_id: Option<Uuid>,
}

/// Synchronous agent run returned by the backend.
///
/// Only `steps`, `answer` and `iterations` are relied on; the rest is
/// carried along when the backend provides it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessResponse {
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub steps: Vec<Value>,
    #[serde(default)]
    pub answer: Value,
    #[serde(default)]
    pub iterations: u32,
    /// Present for `/process-plan` responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Vec<Value>>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ProcessResponse {
    /// Payload of the `agent-complete` event that ends a replay.
    pub fn completion(&self) -> Value {
        let mut payload = json!({
            "answer": self.answer,
            "iterations": self.iterations,
            "total_steps": self.steps.len(),
        });
        if let Some(plan) = &self.plan {
            payload["plan"] = Value::Array(plan.clone());
        }
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_summarizes_the_run() {
        let response: ProcessResponse = serde_json::from_value(json!({
            "task": "t",
            "steps": [{"type": "thought"}, {"type": "final_answer"}],
            "answer": "42",
            "iterations": 2,
            "session_id": null
        }))
        .unwrap();

        assert_eq!(
            response.completion(),
            json!({"answer": "42", "iterations": 2, "total_steps": 2})
        );
    }

    #[test]
    fn completion_carries_plan_when_present() {
        let response: ProcessResponse = serde_json::from_value(json!({
            "steps": [],
            "answer": "ok",
            "plan": [{"step": 1}],
            "iterations": 1
        }))
        .unwrap();

        assert_eq!(response.completion()["plan"], json!([{"step": 1}]));
    }

    #[test]
    fn missing_fields_default() {
        let response: ProcessResponse = serde_json::from_str("{}").unwrap();
        assert!(response.steps.is_empty());
        assert_eq!(response.iterations, 0);
        assert!(response.answer.is_null());
    }
}
