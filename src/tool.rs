use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::Result;

/// A server-side capability the model may request by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the expected input, forwarded verbatim to the model.
    fn input_schema(&self) -> Value {
        json!({"type": "object"})
    }

    async fn call(&self, input: Value) -> Result<Value>;
}

/// Declaration handed to the model provider on every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Name-keyed tool dispatch. Keeps registration order so `describe` is a
/// stable, ordered sequence.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any existing tool with the same name.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        self.tools.retain(|existing| existing.name() != name);
        self.tools.push(Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools
            .iter()
            .find(|tool| tool.name() == name)
            .map(Arc::clone)
    }

    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|tool| tool.name().into()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn describe(&self) -> Vec<ToolSpec> {
        self.tools
            .iter()
            .map(|tool| ToolSpec {
                name: tool.name().into(),
                description: tool.description().into(),
                input_schema: tool.input_schema(),
            })
            .collect()
    }

    /// Dispatch by name. Never fails: unknown tools and tool errors become
    /// `{"error": reason}` payloads so the loop always has a result to hand
    /// back to the model.
    pub async fn execute(&self, name: &str, input: Value) -> Value {
        let Some(tool) = self.get(name) else {
            tracing::warn!(tool = name, "model requested an unregistered tool");
            return json!({"error": format!("unknown tool `{name}`")});
        };
        match tool.call(input).await {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(tool = name, error = %err, "tool call failed");
                json!({"error": err.to_string()})
            }
        }
    }
}
