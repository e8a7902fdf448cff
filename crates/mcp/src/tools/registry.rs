// Tool trait, outcome type and the ordered tool catalog

use crate::error::RegistryError;
use crate::protocol::ToolSchema;
use anyhow::Result;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of a tool invocation.
///
/// `Failure` is an expected, user-facing problem (bad input, backend error)
/// and is reported in-band. Unexpected conditions are `Err` from
/// [`Tool::execute`] instead.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Success(Value),
    Failure(String),
}

impl ToolOutcome {
    pub fn success(value: impl Into<Value>) -> Self {
        Self::Success(value.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Success(Value::String(text.into()))
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with the call's `arguments` object
    async fn execute(&self, arguments: Map<String, Value>) -> Result<ToolOutcome>;
}

/// Tool catalog, listed in registration order.
///
/// Schemas are captured once at registration so listing never calls back
/// into the tools and always yields the same bytes.
#[derive(Default)]
pub struct ToolRegistry {
    schemas: Vec<ToolSchema>,
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let schema = tool.schema();
        if self.index.contains_key(&schema.name) {
            return Err(RegistryError::DuplicateTool(schema.name));
        }

        self.index.insert(schema.name.clone(), self.tools.len());
        self.schemas.push(schema);
        self.tools.push(tool);
        Ok(())
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| self.tools[i].clone())
    }

    /// All tool schemas in registration order
    pub fn list_schemas(&self) -> &[ToolSchema] {
        &self.schemas
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.index.keys().collect::<Vec<_>>())
            .finish()
    }
}

// Helper functions for creating tool schemas

/// Object schema that rejects properties it does not declare.
pub fn json_schema_object(properties: Value, required: Vec<&str>) -> Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}

pub fn json_schema_string(description: &str) -> Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_integer(description: &str, minimum: i64, maximum: Option<i64>) -> Value {
    let mut schema = serde_json::json!({
        "type": "integer",
        "description": description,
        "minimum": minimum
    });
    if let Some(maximum) = maximum {
        schema["maximum"] = maximum.into();
    }
    schema
}

pub fn json_schema_boolean(description: &str) -> Value {
    serde_json::json!({
        "type": "boolean",
        "description": description
    })
}
