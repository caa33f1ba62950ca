//! Tool Registry - central registration and lookup for all tools.
//!
//! This module provides:
//! - [`ToolDescriptor`]: static metadata exposed to clients for discovery
//! - [`ToolRegistry`]: name → (descriptor, handler), in registration order
//!
//! The registry is filled once at startup and only read afterwards, so it is
//! shared behind an `Arc` without locking.

use std::collections::HashMap;
use std::sync::Arc;

use rmcp::model::{JsonObject, Tool};
use serde::Serialize;
use tracing::info;

use super::error::StructuredError;
use super::handlers::ToolHandler;

/// Static metadata describing a tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: JsonObject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<JsonObject>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: JsonObject,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            output_schema: None,
        }
    }

    pub fn with_output_schema(mut self, schema: JsonObject) -> Self {
        self.output_schema = Some(schema);
        self
    }

    /// Create a Tool model for this descriptor (rmcp metadata).
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.clone().into(),
            description: Some(self.description.clone().into()),
            input_schema: Arc::new(self.input_schema.clone()),
            annotations: None,
            output_schema: self.output_schema.clone().map(Arc::new),
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Render in MCP wire casing (`inputSchema`, `outputSchema`).
    pub fn to_mcp_json(&self) -> serde_json::Value {
        let mut value = serde_json::json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema,
        });
        if let (Some(schema), Some(obj)) = (&self.output_schema, value.as_object_mut()) {
            obj.insert("outputSchema".to_string(), schema.clone().into());
        }
        value
    }
}

/// A descriptor bound to its handler.
#[derive(Clone)]
pub struct RegisteredTool {
    descriptor: ToolDescriptor,
    handler: Arc<dyn ToolHandler>,
}

impl RegisteredTool {
    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    pub fn handler(&self) -> &Arc<dyn ToolHandler> {
        &self.handler
    }
}

/// Tool registry - the single source of truth for which tools exist.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool.
    ///
    /// # Panics
    ///
    /// Panics if a tool with the same name is already registered. Tool names
    /// are fixed at build time, so a duplicate is a programming error.
    pub fn register(&mut self, descriptor: ToolDescriptor, handler: Arc<dyn ToolHandler>) {
        assert!(
            !self.by_name.contains_key(&descriptor.name),
            "tool '{}' registered twice",
            descriptor.name
        );

        info!(tool = %descriptor.name, "Tool registered: {}", descriptor.description);
        self.by_name
            .insert(descriptor.name.clone(), self.tools.len());
        self.tools.push(RegisteredTool {
            descriptor,
            handler,
        });
    }

    /// All descriptors in registration order.
    pub fn list(&self) -> Vec<&ToolDescriptor> {
        self.tools.iter().map(|t| &t.descriptor).collect()
    }

    /// Find a tool by name, or fail with MethodNotFound.
    pub fn lookup(&self, name: &str) -> Result<&RegisteredTool, StructuredError> {
        self.by_name
            .get(name)
            .map(|&idx| &self.tools[idx])
            .ok_or_else(|| StructuredError::tool_not_found(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Get all tool names, in registration order.
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.descriptor.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
