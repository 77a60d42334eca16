use std::sync::Arc;
use tooltalk_core::{Error, Result, Tool};

/// A registry of tools, preserving registration order.
///
/// The orchestration loops execute invocations strictly in block order and
/// advertise tools in registration order, so the registry is backed by a
/// `Vec` rather than a map; lookups scan linearly, which is fine at the
/// handful-of-tools scale this runs at.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registers a tool. Duplicate names are rejected; the catalog prompt
    /// would otherwise advertise an ambiguous name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        if self.get(tool.name()).is_some() {
            return Err(Error::message(format!(
                "Tool '{}' is already registered",
                tool.name()
            )));
        }
        tracing::debug!(tool_name = %tool.name(), "Registered tool");
        self.tools.push(tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Tool>> {
        self.tools.iter()
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
        f.debug_list()
            .entries(self.tools.iter().map(|t| t.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::create_echo_tool;

    #[test]
    fn test_registration_order_preserved() {
        let mut registry = ToolRegistry::new();
        for name in ["alpha", "beta", "gamma"] {
            let tool = crate::FunctionTool::builder()
                .name(name)
                .description("test tool")
                .execute(|_| async {
                    Ok(tooltalk_core::ToolResponse {
                        result: serde_json::Value::Null,
                    })
                })
                .build()
                .unwrap();
            registry.register(Arc::new(tool)).unwrap();
        }

        let names: Vec<&str> = registry.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
        assert!(registry.get("beta").is_some());
        assert!(registry.get("delta").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(create_echo_tool().unwrap()))
            .unwrap();
        let result = registry.register(Arc::new(create_echo_tool().unwrap()));
        assert!(result.is_err());
        assert_eq!(registry.len(), 1);
    }
}
