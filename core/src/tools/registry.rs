use super::error::{ToolError, ToolResult};
use super::traits::Tool;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// The set of tools exposed to the conversational model for one session.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: Arc<DashMap<String, Arc<dyn Tool>>>,
    call_timeout: Duration,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_CALL_TIMEOUT)
    }

    pub fn with_timeout(call_timeout: Duration) -> Self {
        Self {
            tools: Arc::new(DashMap::new()),
            call_timeout,
        }
    }

    /// Register a tool under its own name. Re-registering replaces.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name();
        info!(target: "tool_registry", tool = %name, "Registering tool");
        self.tools.insert(name, tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).map(|t| t.clone())
    }

    /// All registered tools, for building the model-facing declarations.
    pub fn list(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.iter().map(|t| t.clone()).collect()
    }

    /// Call a tool by name, bounded by the registry's per-call timeout.
    pub async fn call(&self, name: &str, arguments: serde_json::Value) -> ToolResult<serde_json::Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        debug!(target: "tool_registry", tool = %name, "Invoking tool");

        let result = match timeout(self.call_timeout, tool.call(arguments)).await {
            Ok(res) => res,
            Err(_) => {
                warn!(target: "tool_registry", tool = %name, "Tool execution timed out");
                Err(ToolError::Timeout)
            }
        };

        if let Err(e) = &result {
            warn!(target: "tool_registry", tool = %name, error = %e, "Tool execution failed");
        }

        result
    }
}
