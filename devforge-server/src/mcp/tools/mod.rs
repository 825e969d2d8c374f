// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! MCP tools exposed by the platform server.
//!
//! | tool | module |
//! |------|--------|
//! | `get_service_info`, `list_services`, `get_service_dependencies` | [`catalog`] |
//! | `get_service_metrics`, `get_incidents`, `analyze_platform_health` | [`analytics`] |
//! | `execute_workflow`, `get_workflow_status` | [`workflows`] |
//!
//! Every tool answers with one text block holding pretty-printed JSON. Lookups
//! that miss are answered as results carrying `error` (and for name lookups,
//! `suggestions`), not as JSON-RPC errors.

pub mod analytics;
pub mod catalog;
pub mod params;
pub mod registry;
pub mod workflows;

use crate::mcp::context::PlatformContext;
use std::sync::Arc;

pub use analytics::{AnalyzePlatformHealthTool, GetIncidentsTool, GetServiceMetricsTool};
pub use catalog::{GetServiceDependenciesTool, GetServiceInfoTool, ListServicesTool};
pub use registry::{McpTool, RegistrationError, ToolContext, ToolError, ToolRegistry, ToolResult};
pub use workflows::{ExecuteWorkflowTool, GetWorkflowStatusTool};

/// Most "did you mean" names returned with a miss.
pub const SUGGESTION_LIMIT: usize = 5;

/// Register the platform tool set on `registry`.
pub fn register_platform_tools(
    registry: &ToolRegistry,
    context: &PlatformContext,
) -> Result<(), RegistrationError> {
    let tools: Vec<Arc<dyn McpTool>> = vec![
        Arc::new(GetServiceInfoTool::new(context.clone())),
        Arc::new(ListServicesTool::new(context.clone())),
        Arc::new(GetServiceDependenciesTool::new(context.clone())),
        Arc::new(GetServiceMetricsTool::new(context.clone())),
        Arc::new(GetIncidentsTool::new(context.clone())),
        Arc::new(AnalyzePlatformHealthTool::new(context.clone())),
        Arc::new(ExecuteWorkflowTool::new(context.clone())),
        Arc::new(GetWorkflowStatusTool::new(context.clone())),
    ];
    for tool in tools {
        registry.register(tool)?;
    }
    Ok(())
}
