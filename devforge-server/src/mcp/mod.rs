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

//! Model Context Protocol (MCP) Server Implementation
//!
//! Exposes the platform (service catalog, analytics, workflows) to AI
//! assistants over JSON-RPC 2.0.
//!
//! ## Primitives
//!
//! - **Tools**: eight platform operations, see [`tools`]
//! - **Resources**: read-only views under `devforge://`, see [`resources`]
//!
//! ## Transports
//!
//! - stdio, one message per line ([`transport::StdioTransport`])
//! - HTTP `POST /mcp` ([`server::McpServer`])
//!
//! ```rust,ignore
//! let handler = Arc::new(McpHandler::new(PlatformContext::from_config(&config)?)?);
//! let router = McpServer::new(handler, Duration::from_secs(30)).router();
//! ```

pub mod context;
pub mod handlers;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;
pub mod transport;

pub use context::PlatformContext;
pub use handlers::McpHandler;
pub use protocol::*;
pub use server::McpServer;
pub use tools::registry::{McpTool, RegistrationError, ToolContext, ToolError, ToolRegistry, ToolResult};
pub use transport::{serve_transport, BufferTransport, LineTransport, McpTransport, StdioTransport, TransportError};
