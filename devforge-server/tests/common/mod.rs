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

//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use chrono::Utc;
use devforge_core::dashboard::StaticTelemetryFeed;
use devforge_core::scoring::PlatformScorer;
use devforge_core::store::{MemoryStore, PlatformSnapshot};
use devforge_core::workflow::{ExecutorRegistry, NodeDelays, SimulationSettings, WorkflowRunner};
use devforge_server::mcp::{JsonRpcId, JsonRpcRequest, JsonRpcResponse, McpHandler, PlatformContext};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures/demo-platform.json")
}

/// Demo platform with timestamps moved up to now.
pub fn demo_snapshot() -> PlatformSnapshot {
    let mut snapshot = PlatformSnapshot::load(fixture_path()).expect("fixture loads");
    snapshot.rebase_to(Utc::now());
    snapshot
}

pub fn context_with(snapshot: PlatformSnapshot, settings: SimulationSettings) -> PlatformContext {
    PlatformContext::new(
        Arc::new(MemoryStore::new(snapshot)),
        Arc::new(StaticTelemetryFeed::default()),
        PlatformScorer::default(),
        WorkflowRunner::new(ExecutorRegistry::simulated(&settings)),
    )
}

/// Instant, never-failing workflow nodes.
pub fn instant_settings() -> SimulationSettings {
    SimulationSettings {
        delays: NodeDelays::none(),
        test_failure_rate: 0.0,
    }
}

pub fn demo_handler() -> McpHandler {
    McpHandler::new(context_with(demo_snapshot(), instant_settings())).expect("tools register")
}

pub fn request(id: i64, method: &str, params: Value) -> JsonRpcRequest {
    JsonRpcRequest::new(JsonRpcId::Number(id), method, Some(params))
}

/// Call a tool and decode the JSON inside its text block.
pub async fn call_tool(handler: &McpHandler, name: &str, arguments: Value) -> Value {
    let response = handler
        .handle_request(request(1, "tools/call", json!({ "name": name, "arguments": arguments })))
        .await;
    tool_body(&response)
}

pub fn tool_body(response: &JsonRpcResponse) -> Value {
    let result = response
        .result
        .as_ref()
        .unwrap_or_else(|| panic!("tool call failed: {:?}", response.error));
    assert_eq!(result["content"][0]["type"], "text");
    serde_json::from_str(result["content"][0]["text"].as_str().expect("text block")).expect("JSON text")
}
