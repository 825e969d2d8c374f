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

//! Tool calls against the demo platform, driven through the JSON-RPC handler.

mod common;

use common::{call_tool, context_with, demo_handler, demo_snapshot, request};
use devforge_core::workflow::{NodeDelays, SimulationSettings};
use devforge_server::mcp::{McpHandler, INTERNAL_ERROR, INVALID_PARAMS};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_service_info_resolves_relations() {
    let handler = demo_handler();
    let info = call_tool(&handler, "get_service_info", json!({ "serviceName": "User-Service" })).await;

    assert_eq!(info["basic"]["name"], "user-service");
    assert_eq!(info["basic"]["language"], json!(["TypeScript"]));
    assert_eq!(info["team"]["displayName"], "Identity & Access");
    assert_eq!(info["team"]["members"][0]["name"], "Erin Park");

    let depends_on: Vec<&str> = info["dependencies"]["dependsOn"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["name"].as_str().unwrap())
        .collect();
    assert_eq!(depends_on, vec!["user-db", "event-bus"]);
    assert_eq!(info["dependencies"]["dependents"].as_array().unwrap().len(), 2);

    // one INVESTIGATING incident
    assert_eq!(info["health"]["activeIncidents"], 1);
    assert_eq!(info["deployments"]["recent"][0]["version"], "2.14.0");
}

#[tokio::test]
async fn test_service_info_miss_suggests_names() {
    let handler = demo_handler();
    let body = call_tool(&handler, "get_service_info", json!({ "serviceName": "user" })).await;
    assert_eq!(body["error"], "Service \"user\" not found");
    assert_eq!(body["suggestions"], json!(["user-service", "user-db"]));
}

#[tokio::test]
async fn test_list_services_filters() {
    let handler = demo_handler();

    let payments = call_tool(&handler, "list_services", json!({ "team": "PAYMENTS" })).await;
    assert_eq!(payments["totalCount"], 3);
    let names: Vec<&str> = payments["services"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["billing-service", "legacy-billing", "payment-service"]);
    assert_eq!(payments["filters"]["team"], "PAYMENTS");

    let go = call_tool(&handler, "list_services", json!({ "language": "go" })).await;
    assert_eq!(go["totalCount"], 2);

    let queues = call_tool(&handler, "list_services", json!({ "type": "QUEUE", "limit": 1 })).await;
    assert_eq!(queues["services"][0]["name"], "event-bus");
    assert_eq!(queues["services"][0]["dependentCount"], 4);
}

#[tokio::test]
async fn test_dependency_graph() {
    let handler = demo_handler();
    let body = call_tool(
        &handler,
        "get_service_dependencies",
        json!({ "serviceName": "api-gateway", "depth": 1 }),
    )
    .await;

    assert_eq!(body["rootService"], "api-gateway");
    let graph = &body["graph"];
    assert_eq!(graph["service"]["name"], "api-gateway");
    assert_eq!(graph["dependencies"].as_array().unwrap().len(), 3);
    assert!(graph["dependents"].as_array().unwrap().is_empty());
    assert!(graph["dependencies"][0]["children"].is_null());

    let zero = call_tool(
        &handler,
        "get_service_dependencies",
        json!({ "serviceName": "api-gateway", "depth": 0 }),
    )
    .await;
    assert!(zero["graph"].is_null());
}

#[tokio::test]
async fn test_depth_out_of_range_is_rejected() {
    let response = demo_handler()
        .handle_request(request(
            1,
            "tools/call",
            json!({ "name": "get_service_dependencies", "arguments": { "serviceName": "api-gateway", "depth": 11 } }),
        ))
        .await;
    assert_eq!(response.error.unwrap().code, INVALID_PARAMS);
}

#[tokio::test]
async fn test_service_metrics() {
    let handler = demo_handler();
    let body = call_tool(
        &handler,
        "get_service_metrics",
        json!({ "serviceName": "user-service", "timeRange": "24h", "metrics": ["response_time", "error_rate"] }),
    )
    .await;

    assert_eq!(body["service"]["name"], "user-service");
    assert_eq!(body["timeRange"], "24h");
    let metrics = body["metrics"].as_object().unwrap();
    assert_eq!(metrics.len(), 2);
    let response_time = &metrics["response_time"];
    assert!(response_time["min"].as_f64().unwrap() <= response_time["average"].as_f64().unwrap());
    assert!(response_time["average"].as_f64().unwrap() <= response_time["max"].as_f64().unwrap());

    let miss = call_tool(&handler, "get_service_metrics", json!({ "serviceName": "user" })).await;
    assert_eq!(miss["error"], "Service \"user\" not found");
    assert!(miss.get("suggestions").is_none());
}

#[tokio::test]
async fn test_incidents() {
    let handler = demo_handler();

    let open = call_tool(&handler, "get_incidents", json!({ "status": "OPEN" })).await;
    assert_eq!(open["totalCount"], 2);
    assert_eq!(open["incidents"][0]["id"], "inc-102");
    assert_eq!(open["incidents"][0]["service"]["team"], "Platform Engineering");

    let user = call_tool(&handler, "get_incidents", json!({ "serviceName": "user-service" })).await;
    assert_eq!(user["totalCount"], 2);
    assert_eq!(user["summary"]["activeCount"], 1);
}

#[tokio::test]
async fn test_platform_health() {
    let handler = demo_handler();
    let body = call_tool(
        &handler,
        "analyze_platform_health",
        json!({ "includeRecommendations": false }),
    )
    .await;

    let score = body["overall"]["score"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&score));
    assert_eq!(body["statistics"]["services"], 9);
    assert_eq!(body["statistics"]["teams"], 3);
    assert!(body.get("recommendations").is_none());
}

#[tokio::test]
async fn test_workflow_execution_round_trip() {
    let handler = demo_handler();
    let started = call_tool(
        &handler,
        "execute_workflow",
        json!({ "workflowName": "deploy service", "parameters": { "version": "2.15.0" } }),
    )
    .await;

    assert_eq!(started["status"], "SUCCESS");
    assert_eq!(started["environment"], "DEVELOPMENT");
    assert_eq!(started["parameters"], json!({ "version": "2.15.0" }));
    assert_eq!(started["message"], "Workflow \"deploy service\" execution initiated");
    let execution_id = started["executionId"].as_str().unwrap().to_string();

    let status = call_tool(&handler, "get_workflow_status", json!({ "executionId": execution_id })).await;
    assert_eq!(status["status"], "SUCCESS");
    assert_eq!(status["workflow"]["name"], "Deploy Service");
    assert_eq!(status["triggeredBy"], "system");
    assert_eq!(status["nodeExecutions"].as_array().unwrap().len(), 3);
    assert!(status["completedAt"].is_string());
}

#[tokio::test]
async fn test_workflow_misses() {
    let handler = demo_handler();

    let body = call_tool(&handler, "execute_workflow", json!({ "workflowName": "deploy" })).await;
    assert_eq!(body["error"], "Workflow \"deploy\" not found or not active");
    assert_eq!(body["suggestions"], json!(["Deploy Service", "Rollback Deployment"]));

    // drafts cannot run
    let draft = call_tool(&handler, "execute_workflow", json!({ "workflowName": "Chaos Experiment" })).await;
    assert!(draft["error"].is_string());

    let status = call_tool(&handler, "get_workflow_status", json!({ "executionId": "exec-999" })).await;
    assert_eq!(status["error"], "Workflow execution \"exec-999\" not found");
    assert!(status.get("suggestions").is_none());
}

#[tokio::test]
async fn test_slow_request_times_out() {
    let settings = SimulationSettings {
        delays: NodeDelays {
            deploy_ms: 5_000,
            ..NodeDelays::none()
        },
        test_failure_rate: 0.0,
    };
    let handler = McpHandler::new(context_with(demo_snapshot(), settings)).unwrap();

    let response = handler
        .handle_with_timeout(
            request(
                9,
                "tools/call",
                json!({ "name": "execute_workflow", "arguments": { "workflowName": "Deploy Service" } }),
            ),
            Duration::from_millis(100),
        )
        .await
        .unwrap();
    let error = response.error.unwrap();
    assert_eq!(error.code, INTERNAL_ERROR);
    assert!(error.message.contains("timed out"));
}
