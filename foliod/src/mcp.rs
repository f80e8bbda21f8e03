//! MCP protocol adapter.
//!
//! Exposes the portfolio operations as MCP tools over JSON-RPC 2.0:
//! POST `/mcp` handles `initialize`, `notifications/initialized`, `ping`,
//! `tools/list` and `tools/call`; GET `/health` pings the store.
//!
//! Operation failures (not found, duplicate, invalid weight sum, ...) are
//! reported as tool results with `isError: true` and a readable message;
//! protocol failures map to JSON-RPC error codes. JSON-RPC errors are still
//! HTTP 200.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

use folio_store::HoldingStore;

use crate::service::{
    AddHoldingParams, DeleteHoldingParams, PortfolioService, RebalanceHoldingsParams,
    ResetPortfolioParams, SetTargetPortfolioParams, UpdateHoldingParams,
};

/// MCP protocol revision this server speaks.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

// =============================================================================
// API State
// =============================================================================

/// Shared state for API handlers.
pub struct ApiState<S: HoldingStore + 'static> {
    pub service: Arc<PortfolioService<S>>,
    pub store: Arc<S>,
}

// =============================================================================
// JSON-RPC types
// =============================================================================

/// Incoming JSON-RPC request envelope.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Outgoing JSON-RPC response envelope.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn failure(id: Value, code: i32, message: &str, data: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.to_string(),
                data: Some(data.into()),
            }),
        }
    }
}

/// MCP tool-call result: text content plus an error flag.
#[derive(Debug, Serialize)]
pub struct ToolCallResponse {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

/// One piece of tool-call content.
#[derive(Debug, Serialize)]
pub struct ToolContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl ToolCallResponse {
    fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent { kind: "text", text: text.into() }],
            is_error: false,
        }
    }

    fn error_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent { kind: "text", text: text.into() }],
            is_error: true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

// =============================================================================
// Router
// =============================================================================

/// Create the API router.
pub fn create_router<S: HoldingStore + 'static>(state: Arc<ApiState<S>>) -> Router {
    Router::new()
        .route("/mcp", post(mcp_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint; pings the store.
async fn health_handler<S: HoldingStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
) -> (StatusCode, &'static str) {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, "OK"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "Store connection failed"),
    }
}

/// JSON-RPC endpoint.
async fn mcp_handler<S: HoldingStore + 'static>(
    State(state): State<Arc<ApiState<S>>>,
    body: String,
) -> Json<JsonRpcResponse> {
    let req: JsonRpcRequest = match serde_json::from_str(&body) {
        Ok(req) => req,
        Err(e) => {
            return Json(JsonRpcResponse::failure(
                Value::Null,
                -32700,
                "Parse error",
                e.to_string(),
            ))
        },
    };

    if req.jsonrpc != "2.0" {
        return Json(JsonRpcResponse::failure(
            req.id,
            -32600,
            "Invalid Request",
            "jsonrpc must be '2.0'",
        ));
    }

    debug!(method = %req.method, "mcp request");

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(req.id),
        "notifications/initialized" => handle_initialized(req.id),
        "ping" => JsonRpcResponse::success(req.id, json!({})),
        "tools/list" => JsonRpcResponse::success(req.id, json!({ "tools": tool_listing() })),
        "tools/call" => handle_tools_call(&state, req.id, req.params).await,
        other => JsonRpcResponse::failure(
            req.id,
            -32601,
            "Method not found",
            format!("Unknown method: {}", other),
        ),
    };

    Json(response)
}

fn handle_initialize(id: Value) -> JsonRpcResponse {
    JsonRpcResponse::success(
        id,
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": "folio",
                "version": env!("CARGO_PKG_VERSION"),
            }
        }),
    )
}

fn handle_initialized(id: Value) -> JsonRpcResponse {
    // Some MCP clients send the notification with a null id but still
    // expect a well-formed response; answer with id 0 in that case.
    let id = if id.is_null() { json!(0) } else { id };
    JsonRpcResponse::success(id, json!({}))
}

async fn handle_tools_call<S: HoldingStore + 'static>(
    state: &ApiState<S>,
    id: Value,
    params: Value,
) -> JsonRpcResponse {
    let call: ToolCallParams = match serde_json::from_value(params) {
        Ok(call) => call,
        Err(e) => {
            return JsonRpcResponse::failure(id, -32602, "Invalid params", e.to_string());
        },
    };

    let result = match dispatch_tool(state, &call.name, call.arguments).await {
        Ok(result) => result,
        Err(rpc_error) => return rpc_error.into_response(id),
    };

    match serde_json::to_value(&result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::failure(id, -32603, "Internal error", e.to_string()),
    }
}

/// Protocol-level dispatch failures (unknown tool, malformed arguments).
enum RpcFailure {
    UnknownTool(String),
    InvalidParams(String),
}

impl RpcFailure {
    fn into_response(self, id: Value) -> JsonRpcResponse {
        match self {
            RpcFailure::UnknownTool(name) => JsonRpcResponse::failure(
                id,
                -32601,
                "Method not found",
                format!("Unknown tool: {}", name),
            ),
            RpcFailure::InvalidParams(detail) => {
                JsonRpcResponse::failure(id, -32602, "Invalid params", detail)
            },
        }
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(arguments: Value) -> Result<T, RpcFailure> {
    // tools/call with no arguments key means an empty object
    let arguments = if arguments.is_null() { json!({}) } else { arguments };
    serde_json::from_value(arguments).map_err(|e| RpcFailure::InvalidParams(e.to_string()))
}

fn pretty(value: &impl Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}

async fn dispatch_tool<S: HoldingStore + 'static>(
    state: &ApiState<S>,
    name: &str,
    arguments: Value,
) -> Result<ToolCallResponse, RpcFailure> {
    let service = &state.service;

    let response = match name {
        "get_holdings" => match service.get_holdings().await {
            Ok(holdings) => ToolCallResponse::text(pretty(&holdings)),
            Err(e) => ToolCallResponse::error_text(format!("Error querying holdings: {}", e)),
        },

        "add_holding" => {
            let params: AddHoldingParams = parse_args(arguments)?;
            let ticker = params.ticker.clone();
            match service.add_holding(params).await {
                Ok(holdings) => ToolCallResponse::text(format!(
                    "Successfully added {} with automatic rebalancing:\n{}",
                    ticker,
                    pretty(&holdings)
                )),
                Err(e) => ToolCallResponse::error_text(format!("Error adding holding: {}", e)),
            }
        },

        "update_holding" => {
            let params: UpdateHoldingParams = parse_args(arguments)?;
            let ticker = params.ticker.clone();
            match service.update_holding(params).await {
                Ok(holding) => ToolCallResponse::text(format!(
                    "Successfully updated {}:\n{}",
                    ticker,
                    pretty(&holding)
                )),
                Err(e) => ToolCallResponse::error_text(format!("Error updating holding: {}", e)),
            }
        },

        "delete_holding" => {
            let params: DeleteHoldingParams = parse_args(arguments)?;
            match service.delete_holding(params).await {
                Ok(ticker) => ToolCallResponse::text(format!(
                    "Successfully deleted {} from portfolio",
                    ticker
                )),
                Err(e) => ToolCallResponse::error_text(format!("Error deleting holding: {}", e)),
            }
        },

        "get_portfolio_summary" => match service.get_portfolio_summary().await {
            Ok(summary) => ToolCallResponse::text(pretty(&summary)),
            Err(e) => ToolCallResponse::error_text(format!("Error getting portfolio summary: {}", e)),
        },

        "rebalance_holdings" => {
            let params: RebalanceHoldingsParams = parse_args(arguments)?;
            match service.rebalance_holdings(params).await {
                Ok(holdings) => ToolCallResponse::text(format!(
                    "Successfully rebalanced holdings:\n{}",
                    pretty(&holdings)
                )),
                Err(e) => ToolCallResponse::error_text(format!("Error rebalancing holdings: {}", e)),
            }
        },

        "reset_portfolio" => {
            let params: ResetPortfolioParams = parse_args(arguments)?;
            match service.reset_portfolio(params).await {
                Ok(()) => ToolCallResponse::text(
                    "Successfully reset portfolio - all holdings removed",
                ),
                Err(e) => ToolCallResponse::error_text(format!("Error resetting portfolio: {}", e)),
            }
        },

        "set_target_portfolio" => {
            let params: SetTargetPortfolioParams = parse_args(arguments)?;
            match service.set_target_portfolio(params).await {
                Ok(holdings) => ToolCallResponse::text(format!(
                    "Successfully set target portfolio with {} holdings:\n{}",
                    holdings.len(),
                    pretty(&holdings)
                )),
                Err(e) => {
                    ToolCallResponse::error_text(format!("Error setting target portfolio: {}", e))
                },
            }
        },

        other => return Err(RpcFailure::UnknownTool(other.to_string())),
    };

    Ok(response)
}

// =============================================================================
// Tool declarations
// =============================================================================

fn tool_listing() -> Value {
    let holding_properties = json!({
        "ticker": { "type": "string", "description": "Stock ticker symbol" },
        "name": { "type": "string", "description": "Company display name" },
        "weight": { "type": "number", "description": "Portfolio weight in percent" },
        "price": { "type": "number", "description": "Current price per share" },
        "comment": { "type": "string", "description": "Optional annotation" },
        "return": { "type": "number", "description": "Optional percentage return" }
    });

    json!([
        {
            "name": "get_holdings",
            "description": "Get all current portfolio holdings",
            "inputSchema": { "type": "object", "properties": {} }
        },
        {
            "name": "add_holding",
            "description": "Add a new holding to the portfolio",
            "inputSchema": {
                "type": "object",
                "properties": holding_properties.clone(),
                "required": ["ticker", "name", "weight", "price"]
            }
        },
        {
            "name": "update_holding",
            "description": "Update an existing portfolio holding",
            "inputSchema": {
                "type": "object",
                "properties": holding_properties.clone(),
                "required": ["ticker"]
            }
        },
        {
            "name": "delete_holding",
            "description": "Delete a holding from the portfolio",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "ticker": { "type": "string", "description": "Stock ticker symbol" }
                },
                "required": ["ticker"]
            }
        },
        {
            "name": "get_portfolio_summary",
            "description": "Get portfolio summary statistics",
            "inputSchema": { "type": "object", "properties": {} }
        },
        {
            "name": "rebalance_holdings",
            "description": "Rebalance portfolio holdings to new weights",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "holdings": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "ticker": { "type": "string" },
                                "weight": { "type": "number" }
                            },
                            "required": ["ticker", "weight"]
                        }
                    }
                },
                "required": ["holdings"]
            }
        },
        {
            "name": "reset_portfolio",
            "description": "Reset the entire portfolio by removing all holdings",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "confirm": { "type": "boolean", "description": "Must be true to reset" }
                },
                "required": ["confirm"]
            }
        },
        {
            "name": "set_target_portfolio",
            "description": "Set the entire portfolio to specified target holdings",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "holdings": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": holding_properties,
                            "required": ["ticker", "name", "weight", "price"]
                        }
                    }
                },
                "required": ["holdings"]
            }
        }
    ])
}
