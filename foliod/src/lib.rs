//! Folio daemon library
//!
//! Wires the portfolio service (mutation orchestrator + queries) to the
//! MCP protocol adapter, configuration, and the report writer.

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod mcp;
pub mod report;
pub mod service;

pub use config::{Config, Environment};
pub use error::{ServiceError, ServiceResult};
pub use mcp::{create_router, ApiState};
pub use service::PortfolioService;
