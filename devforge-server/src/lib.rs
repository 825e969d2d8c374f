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

//! DevForge MCP server: exposes the platform intelligence in `devforge-core`
//! to AI assistants over the Model Context Protocol.

pub mod config;
pub mod mcp;

use anyhow::Result;
use config::{LogFormat, ServerConfig, TransportKind};
use mcp::{serve_transport, McpHandler, McpServer, PlatformContext, StdioTransport};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "devforge_server=info,devforge_core=info,tower_http=info";

/// Install the global subscriber. In stdio mode logs go to stderr so stdout
/// carries protocol messages only.
pub fn init_tracing(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let writer = match config.server.transport {
        TransportKind::Stdio => BoxMakeWriter::new(std::io::stderr),
        TransportKind::Http => BoxMakeWriter::new(std::io::stdout),
    };
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(writer);

    let registry = tracing_subscriber::registry().with(filter);
    match config.server.log_format {
        LogFormat::Json => registry.with(fmt_layer.json()).init(),
        LogFormat::Text => registry.with(fmt_layer).init(),
    }
}

pub async fn run_server(config: ServerConfig) -> Result<()> {
    init_tracing(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        transport = ?config.server.transport,
        "Starting DevForge MCP server"
    );
    tracing::debug!("Configuration: {:#?}", config);

    config.validate()?;

    let context = PlatformContext::from_config(&config)?;
    let handler = Arc::new(McpHandler::new(context)?);
    let timeout = Duration::from_secs(config.server.request_timeout_secs);

    match config.server.transport {
        TransportKind::Stdio => {
            let mut transport = StdioTransport::stdio();
            info!("MCP server reading from stdin");
            tokio::select! {
                result = serve_transport(&handler, &mut transport, timeout) => result?,
                _ = shutdown_signal() => info!("Shutdown signal received"),
            }
        }
        TransportKind::Http => {
            let addr = config.socket_addr()?;
            let app = McpServer::new(handler, timeout)
                .router()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(TraceLayer::new_for_http());

            let listener = tokio::net::TcpListener::bind(addr).await?;
            info!(%addr, "MCP server listening on http://{}/mcp", addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
    }

    info!("DevForge MCP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
