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

use anyhow::Result;
use clap::Parser;
use devforge_server::config::{LogFormat, ServerConfig, TransportKind};
use devforge_server::run_server;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "DevForge platform MCP server", long_about = None)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, env = "DEVFORGE_CONFIG")]
    config: Option<PathBuf>,

    /// Transport (overrides config file)
    #[arg(long, value_enum)]
    transport: Option<TransportKind>,

    /// HTTP listen address (overrides config file)
    #[arg(long)]
    listen_addr: Option<String>,

    /// Platform snapshot JSON (overrides config file)
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Log output format (overrides config file)
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = ServerConfig::load(args.config)?;

    // Apply CLI overrides
    if let Some(transport) = args.transport {
        config.server.transport = transport;
    }
    if let Some(addr) = args.listen_addr {
        config.server.listen_addr = addr;
    }
    if let Some(snapshot) = args.snapshot {
        config.storage.snapshot_path = Some(snapshot);
    }
    if let Some(format) = args.log_format {
        config.server.log_format = format;
    }

    run_server(config).await
}
