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

//! MCP transport abstraction (stdio/in-process).
//!
//! The stdio transport exchanges one JSON-RPC message per line. Stdout
//! carries protocol messages only; logs go to stderr.

use crate::mcp::handlers::McpHandler;
use crate::mcp::protocol::{decode_request, JsonRpcRequest, JsonRpcResponse, MalformedMessage};
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed message: {}", .0.error.message)]
    Malformed(MalformedMessage),
    #[error("Channel closed")]
    ChannelClosed,
}

/// Transport abstraction for MCP JSON-RPC messages.
#[async_trait::async_trait]
pub trait McpTransport: Send {
    /// Receive the next request; `None` once the peer has gone away.
    async fn recv(&mut self) -> Result<Option<JsonRpcRequest>, TransportError>;
    /// Send a JSON-RPC response.
    async fn send(&mut self, response: JsonRpcResponse) -> Result<(), TransportError>;
}

/// Newline-delimited JSON over any byte stream.
pub struct LineTransport<R, W> {
    reader: BufReader<R>,
    writer: BufWriter<W>,
    line: Vec<u8>,
}

/// Line transport over the process's stdin and stdout.
pub type StdioTransport = LineTransport<tokio::io::Stdin, tokio::io::Stdout>;

impl StdioTransport {
    pub fn stdio() -> Self {
        LineTransport::new(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer: BufWriter::new(writer),
            line: Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl<R, W> McpTransport for LineTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn recv(&mut self) -> Result<Option<JsonRpcRequest>, TransportError> {
        loop {
            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line).await? == 0 {
                return Ok(None);
            }
            let line = self.line.trim_ascii();
            if line.is_empty() {
                continue;
            }
            return decode_request(line)
                .map(Some)
                .map_err(TransportError::Malformed);
        }
    }

    async fn send(&mut self, response: JsonRpcResponse) -> Result<(), TransportError> {
        let mut payload = serde_json::to_vec(&response)?;
        payload.push(b'\n');
        self.writer.write_all(&payload).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// Channel-backed transport for tests and in-process use.
pub struct BufferTransport {
    input: mpsc::Receiver<JsonRpcRequest>,
    output: mpsc::Sender<JsonRpcResponse>,
}

impl BufferTransport {
    pub fn new(input: mpsc::Receiver<JsonRpcRequest>, output: mpsc::Sender<JsonRpcResponse>) -> Self {
        Self { input, output }
    }
}

#[async_trait::async_trait]
impl McpTransport for BufferTransport {
    async fn recv(&mut self) -> Result<Option<JsonRpcRequest>, TransportError> {
        Ok(self.input.recv().await)
    }

    async fn send(&mut self, response: JsonRpcResponse) -> Result<(), TransportError> {
        self.output
            .send(response)
            .await
            .map_err(|_| TransportError::ChannelClosed)
    }
}

/// Serve requests from `transport` one at a time until the peer disconnects.
/// Malformed messages are answered with a parse or invalid-request error and
/// skipped.
pub async fn serve_transport<T: McpTransport>(
    handler: &McpHandler,
    transport: &mut T,
    timeout: Duration,
) -> Result<(), TransportError> {
    loop {
        let request = match transport.recv().await {
            Ok(Some(request)) => request,
            Ok(None) => {
                info!("MCP client disconnected");
                return Ok(());
            }
            Err(TransportError::Malformed(malformed)) => {
                warn!(error = %malformed.error.message, "Invalid JSON-RPC message");
                transport.send(malformed.into_response()).await?;
                continue;
            }
            Err(e) => return Err(e),
        };

        debug!(method = %request.method, "MCP message received");
        if let Some(response) = handler.handle_with_timeout(request, timeout).await {
            transport.send(response).await?;
        }
    }
}
