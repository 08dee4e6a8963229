//! Message transport.
//!
//! The protocol speaks newline-delimited JSON: one message per line.
//! `StdioTransport` carries it over stdin/stdout for MCP hosts;
//! `DuplexTransport` is an in-memory pair for exercising the server
//! loop in tests.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::McpError;

/// A bidirectional line-oriented message channel.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Read the next message line. `None` means the peer closed.
    async fn receive(&mut self) -> Result<Option<String>, McpError>;

    /// Write one message line.
    async fn send(&mut self, message: &str) -> Result<(), McpError>;
}

/// Transport over the process's own stdin/stdout.
pub struct StdioTransport {
    reader: BufReader<tokio::io::Stdin>,
    writer: tokio::io::Stdout,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            writer: tokio::io::stdout(),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn receive(&mut self) -> Result<Option<String>, McpError> {
        // Blank lines are skipped rather than handed to the parser.
        loop {
            let mut line = String::new();
            let bytes_read = self.reader.read_line(&mut line).await?;
            if bytes_read == 0 {
                return Ok(None); // EOF
            }
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }

    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        self.writer.write_all(message.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

/// In-memory transport backed by channel pairs.
pub struct DuplexTransport {
    rx: tokio::sync::mpsc::Receiver<String>,
    tx: tokio::sync::mpsc::Sender<String>,
}

impl DuplexTransport {
    /// Create two connected ends; what one sends, the other receives.
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_b) = tokio::sync::mpsc::channel(32);
        let (tx_b, rx_a) = tokio::sync::mpsc::channel(32);
        (
            Self { rx: rx_a, tx: tx_a },
            Self { rx: rx_b, tx: tx_b },
        )
    }
}

#[async_trait]
impl Transport for DuplexTransport {
    async fn receive(&mut self) -> Result<Option<String>, McpError> {
        Ok(self.rx.recv().await)
    }

    async fn send(&mut self, message: &str) -> Result<(), McpError> {
        self.tx.send(message.to_string()).await.map_err(|e| {
            McpError::Transport(std::io::Error::new(std::io::ErrorKind::BrokenPipe, e))
        })?;
        Ok(())
    }
}
