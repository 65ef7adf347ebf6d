//! Newline-delimited JSON-RPC transport to an MCP server.
//!
//! Normally the server is a child process and we talk over its stdin/stdout
//! ([`StdioTransport::spawn`]); [`StdioTransport::from_pipes`] accepts any
//! async reader/writer pair so a server loop can be driven in-process.

use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use super::protocol::{codes, JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::constants::SERVER_SHUTDOWN_GRACE_MS;
use crate::error::{ChatError, Result};

type Reader = Box<dyn AsyncBufRead + Send + Unpin>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// How to launch an MCP server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ServerCommand {
    /// Picks an interpreter from the script extension.
    ///
    /// `.py` runs under `python`, `.js` under `node`; anything else is
    /// executed directly. `extra_args` follow the script path.
    pub fn from_script(path: &str, extra_args: &[String]) -> Self {
        let interpreter = match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some("py") => Some("python"),
            Some("js") => Some("node"),
            _ => None,
        };

        match interpreter {
            Some(program) => {
                let mut args = vec![path.to_string()];
                args.extend(extra_args.iter().cloned());
                Self {
                    program: program.to_string(),
                    args,
                }
            }
            None => Self {
                program: path.to_string(),
                args: extra_args.to_vec(),
            },
        }
    }
}

impl std::fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

pub struct StdioTransport {
    child: Mutex<Option<Child>>,
    /// `None` once closed; dropping it signals EOF to the server.
    writer: Mutex<Option<Writer>>,
    reader: Mutex<Reader>,
    next_id: AtomicU64,
}

impl StdioTransport {
    /// Launches the server with piped stdin/stdout; stderr is inherited.
    ///
    /// The child is killed if the transport is dropped without [`close`](Self::close).
    pub fn spawn(command: &ServerCommand) -> Result<Self> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ChatError::transport(format!("failed to spawn `{}`: {}", command, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ChatError::transport("server stdin not available"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ChatError::transport("server stdout not available"))?;

        tracing::debug!(pid = child.id(), %command, "spawned MCP server");

        Ok(Self {
            child: Mutex::new(Some(child)),
            writer: Mutex::new(Some(Box::new(stdin))),
            reader: Mutex::new(Box::new(BufReader::new(stdout))),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_pipes<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            child: Mutex::new(None),
            writer: Mutex::new(Some(Box::new(writer))),
            reader: Mutex::new(Box::new(reader)),
            next_id: AtomicU64::new(1),
        }
    }

    /// Sends a request and waits for the response carrying the same id.
    ///
    /// Server notifications arriving in between are skipped; server requests
    /// are answered (`ping` with `{}`, anything else with method-not-found).
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = JsonRpcRequest::new(id, method, params);
        tracing::debug!(id, method, "-> request");
        self.write_message(&request).await?;

        let expected = Value::from(id);
        let mut reader = self.reader.lock().await;
        loop {
            let mut line = String::new();
            let read = reader
                .read_line(&mut line)
                .await
                .map_err(|e| ChatError::transport(format!("failed to read from server: {}", e)))?;
            if read == 0 {
                return Err(ChatError::transport("server closed the connection"));
            }
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: Value = serde_json::from_str(line).map_err(|e| {
                ChatError::transport(format!("server sent invalid JSON ({}): {}", e, line))
            })?;

            if value.get("method").is_some() {
                self.answer_server_message(value).await?;
                continue;
            }

            let response: JsonRpcResponse = serde_json::from_value(value).map_err(|e| {
                ChatError::transport(format!("server sent an invalid response: {}", e))
            })?;
            if response.id != expected {
                tracing::debug!(id = %response.id, "skipping response for another request");
                continue;
            }

            tracing::debug!(id, method, ok = response.error.is_none(), "<- response");
            if let Some(error) = response.error {
                return Err(ChatError::ProviderRpc {
                    method: method.to_string(),
                    code: error.code,
                    message: error.message,
                });
            }
            return Ok(response.result.unwrap_or(Value::Null));
        }
    }

    /// Sends a notification; no response is expected.
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<()> {
        tracing::debug!(method, "-> notification");
        self.write_message(&JsonRpcRequest::notification(method, params))
            .await
    }

    /// Closes stdin, then gives the server a grace period to exit before killing it.
    pub async fn close(&self) -> Result<()> {
        self.writer.lock().await.take();

        let mut guard = self.child.lock().await;
        if let Some(mut child) = guard.take() {
            let grace = Duration::from_millis(SERVER_SHUTDOWN_GRACE_MS);
            match tokio::time::timeout(grace, child.wait()).await {
                Ok(Ok(status)) => tracing::debug!(%status, "MCP server exited"),
                Ok(Err(e)) => {
                    return Err(ChatError::transport(format!(
                        "failed to wait for server: {}",
                        e
                    )))
                }
                Err(_) => {
                    tracing::warn!("MCP server did not exit in time, killing it");
                    child.kill().await.map_err(|e| {
                        ChatError::transport(format!("failed to kill server: {}", e))
                    })?;
                }
            }
        }
        Ok(())
    }

    async fn answer_server_message(&self, value: Value) -> Result<()> {
        let message: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(m) => m,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring unreadable server message");
                return Ok(());
            }
        };
        let Some(id) = message.id else {
            tracing::debug!(method = %message.method, "server notification");
            return Ok(());
        };

        let reply = if message.method == "ping" {
            JsonRpcResponse::success(id, json!({}))
        } else {
            JsonRpcResponse::failure(
                id,
                JsonRpcError::new(
                    codes::METHOD_NOT_FOUND,
                    format!("client does not support `{}`", message.method),
                ),
            )
        };
        self.write_message(&reply).await
    }

    async fn write_message<T: Serialize>(&self, message: &T) -> Result<()> {
        let mut line = serde_json::to_string(message)
            .map_err(|e| ChatError::transport(format!("failed to encode message: {}", e)))?;
        line.push('\n');

        let mut guard = self.writer.lock().await;
        let writer = guard
            .as_mut()
            .ok_or_else(|| ChatError::transport("connection already closed"))?;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| ChatError::transport(format!("failed to write to server: {}", e)))?;
        writer
            .flush()
            .await
            .map_err(|e| ChatError::transport(format!("failed to flush: {}", e)))?;
        Ok(())
    }
}
