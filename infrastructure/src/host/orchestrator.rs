//! Command orchestrator: correlated commands over one shared host connection.
//!
//! The host speaks an asynchronous command/response protocol over a single
//! ordered connection, while CRUD calls arrive from many concurrent callers.
//! [`CommandOrchestrator`] multiplexes them:
//!
//! | Piece | Role |
//! |-------|------|
//! | correlation id | per-instance counter, one fresh id per command |
//! | pending table | `id → oneshot` waiter; the only shared mutable state |
//! | writer | serialized frame writes behind an async `Mutex` |
//! | reader task | sole owner of the read half; resolves waiters by id |
//!
//! Each waiter resolves exactly once: the reader and the caller both go through
//! `remove` on the pending table, and whichever removes the slot first owns it.
//! A response arriving after its caller timed out (or was cancelled) finds no
//! slot and is dropped.

use super::codec::{read_frame, write_frame};
use super::error::{HostError, Result};
use async_trait::async_trait;
use hacrud_application::HostCommandPort;
use hacrud_domain::{CommandEnvelope, HelperAction, HelperDomain, ProtocolError, ResultEnvelope};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::sync::{Mutex as AsyncMutex, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

type Waiter = oneshot::Sender<std::result::Result<ResultEnvelope, ProtocolError>>;

/// Pending-response table (correlation id → waiter).
///
/// Uses `std::sync::Mutex` so that [`PendingGuard`] can remove its slot
/// synchronously from `Drop`. The lock is never held across an await.
type PendingTable = Arc<Mutex<HashMap<u64, Waiter>>>;

type BoxedWriter = BufWriter<Box<dyn AsyncWrite + Send + Unpin>>;

fn boxed_writer<W>(write_half: W) -> BoxedWriter
where
    W: AsyncWrite + Send + Unpin + 'static,
{
    let boxed: Box<dyn AsyncWrite + Send + Unpin> = Box::new(write_half);
    BufWriter::new(boxed)
}

/// Removes a command's pending slot when the waiting call ends for any reason
/// (response, timeout, send failure, or the caller dropping the future).
struct PendingGuard<'a> {
    pending: &'a PendingTable,
    id: u64,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if pending.remove(&self.id).is_some() {
            debug!("Orchestrator: disowned pending command id={}", self.id);
        }
    }
}

/// The single logical connection to the host platform.
pub struct CommandOrchestrator {
    /// Background reader task handle (aborted on close/drop).
    reader_handle: JoinHandle<()>,

    pending: PendingTable,

    /// Writer (serialized writes, independent of reader).
    writer: AsyncMutex<BoxedWriter>,

    next_id: AtomicU64,

    /// Cleared when the reader ends; new commands then fail fast.
    connected: Arc<AtomicBool>,
}

impl CommandOrchestrator {
    /// Connect to the host over TCP, authenticate if a token is given, and
    /// start the reader task.
    pub async fn connect(
        address: &str,
        access_token: Option<&str>,
        handshake_timeout: Duration,
    ) -> Result<Self> {
        debug!("Connecting to host at {}", address);
        let stream = TcpStream::connect(address)
            .await
            .map_err(|source| HostError::Connect {
                address: address.to_string(),
                source,
            })?;
        let (read_half, write_half) = stream.into_split();

        let mut reader = BufReader::new(read_half);
        let mut writer = boxed_writer(write_half);

        if let Some(token) = access_token {
            tokio::time::timeout(
                handshake_timeout,
                authenticate(&mut reader, &mut writer, token),
            )
            .await
            .map_err(|_| HostError::HandshakeTimeout)??;
        }

        info!("Connected to host at {}", address);
        Ok(Self::start(reader, writer))
    }

    /// Build an orchestrator over an already-established byte stream.
    ///
    /// No handshake is performed.
    pub fn from_stream<R, W>(read_half: R, write_half: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::start(BufReader::new(read_half), boxed_writer(write_half))
    }

    fn start<R>(reader: BufReader<R>, writer: BoxedWriter) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let connected = Arc::new(AtomicBool::new(true));

        let pending_bg = Arc::clone(&pending);
        let connected_bg = Arc::clone(&connected);
        let reader_handle = tokio::spawn(async move {
            Self::reader_loop(reader, &pending_bg).await;
            connected_bg.store(false, Ordering::SeqCst);
            fail_all_pending(&pending_bg);
        });

        Self {
            reader_handle,
            pending,
            writer: AsyncMutex::new(writer),
            next_id: AtomicU64::new(1),
            connected,
        }
    }

    /// Whether the reader task is still running.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Number of commands currently awaiting a response.
    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }

    /// Stop the reader and resolve every pending command with `ConnectionLost`.
    pub fn close(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            info!("Closing host connection");
        }
        self.reader_handle.abort();
        fail_all_pending(&self.pending);
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Waiter>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Background reader loop: single owner of the read half.
    ///
    /// Runs until the connection closes or a framing error occurs.
    async fn reader_loop<R>(mut reader: BufReader<R>, pending: &PendingTable)
    where
        R: AsyncRead + Unpin,
    {
        let mut line = String::new();

        loop {
            let body = match read_frame(&mut reader, &mut line).await {
                Ok(Some(body)) => body,
                Ok(None) => {
                    info!("Orchestrator: host closed the connection");
                    break;
                }
                Err(e) => {
                    warn!("Orchestrator: failed to read frame: {}", e);
                    break;
                }
            };

            let body_str = String::from_utf8_lossy(&body);
            trace!("Orchestrator received: {}", body_str);

            let value: Value = match serde_json::from_slice(&body) {
                Ok(v) => v,
                Err(e) => {
                    warn!("Orchestrator: failed to parse JSON: {} ({})", e, body_str);
                    continue;
                }
            };

            let Some(id) = value.get("id").and_then(Value::as_u64) else {
                trace!(
                    "Orchestrator: ignoring uncorrelated message type={}",
                    value.get("type").and_then(|t| t.as_str()).unwrap_or("")
                );
                continue;
            };

            let outcome = serde_json::from_value::<ResultEnvelope>(value).map_err(|e| {
                warn!("Orchestrator: malformed response id={}: {}", id, e);
                ProtocolError::MalformedResponse(e.to_string())
            });

            let waiter = {
                let mut pending = pending.lock().unwrap_or_else(|e| e.into_inner());
                pending.remove(&id)
            };
            match waiter {
                Some(tx) => {
                    let _ = tx.send(outcome);
                }
                None => debug!("Orchestrator: dropping late response id={}", id),
            }
        }
    }

    async fn send(&self, envelope: &CommandEnvelope) -> std::io::Result<()> {
        let body = serde_json::to_vec(envelope)?;
        trace!("Orchestrator sending: {}", String::from_utf8_lossy(&body));

        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, &body).await
    }
}

#[async_trait]
impl HostCommandPort for CommandOrchestrator {
    async fn execute(
        &self,
        domain: HelperDomain,
        action: HelperAction,
        payload: Map<String, Value>,
        timeout: Duration,
    ) -> std::result::Result<ResultEnvelope, ProtocolError> {
        if !self.is_connected() {
            return Err(ProtocolError::ConnectionLost);
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let envelope = CommandEnvelope::new(id, domain, action, payload);

        let (tx, rx) = oneshot::channel();
        self.lock_pending().insert(id, tx);
        let _guard = PendingGuard {
            pending: &self.pending,
            id,
        };

        // the reader may have drained the table between the first check and the insert
        if !self.is_connected() {
            return Err(ProtocolError::ConnectionLost);
        }

        debug!("Orchestrator: {} id={}", envelope.message_type, id);

        // one deadline covers the writer lock, the write and the response
        let mut sent = false;
        let exchange = async {
            if let Err(e) = self.send(&envelope).await {
                warn!("Orchestrator: failed to send command id={}: {}", id, e);
                return Err(ProtocolError::ConnectionLost);
            }
            sent = true;
            rx.await.unwrap_or(Err(ProtocolError::ConnectionLost))
        };
        let outcome = tokio::time::timeout(timeout, exchange).await;

        match outcome {
            Ok(outcome) => outcome,
            Err(_) => {
                debug!("Orchestrator: command id={} timed out after {:?}", id, timeout);
                if !sent {
                    // a frame cut off mid-write leaves the stream unframed
                    warn!("Orchestrator: host stopped reading, dropping connection");
                    self.close();
                }
                Err(ProtocolError::Timeout(timeout))
            }
        }
    }
}

impl Drop for CommandOrchestrator {
    fn drop(&mut self) {
        debug!("CommandOrchestrator dropping, stopping reader task");
        self.reader_handle.abort();
        fail_all_pending(&self.pending);
    }
}

/// Resolve every pending waiter with `ConnectionLost`.
fn fail_all_pending(pending: &PendingTable) {
    let drained: Vec<Waiter> = {
        let mut pending = pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.drain().map(|(_, tx)| tx).collect()
    };
    if !drained.is_empty() {
        warn!(
            "Orchestrator: failing {} pending command(s) with ConnectionLost",
            drained.len()
        );
    }
    for tx in drained {
        let _ = tx.send(Err(ProtocolError::ConnectionLost));
    }
}

/// Authenticate a fresh connection.
///
/// Sends `{"type": "auth", "access_token": …}` and waits for `auth_ok`.
/// An initial `auth_required` greeting from the host is skipped.
pub async fn authenticate<R, W>(reader: &mut R, writer: &mut W, access_token: &str) -> Result<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let request = json!({"type": "auth", "access_token": access_token});
    write_frame(writer, &serde_json::to_vec(&request)?).await?;

    let mut line = String::new();
    loop {
        let body = read_frame(reader, &mut line)
            .await?
            .ok_or(HostError::HandshakeClosed)?;
        let message: Value = serde_json::from_slice(&body)?;
        match message.get("type").and_then(Value::as_str) {
            Some("auth_required") => continue,
            Some("auth_ok") => {
                debug!("Host accepted access token");
                return Ok(());
            }
            Some("auth_invalid") => {
                let reason = message
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or("invalid access token");
                return Err(HostError::AuthRejected(reason.to_string()));
            }
            _ => return Err(HostError::UnexpectedHandshake(message.to_string())),
        }
    }
}
