//! UDP Command Listener: a dedicated thread that blocks on `recvfrom` with a
//! short read timeout, decodes each datagram as a flat JSON object, and
//! applies each key/value pair to the shared `ParameterStore`.
//!
//! Grounded directly on `engine_v2/command_listener.py`'s `CommandListener`:
//! same bind-then-loop shape, same 100ms timeout so the thread can notice a
//! shutdown request promptly, same "malformed datagram is logged and
//! ignored, never fatal" policy. The Python version used a bare daemon
//! thread with a `running` flag; here that's `Arc<AtomicBool>` checked each
//! timeout tick, joined explicitly on shutdown instead of left to die with
//! the process.

use std::net::UdpSocket;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, warn};

use crate::config::{COMMAND_SOCKET_TIMEOUT_MS, MAX_COMMAND_DATAGRAM_BYTES};
use crate::error::{EngineError, EngineResult};
use crate::params::ParameterStore;

pub struct CommandListener {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CommandListener {
    /// Binds `addr` and spawns the listener thread immediately.
    pub fn spawn(addr: std::net::SocketAddr, store: Arc<ParameterStore>) -> EngineResult<Self> {
        let socket = UdpSocket::bind(addr)
            .map_err(|e| EngineError::Device(format!("command socket bind failed: {e}")))?;
        socket
            .set_read_timeout(Some(Duration::from_millis(COMMAND_SOCKET_TIMEOUT_MS)))
            .map_err(|e| EngineError::Device(format!("failed to set socket timeout: {e}")))?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let thread_shutdown = shutdown.clone();

        let handle = std::thread::Builder::new()
            .name("command-listener".into())
            .spawn(move || Self::listen(socket, store, thread_shutdown))
            .map_err(|e| EngineError::Device(format!("failed to spawn command listener: {e}")))?;

        Ok(Self { shutdown, handle: Some(handle) })
    }

    fn listen(socket: UdpSocket, store: Arc<ParameterStore>, shutdown: Arc<AtomicBool>) {
        let mut buf = [0u8; MAX_COMMAND_DATAGRAM_BYTES];
        while !shutdown.load(Ordering::Relaxed) {
            match socket.recv_from(&mut buf) {
                Ok((len, _src)) => Self::apply_datagram(&buf[..len], &store),
                Err(e) if is_timeout(&e) => continue,
                Err(e) => {
                    warn!("command socket read error: {e}");
                    continue;
                }
            }
        }
        debug!("command listener thread exiting");
    }

    fn apply_datagram(bytes: &[u8], store: &ParameterStore) {
        let parsed: Result<serde_json::Value, _> = serde_json::from_slice(bytes);
        let updates = match parsed {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => {
                warn!("command datagram was valid JSON but not an object; ignoring");
                return;
            }
            Err(e) => {
                warn!("failed to decode command datagram: {e}");
                return;
            }
        };

        for (key, value) in updates {
            store.apply(&key, &value);
        }
    }

    pub fn shutdown(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CommandListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut)
}
