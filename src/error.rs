//! Error types for the engine's fatal-failure path.
//!
//! Only device-level and shutdown conditions become `EngineError` — everything
//! else recoverable (NaN in a frame, a malformed command datagram, a UDP send
//! failure) is logged and handled in place, never propagated as an
//! error type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("capture device error: {0}")]
    Device(String),

    #[error("engine shutting down")]
    Shutdown,
}

pub type EngineResult<T> = Result<T, EngineError>;
