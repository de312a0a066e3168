//! Error taxonomy for both halves of the mapper.
//!
//! `CdpError` covers everything that can go wrong talking to the browser;
//! `BidiError` is what actually crosses the wire back to the automation
//! client and always carries one of the fixed `ErrorCode`s from the BiDi
//! specification (see [`ErrorCode`]).

use std::fmt;
use std::io;

use thiserror::Error;

pub type Result<T, E = CdpError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CdpError {
    #[error("{0}")]
    Ws(#[from] async_tungstenite::tungstenite::Error),
    #[error("{0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Protocol(#[from] bidi_mapper_types::ProtocolError),
    #[error("no response received for the outstanding command")]
    NoResponse,
    #[error("the session was closed: {0}")]
    SessionClosed(String),
    #[error("channel closed while waiting for a reply")]
    ChannelClosed,
    #[error("invariant violated: {0}")]
    InvariantViolated(String),
}

impl CdpError {
    /// The CDP "close"-class error predicate referenced throughout §4 and §7:
    /// the target vanished mid-command, which the mapper must treat as a
    /// benign terminal state rather than a real failure.
    pub fn is_close_error(&self) -> bool {
        match self {
            CdpError::SessionClosed(_) => true,
            CdpError::Protocol(p) => {
                p.message.contains("Not attached to an active page")
                    || p.message.contains("No target with given id found")
                    || p.message.contains("Target closed")
            }
            _ => false,
        }
    }

    pub fn msg(text: impl Into<String>) -> Self {
        CdpError::InvariantViolated(text.into())
    }
}

impl From<futures::channel::oneshot::Canceled> for CdpError {
    fn from(_: futures::channel::oneshot::Canceled) -> Self {
        CdpError::ChannelClosed
    }
}

impl<T> From<futures::channel::mpsc::TrySendError<T>> for CdpError {
    fn from(_: futures::channel::mpsc::TrySendError<T>) -> Self {
        CdpError::ChannelClosed
    }
}

/// The fixed error-code vocabulary from §6/§7 of the specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidArgument,
    NoSuchFrame,
    NoSuchScript,
    NoSuchIntercept,
    NoSuchUserContext,
    NoSuchAlert,
    UnknownCommand,
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidArgument => "invalid argument",
            ErrorCode::NoSuchFrame => "no such frame",
            ErrorCode::NoSuchScript => "no such script",
            ErrorCode::NoSuchIntercept => "no such intercept",
            ErrorCode::NoSuchUserContext => "no such user context",
            ErrorCode::NoSuchAlert => "no such alert",
            ErrorCode::UnknownCommand => "unknown command",
            ErrorCode::UnknownError => "unknown error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error surfaced to the BiDi caller as `{type:"error", error, message}`.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct BidiError {
    pub code: ErrorCode,
    pub message: String,
}

impl BidiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidArgument, message)
    }

    pub fn no_such_frame(context: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::NoSuchFrame,
            format!("No browsing context with id {context}"),
        )
    }

    pub fn no_such_intercept(id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::NoSuchIntercept,
            format!("Intercept '{id}' does not exist."),
        )
    }

    pub fn no_such_script(id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::NoSuchScript,
            format!("Preload script '{id}' does not exist."),
        )
    }

    pub fn no_such_user_context(id: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::NoSuchUserContext,
            format!("User context '{id}' does not exist."),
        )
    }

    pub fn no_such_alert() -> Self {
        Self::new(ErrorCode::NoSuchAlert, "No dialog is showing")
    }
}

/// Internal-error / fatal-error propagation policy from §7: expected CDP
/// error shapes are translated by call sites into a `BidiError`; anything
/// else bubbles up here and becomes `unknown error` without ever reaching
/// the transport as a panic.
impl From<CdpError> for BidiError {
    fn from(err: CdpError) -> Self {
        BidiError::new(ErrorCode::UnknownError, err.to_string())
    }
}
