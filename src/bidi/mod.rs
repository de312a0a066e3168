//! Wire-level BiDi JSON shapes (§6): the envelope around every inbound
//! command and outbound success/error/event message, plus the per-module
//! command and event payloads the dispatcher understands.

pub mod browsing_context;
pub mod network;
pub mod script;
pub mod session;

use serde::{Deserialize, Serialize};

use crate::error::BidiError;

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingCommand {
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// The three outbound shapes from §6: command success, command error, and
/// an out-of-band event. Kept as one enum so the transport only ever
/// serialises one kind of value.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    Success {
        id: u64,
        #[serde(rename = "type")]
        kind: &'static str,
        result: serde_json::Value,
    },
    Error {
        id: Option<u64>,
        #[serde(rename = "type")]
        kind: &'static str,
        error: String,
        message: String,
    },
    Event {
        #[serde(rename = "type")]
        kind: &'static str,
        method: String,
        params: serde_json::Value,
    },
}

impl OutgoingMessage {
    pub fn success(id: u64, result: serde_json::Value) -> Self {
        OutgoingMessage::Success { id, kind: "success", result }
    }

    pub fn error(id: Option<u64>, err: &BidiError) -> Self {
        OutgoingMessage::Error {
            id,
            kind: "error",
            error: err.code.to_string(),
            message: err.message.clone(),
        }
    }

    pub fn event(method: impl Into<String>, params: serde_json::Value) -> Self {
        OutgoingMessage::Event { kind: "event", method: method.into(), params }
    }
}
