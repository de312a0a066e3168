//! Minimal, protocol-agnostic message shapes shared between the BiDi-facing
//! and CDP-facing halves of the mapper.
//!
//! Both WebDriver BiDi and CDP frame their wire format the same way: a
//! dotted `Domain.method` (or `module.event`) identifier, a numeric call id
//! for request/response correlation, and a JSON `params`/`result` payload.
//! Rather than duplicating that plumbing once per protocol, the traits here
//! are implemented by both the `cdp` and `bidi` modules of the mapper crate.

use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Correlates an outgoing command with its eventual response.
///
/// Ids must be unique for the lifetime of a single connection; they are not
/// meaningful across reconnects.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallId(u64);

impl CallId {
    pub fn new(id: u64) -> Self {
        CallId(id)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A monotonically increasing source of [`CallId`]s.
#[derive(Debug, Default)]
pub struct CallIdGenerator(u64);

impl CallIdGenerator {
    pub fn next(&mut self) -> CallId {
        let id = CallId(self.0);
        self.0 = self.0.wrapping_add(1);
        id
    }
}

/// A dotted `Domain.method` or `module.event` identifier.
pub trait Method {
    /// The full identifier, e.g. `"Target.attachToTarget"` or
    /// `"browsingContext.navigate"`.
    fn identifier(&self) -> Cow<'static, str>;

    /// The domain/module part: `"Target"` / `"browsingContext"`.
    fn domain_name(&self) -> Cow<'static, str> {
        self.split().0
    }

    /// The bare method/event name: `"attachToTarget"` / `"navigate"`.
    fn method_name(&self) -> Cow<'static, str> {
        self.split().1
    }

    fn split(&self) -> (Cow<'static, str>, Cow<'static, str>) {
        match self.identifier() {
            Cow::Borrowed(id) => {
                let mut parts = id.splitn(2, '.');
                let domain = parts.next().unwrap_or(id);
                let name = parts.next().unwrap_or("");
                (Cow::Borrowed(domain), Cow::Borrowed(name))
            }
            Cow::Owned(id) => {
                let mut parts = id.splitn(2, '.');
                let domain = parts.next().unwrap_or_default().to_string();
                let name = parts.next().unwrap_or_default().to_string();
                (Cow::Owned(domain), Cow::Owned(name))
            }
        }
    }
}

/// A request/command that expects exactly one [`Method::Response`].
pub trait Command: Serialize + Method {
    type Response: DeserializeOwned + fmt::Debug;
}

/// A one-shot notification pushed by the remote side, not requested by us.
pub trait Event: Method + DeserializeOwned {}

/// A decoded response paired back with the command it answers.
#[derive(Debug)]
pub struct CommandResponse<T: fmt::Debug> {
    pub id: CallId,
    pub method: Cow<'static, str>,
    pub result: T,
}

impl<T: fmt::Debug> Deref for CommandResponse<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.result
    }
}

/// Either half of a demultiplexed inbound message stream.
#[derive(Debug, Clone)]
pub enum Message<E> {
    Response(Response),
    Event(E),
}

/// The raw (not-yet-typed) reply to a submitted command.
#[derive(Debug, Clone)]
pub struct Response {
    pub id: CallId,
    pub result: Option<serde_json::Value>,
    pub error: Option<ProtocolError>,
}

/// An error surfaced by the remote peer in a [`Response`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolError {
    pub code: i64,
    pub message: String,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "protocol error {}: {}", self.code, self.message)
    }
}

impl std::error::Error for ProtocolError {}

/// An event whose payload was not decoded into a known [`Event`] type.
///
/// This is the vehicle for the `cdp.<event>` passthrough tunnel: events the
/// core does not model are still captured here instead of being dropped, so
/// they can be forwarded to a BiDi client that asked for them verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    pub method: Cow<'static, str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub params: serde_json::Value,
}

impl Method for RawEvent {
    fn identifier(&self) -> Cow<'static, str> {
        self.method.clone()
    }
}

impl Event for RawEvent {}

#[cfg(test)]
mod tests {
    use super::*;

    struct Example;

    impl Method for Example {
        fn identifier(&self) -> Cow<'static, str> {
            "Target.attachToTarget".into()
        }
    }

    #[test]
    fn splits_domain_and_method() {
        let e = Example;
        assert_eq!(e.domain_name(), "Target");
        assert_eq!(e.method_name(), "attachToTarget");
    }

    #[test]
    fn call_id_generator_is_monotonic() {
        let mut gen = CallIdGenerator::default();
        let a = gen.next();
        let b = gen.next();
        assert!(a < b);
    }
}
