//! Hand-rolled subset of the Chrome DevTools Protocol the mapper core
//! actually speaks: target/session lifecycle, page/frame events, the
//! network + fetch interception domains, and the runtime execution-context
//! events needed for realms.
//!
//! This intentionally does not attempt to be a full CDP binding generated
//! from the protocol's PDL description (that's what the teacher library's
//! `chromiumoxide_pdl`/`chromiumoxide_cdp` crates are for) — the mapper only
//! ever needs the domains named in the specification, so they are written
//! out by hand as plain serde types, matching the style the teacher uses
//! for its few hand-written protocol fixups in `lib.rs`.

pub mod fetch;
pub mod network;
pub mod page;
pub mod runtime;
pub mod security;
pub mod target;

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

#[allow(unused_imports)]
use bidi_mapper_types::Method;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

id_newtype!(TargetId);
id_newtype!(SessionId);
id_newtype!(FrameId);
id_newtype!(BrowserContextId);
id_newtype!(RequestId);
id_newtype!(FetchId);
id_newtype!(LoaderId);
id_newtype!(ExecutionContextId);
id_newtype!(CdpScriptId);

/// The CDP JSON wrapper around every event: `{method, sessionId?, params}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpEventMessage {
    pub method: Cow<'static, str>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<SessionId>,
    pub params: serde_json::Value,
}

/// The finite set of CDP events the core reacts to, decoded once at the
/// boundary so the rest of the codebase pattern-matches exhaustively
/// instead of re-dispatching on method strings (see §9 Design Notes).
#[derive(Debug, Clone)]
pub enum CdpEvent {
    TargetTargetCreated(target::EventTargetCreated),
    TargetTargetInfoChanged(target::EventTargetInfoChanged),
    TargetTargetDestroyed(target::EventTargetDestroyed),
    TargetTargetCrashed(target::EventTargetCrashed),
    TargetAttachedToTarget(target::EventAttachedToTarget),
    TargetDetachedFromTarget(target::EventDetachedFromTarget),
    PageFrameAttached(page::EventFrameAttached),
    PageFrameDetached(page::EventFrameDetached),
    PageFrameNavigated(page::EventFrameNavigated),
    PageLifecycleEvent(page::EventLifecycleEvent),
    PageJavascriptDialogOpening(page::EventJavascriptDialogOpening),
    PageJavascriptDialogClosed(page::EventJavascriptDialogClosed),
    RuntimeExecutionContextCreated(runtime::EventExecutionContextCreated),
    RuntimeExecutionContextDestroyed(runtime::EventExecutionContextDestroyed),
    RuntimeExecutionContextsCleared(runtime::EventExecutionContextsCleared),
    NetworkRequestWillBeSent(network::EventRequestWillBeSent),
    NetworkRequestWillBeSentExtraInfo(network::EventRequestWillBeSentExtraInfo),
    NetworkResponseReceived(network::EventResponseReceived),
    NetworkResponseReceivedExtraInfo(network::EventResponseReceivedExtraInfo),
    NetworkLoadingFailed(network::EventLoadingFailed),
    NetworkLoadingFinished(network::EventLoadingFinished),
    NetworkRequestServedFromCache(network::EventRequestServedFromCache),
    FetchRequestPaused(fetch::EventRequestPaused),
    FetchAuthRequired(fetch::EventAuthRequired),
    /// Anything that parsed as a CDP event but isn't one of the above: kept
    /// for the `cdp.<event>` passthrough tunnel (§9).
    Other(bidi_mapper_types::RawEvent),
}

impl CdpEvent {
    /// Decode a raw event message into the tagged variant, falling back to
    /// [`CdpEvent::Other`] for anything unmodelled. Decode failures for a
    /// *known* method name are also folded into `Other` rather than
    /// propagated: event handlers must never throw into the transport (§7).
    pub fn decode(method: &str, params: serde_json::Value) -> CdpEvent {
        macro_rules! try_decode {
            ($variant:expr) => {
                match serde_json::from_value(params.clone()) {
                    Ok(ev) => return $variant(ev),
                    Err(err) => {
                        tracing::warn!(method, %err, "failed to decode known CDP event, passing through raw");
                        return CdpEvent::Other(bidi_mapper_types::RawEvent {
                            method: Cow::Owned(method.to_string()),
                            session_id: None,
                            params,
                        });
                    }
                }
            };
        }
        match method {
            "Target.targetCreated" => try_decode!(CdpEvent::TargetTargetCreated),
            "Target.targetInfoChanged" => try_decode!(CdpEvent::TargetTargetInfoChanged),
            "Target.targetDestroyed" => try_decode!(CdpEvent::TargetTargetDestroyed),
            "Target.targetCrashed" => try_decode!(CdpEvent::TargetTargetCrashed),
            "Target.attachedToTarget" => try_decode!(CdpEvent::TargetAttachedToTarget),
            "Target.detachedFromTarget" => try_decode!(CdpEvent::TargetDetachedFromTarget),
            "Page.frameAttached" => try_decode!(CdpEvent::PageFrameAttached),
            "Page.frameDetached" => try_decode!(CdpEvent::PageFrameDetached),
            "Page.frameNavigated" => try_decode!(CdpEvent::PageFrameNavigated),
            "Page.lifecycleEvent" => try_decode!(CdpEvent::PageLifecycleEvent),
            "Page.javascriptDialogOpening" => try_decode!(CdpEvent::PageJavascriptDialogOpening),
            "Page.javascriptDialogClosed" => try_decode!(CdpEvent::PageJavascriptDialogClosed),
            "Runtime.executionContextCreated" => {
                try_decode!(CdpEvent::RuntimeExecutionContextCreated)
            }
            "Runtime.executionContextDestroyed" => {
                try_decode!(CdpEvent::RuntimeExecutionContextDestroyed)
            }
            "Runtime.executionContextsCleared" => {
                try_decode!(CdpEvent::RuntimeExecutionContextsCleared)
            }
            "Network.requestWillBeSent" => try_decode!(CdpEvent::NetworkRequestWillBeSent),
            "Network.requestWillBeSentExtraInfo" => {
                try_decode!(CdpEvent::NetworkRequestWillBeSentExtraInfo)
            }
            "Network.responseReceived" => try_decode!(CdpEvent::NetworkResponseReceived),
            "Network.responseReceivedExtraInfo" => {
                try_decode!(CdpEvent::NetworkResponseReceivedExtraInfo)
            }
            "Network.loadingFailed" => try_decode!(CdpEvent::NetworkLoadingFailed),
            "Network.loadingFinished" => try_decode!(CdpEvent::NetworkLoadingFinished),
            "Network.requestServedFromCache" => {
                try_decode!(CdpEvent::NetworkRequestServedFromCache)
            }
            "Fetch.requestPaused" => try_decode!(CdpEvent::FetchRequestPaused),
            "Fetch.authRequired" => try_decode!(CdpEvent::FetchAuthRequired),
            other => CdpEvent::Other(bidi_mapper_types::RawEvent {
                method: Cow::Owned(other.to_string()),
                session_id: None,
                params,
            }),
        }
    }

    pub fn method_name(&self) -> Cow<'static, str> {
        match self {
            CdpEvent::TargetTargetCreated(_) => "Target.targetCreated".into(),
            CdpEvent::TargetTargetInfoChanged(_) => "Target.targetInfoChanged".into(),
            CdpEvent::TargetTargetDestroyed(_) => "Target.targetDestroyed".into(),
            CdpEvent::TargetTargetCrashed(_) => "Target.targetCrashed".into(),
            CdpEvent::TargetAttachedToTarget(_) => "Target.attachedToTarget".into(),
            CdpEvent::TargetDetachedFromTarget(_) => "Target.detachedFromTarget".into(),
            CdpEvent::PageFrameAttached(_) => "Page.frameAttached".into(),
            CdpEvent::PageFrameDetached(_) => "Page.frameDetached".into(),
            CdpEvent::PageFrameNavigated(_) => "Page.frameNavigated".into(),
            CdpEvent::PageLifecycleEvent(_) => "Page.lifecycleEvent".into(),
            CdpEvent::PageJavascriptDialogOpening(_) => "Page.javascriptDialogOpening".into(),
            CdpEvent::PageJavascriptDialogClosed(_) => "Page.javascriptDialogClosed".into(),
            CdpEvent::RuntimeExecutionContextCreated(_) => {
                "Runtime.executionContextCreated".into()
            }
            CdpEvent::RuntimeExecutionContextDestroyed(_) => {
                "Runtime.executionContextDestroyed".into()
            }
            CdpEvent::RuntimeExecutionContextsCleared(_) => {
                "Runtime.executionContextsCleared".into()
            }
            CdpEvent::NetworkRequestWillBeSent(_) => "Network.requestWillBeSent".into(),
            CdpEvent::NetworkRequestWillBeSentExtraInfo(_) => {
                "Network.requestWillBeSentExtraInfo".into()
            }
            CdpEvent::NetworkResponseReceived(_) => "Network.responseReceived".into(),
            CdpEvent::NetworkResponseReceivedExtraInfo(_) => {
                "Network.responseReceivedExtraInfo".into()
            }
            CdpEvent::NetworkLoadingFailed(_) => "Network.loadingFailed".into(),
            CdpEvent::NetworkLoadingFinished(_) => "Network.loadingFinished".into(),
            CdpEvent::NetworkRequestServedFromCache(_) => {
                "Network.requestServedFromCache".into()
            }
            CdpEvent::FetchRequestPaused(_) => "Fetch.requestPaused".into(),
            CdpEvent::FetchAuthRequired(_) => "Fetch.authRequired".into(),
            CdpEvent::Other(raw) => raw.method.clone(),
        }
    }
}

