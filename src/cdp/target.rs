//! `Target.*` — target discovery, attach/detach, auto-attach.

use serde::{Deserialize, Serialize};

use bidi_mapper_types::{Command, Method};

use super::{BrowserContextId, SessionId, TargetId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Page,
    Iframe,
    Worker,
    SharedWorker,
    ServiceWorker,
    Browser,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetInfo {
    #[serde(rename = "targetId")]
    pub target_id: TargetId,
    #[serde(rename = "type")]
    pub target_type: TargetType,
    pub title: String,
    pub url: String,
    pub attached: bool,
    #[serde(rename = "openerId")]
    pub opener_id: Option<TargetId>,
    #[serde(rename = "browserContextId")]
    pub browser_context_id: Option<BrowserContextId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventTargetCreated {
    #[serde(rename = "targetInfo")]
    pub target_info: TargetInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventTargetInfoChanged {
    #[serde(rename = "targetInfo")]
    pub target_info: TargetInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventTargetDestroyed {
    #[serde(rename = "targetId")]
    pub target_id: TargetId,
}

/// `Inspector.targetCrashed` is mapper-scoped per session, so it is carried
/// alongside the `Target.*` events here even though the CDP domain differs —
/// §4.3 treats it as "the only reliable shared/service worker closed signal".
#[derive(Debug, Clone, Deserialize)]
pub struct EventTargetCrashed {}

#[derive(Debug, Clone, Deserialize)]
pub struct EventAttachedToTarget {
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
    #[serde(rename = "targetInfo")]
    pub target_info: TargetInfo,
    #[serde(rename = "waitingForDebugger")]
    pub waiting_for_debugger: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventDetachedFromTarget {
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
    #[serde(rename = "targetId")]
    pub target_id: Option<TargetId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SetDiscoverTargetsParams {
    pub discover: bool,
}

impl Method for SetDiscoverTargetsParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Target.setDiscoverTargets".into()
    }
}
impl Command for SetDiscoverTargetsParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct SetAutoAttachParams {
    #[serde(rename = "autoAttach")]
    pub auto_attach: bool,
    #[serde(rename = "waitForDebuggerOnStart")]
    pub wait_for_debugger_on_start: bool,
    pub flatten: bool,
}

impl SetAutoAttachParams {
    /// The §4.2 step-5 configuration: attach descendants, flatten sessions,
    /// and hold them paused until we finish unblocking.
    pub fn wait_for_debugger() -> Self {
        Self {
            auto_attach: true,
            wait_for_debugger_on_start: true,
            flatten: true,
        }
    }
}

impl Method for SetAutoAttachParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Target.setAutoAttach".into()
    }
}
impl Command for SetAutoAttachParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTargetParams {
    pub url: String,
    #[serde(rename = "newWindow", skip_serializing_if = "Option::is_none")]
    pub new_window: Option<bool>,
    #[serde(rename = "browserContextId", skip_serializing_if = "Option::is_none")]
    pub browser_context_id: Option<BrowserContextId>,
}

impl CreateTargetParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            new_window: None,
            browser_context_id: None,
        }
    }
}

impl Method for CreateTargetParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Target.createTarget".into()
    }
}
impl Command for CreateTargetParams {
    type Response = CreateTargetResult;
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTargetResult {
    #[serde(rename = "targetId")]
    pub target_id: TargetId,
}

#[derive(Debug, Clone, Serialize)]
pub struct CloseTargetParams {
    #[serde(rename = "targetId")]
    pub target_id: TargetId,
}

impl Method for CloseTargetParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Target.closeTarget".into()
    }
}
impl Command for CloseTargetParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct DetachFromTargetParams {
    #[serde(rename = "sessionId")]
    pub session_id: SessionId,
}

impl Method for DetachFromTargetParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Target.detachFromTarget".into()
    }
}
impl Command for DetachFromTargetParams {
    type Response = serde_json::Value;
}
