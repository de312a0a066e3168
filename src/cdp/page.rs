//! `Page.*` — frame tree, lifecycle events, preload scripts, dialogs.

use serde::{Deserialize, Serialize};

use bidi_mapper_types::{Command, Method};

use super::{CdpScriptId, FrameId, LoaderId};

#[derive(Debug, Clone, Deserialize)]
pub struct EventFrameAttached {
    #[serde(rename = "frameId")]
    pub frame_id: FrameId,
    #[serde(rename = "parentFrameId")]
    pub parent_frame_id: FrameId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventFrameDetached {
    #[serde(rename = "frameId")]
    pub frame_id: FrameId,
    pub reason: FrameDetachedReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameDetachedReason {
    Remove,
    Swap,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Frame {
    pub id: FrameId,
    #[serde(rename = "parentId")]
    pub parent_id: Option<FrameId>,
    pub url: String,
    #[serde(rename = "urlFragment")]
    pub url_fragment: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventFrameNavigated {
    pub frame: Frame,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventLifecycleEvent {
    #[serde(rename = "frameId")]
    pub frame_id: FrameId,
    #[serde(rename = "loaderId")]
    pub loader_id: LoaderId,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventJavascriptDialogOpening {
    pub url: String,
    pub message: String,
    #[serde(rename = "type")]
    pub dialog_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventJavascriptDialogClosed {
    pub result: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EnableParams {}

impl Method for EnableParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Page.enable".into()
    }
}
impl Command for EnableParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct SetLifecycleEventsEnabledParams {
    pub enabled: bool,
}

impl SetLifecycleEventsEnabledParams {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Method for SetLifecycleEventsEnabledParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Page.setLifecycleEventsEnabled".into()
    }
}
impl Command for SetLifecycleEventsEnabledParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct NavigateParams {
    pub url: String,
}

impl NavigateParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Method for NavigateParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Page.navigate".into()
    }
}
impl Command for NavigateParams {
    type Response = serde_json::Value;
}

/// One preload script installed via `addScriptToEvaluateOnNewDocument`. The
/// source is run on every new document before any page script (§3
/// PreloadScript invariant).
#[derive(Debug, Clone, Serialize)]
pub struct AddScriptToEvaluateOnNewDocumentParams {
    pub source: String,
    #[serde(rename = "worldName", skip_serializing_if = "Option::is_none")]
    pub world_name: Option<String>,
}

impl Method for AddScriptToEvaluateOnNewDocumentParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Page.addScriptToEvaluateOnNewDocument".into()
    }
}
impl Command for AddScriptToEvaluateOnNewDocumentParams {
    type Response = AddScriptToEvaluateOnNewDocumentResult;
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddScriptToEvaluateOnNewDocumentResult {
    pub identifier: CdpScriptId,
}

#[derive(Debug, Clone, Serialize)]
pub struct RemoveScriptToEvaluateOnNewDocumentParams {
    pub identifier: CdpScriptId,
}

impl Method for RemoveScriptToEvaluateOnNewDocumentParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Page.removeScriptToEvaluateOnNewDocument".into()
    }
}
impl Command for RemoveScriptToEvaluateOnNewDocumentParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct HandleJavaScriptDialogParams {
    pub accept: bool,
    #[serde(rename = "promptText", skip_serializing_if = "Option::is_none")]
    pub prompt_text: Option<String>,
}

impl Method for HandleJavaScriptDialogParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Page.handleJavaScriptDialog".into()
    }
}
impl Command for HandleJavaScriptDialogParams {
    type Response = serde_json::Value;
}
