//! `Runtime.*` — execution context lifecycle, the debugger release gate.

use serde::{Deserialize, Serialize};

use bidi_mapper_types::{Command, Method};

use super::ExecutionContextId;

#[derive(Debug, Clone, Default, Serialize)]
pub struct EnableParams {}

impl Method for EnableParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Runtime.enable".into()
    }
}
impl Command for EnableParams {
    type Response = serde_json::Value;
}

/// §4.2 step 7: the last command sent for a target, strictly after every
/// other unblock prerequisite has completed or been skipped.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunIfWaitingForDebuggerParams {}

impl Method for RunIfWaitingForDebuggerParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Runtime.runIfWaitingForDebugger".into()
    }
}
impl Command for RunIfWaitingForDebuggerParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionContextDescription {
    pub id: ExecutionContextId,
    pub origin: String,
    pub name: String,
    #[serde(rename = "auxData", default)]
    pub aux_data: serde_json::Value,
}

impl ExecutionContextDescription {
    /// The CDP `frameId` tucked into `auxData` for window realms.
    pub fn frame_id(&self) -> Option<String> {
        self.aux_data
            .get("frameId")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
    }

    pub fn is_default(&self) -> bool {
        self.aux_data
            .get("isDefault")
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventExecutionContextCreated {
    pub context: ExecutionContextDescription,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventExecutionContextDestroyed {
    #[serde(rename = "executionContextId")]
    pub execution_context_id: ExecutionContextId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventExecutionContextsCleared {}
