//! `script.*` preload script commands (§3 PreloadScript).

use serde::Deserialize;

use crate::domain::ids::{BrowsingContextId, PreloadScriptId};

#[derive(Debug, Clone, Deserialize)]
pub struct AddPreloadScriptParams {
    #[serde(rename = "functionDeclaration")]
    pub function_declaration: String,
    #[serde(default)]
    pub sandbox: Option<String>,
    #[serde(default)]
    pub contexts: Option<Vec<BrowsingContextId>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemovePreloadScriptParams {
    pub script: PreloadScriptId,
}
