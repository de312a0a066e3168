//! `browsingContext.*` commands (§4.1, §4.3) and the §2.2 `setViewport`
//! supplement.

use serde::Deserialize;

use crate::domain::ids::{BrowsingContextId, UserContextId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreateType {
    Tab,
    Window,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateParams {
    #[serde(rename = "type")]
    pub create_type: CreateType,
    #[serde(rename = "referenceContext")]
    pub reference_context: Option<BrowsingContextId>,
    #[serde(rename = "userContext")]
    pub user_context: Option<UserContextId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CloseParams {
    pub context: BrowsingContextId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NavigateParams {
    pub context: BrowsingContextId,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetViewportParams {
    pub context: BrowsingContextId,
    #[serde(default)]
    pub viewport: Option<Viewport>,
}
