//! `network.*` commands (§4.4, §4.5): intercept registration and the
//! per-phase continuation commands.

use serde::Deserialize;

use crate::domain::ids::{BrowsingContextId, InterceptId, RequestId};
use crate::domain::network_request::InterceptPhase;
use crate::domain::url_pattern::UrlPattern;

#[derive(Debug, Clone, Deserialize)]
pub struct AddInterceptParams {
    pub phases: Vec<InterceptPhase>,
    #[serde(default, rename = "urlPatterns")]
    pub url_patterns: Vec<UrlPattern>,
    #[serde(default)]
    pub contexts: Option<Vec<BrowsingContextId>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoveInterceptParams {
    pub intercept: InterceptId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContinueRequestParams {
    pub request: RequestId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FailRequestParams {
    pub request: RequestId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContinueResponseParams {
    pub request: RequestId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContinueWithAuthCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ContinueWithAuthParams {
    Default { request: RequestId },
    Cancel { request: RequestId },
    ProvideCredentials {
        request: RequestId,
        credentials: ContinueWithAuthCredentials,
    },
}
