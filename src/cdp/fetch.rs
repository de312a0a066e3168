//! `Fetch.*` — interception: pausing requests/responses/auth challenges and
//! resolving them. §4.4/§4.5 drive this domain almost entirely.

use serde::{Deserialize, Serialize};

use bidi_mapper_types::{Command, Method};

use super::network::{Headers, RequestData};
use super::{FetchId, FrameId, RequestId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RequestStage {
    Request,
    Response,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestPattern {
    #[serde(rename = "urlPattern")]
    pub url_pattern: String,
    #[serde(rename = "requestStage")]
    pub request_stage: RequestStage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRequestPaused {
    #[serde(rename = "requestId")]
    pub request_id: FetchId,
    #[serde(rename = "networkId")]
    pub network_id: Option<RequestId>,
    pub request: RequestData,
    #[serde(rename = "frameId")]
    pub frame_id: FrameId,
    #[serde(rename = "responseStatusCode")]
    pub response_status_code: Option<i64>,
    #[serde(rename = "responseHeaders", default)]
    pub response_headers: Vec<HeaderEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderEntry {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthChallenge {
    pub source: Option<String>,
    pub origin: String,
    pub scheme: String,
    pub realm: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventAuthRequired {
    #[serde(rename = "requestId")]
    pub request_id: FetchId,
    #[serde(rename = "networkId")]
    pub network_id: Option<RequestId>,
    pub request: RequestData,
    #[serde(rename = "frameId")]
    pub frame_id: FrameId,
    #[serde(rename = "authChallenge")]
    pub auth_challenge: AuthChallenge,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnableParams {
    pub patterns: Vec<RequestPattern>,
    #[serde(rename = "handleAuthRequests")]
    pub handle_auth_requests: bool,
}

impl Method for EnableParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Fetch.enable".into()
    }
}
impl Command for EnableParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DisableParams {}

impl Method for DisableParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Fetch.disable".into()
    }
}
impl Command for DisableParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct ContinueRequestParams {
    #[serde(rename = "requestId")]
    pub request_id: FetchId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(rename = "postData", skip_serializing_if = "Option::is_none")]
    pub post_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
}

impl ContinueRequestParams {
    pub fn new(request_id: FetchId) -> Self {
        Self {
            request_id,
            url: None,
            method: None,
            post_data: None,
            headers: None,
        }
    }
}

impl Method for ContinueRequestParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Fetch.continueRequest".into()
    }
}
impl Command for ContinueRequestParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ErrorReason {
    Failed,
    Aborted,
    TimedOut,
    AccessDenied,
    ConnectionClosed,
    ConnectionReset,
    ConnectionRefused,
    ConnectionAborted,
    ConnectionFailed,
    NameNotResolved,
    InternetDisconnected,
    AddressUnreachable,
    BlockedByClient,
    BlockedByResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailRequestParams {
    #[serde(rename = "requestId")]
    pub request_id: FetchId,
    #[serde(rename = "errorReason")]
    pub error_reason: ErrorReason,
}

impl Method for FailRequestParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Fetch.failRequest".into()
    }
}
impl Command for FailRequestParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Serialize)]
pub struct FulfillRequestParams {
    #[serde(rename = "requestId")]
    pub request_id: FetchId,
    #[serde(rename = "responseCode")]
    pub response_code: i64,
    #[serde(rename = "responseHeaders", default)]
    pub response_headers: Vec<HeaderEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Method for FulfillRequestParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Fetch.fulfillRequest".into()
    }
}
impl Command for FulfillRequestParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum AuthChallengeResponseType {
    Default,
    CancelAuth,
    ProvideCredentials,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthChallengeResponse {
    pub response: AuthChallengeResponseType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl AuthChallengeResponse {
    /// §4.5 S5: nobody asked to intercept `authRequired`, so the mapper lets
    /// the browser's own credential flow resume.
    pub fn default_response() -> Self {
        Self {
            response: AuthChallengeResponseType::Default,
            username: None,
            password: None,
        }
    }

    pub fn provide(username: String, password: String) -> Self {
        Self {
            response: AuthChallengeResponseType::ProvideCredentials,
            username: Some(username),
            password: Some(password),
        }
    }

    pub fn cancel() -> Self {
        Self {
            response: AuthChallengeResponseType::CancelAuth,
            username: None,
            password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContinueWithAuthParams {
    #[serde(rename = "requestId")]
    pub request_id: FetchId,
    #[serde(rename = "authChallengeResponse")]
    pub auth_challenge_response: AuthChallengeResponse,
}

impl Method for ContinueWithAuthParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Fetch.continueWithAuth".into()
    }
}
impl Command for ContinueWithAuthParams {
    type Response = serde_json::Value;
}
