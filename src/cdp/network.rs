//! `Network.*` — the request lifecycle events consumed by
//! [`crate::domain::network_request`]. Deliberately narrow: only the fields
//! the mapper actually reads are modelled.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use bidi_mapper_types::{Command, Method};

use super::{LoaderId, RequestId};

pub type Headers = HashMap<String, String>;

#[derive(Debug, Clone, Deserialize)]
pub struct RequestData {
    pub url: String,
    pub method: String,
    #[serde(default)]
    pub headers: Headers,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseData {
    pub url: String,
    pub status: i64,
    #[serde(rename = "statusText")]
    pub status_text: String,
    #[serde(default)]
    pub headers: Headers,
    #[serde(rename = "fromDiskCache", default)]
    pub from_disk_cache: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRequestWillBeSent {
    #[serde(rename = "requestId")]
    pub request_id: RequestId,
    #[serde(rename = "loaderId")]
    pub loader_id: LoaderId,
    pub request: RequestData,
    #[serde(rename = "redirectResponse")]
    pub redirect_response: Option<ResponseData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRequestWillBeSentExtraInfo {
    #[serde(rename = "requestId")]
    pub request_id: RequestId,
    #[serde(default)]
    pub headers: Headers,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventResponseReceived {
    #[serde(rename = "requestId")]
    pub request_id: RequestId,
    pub response: ResponseData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventResponseReceivedExtraInfo {
    #[serde(rename = "requestId")]
    pub request_id: RequestId,
    #[serde(default)]
    pub headers: Headers,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventLoadingFailed {
    #[serde(rename = "requestId")]
    pub request_id: RequestId,
    #[serde(rename = "errorText")]
    pub error_text: String,
    #[serde(default)]
    pub canceled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventLoadingFinished {
    #[serde(rename = "requestId")]
    pub request_id: RequestId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventRequestServedFromCache {
    #[serde(rename = "requestId")]
    pub request_id: RequestId,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EnableParams {}

impl Method for EnableParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Network.enable".into()
    }
}
impl Command for EnableParams {
    type Response = serde_json::Value;
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DisableParams {}

impl Method for DisableParams {
    fn identifier(&self) -> std::borrow::Cow<'static, str> {
        "Network.disable".into()
    }
}
impl Command for DisableParams {
    type Response = serde_json::Value;
}
