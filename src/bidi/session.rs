//! `session.*` commands (§4.6): subscribe/unsubscribe.

use serde::Deserialize;

use crate::domain::ids::{BrowsingContextId, SubscriptionId};

#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeParams {
    pub events: Vec<String>,
    #[serde(default)]
    pub contexts: Option<Vec<BrowsingContextId>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnsubscribeParams {
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionId>,
}
