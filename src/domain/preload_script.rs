//! §3 PreloadScript: JavaScript installed to run on every new document
//! before any page script, optionally scoped to one context.

use std::collections::HashMap;

use crate::cdp::CdpScriptId;

use super::ids::{BrowsingContextId, ChannelId, PreloadScriptId};

#[derive(Debug, Clone)]
pub struct ChannelProxy {
    pub id: ChannelId,
    pub ownership: ChannelOwnership,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOwnership {
    Root,
    Global,
}

#[derive(Debug, Clone)]
pub struct PreloadScript {
    pub id: PreloadScriptId,
    pub source: String,
    pub sandbox: Option<String>,
    pub channels: Vec<ChannelProxy>,
    pub context_filter: Option<BrowsingContextId>,
    /// The CDP script id assigned per target it was installed on, so it can
    /// be torn down with `Page.removeScriptToEvaluateOnNewDocument`.
    pub installed_on: HashMap<crate::cdp::TargetId, CdpScriptId>,
}

impl PreloadScript {
    pub fn new(
        source: String,
        sandbox: Option<String>,
        channels: Vec<ChannelProxy>,
        context_filter: Option<BrowsingContextId>,
    ) -> Self {
        Self {
            id: PreloadScriptId::new(),
            source,
            sandbox,
            channels,
            context_filter,
            installed_on: HashMap::new(),
        }
    }

    /// §4.2 step 6: does this script apply to a target unblocking for
    /// `context`? Global scripts (`context_filter: None`) apply everywhere.
    pub fn applies_to(&self, context: &BrowsingContextId) -> bool {
        match &self.context_filter {
            None => true,
            Some(filter) => filter == context,
        }
    }
}
