//! The BiDi browsing-context tree (§3, §4.1). Grounded on the teacher's
//! `handler::frame::Frame`/`FrameManager` pair, generalised from CDP frames
//! to BiDi contexts (a context may *be* a CDP target, unlike a `Frame`).

use std::collections::HashSet;

use crate::cdp::TargetId;

use super::ids::{BrowsingContextId, UserContextId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessState {
    None,
    Interactive,
    Complete,
}

/// A window, tab, or frame (§3). Owns no other entity directly — it only
/// points at its `CdpTarget` by id, per the no-ownership-cycles design
/// note (§9).
#[derive(Debug, Clone)]
pub struct BrowsingContext {
    pub id: BrowsingContextId,
    pub parent: Option<BrowsingContextId>,
    pub user_context: UserContextId,
    pub url: String,
    pub readiness: ReadinessState,
    pub children: HashSet<BrowsingContextId>,
    /// The CDP target currently driving this context. Rebound, not
    /// recreated, on an OOPIF swap (§4.3 S4).
    pub owning_target: TargetId,
}

impl BrowsingContext {
    pub fn new_top_level(id: BrowsingContextId, user_context: UserContextId, target: TargetId) -> Self {
        Self {
            id,
            parent: None,
            user_context,
            url: "about:blank".to_string(),
            readiness: ReadinessState::None,
            children: HashSet::new(),
            owning_target: target,
        }
    }

    pub fn new_child(
        id: BrowsingContextId,
        parent: BrowsingContextId,
        user_context: UserContextId,
        target: TargetId,
    ) -> Self {
        Self {
            id,
            parent: Some(parent),
            user_context,
            url: "about:blank".to_string(),
            readiness: ReadinessState::None,
            children: HashSet::new(),
            owning_target: target,
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.parent.is_none()
    }
}
