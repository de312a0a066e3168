//! §4.1 BrowsingContextStorage: an O(1)-lookup index over the context tree.
//! Mutation is serialised by the single-threaded runner (§5), so this type
//! carries no internal locking — it is a plain owned `HashMap` wrapped with
//! the tree invariants as methods, mirroring the way the teacher's
//! `FrameManager` owns and mutates its `frames: HashMap<FrameId, Frame>`.

use std::collections::HashMap;

use crate::cdp::{SessionId, TargetId};
use crate::error::BidiError;

use super::browsing_context::BrowsingContext;
use super::ids::BrowsingContextId;

#[derive(Debug, Default)]
pub struct BrowsingContextStorage {
    contexts: HashMap<BrowsingContextId, BrowsingContext>,
    /// Reverse index: CDP session id -> the context it currently drives.
    /// Rebuilt whenever a `CdpTarget` is (re)bound to a context.
    by_session: HashMap<SessionId, BrowsingContextId>,
}

impl BrowsingContextStorage {
    pub fn insert(&mut self, context: BrowsingContext) {
        if let Some(parent_id) = context.parent.clone() {
            if let Some(parent) = self.contexts.get_mut(&parent_id) {
                parent.children.insert(context.id.clone());
            }
        }
        self.contexts.insert(context.id.clone(), context);
    }

    pub fn bind_session(&mut self, session: SessionId, context: BrowsingContextId) {
        self.by_session.insert(session, context);
    }

    pub fn unbind_session(&mut self, session: &SessionId) {
        self.by_session.remove(session);
    }

    /// Removes the subtree rooted at `id` atomically from the caller's
    /// point of view and returns the removed contexts, root first (§4.1:
    /// "removal removes subtree atomically"; §3 invariant (c): descendants
    /// must be detached from storage before any `contextDestroyed` event is
    /// emitted for them).
    pub fn remove_subtree(&mut self, id: &BrowsingContextId) -> Vec<BrowsingContext> {
        let Some(context) = self.contexts.remove(id) else {
            return Vec::new();
        };
        if let Some(parent_id) = context.parent.clone() {
            if let Some(parent) = self.contexts.get_mut(&parent_id) {
                parent.children.remove(id);
            }
        }
        let children: Vec<BrowsingContextId> = context.children.iter().cloned().collect();
        let mut removed = vec![context];
        for child in children {
            removed.extend(self.remove_subtree(&child));
        }
        removed
    }

    pub fn get_by_id(&self, id: &BrowsingContextId) -> Result<&BrowsingContext, BidiError> {
        self.contexts.get(id).ok_or_else(|| BidiError::no_such_frame(id))
    }

    pub fn get_by_id_mut(&mut self, id: &BrowsingContextId) -> Result<&mut BrowsingContext, BidiError> {
        self.contexts
            .get_mut(id)
            .ok_or_else(|| BidiError::no_such_frame(id))
    }

    pub fn find_by_id(&self, id: &BrowsingContextId) -> Option<&BrowsingContext> {
        self.contexts.get(id)
    }

    pub fn find_by_session(&self, session: &SessionId) -> Option<&BrowsingContext> {
        self.by_session.get(session).and_then(|id| self.contexts.get(id))
    }

    /// The reverse of [`Self::find_by_session`]: the session currently
    /// driving a given context, if any.
    pub fn session_for_context(&self, context: &BrowsingContextId) -> Option<SessionId> {
        self.by_session
            .iter()
            .find(|(_, ctx)| *ctx == context)
            .map(|(session, _)| session.clone())
    }

    pub fn find_by_target(&self, target: &TargetId) -> Option<&BrowsingContext> {
        self.contexts.values().find(|c| &c.owning_target == target)
    }

    pub fn top_level_contexts(&self) -> impl Iterator<Item = &BrowsingContext> {
        self.contexts.values().filter(|c| c.is_top_level())
    }

    pub fn all(&self) -> impl Iterator<Item = &BrowsingContext> {
        self.contexts.values()
    }

    /// Walk parent pointers to find the top-level ancestor's id. Cycles are
    /// structurally impossible because `insert` only ever links a new
    /// context to an already-inserted parent (§4.1 invariant).
    pub fn find_top_level_context_id(&self, id: &BrowsingContextId) -> Option<BrowsingContextId> {
        let mut current = self.contexts.get(id)?;
        loop {
            match &current.parent {
                None => return Some(current.id.clone()),
                Some(parent_id) => current = self.contexts.get(parent_id)?,
            }
        }
    }

    /// True if `ancestor` is `descendant` or a proper ancestor of it —
    /// the predicate the subscription manager needs (§4.6).
    pub fn is_ancestor_or_self(&self, ancestor: &BrowsingContextId, descendant: &BrowsingContextId) -> bool {
        let mut current = descendant.clone();
        loop {
            if &current == ancestor {
                return true;
            }
            match self.contexts.get(&current).and_then(|c| c.parent.clone()) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::UserContextId;

    fn ctx(id: &str, parent: Option<&str>) -> BrowsingContext {
        let target = TargetId::new(id);
        match parent {
            None => BrowsingContext::new_top_level(id.into(), UserContextId::default_context(), target),
            Some(p) => BrowsingContext::new_child(
                id.into(),
                p.into(),
                UserContextId::default_context(),
                target,
            ),
        }
    }

    #[test]
    fn insert_links_parent_and_child() {
        let mut storage = BrowsingContextStorage::default();
        storage.insert(ctx("root", None));
        storage.insert(ctx("child", Some("root")));

        assert!(storage.get_by_id(&"root".into()).unwrap().children.contains(&"child".into()));
    }

    #[test]
    fn remove_subtree_removes_descendants_atomically() {
        let mut storage = BrowsingContextStorage::default();
        storage.insert(ctx("root", None));
        storage.insert(ctx("child", Some("root")));
        storage.insert(ctx("grandchild", Some("child")));

        let removed = storage.remove_subtree(&"child".into());
        assert_eq!(removed.len(), 2);
        assert!(storage.find_by_id(&"child".into()).is_none());
        assert!(storage.find_by_id(&"grandchild".into()).is_none());
        assert!(!storage
            .get_by_id(&"root".into())
            .unwrap()
            .children
            .contains(&"child".into()));
    }

    #[test]
    fn unknown_id_is_a_no_such_frame_error() {
        let storage = BrowsingContextStorage::default();
        let err = storage.get_by_id(&"missing".into()).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::NoSuchFrame);
    }

    #[test]
    fn find_top_level_walks_to_the_root() {
        let mut storage = BrowsingContextStorage::default();
        storage.insert(ctx("root", None));
        storage.insert(ctx("child", Some("root")));
        storage.insert(ctx("grandchild", Some("child")));

        assert_eq!(
            storage.find_top_level_context_id(&"grandchild".into()),
            Some("root".into())
        );
    }

    #[test]
    fn session_for_context_reverses_bind_session() {
        let mut storage = BrowsingContextStorage::default();
        storage.insert(ctx("root", None));
        storage.bind_session(SessionId::new("s1"), "root".into());

        assert_eq!(storage.session_for_context(&"root".into()), Some(SessionId::new("s1")));
        assert_eq!(storage.session_for_context(&"missing".into()), None);
    }

    #[test]
    fn ancestor_predicate_includes_self() {
        let mut storage = BrowsingContextStorage::default();
        storage.insert(ctx("root", None));
        storage.insert(ctx("child", Some("root")));

        assert!(storage.is_ancestor_or_self(&"root".into(), &"child".into()));
        assert!(storage.is_ancestor_or_self(&"child".into(), &"child".into()));
        assert!(!storage.is_ancestor_or_self(&"child".into(), &"root".into()));
    }
}
