//! §4.6 SubscriptionManager: which BiDi modules/events are subscribed, for
//! which context subtrees.

use std::collections::HashMap;

use super::browsing_context_storage::BrowsingContextStorage;
use super::ids::{BrowsingContextId, SubscriptionId};

#[derive(Debug, Clone)]
pub struct Subscription {
    pub id: SubscriptionId,
    /// A module name (`"network"`) or a fully qualified event
    /// (`"network.beforeRequestSent"`).
    pub names: Vec<String>,
    /// `None` means global (§4.6: `contexts = ∅` means global).
    pub contexts: Option<Vec<BrowsingContextId>>,
}

#[derive(Debug, Default)]
pub struct SubscriptionManager {
    subscriptions: HashMap<SubscriptionId, Subscription>,
}

impl SubscriptionManager {
    pub fn subscribe(&mut self, names: Vec<String>, contexts: Option<Vec<BrowsingContextId>>) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.subscriptions.insert(
            id.clone(),
            Subscription {
                id: id.clone(),
                names,
                contexts,
            },
        );
        id
    }

    pub fn unsubscribe(&mut self, ids: &[SubscriptionId]) {
        for id in ids {
            self.subscriptions.remove(id);
        }
    }

    /// True iff any live subscription matches `event_name`'s module or its
    /// exact name, and is either global or covers `context_id` (including
    /// any ancestor of it).
    pub fn is_subscribed_to(
        &self,
        event_name: &str,
        context_id: Option<&BrowsingContextId>,
        contexts: &BrowsingContextStorage,
    ) -> bool {
        let module = event_name.split('.').next().unwrap_or(event_name);
        self.subscriptions.values().any(|sub| {
            let name_matches = sub
                .names
                .iter()
                .any(|n| n == module || n == event_name);
            if !name_matches {
                return false;
            }
            match (&sub.contexts, context_id) {
                (None, _) => true,
                (Some(_), None) => false,
                (Some(scoped), Some(ctx)) => scoped
                    .iter()
                    .any(|scope| contexts.is_ancestor_or_self(scope, ctx)),
            }
        })
    }

    /// §4.4: is any subscriber interested in `network.*` anywhere in this
    /// target's subtree? Used to decide whether `Network`/`Fetch` stay
    /// enabled on a given `CdpTarget` (§4.2 step 4, §4.4 network-domain
    /// coupling, §8 invariant 7).
    pub fn has_network_subscriber_for_subtree(
        &self,
        top_level_id: &BrowsingContextId,
        contexts: &BrowsingContextStorage,
    ) -> bool {
        contexts
            .all()
            .filter(|c| contexts.find_top_level_context_id(&c.id).as_ref() == Some(top_level_id))
            .any(|c| self.is_subscribed_to("network", Some(&c.id), contexts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::browsing_context::BrowsingContext;
    use crate::domain::ids::UserContextId;
    use crate::cdp::TargetId;

    fn storage_with_tree() -> BrowsingContextStorage {
        let mut storage = BrowsingContextStorage::default();
        storage.insert(BrowsingContext::new_top_level(
            "root".into(),
            UserContextId::default_context(),
            TargetId::new("root"),
        ));
        storage.insert(BrowsingContext::new_child(
            "child".into(),
            "root".into(),
            UserContextId::default_context(),
            TargetId::new("child"),
        ));
        storage
    }

    #[test]
    fn global_subscription_matches_any_context() {
        let mut mgr = SubscriptionManager::default();
        mgr.subscribe(vec!["network".into()], None);
        let contexts = storage_with_tree();
        assert!(mgr.is_subscribed_to("network.beforeRequestSent", Some(&"child".into()), &contexts));
    }

    #[test]
    fn scoped_subscription_covers_descendants() {
        let mut mgr = SubscriptionManager::default();
        mgr.subscribe(vec!["network".into()], Some(vec!["root".into()]));
        let contexts = storage_with_tree();
        assert!(mgr.is_subscribed_to("network.beforeRequestSent", Some(&"child".into()), &contexts));
    }

    #[test]
    fn scoped_subscription_does_not_cover_unrelated_context() {
        let mut mgr = SubscriptionManager::default();
        mgr.subscribe(vec!["network".into()], Some(vec!["child".into()]));
        let contexts = storage_with_tree();
        assert!(!mgr.is_subscribed_to("network.beforeRequestSent", Some(&"root".into()), &contexts));
    }

    #[test]
    fn unsubscribe_removes_matching() {
        let mut mgr = SubscriptionManager::default();
        let id = mgr.subscribe(vec!["network".into()], None);
        mgr.unsubscribe(&[id]);
        let contexts = storage_with_tree();
        assert!(!mgr.is_subscribed_to("network.beforeRequestSent", Some(&"root".into()), &contexts));
    }
}
