//! §4.6 EventManager: publication, buffering, and subscription-triggered
//! flush. `SubscriptionManager` (the matching predicate) lives in
//! `domain::subscription`; this module owns the buffers and the delivery
//! order contract on top of it.

use std::collections::{HashMap, VecDeque};

use crate::domain::browsing_context_storage::BrowsingContextStorage;
use crate::domain::ids::{BrowsingContextId, SubscriptionId};
use crate::domain::subscription::SubscriptionManager;

/// §9 Open Question, resolved: no numeric bound is given by the
/// specification, so a documented bound is chosen here. 1024 buffered
/// events per (module, context) comfortably covers a burst of `network.*`
/// traffic on a single page load without the buffer becoming unbounded
/// memory growth if a client forgets to subscribe.
pub const DEFAULT_BUFFER_BOUND: usize = 1024;

/// Only these modules carry no-subscriber buffering (§4.6: "buffering is
/// only required for events whose module spec says so — chiefly `log.*`
/// and `network.*`"). Everything else is delivered-or-dropped.
fn is_bufferable(module: &str) -> bool {
    matches!(module, "log" | "network")
}

#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub module: String,
    pub context_id: Option<BrowsingContextId>,
    pub payload: serde_json::Value,
}

/// A FIFO per (module, context) with drop-oldest overflow.
#[derive(Default)]
struct Buffer {
    events: VecDeque<PublishedEvent>,
}

impl Buffer {
    fn push(&mut self, event: PublishedEvent, bound: usize) {
        if self.events.len() >= bound {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

pub struct EventManager {
    subscriptions: SubscriptionManager,
    buffers: HashMap<(String, Option<BrowsingContextId>), Buffer>,
    bound: usize,
    outbox: VecDeque<PublishedEvent>,
}

impl EventManager {
    pub fn new(bound: usize) -> Self {
        Self {
            subscriptions: SubscriptionManager::default(),
            buffers: HashMap::new(),
            bound,
            outbox: VecDeque::new(),
        }
    }

    pub fn subscribe(
        &mut self,
        names: Vec<String>,
        contexts: Option<Vec<BrowsingContextId>>,
        browsing_contexts: &BrowsingContextStorage,
    ) -> SubscriptionId {
        let id = self.subscriptions.subscribe(names, contexts);
        self.flush_newly_matching(browsing_contexts);
        id
    }

    pub fn unsubscribe(&mut self, ids: &[SubscriptionId]) {
        self.subscriptions.unsubscribe(ids);
    }

    /// §4.6 `registerEvent`: deliver immediately if subscribed, otherwise
    /// buffer (when the module is bufferable) or drop it silently.
    pub fn register_event(
        &mut self,
        module: &str,
        context_id: Option<BrowsingContextId>,
        payload: serde_json::Value,
        contexts: &BrowsingContextStorage,
    ) {
        let full_name = payload
            .get("method")
            .and_then(|m| m.as_str())
            .unwrap_or(module);
        if self
            .subscriptions
            .is_subscribed_to(full_name, context_id.as_ref(), contexts)
        {
            self.outbox.push_back(PublishedEvent {
                module: module.to_string(),
                context_id,
                payload,
            });
            return;
        }
        if is_bufferable(module) {
            self.buffers
                .entry((module.to_string(), context_id.clone()))
                .or_default()
                .push(PublishedEvent { module: module.to_string(), context_id, payload }, self.bound);
        }
    }

    /// Moves every buffered event that now matches a live subscription into
    /// the outbox, each buffer draining in its own insertion order, before
    /// any subsequent live event (§4.6).
    fn flush_newly_matching(&mut self, contexts: &BrowsingContextStorage) {
        let matching_keys: Vec<(String, Option<BrowsingContextId>)> = self
            .buffers
            .keys()
            .filter(|(module, ctx)| {
                self.subscriptions.is_subscribed_to(module, ctx.as_ref(), contexts)
            })
            .cloned()
            .collect();
        for key in matching_keys {
            if let Some(mut buffer) = self.buffers.remove(&key) {
                self.outbox.extend(buffer.events.drain(..));
            }
        }
    }

    pub fn drain_outbox(&mut self) -> Vec<PublishedEvent> {
        self.outbox.drain(..).collect()
    }

    /// §4.6 last sentence: once a context is disposed and its
    /// `contextDestroyed` has gone out, nothing more is delivered or
    /// buffered for it.
    pub fn forget_context(&mut self, context_id: &BrowsingContextId) {
        self.buffers.retain(|(_, ctx), _| ctx.as_ref() != Some(context_id));
        self.outbox.retain(|e| e.context_id.as_ref() != Some(context_id));
    }

    pub fn is_subscribed_to(&self, event: &str, context_id: Option<&BrowsingContextId>, contexts: &BrowsingContextStorage) -> bool {
        self.subscriptions.is_subscribed_to(event, context_id, contexts)
    }

    pub fn has_network_subscriber_for_subtree(
        &self,
        top_level_id: &BrowsingContextId,
        contexts: &BrowsingContextStorage,
    ) -> bool {
        self.subscriptions.has_network_subscriber_for_subtree(top_level_id, contexts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdp::TargetId;
    use crate::domain::browsing_context::BrowsingContext;
    use crate::domain::ids::UserContextId;
    use serde_json::json;

    fn contexts() -> BrowsingContextStorage {
        let mut storage = BrowsingContextStorage::default();
        storage.insert(BrowsingContext::new_top_level(
            "root".into(),
            UserContextId::default_context(),
            TargetId::new("root"),
        ));
        storage
    }

    #[test]
    fn unsubscribed_bufferable_event_is_buffered_not_dropped() {
        let mut mgr = EventManager::new(4);
        let contexts = contexts();
        mgr.register_event("network", Some("root".into()), json!({"method": "network.beforeRequestSent"}), &contexts);
        assert!(mgr.drain_outbox().is_empty());
    }

    #[test]
    fn subscribing_flushes_buffered_events_in_order() {
        let mut mgr = EventManager::new(4);
        let contexts = contexts();
        mgr.register_event("network", Some("root".into()), json!({"method": "network.beforeRequestSent", "seq": 1}), &contexts);
        mgr.register_event("network", Some("root".into()), json!({"method": "network.beforeRequestSent", "seq": 2}), &contexts);
        mgr.subscribe(vec!["network".into()], None, &contexts);
        let drained = mgr.drain_outbox();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].payload["seq"], 1);
        assert_eq!(drained[1].payload["seq"], 2);
    }

    #[test]
    fn drop_oldest_once_bound_exceeded() {
        let mut mgr = EventManager::new(1);
        let contexts = contexts();
        mgr.register_event("network", Some("root".into()), json!({"method": "network.x", "seq": 1}), &contexts);
        mgr.register_event("network", Some("root".into()), json!({"method": "network.x", "seq": 2}), &contexts);
        mgr.subscribe(vec!["network".into()], None, &contexts);
        let drained = mgr.drain_outbox();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].payload["seq"], 2);
    }

    #[test]
    fn non_bufferable_module_is_dropped_without_a_subscriber() {
        let mut mgr = EventManager::new(4);
        let contexts = contexts();
        mgr.register_event("browsingContext", Some("root".into()), json!({"method": "browsingContext.load"}), &contexts);
        mgr.subscribe(vec!["browsingContext".into()], None, &contexts);
        assert!(mgr.drain_outbox().is_empty());
    }
}
