//! §2 RealmStorage: index realms by id/context/session.

use std::collections::HashMap;

use crate::cdp::SessionId;

use super::ids::{BrowsingContextId, RealmId};
use super::realm::Realm;

#[derive(Debug, Default)]
pub struct RealmStorage {
    realms: HashMap<RealmId, Realm>,
}

impl RealmStorage {
    pub fn insert(&mut self, realm: Realm) {
        self.realms.insert(realm.id.clone(), realm);
    }

    pub fn get(&self, id: &RealmId) -> Option<&Realm> {
        self.realms.get(id)
    }

    pub fn find_by_context(&self, context: &BrowsingContextId) -> impl Iterator<Item = &Realm> + '_ {
        let context = context.clone();
        self.realms
            .values()
            .filter(move |r| r.browsing_context.as_ref() == Some(&context))
    }

    /// The single "default" realm for a context (§3 invariant (a)): the
    /// window realm with no sandbox name.
    pub fn default_realm(&self, context: &BrowsingContextId) -> Option<&Realm> {
        self.find_by_context(context).find(|r| r.is_default_window())
    }

    pub fn find_by_session(&self, session: &SessionId) -> impl Iterator<Item = &Realm> + '_ {
        let session = session.clone();
        self.realms.values().filter(move |r| r.session == session)
    }

    /// §3 invariant (b): navigating a context invalidates every realm
    /// belonging to it before new ones are created. Returns the removed
    /// realm ids so callers can emit `realmDestroyed`.
    pub fn invalidate_context(&mut self, context: &BrowsingContextId) -> Vec<RealmId> {
        let dead: Vec<RealmId> = self
            .find_by_context(context)
            .map(|r| r.id.clone())
            .collect();
        for id in &dead {
            self.realms.remove(id);
        }
        dead
    }

    /// §3: worker realms are removed when their owning session detaches, or
    /// (for shared/service workers, via `Inspector.targetCrashed`) when the
    /// session's client dies outright.
    pub fn remove_by_session(&mut self, session: &SessionId) -> Vec<RealmId> {
        let dead: Vec<RealmId> = self
            .find_by_session(session)
            .map(|r| r.id.clone())
            .collect();
        for id in &dead {
            self.realms.remove(id);
        }
        dead
    }

    pub fn remove(&mut self, id: &RealmId) -> Option<Realm> {
        self.realms.remove(id)
    }
}
