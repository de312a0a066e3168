//! §2 PreloadScriptStorage: global and per-context preload scripts.

use std::collections::HashMap;

use crate::error::BidiError;

use super::ids::{BrowsingContextId, PreloadScriptId};
use super::preload_script::PreloadScript;

#[derive(Debug, Default)]
pub struct PreloadScriptStorage {
    scripts: HashMap<PreloadScriptId, PreloadScript>,
}

impl PreloadScriptStorage {
    pub fn insert(&mut self, script: PreloadScript) -> PreloadScriptId {
        let id = script.id.clone();
        self.scripts.insert(id.clone(), script);
        id
    }

    pub fn remove(&mut self, id: &PreloadScriptId) -> Result<PreloadScript, BidiError> {
        self.scripts
            .remove(id)
            .ok_or_else(|| BidiError::no_such_script(id))
    }

    pub fn get_mut(&mut self, id: &PreloadScriptId) -> Option<&mut PreloadScript> {
        self.scripts.get_mut(id)
    }

    /// §4.2 step 6: every script that matches the unblocking target's
    /// context, in insertion order so install order is deterministic.
    pub fn matching(&self, context: &BrowsingContextId) -> Vec<&PreloadScript> {
        self.scripts.values().filter(|s| s.applies_to(context)).collect()
    }

    pub fn all(&self) -> impl Iterator<Item = &PreloadScript> {
        self.scripts.values()
    }
}
