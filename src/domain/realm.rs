//! Execution realms (§3): window, sandbox, or worker. Grounded on the
//! teacher's `handler::frame::Frame` bookkeeping style, generalised to the
//! variant set BiDi needs.

use crate::cdp::{ExecutionContextId, SessionId};

use super::ids::{BrowsingContextId, RealmId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealmType {
    Window { sandbox: Option<String> },
    DedicatedWorker,
    SharedWorker,
    ServiceWorker,
}

#[derive(Debug, Clone)]
pub struct Realm {
    pub id: RealmId,
    pub realm_type: RealmType,
    pub origin: String,
    pub execution_context_id: ExecutionContextId,
    pub session: SessionId,
    /// For a window realm, the context it belongs to. Worker realms are
    /// owned by the realms listed in `owners` instead (§3).
    pub browsing_context: Option<BrowsingContextId>,
    pub owners: Vec<RealmId>,
}

impl Realm {
    pub fn is_default_window(&self) -> bool {
        matches!(self.realm_type, RealmType::Window { sandbox: None })
    }
}
