//! §4.4 NetworkStorage (intercept registry, Fetch-stage computation) and
//! §4.5 NetworkRequest (per-request state machine). Grounded on the
//! teacher's `handler::network::NetworkManager` for the domain-enable
//! bookkeeping and `handler::target::Target` for the "compute desired
//! state, diff against current, only commit on success" shape — the actual
//! CDP calls are left to the processor, this module only ever computes
//! *what* should happen and updates its own bookkeeping; it never touches
//! a `CdpClient` directly so it stays unit-testable without a transport.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::cdp::{FetchId, SessionId, TargetId};
use crate::domain::browsing_context_storage::BrowsingContextStorage;
use crate::domain::cdp_target::FetchStages;
use crate::domain::deferred::{deferred, Deferred, DeferredSender};
use crate::domain::ids::{BrowsingContextId, InterceptId, RequestId};
use crate::domain::url_pattern::UrlPattern;
use crate::error::BidiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InterceptPhase {
    BeforeRequestSent,
    ResponseStarted,
    AuthRequired,
}

#[derive(Debug, Clone)]
pub struct Intercept {
    pub id: InterceptId,
    pub patterns: Vec<UrlPattern>,
    pub phases: Vec<InterceptPhase>,
    /// `None` means global, matching `Subscription::contexts` (§2.2/§4.6).
    /// Not named explicitly in the data model's Intercept entry, but §4.4's
    /// "OR together phases across all intercepts scoped to that context
    /// subtree" only makes sense if an intercept can in fact be scoped —
    /// see DESIGN.md.
    pub contexts: Option<Vec<BrowsingContextId>>,
}

impl Intercept {
    fn covers(&self, context: &BrowsingContextId, contexts: &BrowsingContextStorage) -> bool {
        match &self.contexts {
            None => true,
            Some(scoped) => scoped.iter().any(|s| contexts.is_ancestor_or_self(s, context)),
        }
    }
}

/// §4.4: the intercept registry plus the per-target Fetch-stage ledger used
/// to decide when a stage change needs a new `Fetch.enable`/`Fetch.disable`
/// round trip.
#[derive(Default)]
pub struct NetworkStorage {
    intercepts: HashMap<InterceptId, Intercept>,
    committed_stages: HashMap<TargetId, FetchStages>,
}

impl NetworkStorage {
    pub fn add_intercept(
        &mut self,
        patterns: Vec<UrlPattern>,
        phases: Vec<InterceptPhase>,
        contexts: Option<Vec<BrowsingContextId>>,
    ) -> InterceptId {
        let id = InterceptId::new();
        self.intercepts.insert(
            id.clone(),
            Intercept {
                id: id.clone(),
                patterns,
                phases,
                contexts,
            },
        );
        id
    }

    pub fn remove_intercept(&mut self, id: &InterceptId) -> Result<(), BidiError> {
        self.intercepts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| BidiError::no_such_intercept(&id.0))
    }

    /// §4.4: OR together phases across every intercept covering this
    /// context subtree.
    pub fn interception_stages(
        &self,
        top_level_id: &BrowsingContextId,
        contexts: &BrowsingContextStorage,
    ) -> FetchStages {
        self.intercepts
            .values()
            .filter(|i| i.covers(top_level_id, contexts))
            .fold(FetchStages::default(), |acc, i| {
                FetchStages::union(acc, stages_of(i))
            })
    }

    /// §4.4 `requestBlockedBy`.
    pub fn request_blocked_by(
        &self,
        url: &str,
        phase: InterceptPhase,
        context: &BrowsingContextId,
        contexts: &BrowsingContextStorage,
    ) -> Vec<InterceptId> {
        self.intercepts
            .values()
            .filter(|i| i.phases.contains(&phase))
            .filter(|i| UrlPattern::matches_any(&i.patterns, url))
            .filter(|i| i.covers(context, contexts))
            .map(|i| i.id.clone())
            .collect()
    }

    pub fn committed_stages(&self, target: &TargetId) -> FetchStages {
        self.committed_stages.get(target).copied().unwrap_or_default()
    }

    /// Called by the processor only once the corresponding
    /// `Fetch.enable`/`disable` round trip succeeded — §4.4: "record the new
    /// stages only after the CDP command succeeds; on failure, restore the
    /// previous stages" (restoring is simply not calling this).
    pub fn commit_stages(&mut self, target: TargetId, stages: FetchStages) {
        if stages.any() {
            self.committed_stages.insert(target, stages);
        } else {
            self.committed_stages.remove(&target);
        }
    }

    pub fn intercepts(&self) -> impl Iterator<Item = &Intercept> {
        self.intercepts.values()
    }
}

fn stages_of(intercept: &Intercept) -> FetchStages {
    let mut s = FetchStages::default();
    for phase in &intercept.phases {
        match phase {
            InterceptPhase::BeforeRequestSent => s.request = true,
            InterceptPhase::ResponseStarted => s.response = true,
            InterceptPhase::AuthRequired => s.auth = true,
        }
    }
    s
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPhase {
    BeforeRequestSent,
    ResponseStarted,
    AuthRequired,
    Terminal,
}

/// What the processor must do in response to a state transition. Kept as
/// plain data so the state machine stays free of any `CdpClient` call —
/// the processor performs the CDP/BiDi side effects, this module only ever
/// decides what they should be.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkOutcome {
    EmitBeforeRequestSent { is_blocked: bool },
    EmitResponseStarted { is_blocked: bool },
    EmitAuthRequired { is_blocked: bool },
    /// §4.5: no BiDi handler cared about the auth challenge, resume with
    /// CDP's own default flow.
    ResumeAuthWithDefault { fetch_id: FetchId },
    EmitFetchError,
    /// The terminal outcome for a request that completed successfully
    /// rather than failing.
    EmitResponseCompleted,
    /// A redirect re-keyed the request; the previous attempt's
    /// `responseStarted` waiter (if any) is resolved before the new one
    /// starts.
    Redirected,
    Ignored,
}

pub struct NetworkRequest {
    pub id: RequestId,
    pub session_id: SessionId,
    pub context_id: BrowsingContextId,
    pub fetch_id: Option<FetchId>,
    pub url: String,
    pub method: String,
    pub redirect_count: u32,
    pub phase: RequestPhase,
    pub blocked_by: Vec<InterceptId>,
    pub served_from_cache: bool,
    has_request_extra_info: bool,
    has_response_extra_info: bool,
    phase_tx: Option<DeferredSender<()>>,
    pub phase_settled: Deferred<()>,
}

impl NetworkRequest {
    fn new(id: RequestId, session_id: SessionId, context_id: BrowsingContextId, url: String, method: String) -> Self {
        let (phase_tx, phase_settled) = deferred();
        Self {
            id,
            session_id,
            context_id,
            fetch_id: None,
            url,
            method,
            redirect_count: 0,
            phase: RequestPhase::BeforeRequestSent,
            blocked_by: Vec::new(),
            served_from_cache: false,
            has_request_extra_info: false,
            has_response_extra_info: false,
            phase_tx: Some(phase_tx),
            phase_settled,
        }
    }

    /// §4.5: settle whatever phase this request was parked in — used both
    /// on normal completion and on disposal (session detach, redirect).
    fn settle_phase(&mut self) {
        if let Some(mut tx) = self.phase_tx.take() {
            tx.resolve(());
        }
    }

    fn rearm_phase_waiter(&mut self) {
        let (tx, settled) = deferred();
        self.phase_tx = Some(tx);
        self.phase_settled = settled;
    }
}

#[derive(Default)]
pub struct NetworkRequestStorage {
    requests: HashMap<RequestId, NetworkRequest>,
}

impl NetworkRequestStorage {
    /// §4.5 **Initial** transition on `Network.requestWillBeSent`.
    pub fn on_request_will_be_sent(
        &mut self,
        id: RequestId,
        session_id: SessionId,
        context_id: BrowsingContextId,
        url: String,
        method: String,
        is_redirect: bool,
        network: &NetworkStorage,
        contexts: &BrowsingContextStorage,
    ) -> NetworkOutcome {
        if is_redirect {
            if let Some(existing) = self.requests.get_mut(&id) {
                existing.settle_phase();
                existing.redirect_count += 1;
                existing.url = url.clone();
                existing.method = method.clone();
                existing.phase = RequestPhase::BeforeRequestSent;
                existing.fetch_id = None;
                existing.blocked_by.clear();
                existing.has_request_extra_info = false;
                existing.has_response_extra_info = false;
                existing.rearm_phase_waiter();
                return NetworkOutcome::Redirected;
            }
        }

        let blocked_by = network.request_blocked_by(
            &url,
            InterceptPhase::BeforeRequestSent,
            &context_id,
            contexts,
        );
        let is_blocked = !blocked_by.is_empty();
        let mut request = NetworkRequest::new(id.clone(), session_id, context_id, url, method);
        request.blocked_by = blocked_by;
        self.requests.insert(id, request);
        NetworkOutcome::EmitBeforeRequestSent { is_blocked }
    }

    /// §4.5 `network.continueRequest`/`failRequest`/`provideResponse` while
    /// parked in `beforeRequestSent`.
    pub fn resume_before_request_sent(&mut self, id: &RequestId) {
        if let Some(req) = self.requests.get_mut(id) {
            req.settle_phase();
        }
    }

    /// §4.5 `Network.responseReceived`.
    pub fn on_response_received(
        &mut self,
        id: &RequestId,
        network: &NetworkStorage,
        contexts: &BrowsingContextStorage,
    ) -> NetworkOutcome {
        let Some(req) = self.requests.get_mut(id) else {
            return NetworkOutcome::Ignored;
        };
        if req.served_from_cache {
            return NetworkOutcome::Ignored;
        }
        let blocked_by = network.request_blocked_by(
            &req.url,
            InterceptPhase::ResponseStarted,
            &req.context_id,
            contexts,
        );
        let is_blocked = !blocked_by.is_empty();
        req.blocked_by = blocked_by;
        req.phase = RequestPhase::ResponseStarted;
        req.rearm_phase_waiter();
        NetworkOutcome::EmitResponseStarted { is_blocked }
    }

    pub fn resume_response_started(&mut self, id: &RequestId) {
        if let Some(req) = self.requests.get_mut(id) {
            req.settle_phase();
        }
    }

    /// §4.5 `Fetch.authRequired`.
    pub fn on_auth_required(
        &mut self,
        id: &RequestId,
        fetch_id: FetchId,
        network: &NetworkStorage,
        contexts: &BrowsingContextStorage,
    ) -> NetworkOutcome {
        let Some(req) = self.requests.get_mut(id) else {
            return NetworkOutcome::ResumeAuthWithDefault { fetch_id };
        };
        req.fetch_id = Some(fetch_id.clone());
        let blocked_by = network.request_blocked_by(
            &req.url,
            InterceptPhase::AuthRequired,
            &req.context_id,
            contexts,
        );
        if blocked_by.is_empty() {
            return NetworkOutcome::ResumeAuthWithDefault { fetch_id };
        }
        req.blocked_by = blocked_by;
        req.phase = RequestPhase::AuthRequired;
        req.rearm_phase_waiter();
        NetworkOutcome::EmitAuthRequired { is_blocked: true }
    }

    pub fn resume_auth_required(&mut self, id: &RequestId) {
        if let Some(req) = self.requests.get_mut(id) {
            req.settle_phase();
        }
    }

    /// §4.5: extra-info events can arrive before or after the primary
    /// event; both orders are tolerated by simply recording that they
    /// arrived. Callers withhold the BiDi event until the minimum
    /// mergeable information (url/method/headers, or status/headers) is
    /// present — tracked here as the two flags.
    pub fn merge_request_extra_info(&mut self, id: &RequestId) {
        if let Some(req) = self.requests.get_mut(id) {
            req.has_request_extra_info = true;
        }
    }

    pub fn merge_response_extra_info(&mut self, id: &RequestId) {
        if let Some(req) = self.requests.get_mut(id) {
            req.has_response_extra_info = true;
        }
    }

    pub fn on_loading_failed(&mut self, id: &RequestId) -> NetworkOutcome {
        if let Some(mut req) = self.requests.remove(id) {
            req.phase = RequestPhase::Terminal;
            req.settle_phase();
            NetworkOutcome::EmitFetchError
        } else {
            NetworkOutcome::Ignored
        }
    }

    pub fn on_loading_finished(&mut self, id: &RequestId) -> NetworkOutcome {
        if let Some(mut req) = self.requests.remove(id) {
            req.settle_phase();
            NetworkOutcome::EmitResponseCompleted
        } else {
            NetworkOutcome::Ignored
        }
    }

    pub fn on_served_from_cache(&mut self, id: &RequestId) {
        if let Some(req) = self.requests.get_mut(id) {
            req.served_from_cache = true;
        }
    }

    pub fn get(&self, id: &RequestId) -> Option<&NetworkRequest> {
        self.requests.get(id)
    }

    /// `Fetch.requestPaused` carries the fetch-domain id the later
    /// `Fetch.continueRequest`/`failRequest` call needs; `Network.*` events
    /// never see it, so the processor records it separately as it arrives.
    pub fn set_fetch_id(&mut self, id: &RequestId, fetch_id: FetchId) {
        if let Some(req) = self.requests.get_mut(id) {
            req.fetch_id = Some(fetch_id);
        }
    }

    /// §4.5 Disposal: every request tied to a detached session is settled
    /// with a fetchError and removed.
    pub fn dispose_by_session(&mut self, session_id: &SessionId) -> Vec<RequestId> {
        let doomed: Vec<RequestId> = self
            .requests
            .iter()
            .filter(|(_, r)| &r.session_id == session_id)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &doomed {
            if let Some(mut req) = self.requests.remove(id) {
                req.settle_phase();
            }
        }
        doomed
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cdp::TargetId;
    use crate::domain::browsing_context::BrowsingContext;
    use crate::domain::ids::UserContextId;

    fn ctx_storage() -> BrowsingContextStorage {
        let mut storage = BrowsingContextStorage::default();
        storage.insert(BrowsingContext::new_top_level(
            "top".into(),
            UserContextId::default_context(),
            TargetId::new("top"),
        ));
        storage
    }

    #[test]
    fn unmatched_request_is_not_blocked() {
        let network = NetworkStorage::default();
        let contexts = ctx_storage();
        let mut requests = NetworkRequestStorage::default();
        let outcome = requests.on_request_will_be_sent(
            RequestId("r1".into()),
            SessionId::new("s1"),
            "top".into(),
            "http://example.com/".into(),
            "GET".into(),
            false,
            &network,
            &contexts,
        );
        assert_eq!(outcome, NetworkOutcome::EmitBeforeRequestSent { is_blocked: false });
    }

    #[test]
    fn intercept_blocks_matching_request() {
        let mut network = NetworkStorage::default();
        network.add_intercept(vec![], vec![InterceptPhase::BeforeRequestSent], None);
        let contexts = ctx_storage();
        let mut requests = NetworkRequestStorage::default();
        let outcome = requests.on_request_will_be_sent(
            RequestId("r1".into()),
            SessionId::new("s1"),
            "top".into(),
            "http://example.com/".into(),
            "GET".into(),
            false,
            &network,
            &contexts,
        );
        assert_eq!(outcome, NetworkOutcome::EmitBeforeRequestSent { is_blocked: true });
    }

    #[test]
    fn redirect_rearms_and_increments_count() {
        let network = NetworkStorage::default();
        let contexts = ctx_storage();
        let mut requests = NetworkRequestStorage::default();
        requests.on_request_will_be_sent(
            RequestId("r1".into()),
            SessionId::new("s1"),
            "top".into(),
            "http://example.com/a".into(),
            "GET".into(),
            false,
            &network,
            &contexts,
        );
        let outcome = requests.on_request_will_be_sent(
            RequestId("r1".into()),
            SessionId::new("s1"),
            "top".into(),
            "http://example.com/b".into(),
            "GET".into(),
            true,
            &network,
            &contexts,
        );
        assert_eq!(outcome, NetworkOutcome::Redirected);
        assert_eq!(requests.get(&RequestId("r1".into())).unwrap().redirect_count, 1);
    }

    #[test]
    fn auth_required_resumes_with_default_when_unmatched() {
        let network = NetworkStorage::default();
        let contexts = ctx_storage();
        let mut requests = NetworkRequestStorage::default();
        requests.on_request_will_be_sent(
            RequestId("r1".into()),
            SessionId::new("s1"),
            "top".into(),
            "http://example.com/".into(),
            "GET".into(),
            false,
            &network,
            &contexts,
        );
        let outcome = requests.on_auth_required(
            &RequestId("r1".into()),
            FetchId::new("f1"),
            &network,
            &contexts,
        );
        assert_eq!(
            outcome,
            NetworkOutcome::ResumeAuthWithDefault { fetch_id: FetchId::new("f1") }
        );
    }

    #[test]
    fn dispose_by_session_removes_all_its_requests() {
        let network = NetworkStorage::default();
        let contexts = ctx_storage();
        let mut requests = NetworkRequestStorage::default();
        requests.on_request_will_be_sent(
            RequestId("r1".into()),
            SessionId::new("s1"),
            "top".into(),
            "http://example.com/".into(),
            "GET".into(),
            false,
            &network,
            &contexts,
        );
        let doomed = requests.dispose_by_session(&SessionId::new("s1"));
        assert_eq!(doomed.len(), 1);
        assert!(requests.is_empty());
    }

    #[test]
    fn interception_stages_or_together_across_intercepts() {
        let mut network = NetworkStorage::default();
        network.add_intercept(vec![], vec![InterceptPhase::BeforeRequestSent], None);
        network.add_intercept(vec![], vec![InterceptPhase::AuthRequired], None);
        let contexts = ctx_storage();
        let stages = network.interception_stages(&"top".into(), &contexts);
        assert!(stages.request);
        assert!(stages.auth);
        assert!(!stages.response);
    }

    #[test]
    fn loading_finished_emits_response_completed_and_removes_request() {
        let network = NetworkStorage::default();
        let contexts = ctx_storage();
        let mut requests = NetworkRequestStorage::default();
        requests.on_request_will_be_sent(
            RequestId("r1".into()),
            SessionId::new("s1"),
            "top".into(),
            "http://example.com/".into(),
            "GET".into(),
            false,
            &network,
            &contexts,
        );
        let outcome = requests.on_loading_finished(&RequestId("r1".into()));
        assert_eq!(outcome, NetworkOutcome::EmitResponseCompleted);
        assert!(requests.is_empty());
    }

    #[test]
    fn loading_finished_for_unknown_request_is_ignored() {
        let mut requests = NetworkRequestStorage::default();
        let outcome = requests.on_loading_finished(&RequestId("missing".into()));
        assert_eq!(outcome, NetworkOutcome::Ignored);
    }

    #[test]
    fn removing_unknown_intercept_fails() {
        let mut network = NetworkStorage::default();
        assert!(network.remove_intercept(&InterceptId::new()).is_err());
    }
}
