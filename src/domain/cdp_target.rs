//! §4.2 CdpTarget unblock state machine. Grounded on the teacher's
//! `handler::target::Target` (which enumerates the same steps as a
//! `TargetState` progression driven by `CommandChain`s) and
//! `handler::network::NetworkManager::init_commands` for the
//! ignore-certificate-errors wiring — reworked from hand-polled
//! `CommandChain`s into `async`/`await` over the abstract `CdpClient`,
//! since the steps here are genuinely concurrent rather than a strict
//! queue.

use std::collections::HashMap;

use serde_json::json;

use crate::cdp::{self, CdpScriptId, SessionId, TargetId};
use crate::conn::CdpClient;

use super::deferred::{deferred, Deferred, DeferredSender};
use super::ids::{BrowsingContextId, PreloadScriptId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStages {
    pub request: bool,
    pub response: bool,
    pub auth: bool,
}

impl FetchStages {
    pub fn any(&self) -> bool {
        self.request || self.response || self.auth
    }

    pub fn union(a: FetchStages, b: FetchStages) -> FetchStages {
        FetchStages {
            request: a.request || b.request,
            response: a.response || b.response,
            auth: a.auth || b.auth,
        }
    }
}

#[derive(Debug, Clone)]
pub enum UnblockOutcome {
    /// Either every prerequisite succeeded, or the target vanished
    /// mid-unblock (§4.2 failure policy: a close-class error resolves as
    /// success because no client ever observed the target).
    Success,
    Error(String),
}

/// A preload script staged to be installed on this target before
/// `Runtime.runIfWaitingForDebugger` (§4.2 step 6).
#[derive(Debug, Clone)]
pub struct PendingPreloadInstall {
    pub id: PreloadScriptId,
    pub source: String,
    pub sandbox: Option<String>,
}

/// Everything the unblock sequence needs that lives outside `CdpTarget`
/// itself — computed by the processor from the other storages just before
/// the batch runs (§4.2: "entry actions, run concurrently in a single
/// batch").
pub struct UnblockPlan {
    pub accept_insecure_certs: bool,
    pub enable_network: bool,
    pub fetch_stages: FetchStages,
    pub preload_scripts: Vec<PendingPreloadInstall>,
}

pub struct CdpTarget {
    pub target_id: TargetId,
    pub session_id: SessionId,
    pub top_level_id: BrowsingContextId,
    pub network_enabled: bool,
    pub fetch_stages: FetchStages,
    pub installed_preload_scripts: HashMap<PreloadScriptId, CdpScriptId>,
    unblock_tx: DeferredSender<UnblockOutcome>,
    pub unblocked: Deferred<UnblockOutcome>,
}

impl CdpTarget {
    pub fn new(target_id: TargetId, session_id: SessionId, top_level_id: BrowsingContextId) -> Self {
        let (tx, unblocked) = deferred();
        Self {
            target_id,
            session_id,
            top_level_id,
            network_enabled: false,
            fetch_stages: FetchStages::default(),
            installed_preload_scripts: HashMap::new(),
            unblock_tx: tx,
            unblocked,
        }
    }

    /// §4.2: "The deferred must resolve exactly once." Calling this twice
    /// (e.g. once from the happy path, once from a crash handler racing it)
    /// is a no-op after the first.
    pub fn resolve_unblocked(&mut self, outcome: UnblockOutcome) {
        if !self.unblock_tx.is_resolved() {
            self.unblock_tx.resolve(outcome);
        }
    }
}

async fn send(client: &dyn CdpClient, method: &str, params: serde_json::Value) -> Result<(), crate::error::CdpError> {
    client.send_command(method, params).await.map(|_| ())
}

/// Runs §4.2 steps 1-7 against `client`: steps 1-6 fire concurrently and
/// must all complete or fail before `Runtime.runIfWaitingForDebugger` (step
/// 7) is sent. Returns the outcome plus the fetch/network/preload state the
/// caller should persist on the `CdpTarget` and `PreloadScript` entities.
pub async fn run_unblock_sequence(
    client: &dyn CdpClient,
    plan: &UnblockPlan,
) -> (
    UnblockOutcome,
    bool,
    FetchStages,
    HashMap<PreloadScriptId, CdpScriptId>,
) {
    let runtime_enable = send(client, "Runtime.enable", json!({}));
    let page_enable = async {
        send(client, "Page.enable", json!({})).await?;
        send(client, "Page.setLifecycleEventsEnabled", json!({ "enabled": true })).await
    };
    let ignore_certs = send(
        client,
        "Security.setIgnoreCertificateErrors",
        json!({ "ignore": plan.accept_insecure_certs }),
    );
    let network_and_fetch = async {
        if plan.enable_network {
            send(client, "Network.enable", json!({})).await?;
        }
        if plan.fetch_stages.any() {
            let mut patterns = Vec::new();
            if plan.fetch_stages.request || plan.fetch_stages.auth {
                patterns.push(json!({ "urlPattern": "*", "requestStage": "Request" }));
            }
            if plan.fetch_stages.response {
                patterns.push(json!({ "urlPattern": "*", "requestStage": "Response" }));
            }
            send(
                client,
                "Fetch.enable",
                json!({ "patterns": patterns, "handleAuthRequests": plan.fetch_stages.auth }),
            )
            .await?;
        }
        Ok(())
    };
    let auto_attach = send(
        client,
        "Target.setAutoAttach",
        json!({ "autoAttach": true, "waitForDebuggerOnStart": true, "flatten": true }),
    );

    let preload_install = async {
        let mut installed = HashMap::new();
        for script in &plan.preload_scripts {
            let params = json!({
                "source": script.source,
                "worldName": script.sandbox,
            });
            let result = client
                .send_command("Page.addScriptToEvaluateOnNewDocument", params)
                .await?;
            if let Some(id) = result.get("identifier").and_then(|v| v.as_str()) {
                installed.insert(script.id.clone(), CdpScriptId::new(id));
            }
        }
        Ok::<_, crate::error::CdpError>(installed)
    };

    let batch = tokio::try_join!(
        runtime_enable,
        page_enable,
        ignore_certs,
        network_and_fetch,
        auto_attach,
        preload_install,
    );

    match batch {
        Ok((_, _, _, _, _, installed)) => {
            (
                UnblockOutcome::Success,
                plan.enable_network,
                plan.fetch_stages,
                installed,
            )
        }
        Err(err) if client.is_close_error(&err) => {
            // §4.2 failure policy: the target vanished, clients observe
            // nothing — resolve as success with no state changes applied.
            (UnblockOutcome::Success, false, FetchStages::default(), HashMap::new())
        }
        Err(err) => (
            UnblockOutcome::Error(err.to_string()),
            false,
            FetchStages::default(),
            HashMap::new(),
        ),
    }
}

/// §4.2 step 7, sent strictly after `run_unblock_sequence` resolves
/// successfully.
pub async fn release_debugger(client: &dyn CdpClient) -> Result<(), crate::error::CdpError> {
    send(client, "Runtime.runIfWaitingForDebugger", json!({})).await
}

#[allow(dead_code)]
fn _type_check(_: cdp::runtime::EnableParams) {}
