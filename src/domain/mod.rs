//! The protocol-agnostic core: entities and storages the processor wires
//! together, kept free of transport and wire-format concerns so §4's
//! components stay unit-testable on their own (see each submodule for its
//! grounding section).

pub mod browsing_context;
pub mod browsing_context_storage;
pub mod cdp_target;
pub mod deferred;
pub mod ids;
pub mod network_request;
pub mod preload_script;
pub mod preload_script_storage;
pub mod realm;
pub mod realm_storage;
pub mod subscription;
pub mod url_pattern;

pub use browsing_context::{BrowsingContext, ReadinessState};
pub use browsing_context_storage::BrowsingContextStorage;
pub use cdp_target::{CdpTarget, FetchStages, UnblockOutcome};
pub use ids::{BrowsingContextId, InterceptId, PreloadScriptId, RequestId, SubscriptionId, UserContextId};
pub use network_request::{InterceptPhase, NetworkOutcome, NetworkRequestStorage, NetworkStorage};
pub use preload_script::PreloadScript;
pub use preload_script_storage::PreloadScriptStorage;
pub use realm::Realm;
pub use realm_storage::RealmStorage;
pub use subscription::SubscriptionManager;
pub use url_pattern::UrlPattern;
