//! Opaque BiDi-level identifiers. Kept as distinct newtypes so storages
//! can't be indexed by the wrong kind of id by accident (§9: "model as
//! indices into storages keyed by opaque ids").

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cdp;

/// A browsing context id. For a top-level context this is literally the CDP
/// target id; for a child context it's the CDP frame id (§3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BrowsingContextId(pub String);

impl fmt::Display for BrowsingContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<cdp::TargetId> for BrowsingContextId {
    fn from(id: cdp::TargetId) -> Self {
        Self(id.0)
    }
}

impl From<cdp::FrameId> for BrowsingContextId {
    fn from(id: cdp::FrameId) -> Self {
        Self(id.0)
    }
}

impl From<&str> for BrowsingContextId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A browser profile partition. CDP calls this `browserContextId`; the BiDi
/// spec sentinel `"default"` stands in for "no explicit partition" (§3,
/// §2.2 supplement).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserContextId(pub String);

impl UserContextId {
    pub const DEFAULT: &'static str = "default";

    pub fn default_context() -> Self {
        Self(Self::DEFAULT.to_string())
    }

    pub fn is_default(&self) -> bool {
        self.0 == Self::DEFAULT
    }

    /// §3: translate a CDP `browserContextId`, which is absent for the
    /// browser's implicit default profile, into the BiDi sentinel.
    pub fn from_cdp(id: Option<cdp::BrowserContextId>) -> Self {
        match id {
            Some(id) if id.0 != Self::DEFAULT => Self(id.0),
            _ => Self::default_context(),
        }
    }
}

impl fmt::Display for UserContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

uuid_id!(InterceptId);
uuid_id!(PreloadScriptId);
uuid_id!(SubscriptionId);
uuid_id!(RealmId);
uuid_id!(ChannelId);

/// Request ids are not UUIDs: they equal the CDP `Network.requestId` (§3).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub String);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<cdp::RequestId> for RequestId {
    fn from(id: cdp::RequestId) -> Self {
        Self(id.0)
    }
}
