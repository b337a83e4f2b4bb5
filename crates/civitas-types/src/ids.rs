//! Type-safe identifier wrappers.
//!
//! Runtime entities (civilizations, routes, incidents, agreements, ledger
//! entries) carry UUID v7 identifiers so they sort by creation time. Entities
//! defined by static configuration (resources, diplomatic actions) are keyed
//! by their configured string name instead.
//!
//! A market's identity is its owning civilization: [`MarketId::of`] shares
//! the civilization's UUID, so a market id can always be mapped back.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Generates a newtype wrapper around a configured string key.
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Create a key from anything string-like.
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Borrow the key as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }
    };
}

define_id! {
    /// Unique identifier for a civilization.
    CivId
}

define_id! {
    /// Unique identifier for a market. Always equal to the owning
    /// civilization's UUID (see [`MarketId::of`]).
    MarketId
}

define_id! {
    /// Unique identifier for a trade route (edge between two markets).
    RouteId
}

define_id! {
    /// Unique identifier for a diplomatic incident.
    IncidentId
}

define_id! {
    /// Unique identifier for a dynamic agreement.
    AgreementId
}

define_id! {
    /// Unique identifier for a treasury ledger entry.
    LedgerEntryId
}

define_key! {
    /// Configured identifier of a resource kind (e.g. `"iron"`).
    ResourceId
}

define_key! {
    /// Configured identifier of a diplomatic action (e.g. `"trade_agreement"`).
    ActionId
}

impl MarketId {
    /// The market owned by the given civilization.
    pub const fn of(civ: CivId) -> Self {
        Self(civ.0)
    }

    /// The civilization that owns this market.
    pub const fn owner(self) -> CivId {
        CivId(self.0)
    }
}

impl From<CivId> for MarketId {
    fn from(civ: CivId) -> Self {
        Self::of(civ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_id_shares_owner_uuid() {
        let civ = CivId::new();
        let market = MarketId::of(civ);
        assert_eq!(market.into_inner(), civ.into_inner());
        assert_eq!(market.owner(), civ);
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = RouteId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<RouteId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }

    #[test]
    fn resource_key_serializes_as_plain_string() {
        let id = ResourceId::new("iron");
        let json = serde_json::to_string(&id).ok();
        assert_eq!(json.as_deref(), Some("\"iron\""));
        assert_eq!(id.to_string(), "iron");
    }

    #[test]
    fn keys_order_lexicographically() {
        let mut keys = vec![ResourceId::from("silk"), ResourceId::from("food")];
        keys.sort();
        assert_eq!(keys.first().map(ResourceId::as_str), Some("food"));
    }
}
