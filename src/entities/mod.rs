//! Entity type definitions
//!
//! Two documents flow through a run:
//!
//! - [`ArchitectureDocument`] - components and connections read from the diagram
//! - [`ThreatReport`] - STRIDE threats per component, with an overall risk level
//!
//! Both are deserialized from model output, so every field tolerates being
//! absent or `null`.

pub mod architecture;
pub mod threat;

use serde::{Deserialize, Deserializer};

pub use architecture::{ArchitectureDocument, Component, ComponentKind, Connection};
pub use threat::{ComponentThreatEntry, Severity, StrideCategory, Threat, ThreatReport};

/// Provider recorded when the diagram names no cloud service
pub const GENERIC_PROVIDER: &str = "Generic";

/// Deserialize a value, mapping `null` to the type's default
pub(crate) fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize a provider name, mapping `null` or blank to "Generic"
pub(crate) fn provider_or_generic<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let provider = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    if provider.trim().is_empty() {
        Ok(GENERIC_PROVIDER.to_string())
    } else {
        Ok(provider)
    }
}

/// Deserialize a list of strings that the model may send as a single string
pub(crate) fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(item)) if item.trim().is_empty() => Vec::new(),
        Some(OneOrMany::One(item)) => vec![item],
        Some(OneOrMany::Many(items)) => items,
        None => Vec::new(),
    })
}
