use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::fingerprint::Fingerprint;

/// Explicit `null` decodes like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reference to an affected location (`{ "title": ..., "id": ... }`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
}

/// Reference to an affected product. Same shape as [`LocationRef`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
}

/// One status update posted on an incident.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub affected_locations: Vec<LocationRef>,
}

/// One incident from the upstream feed, plus the two ingestion stamps.
///
/// Field names match the feed and the warehouse table columns. Timestamps
/// the feed omits (e.g. `end` on an open incident) are written as NULL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// When the batch containing this record was fetched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_timestamp: Option<DateTime<Utc>>,
    /// Fingerprint of the feed payload this record was decoded from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_hash: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub external_desc: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub updates: Vec<UpdateEvent>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub most_recent_update: UpdateEvent,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status_impact: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub affected_products: Vec<ProductRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uri: String,
    /// The provider does not guarantee a shape for this field.
    #[serde(default, deserialize_with = "null_as_default")]
    pub currently_affected_locations: Vec<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub previously_affected_locations: Vec<LocationRef>,
}

impl IncidentRecord {
    /// Set the ingestion stamps, overwriting anything the feed carried.
    pub fn stamp(&mut self, fetched_at: DateTime<Utc>, fingerprint: &Fingerprint) {
        self.insert_timestamp = Some(fetched_at);
        self.snapshot_hash = Some(fingerprint.as_str().to_string());
    }
}
