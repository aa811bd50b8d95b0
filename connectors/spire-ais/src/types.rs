//! Spire Maritime GraphQL types.
//!
//! Only the fields consumed by the connector are modelled. Every nested
//! attribute is optional because the API returns `null` for anything a
//! vessel has not broadcast yet.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Page Response
// ─────────────────────────────────────────────────────────────────────────────

/// `data` object of a vessels query response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VesselsData {
    /// The paginated vessel connection.
    pub vessels: Vessels,
}

/// Paginated vessel connection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vessels {
    /// Pagination state reported by the API.
    #[serde(default)]
    pub page_info: PageInfo,

    /// Vessels on this page, in API order.
    #[serde(default)]
    pub nodes: Vec<Vessel>,

    /// Size of the whole record set, when the query asks for it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_count: Option<TotalCount>,
}

/// Relay-style page info.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether another page follows this one.
    #[serde(default)]
    pub has_next_page: bool,

    /// Cursor to pass as `after` to fetch the next page.
    #[serde(default)]
    pub end_cursor: Option<String>,
}

impl PageInfo {
    /// End cursor, treating an empty string the same as a missing one.
    #[must_use]
    pub fn cursor(&self) -> Option<&str> {
        self.end_cursor.as_deref().filter(|cursor| !cursor.is_empty())
    }
}

/// Record set size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalCount {
    /// Number of records.
    pub value: u64,

    /// `eq` for an exact count, `gte` for a lower bound.
    #[serde(default)]
    pub relation: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Vessel
// ─────────────────────────────────────────────────────────────────────────────

/// One vessel snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vessel {
    /// Spire vessel identifier.
    pub id: String,

    /// Last time any part of the snapshot changed (RFC 3339).
    pub update_timestamp: String,

    /// Identity, type and dimensions.
    #[serde(default)]
    pub static_data: Option<StaticData>,

    /// Most recent position report.
    #[serde(default)]
    pub last_position_update: Option<LastPositionUpdate>,

    /// Current voyage report.
    #[serde(default)]
    pub current_voyage: Option<CurrentVoyage>,
}

/// Static vessel data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticData {
    #[serde(default)]
    pub ais_class: Option<String>,
    #[serde(default)]
    pub flag: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub callsign: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub update_timestamp: Option<String>,
    #[serde(default)]
    pub ship_type: Option<String>,
    #[serde(default)]
    pub ship_sub_type: Option<String>,
    #[serde(default)]
    pub mmsi: Option<u64>,
    #[serde(default)]
    pub imo: Option<u64>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
}

/// Hull dimensions relative to the AIS antenna, in metres.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(default)]
    pub a: Option<f64>,
    #[serde(default)]
    pub b: Option<f64>,
    #[serde(default)]
    pub c: Option<f64>,
    #[serde(default)]
    pub d: Option<f64>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub length: Option<f64>,
}

/// Last known position report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastPositionUpdate {
    #[serde(default)]
    pub accuracy: Option<String>,
    #[serde(default)]
    pub collection_type: Option<String>,
    #[serde(default)]
    pub course: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub maneuver: Option<String>,
    #[serde(default)]
    pub navigational_status: Option<String>,
    /// Rate of turn.
    #[serde(default)]
    pub rot: Option<f64>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub update_timestamp: Option<String>,
}

/// Current voyage report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentVoyage {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub draught: Option<f64>,
    #[serde(default)]
    pub eta: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub update_timestamp: Option<String>,
}
