//! Vessel query template and request payload.

use serde::{Deserialize, Serialize};

/// Built-in vessels query.
///
/// Takes `$first` (page size) and `$after` (cursor of the previous page). A
/// replacement query supplied through configuration must keep both variables
/// and the `vessels { pageInfo nodes }` response shape.
pub const VESSEL_QUERY: &str = r"
query Vessels($first: Int!, $after: String) {
  vessels(first: $first, after: $after) {
    pageInfo {
      hasNextPage
      endCursor
    }
    totalCount {
      value
      relation
    }
    nodes {
      id
      updateTimestamp
      staticData {
        aisClass
        flag
        name
        callsign
        timestamp
        updateTimestamp
        shipType
        shipSubType
        mmsi
        imo
        dimensions {
          a
          b
          c
          d
          width
          length
        }
      }
      lastPositionUpdate {
        accuracy
        collectionType
        course
        heading
        latitude
        longitude
        maneuver
        navigationalStatus
        rot
        speed
        timestamp
        updateTimestamp
      }
      currentVoyage {
        destination
        draught
        eta
        timestamp
        updateTimestamp
      }
    }
  }
}
";

/// Variables of a page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageVariables {
    /// Page size.
    pub first: u32,

    /// Cursor to continue after; omitted on the first page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

/// GraphQL request payload for one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphqlRequest {
    /// Query text.
    pub query: String,

    /// Variables.
    pub variables: PageVariables,
}

impl GraphqlRequest {
    /// Build a page request.
    #[must_use]
    pub fn page(query: impl Into<String>, first: u32, after: Option<String>) -> Self {
        Self {
            query: query.into(),
            variables: PageVariables { first, after },
        }
    }
}
