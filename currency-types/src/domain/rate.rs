//! Exchange rate observations.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single timestamped rate observation.
///
/// Rates are append-only: rows are never updated or deleted, and "latest"
/// queries order by timestamp descending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rate {
    #[serde(skip_serializing)]
    pub id: i64,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}
