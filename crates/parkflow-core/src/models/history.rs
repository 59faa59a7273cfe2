use serde::Deserialize;

use super::money::deserialize_major_opt;
use super::{EntityId, MinorUnits};

/// A finished (or unpaid) parking session
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParkingSession {
    pub id: EntityId,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub parking_id: Option<EntityId>,
    #[serde(default)]
    pub parking_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    /// Minutes parked
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(alias = "cost_minor", default)]
    pub cost_minor: Option<MinorUnits>,
    /// `cost`, sent in major units
    #[serde(rename = "cost", default, deserialize_with = "deserialize_major_opt")]
    pub cost_major: Option<MinorUnits>,
    #[serde(default)]
    pub vehicle: Option<String>,
    #[serde(default)]
    pub spot: Option<EntityId>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl ParkingSession {
    /// Session cost; the minor-unit field wins when both are sent
    pub fn cost(&self) -> MinorUnits {
        self.cost_minor.or(self.cost_major).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum HistoryResponse {
    List(Vec<ParkingSession>),
    Wrapped {
        #[serde(default)]
        sessions: Vec<ParkingSession>,
    },
}

impl HistoryResponse {
    pub(crate) fn into_vec(self) -> Vec<ParkingSession> {
        match self {
            HistoryResponse::List(sessions) | HistoryResponse::Wrapped { sessions } => sessions,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatistics {
    #[serde(default)]
    pub total_sessions: u32,
    /// Hours parked
    #[serde(default)]
    pub total_time: f64,
    #[serde(alias = "total_spent_minor", default)]
    pub total_spent_minor: Option<MinorUnits>,
    /// `totalSpent`, sent in major units
    #[serde(rename = "totalSpent", default, deserialize_with = "deserialize_major_opt")]
    pub total_spent_major: Option<MinorUnits>,
}

impl HistoryStatistics {
    pub fn total_spent(&self) -> MinorUnits {
        self.total_spent_minor.or(self.total_spent_major).unwrap_or_default()
    }
}

/// Format a duration in minutes as `1h 30m`
pub fn format_duration(minutes: u32) -> String {
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}
