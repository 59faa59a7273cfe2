use serde::Deserialize;

use super::{EntityId, MinorUnits};

/// Currency assumed when the backend omits one
pub const DEFAULT_CURRENCY: &str = "PLN";

/// A parking location as listed by search and the details endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ParkingLocation {
    #[serde(alias = "id_parking", alias = "location_id")]
    pub id: EntityId,
    #[serde(alias = "name_parking", alias = "location_name", default = "unknown")]
    pub name: String,
    #[serde(alias = "address_line", alias = "location_address", default)]
    pub address: String,
    #[serde(default)]
    pub total_spots: u32,
    #[serde(default)]
    pub available_spots: u32,
    #[serde(default)]
    pub occupied_spots: u32,
    #[serde(default)]
    pub price_per_hour_minor: MinorUnits,
    #[serde(default = "default_currency")]
    pub currency_code: String,
    #[serde(default)]
    pub reservation_fee_minor: MinorUnits,
    /// Opaque backend tariff values, shown as-is
    #[serde(default)]
    pub rate_per_min: f64,
    #[serde(default)]
    pub free_minutes: u32,
    #[serde(default)]
    pub rounding_step_min: u32,
}

fn unknown() -> String {
    "Unknown".to_string()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

impl ParkingLocation {
    /// `5.00 PLN/h`
    pub fn hourly_rate_display(&self) -> String {
        format!("{}/h", self.price_per_hour_minor.display(&self.currency_code))
    }
}

/// Typical and peak occupancy, in percent, for a set of hour labels.
/// Fed straight to the chart renderer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Occupancy {
    #[serde(default = "sample_normal")]
    pub normal: Vec<u32>,
    #[serde(default = "sample_peak")]
    pub peak: Vec<u32>,
    #[serde(default = "sample_hours")]
    pub hours: Vec<String>,
    #[serde(default = "today")]
    pub day_of_week: String,
}

fn sample_normal() -> Vec<u32> {
    vec![25, 40, 55, 70, 75, 70, 60, 50, 35]
}

fn sample_peak() -> Vec<u32> {
    vec![45, 65, 80, 90, 95, 90, 80, 70, 50]
}

fn sample_hours() -> Vec<String> {
    ["6 AM", "8 AM", "10 AM", "12 PM", "2 PM", "4 PM", "6 PM", "8 PM", "10 PM"]
        .iter()
        .map(|h| h.to_string())
        .collect()
}

fn today() -> String {
    "Today".to_string()
}

impl Occupancy {
    /// Sample series shown when the occupancy endpoint is unavailable
    pub fn sample() -> Self {
        Self {
            normal: sample_normal(),
            peak: sample_peak(),
            hours: sample_hours(),
            day_of_week: today(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationFee {
    #[serde(rename = "reservationFeeMinor", alias = "reservation_fee_minor", default)]
    pub reservation_fee_minor: MinorUnits,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parking_location_from_backend_row() {
        let json = r#"{"id_parking":3,"name_parking":"Old Town","address_line":"1 Market Sq","total_spots":120,"available_spots":14,"price_per_hour_minor":650,"currency_code":"PLN","reservation_fee_minor":1000,"rate_per_min":0.11,"free_minutes":15,"rounding_step_min":5}"#;
        let parking: ParkingLocation = serde_json::from_str(json).unwrap();
        assert_eq!(parking.id, EntityId::from(3));
        assert_eq!(parking.name, "Old Town");
        assert_eq!(parking.available_spots, 14);
        assert_eq!(parking.hourly_rate_display(), "6.50 PLN/h");
        assert_eq!(parking.reservation_fee_minor, MinorUnits(1000));
    }

    #[test]
    fn test_parking_location_defaults() {
        let parking: ParkingLocation = serde_json::from_str(r#"{"id":1}"#).unwrap();
        assert_eq!(parking.name, "Unknown");
        assert_eq!(parking.currency_code, "PLN");
        assert!(parking.price_per_hour_minor.is_zero());
    }

    #[test]
    fn test_occupancy_partial_payload_uses_sample_series() {
        let occupancy: Occupancy =
            serde_json::from_str(r#"{"normal":[1,2,3],"day_of_week":"Monday"}"#).unwrap();
        assert_eq!(occupancy.normal, vec![1, 2, 3]);
        assert_eq!(occupancy.peak, Occupancy::sample().peak);
        assert_eq!(occupancy.day_of_week, "Monday");
    }
}
