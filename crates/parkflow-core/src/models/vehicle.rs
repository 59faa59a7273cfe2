use serde::{Deserialize, Serialize};

use super::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    #[serde(alias = "vehicle_id")]
    pub id: EntityId,
    #[serde(alias = "licence_plate", alias = "licencePlate", default)]
    pub plate: String,
}

/// Vehicle listings come back either bare or wrapped
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum VehiclesResponse {
    List(Vec<Vehicle>),
    Wrapped {
        #[serde(default)]
        vehicles: Vec<Vehicle>,
    },
}

impl VehiclesResponse {
    pub(crate) fn into_vec(self) -> Vec<Vehicle> {
        match self {
            VehiclesResponse::List(vehicles) | VehiclesResponse::Wrapped { vehicles } => vehicles,
        }
    }
}

/// Plates are stored upper-case without surrounding whitespace
pub fn normalize_plate(plate: &str) -> String {
    plate.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_field_aliases() {
        let json = r#"[{"id":1,"plate":"WA12345"},{"vehicle_id":"2","licence_plate":"KR1"},{"id":3,"licencePlate":"GD9"}]"#;
        let vehicles = serde_json::from_str::<VehiclesResponse>(json).unwrap().into_vec();
        let plates: Vec<&str> = vehicles.iter().map(|v| v.plate.as_str()).collect();
        assert_eq!(plates, ["WA12345", "KR1", "GD9"]);
        assert_eq!(vehicles[1].id, EntityId::from(2));
    }

    #[test]
    fn test_wrapped_vehicles() {
        let json = r#"{"vehicles":[{"id":1,"plate":"WA1"}]}"#;
        let vehicles = serde_json::from_str::<VehiclesResponse>(json).unwrap().into_vec();
        assert_eq!(vehicles.len(), 1);
    }

    #[test]
    fn test_normalize_plate() {
        assert_eq!(normalize_plate("  wa 123ab "), "WA 123AB");
    }
}
