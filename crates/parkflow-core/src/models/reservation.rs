use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Deserializer};
use tracing::debug;

use super::{EntityId, MinorUnits};

/// Status the backend assigns to a paid, bookable reservation
pub const STATUS_PAID: &str = "Paid";

/// Reservation length when none is chosen (2 hours)
pub const DEFAULT_DURATION_SECS: u32 = 7200;

/// Spot used until the user can pick one
pub const DEFAULT_SPOT_ID: &str = "1";

/// A reservation as listed by the customer service.
///
/// The backend has several spellings for most fields and sometimes sends
/// more than one; the first non-empty one wins, in the order listed on
/// `RawReservation`.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawReservation")]
pub struct Reservation {
    pub id: EntityId,
    pub parking_id: Option<EntityId>,
    pub parking_name: String,
    pub status: Option<String>,
    pub end_time: Option<DateTime<Utc>>,
    pub spot: Option<EntityId>,
    pub reservation_fee_minor: Option<MinorUnits>,
}

#[derive(Deserialize)]
struct RawReservation {
    id: Option<EntityId>,
    id_reservation: Option<EntityId>,
    reservation_id: Option<EntityId>,

    id_parking: Option<EntityId>,
    parking_id: Option<EntityId>,
    #[serde(rename = "parkingId")]
    parking_id_camel: Option<EntityId>,

    #[serde(rename = "parkingName")]
    parking_name_camel: Option<String>,
    name_parking: Option<String>,
    location_name: Option<String>,

    status: Option<String>,
    status_reservation: Option<String>,

    #[serde(default, deserialize_with = "deserialize_lenient_time")]
    end_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_lenient_time")]
    valid_until: Option<DateTime<Utc>>,

    spot_code: Option<EntityId>,
    #[serde(rename = "spotCode")]
    spot_code_camel: Option<EntityId>,
    id_spot: Option<EntityId>,

    reservation_fee_minor: Option<MinorUnits>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn non_empty_id(value: Option<EntityId>) -> Option<EntityId> {
    value.filter(|v| !v.as_str().is_empty())
}

impl TryFrom<RawReservation> for Reservation {
    type Error = String;

    fn try_from(raw: RawReservation) -> Result<Self, Self::Error> {
        let id = non_empty_id(raw.id)
            .or_else(|| non_empty_id(raw.id_reservation))
            .or_else(|| non_empty_id(raw.reservation_id))
            .ok_or_else(|| "reservation without an id".to_string())?;

        Ok(Self {
            id,
            parking_id: non_empty_id(raw.id_parking)
                .or_else(|| non_empty_id(raw.parking_id))
                .or_else(|| non_empty_id(raw.parking_id_camel)),
            parking_name: non_empty(raw.parking_name_camel)
                .or_else(|| non_empty(raw.name_parking))
                .or_else(|| non_empty(raw.location_name))
                .unwrap_or_else(|| "Unknown".to_string()),
            status: non_empty(raw.status).or_else(|| non_empty(raw.status_reservation)),
            end_time: raw.end_time.or(raw.valid_until),
            spot: non_empty_id(raw.spot_code)
                .or_else(|| non_empty_id(raw.spot_code_camel))
                .or_else(|| non_empty_id(raw.id_spot)),
            reservation_fee_minor: raw.reservation_fee_minor,
        })
    }
}

/// Accept RFC 3339 instants and zone-less timestamps (read as UTC).
/// Anything unparseable reads as absent rather than failing the list.
fn deserialize_lenient_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Option::<String>::deserialize(deserializer)? {
        Some(text) => text,
        None => return Ok(None),
    };
    let parsed = parse_lenient_time(&text);
    if parsed.is_none() {
        debug!(value = %text, "Unparseable reservation time");
    }
    Ok(parsed)
}

pub(crate) fn parse_lenient_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl Reservation {
    /// Paid and not yet over
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status.as_deref() == Some(STATUS_PAID) && self.end_time.is_some_and(|end| end > now)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ReservationsResponse {
    List(Vec<Reservation>),
    Wrapped {
        #[serde(default)]
        reservations: Vec<Reservation>,
    },
}

impl ReservationsResponse {
    pub(crate) fn into_vec(self) -> Vec<Reservation> {
        match self {
            ReservationsResponse::List(list) | ReservationsResponse::Wrapped { reservations: list } => list,
        }
    }
}

/// A reservation to be created
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub parking_id: EntityId,
    pub spot_id: Option<EntityId>,
    pub date: NaiveDate,
    /// Start time, UTC
    pub time: NaiveTime,
    pub duration_secs: Option<u32>,
}

impl NewReservation {
    /// Query parameters the reservation endpoint expects
    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("parkingId", self.parking_id.to_string()),
            (
                "spotId",
                self.spot_id
                    .as_ref()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| DEFAULT_SPOT_ID.to_string()),
            ),
            ("startDateTime", self.start_date_time()),
            (
                "durationSeconds",
                self.duration_secs.unwrap_or(DEFAULT_DURATION_SECS).to_string(),
            ),
        ]
    }

    /// ISO-8601 instant at minute precision, `2026-01-07T14:00:00Z`
    pub fn start_date_time(&self) -> String {
        format!("{}T{}:00Z", self.date.format("%Y-%m-%d"), self.time.format("%H:%M"))
    }
}
