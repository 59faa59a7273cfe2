use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::{format_minor, parse_major};

/// An amount in currency minor units (cents, grosze), as it crosses the wire.
///
/// Deserializes from an integer, an integral float, or a numeric string.
/// Fractional values are rejected rather than rounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct MinorUnits(pub i64);

impl MinorUnits {
    pub fn get(self) -> i64 {
        self.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// `12.34 PLN`
    pub fn display(self, currency: &str) -> String {
        format_minor(self.0, currency)
    }
}

impl MinorUnits {
    /// Scale a major-unit amount (`12`, `12.5`, `"12,50"`) to minor units.
    /// More than two decimals, or a value out of range, is `None`.
    pub fn from_major(text: &str) -> Option<Self> {
        parse_major(text).map(MinorUnits)
    }
}

impl fmt::Display for MinorUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_minor(self.0, ""))
    }
}

impl From<i64> for MinorUnits {
    fn from(value: i64) -> Self {
        MinorUnits(value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Int(i64),
    Float(f64),
    Str(String),
}

impl<'de> Deserialize<'de> for MinorUnits {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        match RawAmount::deserialize(deserializer)? {
            RawAmount::Int(value) => Ok(MinorUnits(value)),
            RawAmount::Float(value) if value.fract() == 0.0 && value.abs() < i64::MAX as f64 => {
                Ok(MinorUnits(value as i64))
            }
            RawAmount::Float(value) => Err(D::Error::custom(format!(
                "minor-unit amount must be integral, got {}",
                value
            ))),
            RawAmount::Str(text) => text
                .trim()
                .parse::<i64>()
                .map(MinorUnits)
                .map_err(|_| D::Error::custom(format!("invalid minor-unit amount {:?}", text))),
        }
    }
}

/// Deserialize an optional amount the backend sends in major units.
///
/// Integers are scaled with a checked `* 100`. Floats go through their
/// shortest decimal form, so `4.5` becomes 450 without float arithmetic.
pub(crate) fn deserialize_major_opt<'de, D>(deserializer: D) -> Result<Option<MinorUnits>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let scaled = match Option::<RawAmount>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(RawAmount::Int(value)) => value.checked_mul(100).map(MinorUnits),
        Some(RawAmount::Float(value)) => MinorUnits::from_major(&value.to_string()),
        Some(RawAmount::Str(text)) => MinorUnits::from_major(&text),
    };
    scaled
        .map(Some)
        .ok_or_else(|| D::Error::custom("major-unit amount out of range or finer than a cent"))
}
