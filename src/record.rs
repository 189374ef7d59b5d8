//! Timezone record model
//!
//! A record is a semi-structured document: the four transition fields are
//! typed, everything else in the stored object rides along untouched.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Which way the clock moves at the next transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "i64")]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn as_i64(self) -> i64 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => -1,
        }
    }
}

impl TryFrom<i64> for Direction {
    type Error = String;

    /// Stored values are coerced by sign; zero carries no direction.
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            v if v > 0 => Ok(Direction::Forward),
            v if v < 0 => Ok(Direction::Backward),
            _ => Err("transitionDirection must be +1 or -1, got 0".to_string()),
        }
    }
}

impl TryFrom<Value> for Direction {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let n = coerce_int(&value)
            .ok_or_else(|| format!("transitionDirection must be an integer, got {}", value))?;
        Direction::try_from(n)
    }
}

impl From<Direction> for i64 {
    fn from(direction: Direction) -> Self {
        direction.as_i64()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i64())
    }
}

/// Fresh transition prediction for one location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionInfo {
    pub next_transition_epoch: i64,
    pub direction: Direction,
    pub offset_hours: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimezoneRecord {
    #[serde(alias = "timezone")]
    pub location: String,

    #[serde(
        rename = "nextTransitionEpoch",
        alias = "nextTransition",
        deserialize_with = "coerced_int"
    )]
    pub next_transition_epoch: i64,

    #[serde(rename = "transitionDirection")]
    pub transition_direction: Direction,

    #[serde(
        rename = "currentOffsetHours",
        alias = "currentOffset",
        deserialize_with = "coerced_int"
    )]
    pub current_offset_hours: i32,

    /// Fields this tool does not interpret, kept in their stored order.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TimezoneRecord {
    pub fn new(
        location: impl Into<String>,
        next_transition_epoch: i64,
        transition_direction: Direction,
        current_offset_hours: i32,
    ) -> Self {
        Self {
            location: location.into(),
            next_transition_epoch,
            transition_direction,
            current_offset_hours,
            extra: Map::new(),
        }
    }

    /// Overwrite the three transition fields and nothing else.
    pub fn apply(&mut self, info: &TransitionInfo) {
        self.next_transition_epoch = info.next_transition_epoch;
        self.transition_direction = info.direction;
        self.current_offset_hours = info.offset_hours;
    }
}

/// Integer from a JSON number or numeric string. Floats count only when they
/// hold a whole value.
pub(crate) fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_float)),
        Value::String(s) => {
            let s = s.trim();
            s.parse()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_float))
        }
        _ => None,
    }
}

fn whole_float(f: f64) -> Option<i64> {
    // Bounds keep the cast exact; i64::MAX itself is not representable
    if f.fract() == 0.0 && (-9.0e18..=9.0e18).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

fn coerced_int<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    let value = Value::deserialize(deserializer)?;
    let n = coerce_int(&value)
        .ok_or_else(|| de::Error::custom(format!("expected an integer, got {}", value)))?;
    T::try_from(n).map_err(|_| de::Error::custom(format!("integer {} out of range", n)))
}
