//! GMT offset extraction and the offset-to-zone table
//!
//! Locations look like `(GMT-05:00) Eastern Time (US & Canada)`. Only the
//! signed hour is kept: the oracle is keyed by whole-hour buckets, so
//! `(GMT+05:30)` and `(GMT+05:00)` resolve to the same key.

use chrono_tz::Tz;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{DstError, Result};

const PREFIX: &str = "(GMT";

/// Canonical whole-hour offset key, rendered as `-05`, `00`, `01`, `12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OffsetKey {
    hours: i32,
}

impl OffsetKey {
    pub fn from_hours(hours: i32) -> Self {
        Self { hours }
    }

    pub fn hours(&self) -> i32 {
        self.hours
    }
}

impl fmt::Display for OffsetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hours < 0 {
            write!(f, "-{:02}", -self.hours)
        } else {
            write!(f, "{:02}", self.hours)
        }
    }
}

/// Extract the offset key from a location label.
///
/// Accepts `(GMT` + optional sign + `HH` + `:` + `MM` + `)` at the start of the
/// string, followed by anything. The minutes are checked for shape and then
/// dropped.
pub fn resolve(location: &str) -> Result<OffsetKey> {
    parse_annotation(location).ok_or_else(|| DstError::MalformedLocation(location.to_string()))
}

fn parse_annotation(location: &str) -> Option<OffsetKey> {
    let rest = location.strip_prefix(PREFIX)?;

    let (negative, rest) = match rest.as_bytes().first()? {
        b'+' => (false, &rest[1..]),
        b'-' => (true, &rest[1..]),
        _ => (false, rest),
    };

    let bytes = rest.as_bytes();
    if bytes.len() < 6 {
        return None;
    }
    let shape_ok = bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_digit()
        && bytes[2] == b':'
        && bytes[3].is_ascii_digit()
        && bytes[4].is_ascii_digit()
        && bytes[5] == b')';
    if !shape_ok {
        return None;
    }

    let hours = i32::from(bytes[0] - b'0') * 10 + i32::from(bytes[1] - b'0');
    Some(OffsetKey::from_hours(if negative { -hours } else { hours }))
}

/// Offset bucket to representative IANA zone used for oracle lookups.
pub const DEFAULT_ZONES: &[(i32, Tz)] = &[
    (-12, chrono_tz::Pacific::Fiji),
    (-11, chrono_tz::Pacific::Midway),
    (-10, chrono_tz::Pacific::Honolulu),
    (-9, chrono_tz::America::Anchorage),
    (-8, chrono_tz::America::Los_Angeles),
    (-7, chrono_tz::America::Denver),
    (-6, chrono_tz::America::Chicago),
    (-5, chrono_tz::America::New_York),
    (-4, chrono_tz::America::Halifax),
    (-3, chrono_tz::America::Argentina::Buenos_Aires),
    (-2, chrono_tz::Atlantic::South_Georgia),
    (-1, chrono_tz::Atlantic::Azores),
    (0, chrono_tz::Europe::London),
    (1, chrono_tz::Europe::Vienna),
    (2, chrono_tz::Europe::Berlin),
    (3, chrono_tz::Europe::Moscow),
    (4, chrono_tz::Asia::Dubai),
    (5, chrono_tz::Asia::Karachi),
    (6, chrono_tz::Asia::Dhaka),
    (7, chrono_tz::Asia::Bangkok),
    (8, chrono_tz::Asia::Shanghai),
    (9, chrono_tz::Asia::Tokyo),
    (10, chrono_tz::Australia::Sydney),
    (11, chrono_tz::Pacific::Noumea),
    (12, chrono_tz::Pacific::Auckland),
];

/// Immutable lookup from offset key to zone, fixed at construction.
#[derive(Debug, Clone)]
pub struct ZoneTable {
    zones: BTreeMap<OffsetKey, Tz>,
}

impl ZoneTable {
    pub fn from_pairs(pairs: &[(i32, Tz)]) -> Self {
        Self {
            zones: pairs
                .iter()
                .map(|(hours, tz)| (OffsetKey::from_hours(*hours), *tz))
                .collect(),
        }
    }

    pub fn zone_for(&self, key: &OffsetKey) -> Option<Tz> {
        self.zones.get(key).copied()
    }
}

impl Default for ZoneTable {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_ZONES)
    }
}
