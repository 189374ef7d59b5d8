//! Transition oracle: fresh DST predictions from TimeZoneDB
//!
//! The reconciliation loop only sees the [`TransitionOracle`] trait. Any
//! failure (network, non-200, bad body, missing field) comes back as
//! [`DstError::OracleUnavailable`] so a single lookup can never abort a run.

use chrono::DateTime;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::{DstError, Result};
use crate::offset::{OffsetKey, ZoneTable};
use crate::record::{coerce_int, Direction, TransitionInfo};
use crate::redact;

/// TimeZoneDB get-time-zone endpoint
pub const TIMEZONEDB_API_URL: &str = "http://api.timezonedb.com/v2.1/get-time-zone";

const SECS_PER_HOUR: i64 = 3600;

#[allow(async_fn_in_trait)]
pub trait TransitionOracle {
    async fn lookup(&self, key: &OffsetKey) -> Result<TransitionInfo>;
}

impl<T: TransitionOracle + ?Sized> TransitionOracle for &T {
    async fn lookup(&self, key: &OffsetKey) -> Result<TransitionInfo> {
        (**self).lookup(key).await
    }
}

pub struct TimeZoneDbOracle {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    zones: ZoneTable,
}

impl TimeZoneDbOracle {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, zones: ZoneTable) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
            zones,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.timezonedb_url.clone(),
            config.timezonedb_api_key.clone(),
            ZoneTable::default(),
        )
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DstError::OracleUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(DstError::OracleUnavailable(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| DstError::OracleUnavailable(format!("failed to read body: {}", e)))
    }
}

impl TransitionOracle for TimeZoneDbOracle {
    async fn lookup(&self, key: &OffsetKey) -> Result<TransitionInfo> {
        let zone = self
            .zones
            .zone_for(key)
            .ok_or_else(|| DstError::OracleUnavailable(format!("no zone mapped for offset {}", key)))?;

        let url = build_lookup_url(&self.base_url, &self.api_key, zone.name());
        debug!(
            "Querying TimeZoneDB: {}",
            build_lookup_url(&self.base_url, &redact::secret(&self.api_key), zone.name())
        );

        let body = self.fetch(&url).await?;
        parse_timezonedb_response(&body)
    }
}

/// Build the lookup URL with every parameter encoded.
pub fn build_lookup_url(base_url: &str, api_key: &str, zone: &str) -> String {
    format!(
        "{}?key={}&format=json&by=zone&zone={}",
        base_url,
        urlencoding::encode(api_key),
        urlencoding::encode(zone),
    )
}

/// Parse a TimeZoneDB body into a transition prediction.
///
/// The transition instant comes from `nextTransition` (RFC 3339 or epoch) and
/// falls back to `zoneEnd`. `gmtOffset` is seconds, truncated to whole hours.
/// `dst > 0` maps to a forward direction, anything else to backward.
pub fn parse_timezonedb_response(body: &str) -> Result<TransitionInfo> {
    let data: Map<String, Value> = serde_json::from_str(body)
        .map_err(|e| DstError::OracleUnavailable(format!("unparseable response: {}", e)))?;

    if let Some(status) = data.get("status").and_then(Value::as_str) {
        if status != "OK" {
            let message = data
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no message");
            return Err(DstError::OracleUnavailable(format!(
                "status {}: {}",
                status, message
            )));
        }
    }

    let next_transition_epoch = match present(&data, "nextTransition") {
        Some(value) => parse_instant(value)
            .ok_or_else(|| invalid_field("nextTransition", value))?,
        None => {
            let value = present(&data, "zoneEnd").ok_or_else(|| missing_field("nextTransition"))?;
            coerce_int(value).ok_or_else(|| invalid_field("zoneEnd", value))?
        }
    };

    let gmt_offset = present(&data, "gmtOffset").ok_or_else(|| missing_field("gmtOffset"))?;
    let gmt_offset = coerce_int(gmt_offset).ok_or_else(|| invalid_field("gmtOffset", gmt_offset))?;
    let offset_hours = i32::try_from(gmt_offset / SECS_PER_HOUR)
        .map_err(|_| DstError::OracleUnavailable(format!("gmtOffset {} out of range", gmt_offset)))?;

    let dst = present(&data, "dst").ok_or_else(|| missing_field("dst"))?;
    let dst = coerce_int(dst).ok_or_else(|| invalid_field("dst", dst))?;
    let direction = if dst > 0 {
        Direction::Forward
    } else {
        Direction::Backward
    };

    Ok(TransitionInfo {
        next_transition_epoch,
        direction,
        offset_hours,
    })
}

fn present<'a>(data: &'a Map<String, Value>, field: &str) -> Option<&'a Value> {
    data.get(field).filter(|v| !v.is_null())
}

fn parse_instant(value: &Value) -> Option<i64> {
    if let Some(epoch) = coerce_int(value) {
        return Some(epoch);
    }
    let text = value.as_str()?;
    DateTime::parse_from_rfc3339(text.trim())
        .ok()
        .map(|dt| dt.timestamp())
}

fn missing_field(field: &str) -> DstError {
    DstError::OracleUnavailable(format!("response missing {}", field))
}

fn invalid_field(field: &str, value: &Value) -> DstError {
    DstError::OracleUnavailable(format!("response has invalid {}: {}", field, value))
}
