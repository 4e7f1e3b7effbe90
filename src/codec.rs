//! Pure conversions between native values and the wire's string payloads.
//!
//! Encoding is total: every representable native value has a canonical
//! string form. Decoding is partial and reports failures as
//! [`AttrError::Invalid`]; a missing attribute is reported by the accessor
//! layer ([`crate::schema`]), not here.
//!
//! The wire format never carries a literally empty string, so the reserved
//! sentinel [`NULL_SENTINEL`] stands in for the empty string and the empty
//! byte blob.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

/// Reserved token standing in for values the wire cannot carry literally
/// empty. A stored literal `"NULL"` is therefore indistinguishable from the
/// empty string; callers must treat the token as reserved.
pub const NULL_SENTINEL: &str = "NULL";

/// Canonical wire token for `true`.
pub const BOOL_TRUE: &str = "1";
/// Canonical wire token for `false`.
pub const BOOL_FALSE: &str = "0";

/// A deserialization failure, returned as a value: missing or unparsable
/// item data is an expected runtime condition, never a panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttrError {
    #[error("deserialization error: attribute {0} not found")]
    NotFound(String),
    #[error("deserialization error: attribute {attribute} has unexpected value: {value}")]
    Invalid { attribute: String, value: String },
}

fn invalid(attribute: &str, value: &str) -> AttrError {
    AttrError::Invalid {
        attribute: attribute.to_string(),
        value: value.to_string(),
    }
}

pub fn encode_bool(value: bool) -> String {
    if value { BOOL_TRUE } else { BOOL_FALSE }.to_string()
}

/// Recognizes only the two canonical tokens.
pub fn decode_bool(attribute: &str, raw: &str) -> Result<bool, AttrError> {
    match raw {
        BOOL_TRUE => Ok(true),
        BOOL_FALSE => Ok(false),
        _ => Err(invalid(attribute, raw)),
    }
}

pub fn encode_i32(value: i32) -> String {
    value.to_string()
}

pub fn decode_i32(attribute: &str, raw: &str) -> Result<i32, AttrError> {
    raw.parse().map_err(|_| invalid(attribute, raw))
}

pub fn encode_i64(value: i64) -> String {
    value.to_string()
}

pub fn decode_i64(attribute: &str, raw: &str) -> Result<i64, AttrError> {
    raw.parse().map_err(|_| invalid(attribute, raw))
}

/// Shortest decimal form that round-trips the 32-bit value.
pub fn encode_f32(value: f32) -> String {
    value.to_string()
}

pub fn decode_f32(attribute: &str, raw: &str) -> Result<f32, AttrError> {
    raw.parse().map_err(|_| invalid(attribute, raw))
}

/// Shortest decimal form that round-trips the 64-bit value.
pub fn encode_f64(value: f64) -> String {
    value.to_string()
}

pub fn decode_f64(attribute: &str, raw: &str) -> Result<f64, AttrError> {
    raw.parse().map_err(|_| invalid(attribute, raw))
}

/// The empty string is transmitted as [`NULL_SENTINEL`].
pub fn encode_string(value: &str) -> String {
    if value.is_empty() {
        NULL_SENTINEL.to_string()
    } else {
        value.to_string()
    }
}

/// Inverse of [`encode_string`]: the sentinel reads back as the empty
/// string.
pub fn decode_string(raw: &str) -> String {
    if raw == NULL_SENTINEL {
        String::new()
    } else {
        raw.to_string()
    }
}

/// Standard base64 text; the empty blob is transmitted as
/// [`NULL_SENTINEL`] because its base64 form would be empty.
pub fn encode_binary(value: &[u8]) -> String {
    if value.is_empty() {
        NULL_SENTINEL.to_string()
    } else {
        BASE64.encode(value)
    }
}

pub fn decode_binary(attribute: &str, raw: &str) -> Result<Vec<u8>, AttrError> {
    if raw == NULL_SENTINEL {
        return Ok(Vec::new());
    }
    BASE64.decode(raw).map_err(|_| invalid(attribute, raw))
}

/// Seconds since the Unix epoch, decimal. Sub-second precision is dropped.
pub fn encode_timestamp(value: DateTime<Utc>) -> String {
    value.timestamp().to_string()
}

pub fn decode_timestamp(attribute: &str, raw: &str) -> Result<DateTime<Utc>, AttrError> {
    let seconds: i64 = raw.parse().map_err(|_| invalid(attribute, raw))?;
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| invalid(attribute, raw))
}

/// Nanoseconds since the Unix epoch, decimal. Saturates at the edges of the
/// representable nanosecond range (years ~1677..=2262).
pub fn encode_timestamp_nanos(value: DateTime<Utc>) -> String {
    value
        .timestamp_nanos_opt()
        .unwrap_or(if value.timestamp() < 0 {
            i64::MIN
        } else {
            i64::MAX
        })
        .to_string()
}

pub fn decode_timestamp_nanos(attribute: &str, raw: &str) -> Result<DateTime<Utc>, AttrError> {
    let nanos: i64 = raw.parse().map_err(|_| invalid(attribute, raw))?;
    Ok(Utc.timestamp_nanos(nanos))
}
