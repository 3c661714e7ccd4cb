use chrono::NaiveDate;
use std::str::FromStr;

use crate::ipc::error::HandlerErr;

pub fn required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

/// Required string that must not be blank; returned trimmed.
pub fn required_text(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    let v = required_str(params, key)?;
    let t = v.trim();
    if t.is_empty() {
        return Err(HandlerErr::bad_params(format!("{} must not be empty", key)));
    }
    Ok(t.to_string())
}

/// Required string that must not be blank; returned as sent.
pub fn required_raw_text(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    let v = required_str(params, key)?;
    if v.trim().is_empty() {
        return Err(HandlerErr::bad_params(format!("{} must not be empty", key)));
    }
    Ok(v)
}

/// Missing, null and blank all read as `None`.
pub fn optional_text(params: &serde_json::Value, key: &str) -> Result<Option<String>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => {
            let s = v
                .as_str()
                .ok_or_else(|| HandlerErr::bad_params(format!("{} must be string or null", key)))?;
            let t = s.trim();
            Ok(if t.is_empty() { None } else { Some(t.to_string()) })
        }
    }
}

pub fn required_id(params: &serde_json::Value, key: &str) -> Result<i64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn optional_id(params: &serde_json::Value, key: &str) -> Result<Option<i64>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_i64()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be integer or null", key))),
    }
}

pub fn optional_bool(params: &serde_json::Value, key: &str) -> Result<Option<bool>, HandlerErr> {
    match params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v
            .as_bool()
            .map(Some)
            .ok_or_else(|| HandlerErr::bad_params(format!("{} must be boolean", key))),
    }
}

pub fn id_list(params: &serde_json::Value, key: &str) -> Result<Vec<i64>, HandlerErr> {
    let Some(items) = params.get(key).and_then(|v| v.as_array()) else {
        return Err(HandlerErr::bad_params(format!("missing {}", key)));
    };
    items
        .iter()
        .map(|v| {
            v.as_i64()
                .ok_or_else(|| HandlerErr::bad_params(format!("{} must contain integers", key)))
        })
        .collect()
}

fn parse_date(key: &str, raw: &str) -> Result<NaiveDate, HandlerErr> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| HandlerErr::bad_params(format!("{} must be YYYY-MM-DD", key)))
}

pub fn required_date(params: &serde_json::Value, key: &str) -> Result<NaiveDate, HandlerErr> {
    parse_date(key, &required_str(params, key)?)
}

pub fn optional_date(params: &serde_json::Value, key: &str) -> Result<Option<NaiveDate>, HandlerErr> {
    optional_text(params, key)?
        .map(|s| parse_date(key, &s))
        .transpose()
}

/// Parses an enumerated tag such as a role or status.
pub fn required_tag<T>(params: &serde_json::Value, key: &str) -> Result<T, HandlerErr>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = required_str(params, key)?;
    raw.parse::<T>()
        .map_err(|e| HandlerErr::bad_params(e.to_string()))
}

pub fn optional_tag<T>(params: &serde_json::Value, key: &str) -> Result<Option<T>, HandlerErr>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_text(params, key)?
        .map(|s| s.parse::<T>().map_err(|e| HandlerErr::bad_params(e.to_string())))
        .transpose()
}

/// Whether the caller sent the key at all, null included.
pub fn has(params: &serde_json::Value, key: &str) -> bool {
    params.get(key).is_some()
}
