//! Field-by-field validation of raw matcher results.
//!
//! Exactly one schema version is current for a pipeline instance. The
//! `version` discriminant must match it literally; there is no coercion
//! between versions here (migration is an offline concern). Checks run per
//! field in a fixed order — presence, type, emptiness, enum membership —
//! and the first failure is the diagnostic.

use {
    capmatch_common::{MatchReport, MatcherKind, Priority, Protocol, Relevance},
    serde_json::Value,
    thiserror::Error,
};

/// One failed check: a stable code, the offending field, and a human
/// message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("field `{field}`: {message} ({code})")]
pub struct ValidationError {
    pub code: &'static str,
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(code: &'static str, field: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            field,
            message: message.into(),
        }
    }
}

/// Validate a raw result against the active protocol, producing a typed
/// report or the first field diagnostic.
pub fn validate(protocol: Protocol, raw: &Value) -> Result<MatchReport, ValidationError> {
    let object = raw.as_object().ok_or_else(|| {
        ValidationError::new("not_object", "result", "matcher result must be a JSON object")
    })?;

    let version = require_string(object, "version")?;
    if version != protocol.version_literal() {
        return Err(ValidationError::new(
            "version_mismatch",
            "version",
            format!(
                "expected \"{}\", got \"{version}\"",
                protocol.version_literal()
            ),
        ));
    }

    match protocol {
        Protocol::V1 => {
            let relevant = require_bool(object, "relevant")?;
            let priority = require_enum(object, "priority", Priority::parse)?;
            let relevance = require_enum(object, "relevance", Relevance::parse)?;
            let kind = optional_kind(object, &[MatcherKind::Capability, MatcherKind::Delegate])?;
            Ok(MatchReport::Legacy {
                relevant,
                priority,
                relevance,
                kind,
            })
        },
        Protocol::V2 => {
            let match_count = require_count(object, "matchCount")?;
            let kind = optional_kind(
                object,
                &[
                    MatcherKind::Capability,
                    MatcherKind::Delegate,
                    MatcherKind::Action,
                ],
            )?;
            Ok(MatchReport::Current { match_count, kind })
        },
    }
}

type Object = serde_json::Map<String, Value>;

fn require_present<'a>(
    object: &'a Object,
    field: &'static str,
) -> Result<&'a Value, ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(ValidationError::new(
            "missing_field",
            field,
            "required field is missing or null",
        )),
        Some(value) => Ok(value),
    }
}

fn require_string<'a>(object: &'a Object, field: &'static str) -> Result<&'a str, ValidationError> {
    let value = require_present(object, field)?;
    let s = value
        .as_str()
        .ok_or_else(|| ValidationError::new("invalid_type", field, "must be a string"))?;
    if s.trim().is_empty() {
        return Err(ValidationError::new(
            "empty_value",
            field,
            "must not be empty",
        ));
    }
    Ok(s)
}

fn require_bool(object: &Object, field: &'static str) -> Result<bool, ValidationError> {
    require_present(object, field)?
        .as_bool()
        .ok_or_else(|| ValidationError::new("invalid_type", field, "must be a boolean"))
}

fn require_enum<T>(
    object: &Object,
    field: &'static str,
    parse: fn(&str) -> Option<T>,
) -> Result<T, ValidationError> {
    let s = require_string(object, field)?;
    parse(s).ok_or_else(|| {
        ValidationError::new("invalid_value", field, format!("\"{s}\" is not a known value"))
    })
}

/// A match count must be a plain non-negative integer — floats, negatives,
/// and stringly-typed numbers are all rejected.
fn require_count(object: &Object, field: &'static str) -> Result<u32, ValidationError> {
    let value = require_present(object, field)?;
    let n = value.as_u64().ok_or_else(|| {
        ValidationError::new("invalid_type", field, "must be a non-negative integer")
    })?;
    Ok(u32::try_from(n).unwrap_or(u32::MAX))
}

fn optional_kind(
    object: &Object,
    allowed: &[MatcherKind],
) -> Result<Option<MatcherKind>, ValidationError> {
    let value = match object.get("kind") {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };
    let s = value
        .as_str()
        .ok_or_else(|| ValidationError::new("invalid_type", "kind", "must be a string"))?;
    let kind = MatcherKind::parse(s).ok_or_else(|| {
        ValidationError::new("invalid_value", "kind", format!("\"{s}\" is not a known kind"))
    })?;
    if !allowed.contains(&kind) {
        return Err(ValidationError::new(
            "invalid_value",
            "kind",
            format!("\"{s}\" is not allowed in this schema version"),
        ));
    }
    Ok(Some(kind))
}
