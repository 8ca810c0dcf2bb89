//! Trigger payload validation.
//!
//! The host hands one JSON object on stdin per invocation. Every field is
//! mandatory; a malformed payload fails the whole run before any matcher is
//! loaded, because without it no matcher can run meaningfully.

use std::path::PathBuf;

use {serde_json::Value, thiserror::Error};

/// The hook event this pipeline serves.
pub const EVENT_NAME: &str = "UserPromptSubmit";

/// Field names the payload must carry, in check order.
pub const REQUIRED_FIELDS: &[&str] = &[
    "prompt",
    "cwd",
    "session_id",
    "transcript_path",
    "permission_mode",
    "hook_event_name",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PayloadError {
    #[error("trigger payload is not valid JSON: {0}")]
    Syntax(String),

    #[error("trigger payload must be a JSON object")]
    NotObject,

    #[error("trigger payload field `{field}` is missing or null")]
    MissingField { field: &'static str },

    #[error("trigger payload field `{field}` must be a string")]
    InvalidType { field: &'static str },

    #[error("trigger payload field `{field}` must not be empty")]
    EmptyField { field: &'static str },
}

// ── PermissionMode ──────────────────────────────────────────────────────────

/// Host permission mode. Unknown modes are preserved rather than rejected;
/// the wire contract only requires a non-empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionMode {
    Default,
    AcceptEdits,
    Plan,
    BypassPermissions,
    Other(String),
}

impl PermissionMode {
    fn parse(s: &str) -> Self {
        match s {
            "default" => Self::Default,
            "acceptEdits" => Self::AcceptEdits,
            "plan" => Self::Plan,
            "bypassPermissions" => Self::BypassPermissions,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Default => "default",
            Self::AcceptEdits => "acceptEdits",
            Self::Plan => "plan",
            Self::BypassPermissions => "bypassPermissions",
            Self::Other(s) => s,
        }
    }
}

// ── TriggerPayload ──────────────────────────────────────────────────────────

/// The validated per-invocation trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerPayload {
    pub prompt: String,
    pub cwd: PathBuf,
    pub session_id: String,
    pub transcript_path: PathBuf,
    pub permission_mode: PermissionMode,
    pub hook_event_name: String,
}

impl TriggerPayload {
    /// Parse and validate the raw stdin text. Fields are checked in a fixed
    /// order; the first failure is the diagnostic.
    pub fn from_json(raw: &str) -> Result<Self, PayloadError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| PayloadError::Syntax(e.to_string()))?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, PayloadError> {
        let object = value.as_object().ok_or(PayloadError::NotObject)?;

        let get = |field: &'static str| -> Result<&str, PayloadError> {
            let raw = match object.get(field) {
                None | Some(Value::Null) => return Err(PayloadError::MissingField { field }),
                Some(v) => v,
            };
            let s = raw.as_str().ok_or(PayloadError::InvalidType { field })?;
            if s.trim().is_empty() {
                return Err(PayloadError::EmptyField { field });
            }
            Ok(s)
        };

        // Checked in REQUIRED_FIELDS order so the first failure is stable.
        let prompt = get("prompt")?.to_string();
        let cwd = PathBuf::from(get("cwd")?);
        let session_id = get("session_id")?.to_string();
        let transcript_path = PathBuf::from(get("transcript_path")?);
        let permission_mode = PermissionMode::parse(get("permission_mode")?);
        let hook_event_name = get("hook_event_name")?.to_string();

        Ok(Self {
            prompt,
            cwd,
            session_id,
            transcript_path,
            permission_mode,
            hook_event_name,
        })
    }
}
