//! The immutable per-invocation context shared with every matcher.

pub mod payload;
pub mod transcript;

use {capmatch_common::Protocol, serde_json::json};

pub use {
    payload::{EVENT_NAME, PayloadError, PermissionMode, TriggerPayload},
    transcript::{HistoryEntry, TranscriptAccessor, TranscriptError},
};

/// Everything a matcher may observe. Built once from the validated trigger
/// payload, then shared by reference; never mutated afterwards.
#[derive(Debug)]
pub struct InvocationContext {
    pub prompt: String,
    pub working_dir: std::path::PathBuf,
    pub session_id: String,
    pub permission_mode: PermissionMode,
    pub protocol: Protocol,
    pub transcript: TranscriptAccessor,
}

impl InvocationContext {
    pub fn new(payload: TriggerPayload, protocol: Protocol) -> Self {
        Self {
            prompt: payload.prompt,
            working_dir: payload.cwd,
            session_id: payload.session_id,
            permission_mode: payload.permission_mode,
            protocol,
            transcript: TranscriptAccessor::new(payload.transcript_path),
        }
    }

    /// The base JSON object written to a matcher's stdin. Executors may
    /// extend it with requested transcript projections before serializing.
    pub fn payload_json(&self) -> serde_json::Value {
        json!({
            "prompt": self.prompt,
            "cwd": self.working_dir,
            "session_id": self.session_id,
            "transcript_path": self.transcript.path(),
            "permission_mode": self.permission_mode.as_str(),
            "hook_event_name": EVENT_NAME,
            "schema_version": self.protocol.version_literal(),
        })
    }
}
