//! Lazy, memoized access to the conversation transcript.
//!
//! The transcript is a JSONL file the host maintains for the session. It is
//! parsed at most once per invocation, no matter how many matchers ask for a
//! projection, and never if none do. Concurrent first callers share one
//! in-flight parse; later callers read the cached result.

use std::{collections::BTreeMap, path::PathBuf};

use {
    serde::Serialize,
    serde_json::Value,
    thiserror::Error,
    tokio::sync::OnceCell,
    tracing::debug,
};

/// Cloneable so the failed parse can be cached and replayed to every caller
/// without re-reading the file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to read transcript {path}: {reason}")]
pub struct TranscriptError {
    pub path: PathBuf,
    pub reason: String,
}

/// One extracted conversation turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub role: String,
    pub text: String,
}

/// Everything derived from one parse of the transcript file.
#[derive(Debug)]
struct Transcript {
    raw: Vec<Value>,
    history: Vec<HistoryEntry>,
    tool_usage: BTreeMap<String, u32>,
    first_message: Option<String>,
}

// ── TranscriptAccessor ──────────────────────────────────────────────────────

/// Single-flight handle over one transcript file, shared by reference with
/// every matcher invocation.
#[derive(Debug)]
pub struct TranscriptAccessor {
    path: PathBuf,
    cell: OnceCell<Result<Transcript, TranscriptError>>,
}

impl TranscriptAccessor {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cell: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// True once any accessor has forced the parse. Mostly for tests of the
    /// parse-at-most-once invariant.
    pub fn parsed(&self) -> bool {
        self.cell.initialized()
    }

    /// Every parsed transcript line, in file order.
    pub async fn raw_messages(&self) -> Result<&[Value], TranscriptError> {
        Ok(&self.load().await?.raw)
    }

    /// User/assistant turns with their extracted text.
    pub async fn history(&self) -> Result<&[HistoryEntry], TranscriptError> {
        Ok(&self.load().await?.history)
    }

    /// Tool name → use count across the whole transcript.
    pub async fn tool_usage(&self) -> Result<&BTreeMap<String, u32>, TranscriptError> {
        Ok(&self.load().await?.tool_usage)
    }

    /// Text of the first user turn, if any.
    pub async fn first_message(&self) -> Result<Option<&str>, TranscriptError> {
        Ok(self.load().await?.first_message.as_deref())
    }

    async fn load(&self) -> Result<&Transcript, TranscriptError> {
        let result = self
            .cell
            .get_or_init(|| parse_file(self.path.clone()))
            .await;
        result.as_ref().map_err(Clone::clone)
    }
}

async fn parse_file(path: PathBuf) -> Result<Transcript, TranscriptError> {
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| TranscriptError {
            path: path.clone(),
            reason: e.to_string(),
        })?;

    let mut raw = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(value) => raw.push(value),
            Err(e) => debug!(?path, %e, "skipping unparseable transcript line"),
        }
    }

    let mut history = Vec::new();
    let mut tool_usage: BTreeMap<String, u32> = BTreeMap::new();
    for entry in &raw {
        let role = match entry.get("type").and_then(Value::as_str) {
            Some(role @ ("user" | "assistant")) => role,
            _ => continue,
        };
        let content = entry.pointer("/message/content");
        if let Some(text) = extract_text(content) {
            history.push(HistoryEntry {
                role: role.to_string(),
                text,
            });
        }
        count_tool_uses(content, &mut tool_usage);
    }

    let first_message = history
        .iter()
        .find(|h| h.role == "user")
        .map(|h| h.text.clone());

    debug!(
        ?path,
        lines = raw.len(),
        turns = history.len(),
        "transcript parsed"
    );

    Ok(Transcript {
        raw,
        history,
        tool_usage,
        first_message,
    })
}

/// Message content is either a plain string or an array of typed blocks.
fn extract_text(content: Option<&Value>) -> Option<String> {
    match content? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Array(blocks) => {
            let text: Vec<&str> = blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect();
            match text.is_empty() {
                true => None,
                false => Some(text.join("\n")),
            }
        },
        _ => None,
    }
}

fn count_tool_uses(content: Option<&Value>, usage: &mut BTreeMap<String, u32>) {
    let Some(Value::Array(blocks)) = content else {
        return;
    };
    for block in blocks {
        if block.get("type").and_then(Value::as_str) == Some("tool_use")
            && let Some(name) = block.get("name").and_then(Value::as_str)
        {
            *usage.entry(name.to_string()).or_insert(0) += 1;
        }
    }
}
