//! Executable matcher scripts.
//!
//! A matcher is any on-disk executable. It receives the serialized
//! invocation context as JSON on stdin and must print a single JSON result
//! object on stdout and exit 0. The "callable export" check of the plugin
//! contract is the executable bit.
//!
//! A script may ask for transcript projections with a header directive in
//! its first lines:
//!
//! ```text
//! #!/bin/sh
//! # capmatch-needs: history tool-usage
//! ```
//!
//! Requested projections are resolved through the shared memoized accessor
//! and embedded under a `transcript` key in that matcher's stdin payload.

use std::path::PathBuf;

use {
    anyhow::{Context, bail},
    async_trait::async_trait,
    serde_json::Value,
    thiserror::Error,
    tokio::{io::AsyncWriteExt, process::Command},
    tracing::{debug, warn},
};

use {
    capmatch_common::MatcherKind, capmatch_context::InvocationContext,
    capmatch_discovery::MatcherRecord,
};

use crate::Matcher;

/// How many leading lines are searched for the needs directive.
const DIRECTIVE_WINDOW: usize = 16;

const DIRECTIVE_PREFIX: &str = "# capmatch-needs:";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("matcher file not found: {0}")]
    Missing(PathBuf),

    #[error("matcher is not a regular file: {0}")]
    NotAFile(PathBuf),

    #[error("matcher is not executable: {0}")]
    NotExecutable(PathBuf),

    #[error("failed to read matcher {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Transcript projections a matcher can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Need {
    History,
    ToolUsage,
    FirstMessage,
    RawMessages,
}

impl Need {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "history" => Some(Self::History),
            "tool-usage" => Some(Self::ToolUsage),
            "first-message" => Some(Self::FirstMessage),
            "raw" => Some(Self::RawMessages),
            _ => None,
        }
    }

    fn key(&self) -> &'static str {
        match self {
            Self::History => "history",
            Self::ToolUsage => "tool_usage",
            Self::FirstMessage => "first_message",
            Self::RawMessages => "raw_messages",
        }
    }
}

// ── ShellMatcher ────────────────────────────────────────────────────────────

/// A discovered matcher script, verified loadable.
pub struct ShellMatcher {
    name: String,
    kind: MatcherKind,
    path: PathBuf,
    needs: Vec<Need>,
}

impl ShellMatcher {
    /// Adapt a discovery record into an invokable matcher. Missing file,
    /// non-file, unreadable, or non-executable all fail the load; the
    /// caller skips this matcher and moves on.
    pub fn load(record: &MatcherRecord) -> Result<Self, LoadError> {
        let path = record.path.clone();
        let metadata = std::fs::metadata(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoadError::Missing(path.clone()),
            _ => LoadError::Unreadable {
                path: path.clone(),
                source: e,
            },
        })?;
        if !metadata.is_file() {
            return Err(LoadError::NotAFile(path));
        }
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if metadata.permissions().mode() & 0o111 == 0 {
                return Err(LoadError::NotExecutable(path));
            }
        }

        let head = std::fs::read_to_string(&path).map_err(|e| LoadError::Unreadable {
            path: path.clone(),
            source: e,
        })?;
        let needs = parse_needs(&record.name, &head);

        Ok(Self {
            name: record.name.clone(),
            kind: record.kind,
            path,
            needs,
        })
    }

    pub fn needs(&self) -> &[Need] {
        &self.needs
    }

    async fn build_payload(&self, ctx: &InvocationContext) -> anyhow::Result<String> {
        let mut payload = ctx.payload_json();
        if !self.needs.is_empty() {
            let mut transcript = serde_json::Map::new();
            for need in &self.needs {
                let value = match need {
                    Need::History => serde_json::to_value(ctx.transcript.history().await?)?,
                    Need::ToolUsage => serde_json::to_value(ctx.transcript.tool_usage().await?)?,
                    Need::FirstMessage => {
                        Value::from(ctx.transcript.first_message().await?)
                    },
                    Need::RawMessages => {
                        serde_json::to_value(ctx.transcript.raw_messages().await?)?
                    },
                };
                transcript.insert(need.key().to_string(), value);
            }
            payload["transcript"] = Value::Object(transcript);
        }
        serde_json::to_string(&payload).context("failed to serialize matcher payload")
    }
}

fn parse_needs(matcher: &str, content: &str) -> Vec<Need> {
    let Some(directive) = content
        .lines()
        .take(DIRECTIVE_WINDOW)
        .find_map(|line| line.trim().strip_prefix(DIRECTIVE_PREFIX))
    else {
        return Vec::new();
    };

    let mut needs = Vec::new();
    for token in directive.split_whitespace() {
        match Need::parse(token) {
            Some(need) if !needs.contains(&need) => needs.push(need),
            Some(_) => {},
            None => warn!(matcher, token, "unknown transcript projection in needs directive"),
        }
    }
    needs
}

#[async_trait]
impl Matcher for ShellMatcher {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> MatcherKind {
        self.kind
    }

    async fn evaluate(&self, ctx: &InvocationContext) -> anyhow::Result<Value> {
        let payload = self.build_payload(ctx).await?;

        debug!(
            matcher = %self.name,
            path = %self.path.display(),
            payload_len = payload.len(),
            "spawning matcher"
        );

        let mut child = Command::new(&self.path)
            .current_dir(&ctx.working_dir)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn matcher {}", self.path.display()))?;

        // Write the context to stdin; a matcher that never reads it is fine.
        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(payload.as_bytes()).await
            && e.kind() != std::io::ErrorKind::BrokenPipe
        {
            return Err(e.into());
        }

        let output = child
            .wait_with_output()
            .await
            .with_context(|| format!("matcher '{}' failed to complete", self.name))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "matcher '{}' exited with {}: {}",
                self.name,
                output.status,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            bail!("matcher '{}' produced no result", self.name);
        }
        serde_json::from_str(trimmed)
            .with_context(|| format!("matcher '{}' printed invalid JSON", self.name))
    }
}
