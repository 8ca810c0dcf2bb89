//! Matcher kinds, protocol versions, and search-root provenance.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── MatcherKind ─────────────────────────────────────────────────────────────

/// What a discovered matcher suggests invoking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatcherKind {
    /// A capability bundle (directory with its own docs and matcher).
    Capability,
    /// A delegate definition the host runs as a subagent.
    Delegate,
    /// A slash-style action the host exposes as a command.
    Action,
}

impl MatcherKind {
    /// Parse the lowercase wire form used in matcher reports.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "capability" => Some(Self::Capability),
            "delegate" => Some(Self::Delegate),
            "action" => Some(Self::Action),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Capability => "capability",
            Self::Delegate => "delegate",
            Self::Action => "action",
        }
    }
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Protocol ────────────────────────────────────────────────────────────────

/// Matcher protocol version. A single invocation scans and validates exactly
/// one protocol; the two are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    V1,
    V2,
}

impl Protocol {
    pub const CURRENT: Protocol = Protocol::V2;

    /// The `version` literal a report must carry for this protocol.
    pub fn version_literal(&self) -> &'static str {
        match self {
            Self::V1 => "1.0",
            Self::V2 => "2.0",
        }
    }

    /// Filename suffix for delegate/action sibling matchers
    /// (`<name><suffix>`).
    pub fn matcher_suffix(&self) -> &'static str {
        match self {
            Self::V1 => ".v1.matcher.sh",
            Self::V2 => ".v2.matcher.sh",
        }
    }

    /// Fixed matcher filename inside a capability's `.capmatch/` directory.
    pub fn capability_matcher_file(&self) -> &'static str {
        match self {
            Self::V1 => "UserPromptSubmit.v1.matcher.sh",
            Self::V2 => "UserPromptSubmit.v2.matcher.sh",
        }
    }
}

// ── RootSource ──────────────────────────────────────────────────────────────

/// Which search root a matcher came from. Project entries shadow user
/// entries of the same `(kind, name)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootSource {
    Project,
    User,
}

impl fmt::Display for RootSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project => f.write_str("project"),
            Self::User => f.write_str("user"),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parse_round_trip() {
        for kind in [
            MatcherKind::Capability,
            MatcherKind::Delegate,
            MatcherKind::Action,
        ] {
            assert_eq!(MatcherKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(MatcherKind::parse("skill"), None);
        assert_eq!(MatcherKind::parse(""), None);
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MatcherKind::Delegate).unwrap(),
            "\"delegate\""
        );
    }

    #[test]
    fn current_protocol_literals() {
        assert_eq!(Protocol::CURRENT.version_literal(), "2.0");
        assert_eq!(Protocol::V1.version_literal(), "1.0");
        assert!(
            Protocol::CURRENT
                .capability_matcher_file()
                .ends_with(Protocol::CURRENT.matcher_suffix())
        );
    }
}
