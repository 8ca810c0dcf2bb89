//! Validated matcher reports.
//!
//! Matchers declare their result in one of two historical shapes, selected
//! by the `version` discriminant. The raw JSON is checked field by field in
//! `capmatch-runner`; a [`MatchReport`] only exists once validation passed.

use crate::types::MatcherKind;

// ── Legacy ordinal tiers ────────────────────────────────────────────────────

/// Urgency tier in the legacy (v1) scheme. Declaration order is ranking
/// order: `Critical` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Confidence tier in the legacy (v1) scheme. `High` sorts first within a
/// priority group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Relevance {
    High,
    Medium,
    Low,
}

impl Relevance {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }
}

// ── MatchReport ─────────────────────────────────────────────────────────────

/// A matcher's validated result, one variant per protocol version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchReport {
    /// `{"version":"1.0", ...}` — boolean relevance plus ordinal tiers.
    Legacy {
        relevant: bool,
        priority: Priority,
        relevance: Relevance,
        kind: Option<MatcherKind>,
    },
    /// `{"version":"2.0", ...}` — keyword match count, capped before scoring.
    Current {
        match_count: u32,
        kind: Option<MatcherKind>,
    },
}

impl MatchReport {
    /// Whether this report nominates its matcher for ranking at all.
    pub fn is_relevant(&self) -> bool {
        match self {
            Self::Legacy { relevant, .. } => *relevant,
            Self::Current { match_count, .. } => *match_count > 0,
        }
    }

    /// A declared kind overrides whatever discovery inferred from the path.
    pub fn kind_override(&self) -> Option<MatcherKind> {
        match self {
            Self::Legacy { kind, .. } | Self::Current { kind, .. } => *kind,
        }
    }
}
