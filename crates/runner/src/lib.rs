//! Matcher execution, validation, ranking, and output rendering.
//!
//! Matchers are third-party code the pipeline does not own and must not
//! trust: every load, invocation, and validation step is fenced so one
//! broken matcher can only ever remove itself from the ranking.

pub mod format;
pub mod pipeline;
pub mod score;
pub mod shell;
pub mod validate;

use {
    async_trait::async_trait, capmatch_common::MatcherKind, capmatch_context::InvocationContext,
    serde_json::Value,
};

pub use {
    format::{Reply, render},
    pipeline::{Evaluation, run},
    score::{MATCH_COUNT_CAP, RankedItem, Ranking},
    shell::ShellMatcher,
    validate::{ValidationError, validate},
};

/// The polymorphic seam between the pipeline and matcher implementations.
///
/// `evaluate` returns the matcher's raw, untrusted JSON result; the pipeline
/// validates it against the active protocol before anything else sees it.
#[async_trait]
pub trait Matcher: Send + Sync {
    fn name(&self) -> &str;

    /// Kind inferred at discovery time. A validated report may override it.
    fn kind(&self) -> MatcherKind;

    async fn evaluate(&self, ctx: &InvocationContext) -> anyhow::Result<Value>;
}
