//! The per-invocation pipeline: load, evaluate, validate, rank, render.
//!
//! Every matcher runs inside its own fence. A matcher that fails to load,
//! crashes, times out, or returns an invalid result is logged and dropped;
//! the remaining matchers are unaffected and the run still succeeds.

use std::time::Duration;

use {futures::future::join_all, tracing::{debug, warn}};

use {
    capmatch_common::{MatchReport, MatcherKind},
    capmatch_config::Settings,
    capmatch_context::InvocationContext,
    capmatch_discovery::MatcherRecord,
};

use crate::{Matcher, format, score, shell::ShellMatcher, validate::validate};

/// One matcher's validated, typed result, ready for ranking. The kind is the
/// discovery-time kind unless the report overrode it.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub name: String,
    pub kind: MatcherKind,
    pub report: MatchReport,
}

/// Run the whole pipeline over discovered records. `None` means silence:
/// nothing loadable, nothing relevant, or nothing survived validation.
pub async fn run(
    records: Vec<MatcherRecord>,
    ctx: &InvocationContext,
    settings: &Settings,
) -> Option<format::Reply> {
    let matchers = load_all(&records);
    if matchers.is_empty() {
        debug!("no loadable matchers");
        return None;
    }

    let timeout = Duration::from_secs(settings.matcher_timeout_secs);
    let evaluations = evaluate_all(&matchers, ctx, timeout).await;

    let mut ranking = score::rank(ctx.protocol, &evaluations);
    ranking.truncate(settings.max_suggestions);
    debug!(suggestions = ranking.len(), "ranking complete");

    format::render(&ranking).map(format::Reply::new)
}

/// Adapt records into invokable matchers, skipping any that fail to load.
fn load_all(records: &[MatcherRecord]) -> Vec<Box<dyn Matcher>> {
    records
        .iter()
        .filter_map(|record| match ShellMatcher::load(record) {
            Ok(matcher) => Some(Box::new(matcher) as Box<dyn Matcher>),
            Err(e) => {
                warn!(matcher = %record.name, kind = %record.kind, %e, "skipping unloadable matcher");
                None
            },
        })
        .collect()
}

/// Evaluate all matchers concurrently under a uniform per-matcher timeout.
/// Results come back in input order regardless of completion order, so
/// ranking ties stay deterministic.
pub async fn evaluate_all(
    matchers: &[Box<dyn Matcher>],
    ctx: &InvocationContext,
    timeout: Duration,
) -> Vec<Evaluation> {
    let runs = matchers.iter().map(|matcher| async move {
        let raw = match tokio::time::timeout(timeout, matcher.evaluate(ctx)).await {
            Err(_) => {
                warn!(matcher = matcher.name(), ?timeout, "matcher timed out");
                return None;
            },
            Ok(Err(e)) => {
                warn!(matcher = matcher.name(), %e, "matcher failed");
                return None;
            },
            Ok(Ok(raw)) => raw,
        };
        match validate(ctx.protocol, &raw) {
            Err(e) => {
                warn!(matcher = matcher.name(), %e, "matcher result rejected");
                None
            },
            Ok(report) => Some(Evaluation {
                name: matcher.name().to_string(),
                kind: report.kind_override().unwrap_or_else(|| matcher.kind()),
                report,
            }),
        }
    });
    join_all(runs).await.into_iter().flatten().collect()
}
