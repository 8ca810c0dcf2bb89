//! Score aggregation and ranking.
//!
//! One scheme per invocation, selected by the active protocol. Ties keep
//! stable input order in both schemes; the legacy scheme deliberately has no
//! numeric tie-break below its `(priority, relevance)` key.

use capmatch_common::{MatchReport, MatcherKind, Priority, Protocol, Relevance};

use crate::pipeline::Evaluation;

/// Declared match counts are capped here before scoring, so keyword-stuffed
/// matchers cannot crowd out honest ones.
pub const MATCH_COUNT_CAP: u32 = 10;

/// One surviving matcher with its normalized score.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedItem {
    pub name: String,
    pub kind: MatcherKind,
    pub score: f64,
}

/// The ranked result, shaped per scheme: the legacy scheme preserves its
/// priority-tier grouping for output, the current scheme is a flat list.
#[derive(Debug, Clone, PartialEq)]
pub enum Ranking {
    Legacy(Vec<(Priority, Vec<RankedItem>)>),
    Current(Vec<RankedItem>),
}

impl Ranking {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Legacy(tiers) => tiers.iter().all(|(_, items)| items.is_empty()),
            Self::Current(items) => items.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Legacy(tiers) => tiers.iter().map(|(_, items)| items.len()).sum(),
            Self::Current(items) => items.len(),
        }
    }

    /// Keep only the first `max` items in rank order.
    pub fn truncate(&mut self, max: usize) {
        match self {
            Self::Current(items) => items.truncate(max),
            Self::Legacy(tiers) => {
                let mut remaining = max;
                for (_, items) in tiers.iter_mut() {
                    let take = remaining.min(items.len());
                    items.truncate(take);
                    remaining -= take;
                }
                tiers.retain(|(_, items)| !items.is_empty());
            },
        }
    }

    /// All surviving `(kind, name)` pairs in rank order.
    pub fn identities(&self) -> Vec<(MatcherKind, &str)> {
        match self {
            Self::Current(items) => items.iter().map(|i| (i.kind, i.name.as_str())).collect(),
            Self::Legacy(tiers) => tiers
                .iter()
                .flat_map(|(_, items)| items.iter().map(|i| (i.kind, i.name.as_str())))
                .collect(),
        }
    }
}

/// Rank validated, relevant evaluations under the active protocol's scheme.
pub fn rank(protocol: Protocol, evaluations: &[Evaluation]) -> Ranking {
    match protocol {
        Protocol::V1 => rank_legacy(evaluations),
        Protocol::V2 => rank_current(evaluations),
    }
}

fn rank_legacy(evaluations: &[Evaluation]) -> Ranking {
    let mut candidates: Vec<(&Evaluation, Priority, Relevance)> = evaluations
        .iter()
        .filter_map(|e| match e.report {
            MatchReport::Legacy {
                relevant: true,
                priority,
                relevance,
                ..
            } => Some((e, priority, relevance)),
            _ => None,
        })
        .collect();
    // Stable sort: input order is the only tie-break below the tier key.
    candidates.sort_by_key(|(_, priority, relevance)| (*priority, *relevance));

    let mut tiers: Vec<(Priority, Vec<RankedItem>)> = Vec::new();
    for (evaluation, priority, _) in candidates {
        let item = RankedItem {
            name: evaluation.name.clone(),
            kind: evaluation.kind,
            score: legacy_weight(priority),
        };
        match tiers.last_mut() {
            Some((tier, items)) if *tier == priority => items.push(item),
            _ => tiers.push((priority, vec![item])),
        }
    }
    Ranking::Legacy(tiers)
}

fn legacy_weight(priority: Priority) -> f64 {
    match priority {
        Priority::Critical => 1.0,
        Priority::High => 0.75,
        Priority::Medium => 0.5,
        Priority::Low => 0.25,
    }
}

fn rank_current(evaluations: &[Evaluation]) -> Ranking {
    let mut candidates: Vec<(&Evaluation, u32)> = evaluations
        .iter()
        .filter_map(|e| match e.report {
            MatchReport::Current { match_count, .. } if match_count > 0 => {
                Some((e, match_count.min(MATCH_COUNT_CAP)))
            },
            _ => None,
        })
        .collect();
    candidates.sort_by_key(|(_, capped)| std::cmp::Reverse(*capped));

    let max = candidates
        .iter()
        .map(|(_, capped)| *capped)
        .max()
        .unwrap_or(0);
    let items = candidates
        .into_iter()
        .map(|(evaluation, capped)| RankedItem {
            name: evaluation.name.clone(),
            kind: evaluation.kind,
            score: f64::from(capped) / f64::from(max),
        })
        .collect();
    Ranking::Current(items)
}
