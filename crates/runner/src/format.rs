//! Rendering the ranked list into the host reply.
//!
//! Silence is the common outcome: an empty ranking produces no output at
//! all. Otherwise the block is deterministic — same ranking, same bytes.

use std::fmt::Write as _;

use {capmatch_common::MatcherKind, serde::Serialize};

use crate::score::{RankedItem, Ranking};

const CALL_TO_ACTION: &str =
    "Relevant capabilities were detected for this prompt. Consider invoking the \
     matching tool before responding:";

/// The structured reply the host reads from stdout. Emitted only when at
/// least one suggestion survived ranking.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub hook_specific_output: HookSpecificOutput,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSpecificOutput {
    pub hook_event_name: &'static str,
    pub additional_context: String,
}

impl Reply {
    pub fn new(additional_context: String) -> Self {
        Self {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: capmatch_context::EVENT_NAME,
                additional_context,
            },
        }
    }
}

/// Render the suggestion block, or `None` when there is nothing to say.
pub fn render(ranking: &Ranking) -> Option<String> {
    if ranking.is_empty() {
        return None;
    }
    let mut out = String::from(CALL_TO_ACTION);
    out.push('\n');

    match ranking {
        Ranking::Current(items) => {
            for (position, item) in items.iter().enumerate() {
                let _ = write!(
                    out,
                    "\n{}. {} ({}, score {:.2}) — {}",
                    position + 1,
                    item.name,
                    item.kind,
                    item.score,
                    invocation_hint(item)
                );
            }
        },
        Ranking::Legacy(tiers) => {
            for (priority, items) in tiers {
                let _ = write!(out, "\n[{}]", priority.as_str());
                for item in items {
                    let _ = write!(
                        out,
                        "\n- {} ({}) — {}",
                        item.name,
                        item.kind,
                        invocation_hint(item)
                    );
                }
                out.push('\n');
            }
            // Tier sections add their own trailing newline.
            while out.ends_with('\n') {
                out.pop();
            }
        },
    }
    Some(out)
}

/// Map a kind onto the host's invocation syntax.
fn invocation_hint(item: &RankedItem) -> String {
    match item.kind {
        MatcherKind::Capability => {
            format!("invoke the capability tool with name=\"{}\"", item.name)
        },
        MatcherKind::Delegate => {
            format!("invoke the delegation tool with subagent=\"{}\"", item.name)
        },
        MatcherKind::Action => {
            format!("invoke the action tool with name=\"/{}\"", item.name)
        },
    }
}
