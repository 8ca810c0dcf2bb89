//! Shared types used across all capmatch crates.

pub mod report;
pub mod types;

pub use {
    report::{MatchReport, Priority, Relevance},
    types::{MatcherKind, Protocol, RootSource},
};
