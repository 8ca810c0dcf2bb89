//! Matcher discovery: turn candidate paths into typed, deduplicated records.
//!
//! Discovery is a pure function of the filesystem, run fresh per invocation;
//! there is no cached registry because the process itself is one-shot.

pub mod filter;

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use {
    capmatch_common::{MatcherKind, Protocol, RootSource},
    tracing::{debug, warn},
};

/// Namespace directory a capability keeps its matchers in.
pub const CAPABILITY_NAMESPACE: &str = ".capmatch";

// ── SearchRoots ─────────────────────────────────────────────────────────────

/// Root directories scanned for matchers, in precedence order.
#[derive(Debug, Clone)]
pub struct SearchRoots {
    pub roots: Vec<(PathBuf, RootSource)>,
}

impl SearchRoots {
    pub fn new(roots: Vec<(PathBuf, RootSource)>) -> Self {
        Self { roots }
    }

    /// Project root first so project entries shadow user entries.
    pub fn defaults(cwd: &Path) -> Self {
        Self::new(vec![
            (capmatch_config::project_root(cwd), RootSource::Project),
            (capmatch_config::user_root(), RootSource::User),
        ])
    }
}

// ── MatcherRecord ───────────────────────────────────────────────────────────

/// One discovered matcher. Identity is `(kind, name)`; immutable for the
/// rest of the invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherRecord {
    pub name: String,
    pub kind: MatcherKind,
    pub source: RootSource,
    pub path: PathBuf,
}

/// Derive typed records from the filter's flat path list and deduplicate
/// `(kind, name)` collisions, letting project entries shadow user entries.
pub fn records_from_candidates(
    roots: &SearchRoots,
    protocol: Protocol,
    candidates: Vec<PathBuf>,
) -> Vec<MatcherRecord> {
    let mut records: Vec<MatcherRecord> = Vec::with_capacity(candidates.len());
    let mut by_identity: HashMap<(MatcherKind, String), usize> = HashMap::new();

    for path in candidates {
        let Some(record) = derive_record(roots, protocol, &path) else {
            warn!(?path, "candidate path does not match any discovery layout");
            continue;
        };
        let identity = (record.kind, record.name.clone());
        match by_identity.get(&identity) {
            None => {
                by_identity.insert(identity, records.len());
                records.push(record);
            },
            Some(&existing) => {
                let kept = &records[existing];
                if kept.source == RootSource::User && record.source == RootSource::Project {
                    debug!(
                        name = %record.name,
                        kind = %record.kind,
                        "project matcher shadows user matcher"
                    );
                    records[existing] = record;
                } else {
                    debug!(
                        name = %record.name,
                        kind = %record.kind,
                        source = %record.source,
                        "dropping shadowed duplicate matcher"
                    );
                }
            },
        }
    }

    records
}

/// Convenience for the in-process fast path: scan, then derive.
pub fn discover(roots: &SearchRoots, protocol: Protocol) -> Vec<MatcherRecord> {
    let candidates = filter::candidates(roots, protocol);
    records_from_candidates(roots, protocol, candidates)
}

fn derive_record(
    roots: &SearchRoots,
    protocol: Protocol,
    path: &Path,
) -> Option<MatcherRecord> {
    let (root, source) = roots
        .roots
        .iter()
        .find(|(root, _)| path.starts_with(root))?;
    let relative: Vec<&str> = path
        .strip_prefix(root)
        .ok()?
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();

    match relative.as_slice() {
        // capabilities/<name>/.capmatch/UserPromptSubmit.<proto>.matcher.sh
        ["capabilities", name, CAPABILITY_NAMESPACE, file]
            if *file == protocol.capability_matcher_file() =>
        {
            Some(MatcherRecord {
                name: (*name).to_string(),
                kind: MatcherKind::Capability,
                source: *source,
                path: path.to_path_buf(),
            })
        },
        // delegates/<name>.<proto>.matcher.sh, actions/<name>.<proto>.matcher.sh
        [dir @ ("delegates" | "actions"), file] => {
            let name = file.strip_suffix(protocol.matcher_suffix())?;
            if name.is_empty() {
                return None;
            }
            // The matcher must sit next to its definition file.
            let definition = root.join(*dir).join(format!("{name}.md"));
            if !definition.is_file() {
                warn!(?path, "matcher has no sibling definition file, skipping");
                return None;
            }
            let kind = match *dir {
                "delegates" => MatcherKind::Delegate,
                _ => MatcherKind::Action,
            };
            Some(MatcherRecord {
                name: name.to_string(),
                kind,
                source: *source,
                path: path.to_path_buf(),
            })
        },
        _ => None,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn seed_capability(root: &Path, name: &str) {
        let dir = root.join("capabilities").join(name).join(CAPABILITY_NAMESPACE);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("UserPromptSubmit.v2.matcher.sh"), "#!/bin/sh\n").unwrap();
    }

    fn seed_sibling(root: &Path, dir: &str, name: &str) {
        let dir = root.join(dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(format!("{name}.md")), "# def\n").unwrap();
        std::fs::write(dir.join(format!("{name}.v2.matcher.sh")), "#!/bin/sh\n").unwrap();
    }

    #[test]
    fn derives_names_and_kinds() {
        let tmp = tempfile::tempdir().unwrap();
        seed_capability(tmp.path(), "docker-helper");
        seed_sibling(tmp.path(), "delegates", "reviewer");
        seed_sibling(tmp.path(), "actions", "release");

        let roots = SearchRoots::new(vec![(tmp.path().to_path_buf(), RootSource::Project)]);
        let mut records = discover(&roots, Protocol::V2);
        records.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "docker-helper");
        assert_eq!(records[0].kind, MatcherKind::Capability);
        assert_eq!(records[1].name, "release");
        assert_eq!(records[1].kind, MatcherKind::Action);
        assert_eq!(records[2].name, "reviewer");
        assert_eq!(records[2].kind, MatcherKind::Delegate);
    }

    #[test]
    fn project_shadows_user() {
        let project = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        seed_capability(project.path(), "shared");
        seed_capability(user.path(), "shared");
        seed_capability(user.path(), "user-only");

        let roots = SearchRoots::new(vec![
            (project.path().to_path_buf(), RootSource::Project),
            (user.path().to_path_buf(), RootSource::User),
        ]);
        let records = discover(&roots, Protocol::V2);

        assert_eq!(records.len(), 2);
        let shared = records.iter().find(|r| r.name == "shared").unwrap();
        assert_eq!(shared.source, RootSource::Project);
        assert!(records.iter().any(|r| r.name == "user-only"));
    }

    #[test]
    fn project_wins_regardless_of_candidate_order() {
        let project = tempfile::tempdir().unwrap();
        let user = tempfile::tempdir().unwrap();
        seed_capability(project.path(), "shared");
        seed_capability(user.path(), "shared");

        let roots = SearchRoots::new(vec![
            (project.path().to_path_buf(), RootSource::Project),
            (user.path().to_path_buf(), RootSource::User),
        ]);
        // User candidate listed first, as an external filter might emit it.
        let candidates = vec![
            user.path()
                .join("capabilities/shared/.capmatch/UserPromptSubmit.v2.matcher.sh"),
            project
                .path()
                .join("capabilities/shared/.capmatch/UserPromptSubmit.v2.matcher.sh"),
        ];
        let records = records_from_candidates(&roots, Protocol::V2, candidates);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source, RootSource::Project);
    }

    #[test]
    fn orphan_sibling_matcher_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("delegates");
        std::fs::create_dir_all(&dir).unwrap();
        // Matcher without its definition file.
        std::fs::write(dir.join("ghost.v2.matcher.sh"), "#!/bin/sh\n").unwrap();

        let roots = SearchRoots::new(vec![(tmp.path().to_path_buf(), RootSource::Project)]);
        assert!(discover(&roots, Protocol::V2).is_empty());
    }

    #[test]
    fn path_outside_roots_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let roots = SearchRoots::new(vec![(tmp.path().to_path_buf(), RootSource::Project)]);
        let records = records_from_candidates(
            &roots,
            Protocol::V2,
            vec![PathBuf::from("/elsewhere/delegates/x.v2.matcher.sh")],
        );
        assert!(records.is_empty());
    }
}
