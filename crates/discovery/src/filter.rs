//! The fast filter: a dependency-free candidate scan.
//!
//! This runs before anything else — before the async runtime exists and
//! before stdin is read — because the common case is "no matchers
//! installed" and that case must cost close to nothing. It only matches the
//! active protocol's filenames; it never opens, parses, or validates a file.

use std::path::{Path, PathBuf};

use capmatch_common::Protocol;

use crate::SearchRoots;

/// Collect candidate matcher paths under the configured roots.
///
/// A missing or unreadable root (or kind directory) is skipped, not an
/// error. Paths come back in root priority order.
pub fn candidates(roots: &SearchRoots, protocol: Protocol) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for (root, _source) in &roots.roots {
        scan_capabilities(&root.join("capabilities"), protocol, &mut found);
        scan_siblings(&root.join("delegates"), protocol, &mut found);
        scan_siblings(&root.join("actions"), protocol, &mut found);
    }
    found
}

/// `<dir>/<name>/.capmatch/UserPromptSubmit.<proto>.matcher.sh`
fn scan_capabilities(dir: &Path, protocol: Protocol, found: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let matcher = entry
            .path()
            .join(crate::CAPABILITY_NAMESPACE)
            .join(protocol.capability_matcher_file());
        if matcher.is_file() {
            found.push(matcher);
        }
    }
}

/// `<dir>/<name>.<proto>.matcher.sh` next to the definition file.
fn scan_siblings(dir: &Path, protocol: Protocol, found: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };
    let suffix = protocol.matcher_suffix();
    for entry in entries.flatten() {
        let path = entry.path();
        let is_matcher = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(suffix));
        if is_matcher && path.is_file() {
            found.push(path);
        }
    }
}
