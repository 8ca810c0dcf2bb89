//! Search-root resolution and optional settings for the matcher pipeline.
//!
//! Matchers live under two roots: the project root `<cwd>/.capmatch/` and
//! the user root `~/.capmatch/` (overridable via `CAPMATCH_HOME`). Settings
//! come from `<user root>/config.toml` when present; everything has a
//! sensible default because the common case is no config file at all.

use std::path::{Path, PathBuf};

use {serde::Deserialize, thiserror::Error, tracing::warn};

/// Directory name shared by the project and user roots.
pub const ROOT_DIR_NAME: &str = ".capmatch";

/// Settings file name under the user root.
const SETTINGS_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── Roots ───────────────────────────────────────────────────────────────────

/// The user-level root, `$CAPMATCH_HOME` or `~/.capmatch`.
///
/// Falls back to a relative `.capmatch` when no home directory can be
/// resolved (containers without a passwd entry); the discovery layer treats
/// a missing root as an empty one, so this never fails.
pub fn user_root() -> PathBuf {
    if let Some(home) = std::env::var_os("CAPMATCH_HOME") {
        return PathBuf::from(home);
    }
    match directories::BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(ROOT_DIR_NAME),
        None => PathBuf::from(ROOT_DIR_NAME),
    }
}

/// The project-level root for the given working directory.
pub fn project_root(cwd: &Path) -> PathBuf {
    cwd.join(ROOT_DIR_NAME)
}

// ── Settings ────────────────────────────────────────────────────────────────

/// Pipeline settings, all optional on disk.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Per-matcher execution timeout in seconds.
    pub matcher_timeout_secs: u64,
    /// Maximum number of suggestions to render after ranking.
    pub max_suggestions: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            matcher_timeout_secs: 5,
            max_suggestions: 10,
        }
    }
}

impl Settings {
    /// Load settings from `<user root>/config.toml`, then apply env
    /// overrides. Absent file means defaults; an unreadable or invalid file
    /// is logged and also means defaults, since a broken config must not
    /// take the hook down.
    pub fn load() -> Self {
        let mut settings = match Self::read(&user_root().join(SETTINGS_FILE)) {
            Ok(s) => s,
            Err(e) => {
                warn!(%e, "ignoring unusable settings file");
                Self::default()
            },
        };
        if let Ok(raw) = std::env::var("CAPMATCH_TIMEOUT_SECS") {
            match raw.parse() {
                Ok(secs) => settings.matcher_timeout_secs = secs,
                Err(_) => warn!(%raw, "ignoring non-numeric CAPMATCH_TIMEOUT_SECS"),
            }
        }
        settings
    }

    /// Read and parse one settings file. Missing file is not an error.
    pub fn read(path: &Path) -> Result<Self, Error> {
        if !path.is_file() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let settings = Settings::read(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.matcher_timeout_secs, 5);
        assert_eq!(settings.max_suggestions, 10);
    }

    #[test]
    fn reads_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "matcher_timeout_secs = 2\n").unwrap();
        let settings = Settings::read(&path).unwrap();
        assert_eq!(settings.matcher_timeout_secs, 2);
        assert_eq!(settings.max_suggestions, 10);
    }

    #[test]
    fn rejects_unknown_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "matcher_timeout = 2\n").unwrap();
        assert!(Settings::read(&path).is_err());
    }

    #[test]
    fn project_root_is_under_cwd() {
        assert_eq!(
            project_root(Path::new("/work/repo")),
            PathBuf::from("/work/repo/.capmatch")
        );
    }
}
