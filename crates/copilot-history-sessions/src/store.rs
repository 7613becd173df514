use std::path::{Path, PathBuf};

use crate::types::SessionLogFile;

/// Environment variable selecting the session log directory.
pub const SESSION_DIR_ENV: &str = "SESSION_STATE_DIR";

/// Extension of session log files.
pub const SESSION_EXTENSION: &str = "jsonl";

/// Resolve the session log directory: `SESSION_STATE_DIR` when set,
/// otherwise `~/.copilot/session-state`. The directory is not created.
pub fn resolve_session_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(SESSION_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    default_session_dir()
}

/// `~/.copilot/session-state`, relative to the working directory when no home
/// directory can be determined.
pub fn default_session_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".copilot")
        .join("session-state")
}

/// List the session logs in `dir`, oldest first.
///
/// A missing or unreadable directory is an empty store, not an error.
pub fn list_session_files(dir: &Path) -> Vec<SessionLogFile> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot read session dir {:?}: {}", dir, e);
            return Vec::new();
        }
    };

    let mut files: Vec<SessionLogFile> = Vec::new();

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Failed to read entry in {:?}: {}", dir, e);
                continue;
            }
        };
        let path = entry.path();

        if path.extension().and_then(|s| s.to_str()) != Some(SESSION_EXTENSION) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!("Failed to stat session {:?}: {}", path, e);
                continue;
            }
        };
        let Ok(modified) = metadata.modified() else {
            continue;
        };

        let session_id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        files.push(SessionLogFile {
            path,
            session_id,
            modified,
        });
    }

    files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));
    files
}

/// Read-only access to a directory of session logs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    sessions_dir: PathBuf,
}

impl SessionStore {
    /// Create a store over the resolved default directory.
    pub fn new() -> Self {
        Self::with_dir(resolve_session_dir())
    }

    /// Create a store over a custom directory (useful for testing).
    pub fn with_dir(sessions_dir: PathBuf) -> Self {
        Self { sessions_dir }
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    pub fn exists(&self) -> bool {
        self.sessions_dir.is_dir()
    }

    /// Session logs, oldest first.
    pub fn files(&self) -> Vec<SessionLogFile> {
        list_session_files(&self.sessions_dir)
    }

    /// Session logs, most recently modified first.
    pub fn recent_files(&self) -> Vec<SessionLogFile> {
        let mut files = self.files();
        files.reverse();
        files
    }

    /// Most recent session whose id contains `fragment`.
    pub fn find_session(&self, fragment: &str) -> Option<SessionLogFile> {
        self.recent_files()
            .into_iter()
            .find(|f| f.session_id.contains(fragment))
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
