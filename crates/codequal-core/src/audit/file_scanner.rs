use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;
use tracing::{trace, warn};

/// Extensions scanned when no allow-list is configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["py", "js", "java", "cpp", "c", "ts", "go"];

/// Directory names that are never descended into.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &["venv", "node_modules", ".git", "__pycache__"];

static DEFAULT_EXTENSION_SET: Lazy<HashSet<String>> =
    Lazy::new(|| DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect());

static DEFAULT_IGNORED_DIR_SET: Lazy<HashSet<String>> =
    Lazy::new(|| DEFAULT_IGNORED_DIRS.iter().map(|s| s.to_string()).collect());

/// Enumerates candidate source files under a root directory.
///
/// Ignored directory names are pruned before descent, so excluded subtrees
/// (dependency caches, VCS metadata) are never traversed. Unreadable entries
/// are logged and skipped; a scan never aborts because of one bad entry.
#[derive(Debug, Clone)]
pub struct FileScanner {
    extensions: HashSet<String>,
    ignored_dirs: HashSet<String>,
}

impl Default for FileScanner {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSION_SET.clone(),
            ignored_dirs: DEFAULT_IGNORED_DIR_SET.clone(),
        }
    }
}

impl FileScanner {
    pub fn new(
        extensions: impl IntoIterator<Item = String>,
        ignored_dirs: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect(),
            ignored_dirs: ignored_dirs.into_iter().collect(),
        }
    }

    /// Extend the extension allow-list. Leading dots are accepted and stripped.
    pub fn with_extra_extensions(mut self, extra: impl IntoIterator<Item = String>) -> Self {
        self.extensions
            .extend(extra.into_iter().map(|ext| ext.trim_start_matches('.').to_string()));
        self
    }

    /// Extend the set of pruned directory names.
    pub fn with_extra_ignored_dirs(mut self, extra: impl IntoIterator<Item = String>) -> Self {
        self.ignored_dirs.extend(extra);
        self
    }

    pub fn extensions(&self) -> &HashSet<String> {
        &self.extensions
    }

    pub fn ignored_dirs(&self) -> &HashSet<String> {
        &self.ignored_dirs
    }

    /// Walk `root` and collect eligible file paths in traversal order.
    pub fn scan(&self, root: &Path) -> Vec<PathBuf> {
        let mut files = Vec::new();
        self.walk(root, &mut files);
        files
    }

    fn walk(&self, dir: &Path, out: &mut Vec<PathBuf>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %dir.display(), %err, "skipping unreadable directory");
                return;
            }
        };
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(dir = %dir.display(), %err, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(err) => {
                    warn!(path = %path.display(), %err, "skipping entry without file type");
                    continue;
                }
            };
            if file_type.is_dir() {
                let name = entry.file_name();
                if self.ignored_dirs.contains(name.to_string_lossy().as_ref()) {
                    trace!(dir = %path.display(), "pruned ignored directory");
                    continue;
                }
                self.walk(&path, out);
            } else if file_type.is_file() && self.matches_extension(&path) {
                out.push(path);
            }
        }
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(ext))
    }
}
