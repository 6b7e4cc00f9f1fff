//! Directory traversal for the file arguments.
//!
//! Walks with an explicit stack instead of recursion, so the depth of the tree
//! only costs heap space. Unreadable entries are logged and counted, not fatal.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use log::{debug, warn};

use crate::error::{Error, Result};

const IGNORED_DIRS: [&str; 9] = [
    "target",
    "node_modules",
    "build",
    "dist",
    ".git",
    "venv",
    "__pycache__",
    "bin",
    "obj",
];

#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub non_recursive: bool,
    pub max_depth: usize,
    pub max_entries: usize,
    pub ignore: Vec<String>,
    pub filespec: Option<Pattern>,
}

impl WalkOptions {
    pub fn parse_filespec(spec: Option<&str>) -> Result<Option<Pattern>> {
        spec.map(|spec| {
            Pattern::new(spec).map_err(|source| Error::InvalidFilespec {
                spec: spec.to_string(),
                source,
            })
        })
        .transpose()
    }

    fn is_ignored_dir(&self, path: &Path) -> bool {
        let dir_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        IGNORED_DIRS.contains(&dir_name) || self.ignore.iter().any(|d| path.ends_with(Path::new(d)))
    }
}

/// Collect the files under `root` in name order, directories depth first.
///
/// Warnings are added to `error_count`; only exceeding `max_entries` fails.
pub fn collect_files(root: &Path, options: &WalkOptions, error_count: &mut usize) -> Result<Vec<PathBuf>> {
    let root_path = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    let mut files = Vec::new();
    let mut stack = vec![(root_path.clone(), 0usize)];

    while let Some((dir, depth)) = stack.pop() {
        if depth > options.max_depth {
            warn!(
                "Maximum directory depth ({}) reached at {}",
                options.max_depth,
                dir.display()
            );
            *error_count += 1;
            continue;
        }
        if depth > 0 && options.is_ignored_dir(&dir) {
            debug!("skipping ignored directory {}", dir.display());
            continue;
        }

        let read_dir = match fs::read_dir(&dir) {
            Ok(iter) => iter,
            Err(err) => {
                warn!("Error reading directory {}: {}", dir.display(), err);
                *error_count += 1;
                continue;
            }
        };

        let mut entries = Vec::new();
        for entry_result in read_dir {
            match entry_result {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    warn!("Error reading entry in {}: {}", dir.display(), err);
                    *error_count += 1;
                }
            }
        }
        entries.sort_by_key(|entry| entry.file_name());

        let mut subdirs = Vec::new();
        for entry in entries {
            let entry_path = entry.path();
            let file_type = match entry.file_type() {
                Ok(ft) => ft,
                Err(err) => {
                    warn!("Error reading type for {}: {}", entry_path.display(), err);
                    *error_count += 1;
                    continue;
                }
            };

            if file_type.is_dir() {
                if !options.non_recursive {
                    subdirs.push(entry_path);
                }
            } else if file_type.is_file() {
                if !filespec_matches(options.filespec.as_ref(), &root_path, &entry_path) {
                    continue;
                }
                if files.len() >= options.max_entries {
                    return Err(Error::TooManyEntries {
                        limit: options.max_entries,
                    });
                }
                files.push(entry_path);
            }
        }

        // Reversed so the first name is popped first.
        stack.extend(subdirs.into_iter().rev().map(|path| (path, depth + 1)));
    }

    Ok(files)
}

/// Matches the file name or the path relative to `root_path` (with `/` separators).
fn filespec_matches(filespec: Option<&Pattern>, root_path: &Path, file_path: &Path) -> bool {
    let Some(pattern) = filespec else {
        return true;
    };
    if file_path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| pattern.matches(name))
    {
        return true;
    }

    let Ok(relative) = file_path.strip_prefix(root_path) else {
        return false;
    };
    relative
        .to_str()
        .is_some_and(|rel| pattern.matches(&rel.replace('\\', "/")))
}
