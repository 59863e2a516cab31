//! Template discovery: walks a checkout for files with a template suffix.

use std::path::{Component, Path};

use walkdir::{DirEntry, WalkDir};

use tplwatch_core::TemplateSet;

use crate::error::WatchError;

/// Collect every regular file under `root` whose name ends with one of
/// `suffixes`.
///
/// Paths are returned relative to `root` with `/` separators. The `.git`
/// directory is never entered and symlinks are not followed. Any traversal
/// error, including a missing root, aborts the scan.
///
/// Paths containing `\n` or `\r` are skipped with a warning: the state file
/// stores one path per line and could not record them.
pub fn scan(root: &Path, suffixes: &[String]) -> Result<TemplateSet, WatchError> {
    let meta = std::fs::metadata(root).map_err(|source| WatchError::ScanRoot {
        path: root.to_path_buf(),
        source,
    })?;
    if !meta.is_dir() {
        return Err(WatchError::NotADirectory(root.to_path_buf()));
    }

    let mut found = TemplateSet::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_git_dir(e));
    for entry in walker {
        let entry = entry.map_err(|source| WatchError::Scan {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !suffixes.iter().any(|s| name.ends_with(s.as_str())) {
            continue;
        }
        let rel = to_slash(entry.path().strip_prefix(root).unwrap_or(entry.path()));
        if rel.contains(['\n', '\r']) {
            tracing::warn!("skipping template with a line break in its path: {rel:?}");
            continue;
        }
        found.insert(rel);
    }

    tracing::debug!("scanned {}: {} template(s)", root.display(), found.len());
    Ok(found)
}

fn is_git_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_type().is_dir() && entry.file_name() == ".git"
}

fn to_slash(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
