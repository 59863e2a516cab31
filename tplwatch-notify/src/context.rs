//! Template contexts: serializable rendering payloads for each message part.

use serde::{Deserialize, Serialize};

use tplwatch_core::types::Repository;

use crate::error::NotifyError;

/// Context for `notice/header.tera`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderCtx {
    pub repo_name: String,
    /// Total new templates across every part of the batch.
    pub count: usize,
}

/// Context for `notice/entry.tera`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryCtx {
    /// Path relative to the repository root.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

/// Context for `notice/baseline.tera`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineCtx {
    pub repo_name: String,
    pub count: usize,
}

impl HeaderCtx {
    pub fn new(repo: &Repository, count: usize) -> Self {
        Self {
            repo_name: repo.name.to_string(),
            count,
        }
    }
}

impl EntryCtx {
    pub fn new(repo: &Repository, path: &str) -> Self {
        Self {
            path: path.to_string(),
            link: repo.link_for(path),
        }
    }

    /// Same entry without its hyperlink.
    pub fn unlinked(&self) -> Self {
        Self {
            path: self.path.clone(),
            link: None,
        }
    }
}

impl BaselineCtx {
    pub fn new(repo: &Repository, count: usize) -> Self {
        Self {
            repo_name: repo.name.to_string(),
            count,
        }
    }
}

/// Serialize any context into a [`tera::Context`].
pub(crate) fn to_tera_context<T: Serialize>(ctx: &T) -> Result<tera::Context, NotifyError> {
    Ok(tera::Context::from_serialize(ctx)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tplwatch_core::types::RepoName;

    #[test]
    fn entry_link_follows_repository_link_base() {
        let repo = Repository {
            name: RepoName::from("r"),
            url: "u".into(),
            link_base: Some("https://example.com/blob/main".into()),
            path: PathBuf::from("/tmp/r"),
        };
        let entry = EntryCtx::new(&repo, "dns/a.yaml");
        assert_eq!(
            entry.link.as_deref(),
            Some("https://example.com/blob/main/dns/a.yaml")
        );
        assert!(entry.unlinked().link.is_none());
    }

    #[test]
    fn missing_link_is_not_serialized() {
        let entry = EntryCtx {
            path: "a.yaml".into(),
            link: None,
        };
        let ctx = to_tera_context(&entry).expect("context");
        assert!(ctx.get("link").is_none());
        assert!(ctx.get("path").is_some());
    }
}
