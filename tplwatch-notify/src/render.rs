//! Tera rendering engine for chat messages: [`MessageRenderer`].
//!
//! # Message layout
//!
//! | Part     | Template               | Notes                                  |
//! |----------|------------------------|----------------------------------------|
//! | Header   | `notice/header.tera`   | repeated at the top of every batch     |
//! | Entry    | `notice/entry.tera`    | one line per new template              |
//! | Baseline | `notice/baseline.tera` | one-off "now tracking" acknowledgement |
//!
//! Output is Telegram HTML; the `tg_escape` filter escapes `&`, `<`, `>` and `"`.
//! Lengths are measured in UTF-16 code units, which is how the Bot API counts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tera::{Tera, Value};

use tplwatch_core::types::Repository;

use crate::context::{to_tera_context, BaselineCtx, EntryCtx, HeaderCtx};
use crate::error::{io_err, NotifyError};

// ---------------------------------------------------------------------------
// Embedded templates: baked into the binary at compile time via include_str!
// ---------------------------------------------------------------------------

pub const HEADER_TEMPLATE: &str = "notice/header.tera";
pub const ENTRY_TEMPLATE: &str = "notice/entry.tera";
pub const BASELINE_TEMPLATE: &str = "notice/baseline.tera";

const TPLS: &[(&str, &str)] = &[
    (HEADER_TEMPLATE, include_str!("templates/header.tera")),
    (ENTRY_TEMPLATE, include_str!("templates/entry.tera")),
    (BASELINE_TEMPLATE, include_str!("templates/baseline.tera")),
];

const ELLIPSIS: char = '…';

// ---------------------------------------------------------------------------
// Template loading helpers
// ---------------------------------------------------------------------------

fn normalize_template_name(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

fn collect_template_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), NotifyError> {
    let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        let meta = entry.metadata().map_err(|e| io_err(&path, e))?;
        if meta.is_dir() {
            collect_template_files(&path, out)?;
        } else if meta.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

/// Load `.tera` overrides from `dir`, named by their path relative to it
/// (`notice/header.tera` replaces the embedded header).
fn load_user_templates(dir: &Path) -> Result<Vec<(String, String)>, NotifyError> {
    if !dir.exists() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    collect_template_files(dir, &mut files)?;
    let mut templates = Vec::new();
    for path in files {
        if path.extension().and_then(|s| s.to_str()) != Some("tera") {
            continue;
        }
        let rel = path.strip_prefix(dir).unwrap_or(path.as_path());
        let name = normalize_template_name(rel);
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        templates.push((name, contents));
    }
    Ok(templates)
}

fn build_tera(user_template_dir: Option<&Path>) -> Result<Tera, NotifyError> {
    let mut templates: HashMap<String, String> = HashMap::new();
    for (name, content) in TPLS {
        templates.insert((*name).to_string(), (*content).to_string());
    }
    if let Some(dir) = user_template_dir {
        for (name, content) in load_user_templates(dir)? {
            tracing::debug!("template override: {name}");
            templates.insert(name, content);
        }
    }

    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.register_filter("tg_escape", tg_escape_filter);
    let items: Vec<(String, String)> = templates.into_iter().collect();
    tera.add_raw_templates(items)?;
    Ok(tera)
}

fn tg_escape_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = tera::try_get_value!("tg_escape", "value", String, value);
    Ok(Value::String(escape_html(&s)))
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}

/// Message length as the Bot API counts it.
pub fn text_len(text: &str) -> usize {
    text.encode_utf16().count()
}

// ---------------------------------------------------------------------------
// MessageRenderer
// ---------------------------------------------------------------------------

/// Renders notification text and splits it into size-bounded batches.
///
/// Create once with [`MessageRenderer::new`] and reuse across repositories.
pub struct MessageRenderer {
    tera: Tera,
}

impl MessageRenderer {
    /// Embedded templates only.
    pub fn new() -> Result<Self, NotifyError> {
        Self::with_overrides(None)
    }

    /// Embedded templates plus any `.tera` overrides found in `user_template_dir`.
    pub fn with_overrides(user_template_dir: Option<&Path>) -> Result<Self, NotifyError> {
        Ok(MessageRenderer {
            tera: build_tera(user_template_dir)?,
        })
    }

    fn render_part<T: serde::Serialize>(&self, name: &str, ctx: &T) -> Result<String, NotifyError> {
        let rendered = self.tera.render(name, &to_tera_context(ctx)?)?;
        Ok(rendered.replace("\r\n", "\n").trim().to_string())
    }

    /// Header line(s) for a batch, including the blank separator line.
    pub fn header(&self, repo: &Repository, count: usize) -> Result<String, NotifyError> {
        let header = self.render_part(HEADER_TEMPLATE, &HeaderCtx::new(repo, count))?;
        Ok(format!("{header}\n\n"))
    }

    /// One entry line, newline-terminated.
    pub fn entry(&self, ctx: &EntryCtx) -> Result<String, NotifyError> {
        let line = self.render_part(ENTRY_TEMPLATE, ctx)?;
        Ok(format!("{line}\n"))
    }

    /// The "now tracking" acknowledgement sent when a baseline is first recorded.
    pub fn baseline(&self, repo: &Repository, count: usize) -> Result<String, NotifyError> {
        self.render_part(BASELINE_TEMPLATE, &BaselineCtx::new(repo, count))
    }

    /// Render the new-template notice for `items`, split so every message is at
    /// most `limit` characters and starts with the same header.
    ///
    /// Entries are never truncated across messages. An entry too long to fit
    /// next to the header loses its link first, then has its path shortened
    /// from the left.
    pub fn render_batches(
        &self,
        repo: &Repository,
        items: &[String],
        limit: usize,
    ) -> Result<Vec<String>, NotifyError> {
        let header = self.header(repo, items.len())?;
        let header_len = text_len(&header);
        if header_len >= limit {
            return Err(NotifyError::HeaderTooLong {
                len: header_len,
                limit,
            });
        }
        let budget = limit - header_len;

        let mut batches = Vec::new();
        let mut body = String::new();
        let mut body_len = 0;
        for item in items {
            let line = self.entry_within(repo, item, budget, limit)?;
            let line_len = text_len(&line);
            if !body.is_empty() && body_len + line_len > budget {
                batches.push(finish(&header, &body));
                body.clear();
                body_len = 0;
            }
            body.push_str(&line);
            body_len += line_len;
        }
        if !body.is_empty() || batches.is_empty() {
            batches.push(finish(&header, &body));
        }
        Ok(batches)
    }

    fn entry_within(
        &self,
        repo: &Repository,
        path: &str,
        budget: usize,
        limit: usize,
    ) -> Result<String, NotifyError> {
        let ctx = EntryCtx::new(repo, path);
        let line = self.entry(&ctx)?;
        if text_len(&line) <= budget {
            return Ok(line);
        }

        let plain = ctx.unlinked();
        let line = self.entry(&plain)?;
        if text_len(&line) <= budget {
            return Ok(line);
        }

        // Keep the tail: the file name is the most telling part of the path.
        let chars: Vec<char> = path.chars().collect();
        for skip in 1..chars.len() {
            let mut shortened = String::new();
            shortened.push(ELLIPSIS);
            shortened.extend(&chars[skip..]);
            let line = self.entry(&EntryCtx {
                path: shortened,
                link: None,
            })?;
            if text_len(&line) <= budget {
                return Ok(line);
            }
        }
        Err(NotifyError::EntryTooLong {
            path: path.to_string(),
            limit,
        })
    }
}

fn finish(header: &str, body: &str) -> String {
    format!("{header}{body}").trim_end().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
