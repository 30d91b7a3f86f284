//! Prebuilt JSON bundle adapter.
//!
//! Stands in for the opaque static index artifact: a `bundle.json` file
//! holding an array of `{url, title, content}` documents, produced ahead of
//! time by whatever built the site. Ranking here is deliberately simple
//! (term-hit counts, titles weighted); the overlay treats whatever order
//! comes back as authoritative.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{IndexMatch, ResultItem, SearchIndex};

/// Words of context kept on each side of the first matched word.
const EXCERPT_BEFORE: usize = 8;
const EXCERPT_AFTER: usize = 24;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("bundle not readable at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("bundle is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleDoc {
    pub url: String,
    pub title: String,
    pub content: String,
}

/// Disk-backed [`SearchIndex`]. Nothing is touched until `init()` runs.
pub struct BundleIndex {
    path: PathBuf,
    docs: OnceCell<Arc<Vec<BundleDoc>>>,
}

impl BundleIndex {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            docs: OnceCell::new(),
        }
    }
}

#[async_trait]
impl SearchIndex for BundleIndex {
    async fn init(&self) -> Result<()> {
        if self.docs.get().is_some() {
            return Ok(());
        }
        let raw = tokio::fs::read(&self.path).await.map_err(|e| BundleError::Read {
            path: self.path.clone(),
            source: e,
        })?;
        let docs: Vec<BundleDoc> = serde_json::from_slice(&raw).map_err(BundleError::Parse)?;
        tracing::info!(path = %self.path.display(), docs = docs.len(), "bundle loaded");
        let _ = self.docs.set(Arc::new(docs));
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Option<Vec<Box<dyn IndexMatch>>>> {
        let docs = self
            .docs
            .get()
            .ok_or_else(|| anyhow::anyhow!("bundle index used before init"))?
            .clone();
        let terms = Arc::new(tokenize(query));
        if terms.is_empty() {
            return Ok(Some(Vec::new()));
        }

        let mut scored: Vec<(usize, usize)> = docs
            .iter()
            .enumerate()
            .filter_map(|(idx, doc)| {
                let score: usize = terms
                    .iter()
                    .map(|t| count_ci(&doc.title, t) * 3 + count_ci(&doc.content, t))
                    .sum();
                (score > 0).then_some((idx, score))
            })
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let matches = scored
            .into_iter()
            .map(|(idx, _)| {
                Box::new(BundleMatch {
                    id: docs[idx].url.clone(),
                    docs: docs.clone(),
                    idx,
                    terms: terms.clone(),
                }) as Box<dyn IndexMatch>
            })
            .collect();
        Ok(Some(matches))
    }
}

struct BundleMatch {
    id: String,
    docs: Arc<Vec<BundleDoc>>,
    idx: usize,
    terms: Arc<Vec<String>>,
}

#[async_trait]
impl IndexMatch for BundleMatch {
    fn id(&self) -> &str {
        &self.id
    }

    async fn data(&self) -> Result<ResultItem> {
        let doc = &self.docs[self.idx];
        Ok(ResultItem {
            url: doc.url.clone(),
            title: doc.title.clone(),
            excerpt: excerpt(&doc.content, &self.terms),
        })
    }
}

fn tokenize(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Byte offset of the next case-insensitive occurrence of `needle` in
/// `haystack` at or after `from`. ASCII-insensitive only; non-ASCII terms
/// match exactly.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    if needle.is_empty() || haystack.len() < from + needle.len() {
        return None;
    }
    let hay = haystack.as_bytes();
    let nee = needle.as_bytes();
    let mut i = from;
    while i + nee.len() <= hay.len() {
        if !haystack.is_char_boundary(i) {
            i += 1;
            continue;
        }
        if haystack.is_char_boundary(i + nee.len()) && hay[i..i + nee.len()].eq_ignore_ascii_case(nee)
        {
            return Some(i);
        }
        i += 1;
    }
    None
}

fn count_ci(haystack: &str, needle: &str) -> usize {
    let mut n = 0;
    let mut at = 0;
    while let Some(pos) = find_ci(haystack, needle, at) {
        n += 1;
        at = pos + needle.len();
    }
    n
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape `text` and wrap every term occurrence in `<mark>` tags.
pub fn highlight(text: &str, terms: &[String]) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut at = 0;
    loop {
        let next = terms
            .iter()
            .filter_map(|t| find_ci(text, t, at).map(|pos| (pos, t.len())))
            .min();
        match next {
            Some((pos, len)) => {
                out.push_str(&escape_html(&text[at..pos]));
                out.push_str("<mark>");
                out.push_str(&escape_html(&text[pos..pos + len]));
                out.push_str("</mark>");
                at = pos + len;
            }
            None => {
                out.push_str(&escape_html(&text[at..]));
                return out;
            }
        }
    }
}

/// Window of words around the first matched term, highlighted and escaped.
fn excerpt(content: &str, terms: &[String]) -> String {
    let words: Vec<&str> = content.split_whitespace().collect();
    let hit = words
        .iter()
        .position(|w| terms.iter().any(|t| find_ci(w, t, 0).is_some()))
        .unwrap_or(0);
    let start = hit.saturating_sub(EXCERPT_BEFORE);
    let end = (hit + EXCERPT_AFTER).min(words.len());
    let mut window = words[start..end].join(" ");
    if start > 0 {
        window.insert_str(0, "… ");
    }
    if end < words.len() {
        window.push_str(" …");
    }
    highlight(&window, terms)
}

/// Write a small sample bundle so the app is runnable out of the box.
pub fn write_demo_bundle(path: &Path) -> Result<()> {
    let docs = vec![
        BundleDoc {
            url: "/posts/hello-world/".into(),
            title: "Hello, world".into(),
            content: "First post on the new site. Built with a static generator, \
                      deployed as plain files, searched with a prebuilt index."
                .into(),
        },
        BundleDoc {
            url: "/posts/learning-rust/".into(),
            title: "Learning Rust".into(),
            content: "Notes from learning Rust: ownership, borrowing, and why the \
                      compiler is the best teacher. Rust makes invalid states \
                      unrepresentable."
                .into(),
        },
        BundleDoc {
            url: "/posts/terminal-tools/".into(),
            title: "Terminal tools I like".into(),
            content: "A tour of terminal tools: multiplexers, fuzzy finders, and \
                      pagers. Rust shows up a lot in this space."
                .into(),
        },
    ];
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_vec_pretty(&docs)?)?;
    Ok(())
}
