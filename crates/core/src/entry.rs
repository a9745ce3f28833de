//! The blog entry document model and output-path derivation.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::frontmatter::FrontMatter;

/// Title used when neither the CLI nor the front matter provides one.
pub const DEFAULT_TITLE: &str = "untitled";

/// Declared content type of a remote entry body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Markdown,
    Html,
}

impl ContentType {
    /// Map the `type` attribute of an Atom `<content>` element.
    pub fn from_mime(mime: &str) -> Self {
        match mime {
            "text/html" | "html" => ContentType::Html,
            _ => ContentType::Markdown,
        }
    }
}

/// One blog entry as fetched from the remote service.
///
/// An entry without an `id` has not been published yet; the id is assigned
/// by the remote side on first creation and is immutable afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub id: Option<String>,
    pub title: String,
    pub body: String,
    pub content_type: ContentType,
    pub draft: bool,
    /// Order preserved, duplicates allowed.
    pub categories: Vec<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub edit_url: Option<String>,
}

/// The slice of entry data returned by the collection feed.
#[derive(Debug, Clone, Serialize)]
pub struct EntrySummary {
    pub id: String,
    pub title: String,
    pub updated: Option<String>,
    pub draft: bool,
    pub categories: Vec<String>,
    pub edit_url: Option<String>,
}

/// Outbound entry fields assembled from a local file plus CLI overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryFields {
    pub title: String,
    pub id: Option<String>,
    pub draft: bool,
    /// `None` when the front matter had no category list at all; this is
    /// distinct from an explicitly empty list.
    pub categories: Option<Vec<String>>,
}

/// Merge front matter with explicit CLI overrides into outbound fields.
///
/// The explicit title and draft override the stored values; the id is
/// always copied through from the front matter.
pub fn prepare_entry(
    front: Option<&FrontMatter>,
    explicit_title: Option<&str>,
    explicit_draft: Option<bool>,
) -> EntryFields {
    let title = explicit_title
        .map(str::to_string)
        .or_else(|| front.and_then(|f| f.title.clone()))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    let draft = explicit_draft.unwrap_or_else(|| front.map(FrontMatter::draft).unwrap_or(false));

    EntryFields {
        title,
        id: front.and_then(|f| f.id.clone()),
        draft,
        categories: front.and_then(|f| f.categories.clone()),
    }
}

static SLUG_STRIP_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SLUG_COLLAPSE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-\s]+").unwrap());

/// Derive a filesystem-safe slug from an entry title.
///
/// Lowercases the title, strips everything that is not a word character,
/// whitespace or hyphen, and collapses whitespace/hyphen runs into single
/// hyphens. May return an empty string.
pub fn slugify(title: &str) -> String {
    let stripped = SLUG_STRIP_RE.replace_all(title, "");
    let trimmed = stripped.trim().to_lowercase();
    SLUG_COLLAPSE_RE.replace_all(&trimmed, "-").into_owned()
}

/// Derive the output file path for an entry.
///
/// A parsable `created` timestamp buckets the file into `base/YYYYMMDD/`;
/// an explicit output directory overrides the bucketing entirely. When the
/// slug reduces to nothing the entry id is used as the file name.
pub fn output_path(
    id: &str,
    title: &str,
    created: Option<&str>,
    base_dir: &Path,
    explicit_dir: Option<&Path>,
) -> PathBuf {
    let dir = match explicit_dir {
        Some(dir) => dir.to_path_buf(),
        None => match created.and_then(|c| DateTime::parse_from_rfc3339(c).ok()) {
            Some(dt) => base_dir.join(dt.format("%Y%m%d").to_string()),
            None => base_dir.to_path_buf(),
        },
    };

    let slug = slugify(title);
    let mut file_name = if slug.is_empty() { id.to_string() } else { slug };
    if !file_name.ends_with(".md") {
        file_name.push_str(".md");
    }

    dir.join(file_name)
}

/// Render an RFC 3339 timestamp for human-readable output, passing the
/// input through unchanged when it does not parse.
pub fn format_datetime(raw: &str) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => raw.to_string(),
    }
}
