//! YAML front-matter handling for local Markdown files.
//!
//! A front-matter block is a YAML document delimited by `---` marker lines,
//! anchored at the very start of the file. Only the fields that round-trip
//! to the remote side are modeled; unknown keys are ignored, and a header
//! that fails to parse degrades the whole file to a headerless body.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::Visitor;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Marker line delimiting the front-matter block.
pub const MARKER: &str = "---";

static FRONT_MATTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A---\s*\n(.*?)\n---\s*\n").unwrap());

/// The persisted header of a local Markdown file.
///
/// A strict subset of the entry document model: these four fields are the
/// only ones that survive a round trip through the file header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<DraftFlag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl FrontMatter {
    /// Normalized draft value; absent defaults to `false`.
    pub fn draft(&self) -> bool {
        self.draft.map(DraftFlag::as_bool).unwrap_or(false)
    }
}

/// Draft marker as found in hand-edited headers.
///
/// Serializes as a plain boolean but accepts the whole zoo of scalar
/// spellings on the way in: `true`/`yes`/`on`/`y`/`1` (case-insensitive)
/// are truthy, any other string is false, integers are truthy when nonzero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DraftFlag(pub bool);

impl DraftFlag {
    pub fn as_bool(self) -> bool {
        self.0
    }
}

/// Normalize a string token to a draft boolean.
pub fn truthy(token: &str) -> bool {
    matches!(
        token.to_lowercase().as_str(),
        "true" | "yes" | "on" | "y" | "1"
    )
}

impl Serialize for DraftFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(self.0)
    }
}

impl<'de> Deserialize<'de> for DraftFlag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DraftVisitor;

        impl<'de> Visitor<'de> for DraftVisitor {
            type Value = DraftFlag;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a boolean or a truthy/falsy scalar")
            }

            fn visit_bool<E>(self, value: bool) -> Result<DraftFlag, E> {
                Ok(DraftFlag(value))
            }

            fn visit_i64<E>(self, value: i64) -> Result<DraftFlag, E> {
                Ok(DraftFlag(value != 0))
            }

            fn visit_u64<E>(self, value: u64) -> Result<DraftFlag, E> {
                Ok(DraftFlag(value != 0))
            }

            fn visit_str<E>(self, value: &str) -> Result<DraftFlag, E> {
                Ok(DraftFlag(truthy(value)))
            }
        }

        deserializer.deserialize_any(DraftVisitor)
    }
}

/// Result of splitting a file into header and body.
#[derive(Debug)]
pub struct Split {
    pub front: Option<FrontMatter>,
    pub body: String,
    /// Set when a header block was present but did not parse. The file is
    /// still usable as a plain body; the caller decides how to surface this.
    pub warning: Option<String>,
}

/// Split a Markdown file into its front matter and body.
///
/// When no header block is found, or the block fails to parse, the whole
/// input is returned as the body.
pub fn split(content: &str) -> Split {
    let Some(caps) = FRONT_MATTER_RE.captures(content) else {
        return Split {
            front: None,
            body: content.to_string(),
            warning: None,
        };
    };

    let whole = caps.get(0).unwrap();
    match serde_yaml::from_str::<FrontMatter>(&caps[1]) {
        Ok(front) => Split {
            front: Some(front),
            body: content[whole.end()..].to_string(),
            warning: None,
        },
        Err(e) => Split {
            front: None,
            body: content.to_string(),
            warning: Some(format!("front matter ignored: {e}")),
        },
    }
}

/// Compose a Markdown file from front matter and body.
///
/// Emits the opening marker, the YAML header, the closing marker, a blank
/// line, and the body verbatim. Non-ASCII content is written as-is.
pub fn compose(front: &FrontMatter, body: &str) -> Result<String, Error> {
    let yaml = serde_yaml::to_string(front).map_err(|e| Error::FrontMatter(e.to_string()))?;
    Ok(format!("{MARKER}\n{yaml}{MARKER}\n\n{body}"))
}
