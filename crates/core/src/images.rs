//! Scanning for Markdown image references and Fotolife embed tokens.
//!
//! Pure text scanning only; resolving paths against the file system and
//! talking to the upload endpoint happen in the shell crate.

use std::sync::LazyLock;

use regex::Regex;

/// Literal prefix of a Fotolife embed token, e.g. `[f:id:user:123p:plain]`.
pub const EMBED_TOKEN_PREFIX: &str = "[f:id:";

static LOCAL_IMAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]*)\)").unwrap());

static EMBED_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[f:id:[^\]]+\]").unwrap());

/// One `![alt](path)` reference pointing at a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImageRef {
    pub alt: String,
    pub path: String,
    /// Byte offsets of the whole reference within the scanned body.
    pub start: usize,
    pub end: usize,
}

/// Whether an image path points at a remote URL rather than a local file.
pub fn is_remote_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Find every local image reference in a Markdown body, left to right.
///
/// References with an `http://` or `https://` path are skipped. Matches are
/// non-overlapping by construction (bracket and paren groups are disjoint).
pub fn find_local_image_refs(body: &str) -> Vec<LocalImageRef> {
    LOCAL_IMAGE_RE
        .captures_iter(body)
        .filter_map(|caps| {
            let whole = caps.get(0).unwrap();
            let path = caps[2].trim();
            if is_remote_path(path) {
                return None;
            }
            Some(LocalImageRef {
                alt: caps[1].to_string(),
                path: path.to_string(),
                start: whole.start(),
                end: whole.end(),
            })
        })
        .collect()
}

/// Replace embed tokens using the given lookup, leaving unknown tokens
/// untouched. The lookup receives the full token including brackets.
pub fn replace_embed_tokens<F>(body: &str, mut localize: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    let mut out = String::with_capacity(body.len());
    let mut last = 0;
    for found in EMBED_TOKEN_RE.find_iter(body) {
        out.push_str(&body[last..found.start()]);
        match localize(found.as_str()) {
            Some(replacement) => out.push_str(&replacement),
            None => out.push_str(found.as_str()),
        }
        last = found.end();
    }
    out.push_str(&body[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_local_references_in_order() {
        let body = "a ![one](./img/a.png) b ![two](img/b.png) c";
        let refs = find_local_image_refs(body);
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].alt, "one");
        assert_eq!(refs[0].path, "./img/a.png");
        assert_eq!(&body[refs[0].start..refs[0].end], "![one](./img/a.png)");
        assert_eq!(refs[1].path, "img/b.png");
    }

    #[test]
    fn test_skips_remote_references_case_insensitively() {
        let body = "![a](http://x/y.png) ![b](HTTPS://x/z.png) ![c](local.png)";
        let refs = find_local_image_refs(body);
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].path, "local.png");
    }

    #[test]
    fn test_empty_alt_text_is_allowed() {
        let refs = find_local_image_refs("![](x.png)");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].alt, "");
    }

    #[test]
    fn test_replace_embed_tokens_known_and_unknown() {
        let body = "a [f:id:user:1p:plain] b [f:id:user:2p:plain] c";
        let out = replace_embed_tokens(body, |token| {
            (token == "[f:id:user:1p:plain]").then(|| "![](img/a.png)".to_string())
        });
        assert_eq!(out, "a ![](img/a.png) b [f:id:user:2p:plain] c");
    }

    #[test]
    fn test_replace_embed_tokens_ignores_other_brackets() {
        let body = "[tex:x] [link](y) [f:id:u:3p:plain]";
        let out = replace_embed_tokens(body, |_| Some("T".to_string()));
        assert_eq!(out, "[tex:x] [link](y) T");
    }
}
