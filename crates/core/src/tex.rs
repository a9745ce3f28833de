//! Display-math transcoding.
//!
//! Local files use universal `$$`-delimited blocks; the remote platform
//! renders `[tex:...]` embeds instead. Both rewrites are pure and total on
//! strings; matches are non-overlapping and non-greedy up to the first
//! closing delimiter, so nesting never arises.

use std::sync::LazyLock;

use regex::Regex;

static DISPLAY_MATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$\$\n(.*?)\n\$\$").unwrap());

static TEX_EMBED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\[tex:(.*?)\]").unwrap());

/// Rewrite every `$$\n...\n$$` block into a `[tex:...]` embed.
pub fn to_embed_form(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut last = 0;
    for caps in DISPLAY_MATH_RE.captures_iter(body) {
        let whole = caps.get(0).unwrap();
        out.push_str(&body[last..whole.start()]);
        out.push_str("[tex:");
        out.push_str(&caps[1]);
        out.push(']');
        last = whole.end();
    }
    out.push_str(&body[last..]);
    out
}

/// Rewrite every `[tex:...]` embed back into a `$$`-delimited block.
///
/// Embeds with empty or whitespace-only content are left untouched so the
/// inverse pass never produces a degenerate math block.
pub fn to_universal_form(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut last = 0;
    for caps in TEX_EMBED_RE.captures_iter(body) {
        let whole = caps.get(0).unwrap();
        let inner = &caps[1];
        out.push_str(&body[last..whole.start()]);
        if inner.trim().is_empty() {
            out.push_str(whole.as_str());
        } else {
            out.push_str("$$\n");
            out.push_str(inner);
            out.push_str("\n$$");
        }
        last = whole.end();
    }
    out.push_str(&body[last..]);
    out
}
