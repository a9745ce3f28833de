use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use hatena_md_core::entry::{ContentType, Entry, EntryFields};
use hatena_md_core::frontmatter::{self, DraftFlag, FrontMatter};
use hatena_md_core::tex;

use crate::api::HatenaClient;
use crate::config::Config;
use crate::images::{ImageResolver, ImageUploader};
use crate::prelude::*;

pub mod create;
pub mod drafts;
pub mod get;
pub mod getall;
pub mod list;
pub mod update;

/// Build an authenticated client, failing with setup guidance when the
/// credentials are missing.
pub fn client(config: &Config) -> Result<HatenaClient> {
    config.ensure_configured()?;
    Ok(HatenaClient::new(config.credentials())?)
}

/// Accept either a bare entry id or an edit URL ending in the id.
pub fn extract_entry_id(input: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    match trimmed.rsplit('/').next() {
        Some(tail) if !tail.is_empty() => tail.to_string(),
        _ => trimmed.to_string(),
    }
}

/// Directory holding a source Markdown file, as an absolute path.
///
/// Upload-cache keys are derived from it, so invocations from different
/// working directories must agree on the spelling.
pub fn source_dir(file: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(file)
        .wrap_err_with(|| f!("Failed to resolve {}", file.display()))?;
    Ok(absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(absolute))
}

/// Assemble the outbound entry body: substitute local image references
/// with embed tokens, then rewrite display math into its embed form.
pub async fn outbound_body<U: ImageUploader>(
    resolver: &mut ImageResolver<'_>,
    uploader: &U,
    body: &str,
    base_dir: &Path,
) -> String {
    let body = resolver.upload_and_replace(uploader, body, base_dir).await;
    tex::to_embed_form(&body)
}

/// Record an assigned entry id in a local file, keeping the author's body
/// untouched. Tokens only ever go into the outbound payload.
pub fn write_back_entry_id(
    file: &Path,
    fields: &EntryFields,
    entry_id: &str,
    categories: &[String],
    body: &str,
) -> Result<()> {
    let front = FrontMatter {
        title: Some(fields.title.clone()),
        id: Some(entry_id.to_string()),
        draft: Some(DraftFlag(fields.draft)),
        categories: (!categories.is_empty()).then(|| categories.to_vec()),
    };
    let content = frontmatter::compose(&front, body)?;
    fs::write(file, content).wrap_err_with(|| f!("Failed to write {}", file.display()))?;
    Ok(())
}

/// Split a comma-separated category list, dropping empty fragments.
pub fn parse_categories(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Write a fetched entry to `output_path` as a front-mattered Markdown
/// file. HTML bodies are converted to Markdown, embed tokens are localized
/// and display math is rewritten into its universal form.
pub fn save_entry_markdown(
    entry: &Entry,
    output_path: &Path,
    resolver: &ImageResolver,
) -> Result<PathBuf> {
    let id = entry.id.clone().ok_or_else(|| {
        hatena_md_core::Error::IncompleteEntry("entry has no id; cannot save it".to_string())
    })?;

    let body = match entry.content_type {
        ContentType::Html => html2md::parse_html(&entry.body),
        ContentType::Markdown => entry.body.clone(),
    };
    let body = resolver.localize_references(&body, output_path);
    let body = tex::to_universal_form(&body);

    let front = FrontMatter {
        title: Some(entry.title.clone()),
        id: Some(id),
        draft: Some(DraftFlag(entry.draft)),
        categories: (!entry.categories.is_empty()).then(|| entry.categories.clone()),
    };
    let content = frontmatter::compose(&front, &body)?;

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .wrap_err_with(|| f!("Failed to create {}", parent.display()))?;
    }
    fs::write(output_path, content)
        .wrap_err_with(|| f!("Failed to write {}", output_path.display()))?;

    Ok(output_path.to_path_buf())
}

/// Ask a yes/no question on stdin; anything but an explicit yes is a no.
pub fn confirm(message: &str) -> Result<bool> {
    print!("{message} [y/N]: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let line = line.trim();
    Ok(line.eq_ignore_ascii_case("y") || line.eq_ignore_ascii_case("yes"))
}
