use std::fs;
use std::path::PathBuf;

use hatena_md_core::entry::prepare_entry;
use hatena_md_core::frontmatter;

use crate::cache::UploadCache;
use crate::config::Config;
use crate::error::Error;
use crate::images::ImageResolver;
use crate::prelude::{println, *};

/// Options for the update command
#[derive(Debug, clap::Args)]
pub struct UpdateOptions {
    /// Markdown file holding the new content
    pub file: PathBuf,

    /// Entry id or edit URL; defaults to the id stored in the front matter
    pub entry_id: Option<String>,

    /// Entry title, overriding the front matter
    #[arg(short, long)]
    pub title: Option<String>,

    /// Comma-separated category list, overriding the front matter
    #[arg(short, long)]
    pub categories: Option<String>,

    /// Mark as a draft (or publish with --draft false)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub draft: Option<bool>,
}

pub async fn run(options: UpdateOptions, global: crate::Global) -> Result<()> {
    let config = Config::load(global.config.as_deref())?;
    let client = super::client(&config)?;

    if !options.file.is_file() {
        return Err(Error::FileNotFound(options.file.display().to_string()).into());
    }
    let content = fs::read_to_string(&options.file)
        .wrap_err_with(|| f!("Failed to read {}", options.file.display()))?;

    let split = frontmatter::split(&content);
    if let Some(warning) = &split.warning {
        log::warn!("{}: {warning}", options.file.display());
    }

    let fields = prepare_entry(split.front.as_ref(), options.title.as_deref(), options.draft);
    let entry_id = options
        .entry_id
        .as_deref()
        .map(super::extract_entry_id)
        .or_else(|| fields.id.clone())
        .ok_or_else(|| {
            eyre!(
                "{} carries no entry id; pass one explicitly or create the entry first",
                options.file.display()
            )
        })?;

    let categories = match &options.categories {
        Some(raw) => super::parse_categories(raw),
        None => fields.categories.clone().unwrap_or_default(),
    };

    let base_dir = super::source_dir(&options.file)?;
    let mut cache = UploadCache::load(&config.default_output_dir);
    let mut resolver = ImageResolver::new(&mut cache);
    let outbound = super::outbound_body(&mut resolver, &client, &split.body, &base_dir).await;

    client
        .update_entry(&entry_id, &fields.title, &outbound, &categories, fields.draft)
        .await?;

    // When the id came from the command line, store it so the next update
    // can omit it.
    if fields.id.is_none() {
        super::write_back_entry_id(&options.file, &fields, &entry_id, &categories, &split.body)?;
    }

    println!("Updated entry {entry_id}");
    Ok(())
}
