use std::fs;
use std::path::PathBuf;

use hatena_md_core::entry::prepare_entry;
use hatena_md_core::frontmatter;

use crate::cache::UploadCache;
use crate::config::Config;
use crate::error::Error;
use crate::images::ImageResolver;
use crate::prelude::{println, *};

/// Options for the create command
#[derive(Debug, clap::Args)]
pub struct CreateOptions {
    /// Markdown file to publish
    pub file: PathBuf,

    /// Entry title, overriding the front matter
    #[arg(short, long)]
    pub title: Option<String>,

    /// Comma-separated category list, overriding the front matter
    #[arg(short, long)]
    pub categories: Option<String>,

    /// Create as a draft (or publish with --draft false)
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub draft: Option<bool>,
}

pub async fn run(options: CreateOptions, global: crate::Global) -> Result<()> {
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
    if let Some(id) = &fields.id {
        return Err(eyre!(
            "{} already carries entry id {id}; use `hatena-md update` instead",
            options.file.display()
        ));
    }

    let categories = match &options.categories {
        Some(raw) => super::parse_categories(raw),
        None => fields.categories.clone().unwrap_or_default(),
    };

    let base_dir = super::source_dir(&options.file)?;
    let mut cache = UploadCache::load(&config.default_output_dir);
    let mut resolver = ImageResolver::new(&mut cache);
    let outbound = super::outbound_body(&mut resolver, &client, &split.body, &base_dir).await;

    let id = client
        .create_entry(&fields.title, &outbound, &categories, fields.draft)
        .await?;

    super::write_back_entry_id(&options.file, &fields, &id, &categories, &split.body)?;

    println!("Created entry {id}");
    Ok(())
}
