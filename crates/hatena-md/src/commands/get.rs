use std::path::PathBuf;

use hatena_md_core::entry::output_path;

use crate::cache::UploadCache;
use crate::config::Config;
use crate::images::ImageResolver;
use crate::prelude::{println, *};

/// Options for the get command
#[derive(Debug, clap::Args)]
pub struct GetOptions {
    /// Entry id or edit URL
    pub entry_id: String,

    /// Directory to save the file into, bypassing the date bucketing
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run(options: GetOptions, global: crate::Global) -> Result<()> {
    let config = Config::load(global.config.as_deref())?;
    let client = super::client(&config)?;

    let entry_id = super::extract_entry_id(&options.entry_id);
    let entry = client.get_entry(&entry_id).await?;

    let path = output_path(
        &entry_id,
        &entry.title,
        entry.created.as_deref(),
        &config.default_output_dir,
        options.output.as_deref(),
    );

    let mut cache = UploadCache::load(&config.default_output_dir);
    let resolver = ImageResolver::new(&mut cache);
    let saved = super::save_entry_markdown(&entry, &path, &resolver)?;

    println!("Saved {}", saved.display());
    Ok(())
}
