use std::path::PathBuf;

use hatena_md_core::entry::output_path;

use crate::cache::UploadCache;
use crate::config::Config;
use crate::images::ImageResolver;
use crate::prelude::{eprintln, println, *};

/// Options for the getall command
#[derive(Debug, clap::Args)]
pub struct GetallOptions {
    /// Directory to save every file into, bypassing the date bucketing
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

pub async fn run(options: GetallOptions, global: crate::Global) -> Result<()> {
    let config = Config::load(global.config.as_deref())?;
    let client = super::client(&config)?;

    let summaries = client.list_entries(None).await?;
    let total = summaries.len();

    let mut cache = UploadCache::load(&config.default_output_dir);
    let resolver = ImageResolver::new(&mut cache);

    // One bad entry must not abort the rest of the download.
    let mut saved = 0;
    for summary in summaries {
        let result = async {
            let entry = client.get_entry(&summary.id).await?;
            let path = output_path(
                &summary.id,
                &entry.title,
                entry.created.as_deref(),
                &config.default_output_dir,
                options.output_dir.as_deref(),
            );
            super::save_entry_markdown(&entry, &path, &resolver)
        }
        .await;

        match result {
            Ok(path) => {
                saved += 1;
                if global.verbose {
                    println!("Saved {}", path.display());
                }
            }
            Err(e) => eprintln!("Skipping entry {}: {e}", summary.id),
        }
    }

    println!("Saved {saved} of {total} entries.");
    Ok(())
}
