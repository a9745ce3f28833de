use crate::config::Config;
use crate::prelude::{println, *};

use super::list::{format_entry_list, OutputFormat};

#[derive(Debug, clap::Parser)]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Parser)]
pub enum Commands {
    /// List draft entries
    List(ListOptions),

    /// Publish a draft entry
    Publish(PublishOptions),
}

/// Options for the drafts list command
#[derive(Debug, clap::Args)]
pub struct ListOptions {
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Options for the drafts publish command
#[derive(Debug, clap::Args)]
pub struct PublishOptions {
    /// Entry id or edit URL
    pub entry_id: String,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    match app.command {
        Commands::List(options) => list(options, global).await,
        Commands::Publish(options) => publish(options, global).await,
    }
}

async fn list(options: ListOptions, global: crate::Global) -> Result<()> {
    let config = Config::load(global.config.as_deref())?;
    let client = super::client(&config)?;

    let mut entries = client.list_entries(None).await?;
    entries.retain(|e| e.draft);

    println!("{}", format_entry_list(&entries, options.format)?);
    Ok(())
}

async fn publish(options: PublishOptions, global: crate::Global) -> Result<()> {
    let config = Config::load(global.config.as_deref())?;
    let client = super::client(&config)?;

    let entry_id = super::extract_entry_id(&options.entry_id);
    let entry = client.get_entry(&entry_id).await?;

    if !entry.draft {
        return Err(eyre!("Entry {entry_id} is already published"));
    }

    println!("Title: {}", entry.title);
    if !super::confirm("Publish this entry?")? {
        println!("Aborted.");
        return Ok(());
    }

    client
        .update_entry(
            &entry_id,
            &entry.title,
            &entry.body,
            &entry.categories,
            false,
        )
        .await?;

    println!("Published entry {entry_id}");
    Ok(())
}
