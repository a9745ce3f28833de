#![allow(unused)]

use crate::prelude::*;
use clap::Parser;
use std::path::PathBuf;

mod api;
mod cache;
mod commands;
mod config;
mod error;
mod images;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Manage Hatena Blog entries as local Markdown files"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Path to the configuration file
    #[clap(long, env = "HATENA_MD_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "HATENA_MD_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Show or edit the API credentials and defaults
    Config(config::ConfigOptions),

    /// List blog entries
    List(commands::list::ListOptions),

    /// Fetch one entry and save it as a Markdown file
    Get(commands::get::GetOptions),

    /// Fetch every entry on the blog
    Getall(commands::getall::GetallOptions),

    /// Create a new entry from a Markdown file
    Create(commands::create::CreateOptions),

    /// Update an existing entry from a Markdown file
    Update(commands::update::UpdateOptions),

    /// Draft management
    Drafts(commands::drafts::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Config(options) => config::run(options, app.global),
        SubCommands::List(options) => commands::list::run(options, app.global).await,
        SubCommands::Get(options) => commands::get::run(options, app.global).await,
        SubCommands::Getall(options) => commands::getall::run(options, app.global).await,
        SubCommands::Create(options) => commands::create::run(options, app.global).await,
        SubCommands::Update(options) => commands::update::run(options, app.global).await,
        SubCommands::Drafts(sub_app) => commands::drafts::run(sub_app, app.global).await,
    }
}
