use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::prelude::{println, *};

/// Credentials consumed by the remote transport. Opaque strings; nothing
/// is validated here beyond presence.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub hatena_id: String,
    pub blog_id: String,
    pub api_key: String,
}

/// On-disk configuration, stored as JSON in the platform config directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hatena_id: String,
    pub blog_id: String,
    pub api_key: String,
    pub default_output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hatena_id: String::new(),
            blog_id: String::new(),
            api_key: String::new(),
            default_output_dir: PathBuf::from("posts"),
        }
    }
}

impl Config {
    /// Resolve the configuration file path, honoring the global override.
    pub fn path(override_path: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = override_path {
            return Ok(path.to_path_buf());
        }
        let dir = dirs_next::config_dir()
            .ok_or_else(|| eyre!("Unable to determine config directory"))?
            .join("hatena-md");
        Ok(dir.join("config.json"))
    }

    /// Load the configuration. A missing or unreadable file is non-fatal
    /// and degrades to the defaults.
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        Ok(Self::load_from(&Self::path(override_path)?))
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("ignoring unreadable config {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist the configuration, readable by the owning user only.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, format!("{json}\n"))
            .map_err(|e| eyre!("Failed to write config file: {}", e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))
                .map_err(|e| eyre!("Failed to set config permissions: {}", e))?;
        }

        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        !self.hatena_id.is_empty() && !self.blog_id.is_empty() && !self.api_key.is_empty()
    }

    /// Fail with guidance when the required credentials are missing.
    pub fn ensure_configured(&self) -> Result<(), Error> {
        if self.is_configured() {
            Ok(())
        } else {
            Err(Error::NotConfigured)
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            hatena_id: self.hatena_id.clone(),
            blog_id: self.blog_id.clone(),
            api_key: self.api_key.clone(),
        }
    }

    /// Interactive setup; empty input keeps the current value.
    pub fn wizard(&mut self) -> Result<()> {
        println!("hatena-md setup wizard");
        println!("----------------------");
        println!("Enter the Hatena Blog AtomPub credentials.");

        self.hatena_id = prompt("Hatena ID", &self.hatena_id)?;
        self.blog_id = prompt("Blog ID", &self.blog_id)?;
        self.api_key = prompt("API key", &self.api_key)?;
        let output_dir = prompt(
            "Default output directory",
            &self.default_output_dir.to_string_lossy(),
        )?;
        self.default_output_dir = PathBuf::from(output_dir);

        Ok(())
    }
}

fn prompt(label: &str, current: &str) -> Result<String> {
    print!("{label} [{current}]: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let line = line.trim();

    Ok(if line.is_empty() {
        current.to_string()
    } else {
        line.to_string()
    })
}

/// Options for the config command
#[derive(Debug, clap::Args)]
pub struct ConfigOptions {
    /// Print the current configuration
    #[arg(long)]
    pub show: bool,

    /// Run the interactive setup wizard
    #[arg(long)]
    pub wizard: bool,
}

pub fn run(options: ConfigOptions, global: crate::Global) -> Result<()> {
    let path = Config::path(global.config.as_deref())?;
    let mut config = Config::load_from(&path);

    if options.show {
        println!("Configuration file: {}", path.display());
        println!("Hatena ID: {}", config.hatena_id);
        println!("Blog ID: {}", config.blog_id);
        println!(
            "API key: {}",
            if config.api_key.is_empty() { "" } else { "********" }
        );
        println!(
            "Default output directory: {}",
            config.default_output_dir.display()
        );
        return Ok(());
    }

    if options.wizard || !config.is_configured() {
        if !config.is_configured() {
            println!("Required settings are missing; starting the setup wizard.");
        }
        config.wizard()?;
        config.save(&path)?;
        println!("Saved configuration to {}", path.display());
        return Ok(());
    }

    println!("Usage: hatena-md config [--show] [--wizard]");
    Ok(())
}
