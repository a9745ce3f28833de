use clap::ValueEnum;
use prettytable::row;

use hatena_md_core::entry::{format_datetime, EntrySummary};

use crate::config::Config;
use crate::prelude::{println, *};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

/// Options for the list command
#[derive(Debug, clap::Args)]
pub struct ListOptions {
    /// Maximum number of entries to show
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Show only draft entries
    #[arg(long)]
    pub draft: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

pub async fn run(options: ListOptions, global: crate::Global) -> Result<()> {
    let config = Config::load(global.config.as_deref())?;
    let client = super::client(&config)?;

    // The draft filter is applied locally, so fetch everything first and
    // trim afterwards.
    let fetch_limit = if options.draft { None } else { options.limit };
    let mut entries = client.list_entries(fetch_limit).await?;
    if options.draft {
        entries.retain(|e| e.draft);
        if let Some(limit) = options.limit {
            entries.truncate(limit);
        }
    }

    println!("{}", format_entry_list(&entries, options.format)?);
    Ok(())
}

/// Render a collection of entry summaries in the requested format.
pub fn format_entry_list(entries: &[EntrySummary], format: OutputFormat) -> Result<String> {
    if entries.is_empty() {
        return Ok("No entries found.".to_string());
    }

    match format {
        OutputFormat::Text => {
            let mut table = new_table();
            table.add_row(row!["ID", "TITLE", "UPDATED", "DRAFT", "CATEGORIES"]);
            for entry in entries {
                table.add_row(row![
                    entry.id,
                    entry.title,
                    entry
                        .updated
                        .as_deref()
                        .map(format_datetime)
                        .unwrap_or_default(),
                    if entry.draft { "yes" } else { "no" },
                    entry.categories.join(", "),
                ]);
            }
            Ok(table.to_string().trim_end().to_string())
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(entries)?),
        OutputFormat::Csv => {
            let mut out = String::from("id,title,updated,draft,categories\n");
            for entry in entries {
                out.push_str(&f!(
                    "{},{},{},{},{}\n",
                    csv_field(&entry.id),
                    csv_field(&entry.title),
                    csv_field(entry.updated.as_deref().unwrap_or_default()),
                    entry.draft,
                    csv_field(&entry.categories.join(", ")),
                ));
            }
            Ok(out.trim_end().to_string())
        }
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        f!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: &str, title: &str, draft: bool) -> EntrySummary {
        EntrySummary {
            id: id.to_string(),
            title: title.to_string(),
            updated: Some("2024-03-05T12:34:56+09:00".to_string()),
            draft,
            categories: vec!["tech".to_string()],
            edit_url: None,
        }
    }

    #[test]
    fn test_empty_list_has_friendly_message() {
        let out = format_entry_list(&[], OutputFormat::Text).unwrap();
        assert_eq!(out, "No entries found.");
    }

    #[test]
    fn test_text_format_includes_header_and_rows() {
        let out = format_entry_list(&[summary("42", "Hello", true)], OutputFormat::Text).unwrap();
        assert!(out.contains("ID"));
        assert!(out.contains("Hello"));
        assert!(out.contains("2024-03-05 12:34:56"));
        assert!(out.contains("yes"));
    }

    #[test]
    fn test_json_format_is_parseable() {
        let out = format_entry_list(&[summary("42", "Hello", false)], OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["id"], "42");
        assert_eq!(parsed[0]["draft"], false);
    }

    #[test]
    fn test_csv_format_quotes_embedded_commas() {
        let out =
            format_entry_list(&[summary("42", "a, b", false)], OutputFormat::Csv).unwrap();
        assert!(out.starts_with("id,title,updated,draft,categories\n"));
        assert!(out.contains("\"a, b\""));
    }

    #[test]
    fn test_csv_field_escapes_quotes() {
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("plain"), "plain");
    }
}
