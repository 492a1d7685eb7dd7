//! Command-line interface definitions for News Notes.
//!
//! Every option has a default, so running the binary with no arguments
//! serves the API on port 3003 against a local store and scrapes the
//! HuffPost front page.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::scrapers::huffpost;

/// Command-line arguments for the News Notes application.
///
/// # Examples
///
/// ```sh
/// # Serve the API with defaults
/// news_notes
///
/// # Serve on another port with a custom selector map
/// news_notes --port 8080 --selectors selectors/huffpost.yaml
///
/// # Scrape once, print the report, and exit
/// news_notes scrape
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the HTTP server
    #[arg(short, long, default_value_t = 3003)]
    pub port: u16,

    /// Document store connection string
    #[arg(short, long, default_value = "sqlite://news_notes.db")]
    pub database_url: String,

    /// Page to scrape
    #[arg(short, long, default_value = huffpost::SOURCE_URL)]
    pub source_url: String,

    /// Directory of static files served as-is
    #[arg(long, default_value = "public")]
    pub public_dir: PathBuf,

    /// Optional YAML selector map replacing the built-in HuffPost layout
    #[arg(long)]
    pub selectors: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Scrape the source page once, wait for every write, and print a JSON report
    Scrape,
}

impl Cli {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["news_notes"]);

        assert_eq!(cli.addr(), "0.0.0.0:3003");
        assert_eq!(cli.database_url, "sqlite://news_notes.db");
        assert_eq!(cli.source_url, "https://www.huffpost.com/");
        assert_eq!(cli.public_dir, PathBuf::from("public"));
        assert!(cli.selectors.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "news_notes",
            "-p",
            "8080",
            "-d",
            "sqlite::memory:",
            "-s",
            "https://example.com/",
        ]);

        assert_eq!(cli.port, 8080);
        assert_eq!(cli.database_url, "sqlite::memory:");
        assert_eq!(cli.source_url, "https://example.com/");
    }

    #[test]
    fn test_cli_scrape_subcommand() {
        let cli = Cli::parse_from(["news_notes", "--selectors", "map.yaml", "scrape"]);

        assert_eq!(cli.command, Some(Command::Scrape));
        assert_eq!(cli.selectors, Some(PathBuf::from("map.yaml")));
    }
}
