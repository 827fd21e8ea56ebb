//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// SAP OData and SharePoint connectors CLI
#[derive(Parser, Debug)]
#[command(name = "odata-connectors")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read rows of the configured OData entity set
    Read {
        /// Maximum rows to read (0 or negative = unlimited)
        #[arg(long, default_value = "-1", allow_hyphen_values = true)]
        limit: i64,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },

    /// List entity sets of the configured OData service
    EntitySets,

    /// List service nodes of the configured preset
    Services,

    /// Show the schema of the configured SharePoint list
    ListSchema,

    /// Read rows of the configured SharePoint list
    ListRead {
        /// Maximum rows to read (0 or negative = unlimited)
        #[arg(long, default_value = "-1", allow_hyphen_values = true)]
        limit: i64,
    },

    /// Browse a document library path
    Browse {
        /// Path relative to the library root
        #[arg(default_value = "/")]
        path: String,
    },

    /// Show metadata of a document library path
    Stat {
        /// Path relative to the library root
        path: String,
    },

    /// List every file below a document library path
    Enumerate {
        /// Path relative to the library root
        #[arg(default_value = "/")]
        path: String,

        /// Stop at the first file found
        #[arg(long)]
        first: bool,
    },

    /// Download a file from the document library
    Download {
        /// Path relative to the library root
        path: String,

        /// Local destination (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one row per line)
    Json,
    /// Human-readable output
    Pretty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read() {
        let cli = Cli::parse_from([
            "odata-connectors",
            "-C",
            "config.yaml",
            "read",
            "--limit",
            "10",
            "--format",
            "pretty",
        ]);

        assert_eq!(cli.config, Some(PathBuf::from("config.yaml")));
        match cli.command {
            Commands::Read { limit, format } => {
                assert_eq!(limit, 10);
                assert_eq!(format, OutputFormat::Pretty);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::parse_from(["odata-connectors", "list-read", "--verbose"]);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::ListRead { limit: -1 }));

        let cli = Cli::parse_from(["odata-connectors", "browse"]);
        assert!(matches!(cli.command, Commands::Browse { path } if path == "/"));
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
