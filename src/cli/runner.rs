//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{load_config, ConnectorConfig};
use crate::connector::{ODataDataset, RowSource, SharePointListDataset};
use crate::error::{Error, Result};
use crate::limit::RecordsLimit;
use crate::sharepoint::{SharePointClient, SharePointFs};
use futures::StreamExt;
use serde::Serialize;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Read { limit, format } => self.read(&config, *limit, *format).await,
            Commands::EntitySets => self.entity_sets(&config).await,
            Commands::Services => self.services(&config),
            Commands::ListSchema => self.list_schema(&config).await,
            Commands::ListRead { limit } => self.list_read(&config, *limit).await,
            Commands::Browse { path } => {
                let entry = self.file_system(&config)?.browse(path).await?;
                print_pretty(&entry)
            }
            Commands::Stat { path } => {
                let stat = self.file_system(&config)?.stat(path).await?;
                print_pretty(&stat)
            }
            Commands::Enumerate { path, first } => {
                let files = self.file_system(&config)?.enumerate(path, *first).await?;
                for file in &files {
                    print_line(file)?;
                }
                Ok(())
            }
            Commands::Download { path, output } => {
                self.download(&config, path, output.as_deref()).await
            }
        }
    }

    /// Load the configuration file
    fn load_config(&self) -> Result<ConnectorConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Configuration file not specified (use -C flag)"))?;
        load_config(path)
    }

    fn file_system(&self, config: &ConnectorConfig) -> Result<SharePointFs> {
        let sharepoint = config.sharepoint()?;
        let client = SharePointClient::new(sharepoint.clone())?;
        Ok(SharePointFs::new(client, &sharepoint.root))
    }

    async fn read(&self, config: &ConnectorConfig, limit: i64, format: OutputFormat) -> Result<()> {
        let dataset = ODataDataset::connect(config.odata()?).await?;
        let mut rows = dataset.rows(RecordsLimit::new(limit)).await?;

        let mut count = 0u64;
        while let Some(row) = rows.next().await {
            let row = row?;
            match format {
                OutputFormat::Json => print_line(&row)?,
                OutputFormat::Pretty => print_pretty(&row)?,
            }
            count += 1;
        }

        info!("Read {count} rows");
        Ok(())
    }

    async fn entity_sets(&self, config: &ConnectorConfig) -> Result<()> {
        let dataset = ODataDataset::connect(config.odata()?).await?;
        for name in dataset.entity_sets().await? {
            print_line(&json!({"name": name}))?;
        }
        Ok(())
    }

    fn services(&self, config: &ConnectorConfig) -> Result<()> {
        for (node, label) in config.odata()?.service_nodes()? {
            print_line(&json!({"service_node": node, "label": label}))?;
        }
        Ok(())
    }

    async fn list_schema(&self, config: &ConnectorConfig) -> Result<()> {
        let dataset = SharePointListDataset::new(config.sharepoint()?)?;
        print_pretty(&dataset.read_schema().await?)
    }

    async fn list_read(&self, config: &ConnectorConfig, limit: i64) -> Result<()> {
        let dataset = SharePointListDataset::new(config.sharepoint()?)?;
        let mut rows = dataset.rows(RecordsLimit::new(limit)).await?;
        while let Some(row) = rows.next().await {
            print_line(&row?)?;
        }
        Ok(())
    }

    async fn download(&self, config: &ConnectorConfig, path: &str, output: Option<&Path>) -> Result<()> {
        let content = self.file_system(config)?.read(path).await?;
        match output {
            Some(output) => {
                std::fs::write(output, &content)?;
                info!("Wrote {} bytes to {}", content.len(), output.display());
            }
            None => std::io::stdout().write_all(&content)?,
        }
        Ok(())
    }
}

fn print_line<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn print_pretty<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
