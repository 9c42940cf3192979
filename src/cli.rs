use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "pdfsplice")]
#[command(about = "Extract page ranges from PDFs and merge PDFs, with MCP server support")]
#[command(version)]
pub struct Cli {
    /// TOML config file
    #[arg(short, long, global = true, env = "PDFSPLICE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory uploads are staged in while a request runs
    #[arg(long, global = true, env = "PDFSPLICE_UPLOAD_DIR")]
    pub upload_dir: Option<PathBuf>,

    /// Directory finished documents are written to
    #[arg(long, global = true, env = "PDFSPLICE_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Largest accepted input file, in bytes
    #[arg(long, global = true, env = "PDFSPLICE_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<u64>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// The config file (if any) with command-line overrides applied.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(dir) = &self.upload_dir {
            config.upload_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(max) = self.max_upload_bytes {
            config.max_upload_bytes = max;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// Extract page ranges to a new PDF
    #[command(alias = "cat")]
    Extract {
        /// PDF file to extract from
        path: PathBuf,

        /// Pages to keep (e.g., "1-3,5 7-9"); order and duplicates don't matter
        pages: String,
    },

    /// Combine multiple PDFs into one
    Merge {
        /// PDF files to merge, in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}
