//! Command line and environment configuration

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rawprint::{AccessMask, DocumentInfo, PrinterDefaults};

#[derive(Debug, Parser)]
#[command(name = "rawprint", version, about = "Send raw jobs to the Windows print spooler")]
pub struct Cli {
    /// Log level, overridden by RUST_LOG
    #[arg(long, env = "RAWPRINT_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "RAWPRINT_LOG_JSON", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List printers, skipping virtual ones (PDF, XPS, OneNote, FILE:)
    List,

    /// Send a file to a printer as one raw job
    Send(SendArgs),

    /// Show the dependent files of a printer's driver
    DriverFiles {
        /// Printer name; defaults to the system default printer
        #[arg(long, env = "RAWPRINT_PRINTER")]
        printer: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct SendArgs {
    /// File whose bytes are sent verbatim
    pub file: PathBuf,

    /// Printer name; defaults to the system default printer
    #[arg(long, env = "RAWPRINT_PRINTER")]
    pub printer: Option<String>,

    /// Job name shown in the queue; defaults to the file name
    #[arg(long, env = "RAWPRINT_JOB_NAME")]
    pub job_name: Option<String>,

    /// Spooler data type
    #[arg(long, env = "RAWPRINT_DATA_TYPE")]
    pub data_type: Option<String>,

    /// Let the spooler write the job to this file instead of the port
    #[arg(long)]
    pub output_file: Option<String>,

    /// JSON document descriptor; flags override its fields
    #[arg(long, env = "RAWPRINT_DOCUMENT")]
    pub document: Option<PathBuf>,
}

impl SendArgs {
    /// Build the document descriptor for this job
    pub fn document_info(&self) -> anyhow::Result<DocumentInfo> {
        let mut doc = match &self.document {
            Some(path) => load_document(path)?,
            None => DocumentInfo {
                name: file_job_name(&self.file),
                ..DocumentInfo::default()
            },
        };

        if let Some(name) = &self.job_name {
            doc.name = name.clone();
        }
        if let Some(data_type) = &self.data_type {
            doc.data_type = Some(data_type.clone());
        }
        if let Some(output) = &self.output_file {
            doc.output_file = Some(output.clone());
        }
        Ok(doc)
    }

    /// Open the printer for use, with the job's data type
    pub fn printer_defaults(&self, doc: &DocumentInfo) -> PrinterDefaults {
        let defaults = PrinterDefaults::default().with_access(AccessMask::USE);
        match &doc.data_type {
            Some(data_type) => defaults.with_data_type(data_type.clone()),
            None => defaults,
        }
    }
}

fn file_job_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| rawprint::DEFAULT_DOCUMENT_NAME.to_string())
}

fn load_document(path: &Path) -> anyhow::Result<DocumentInfo> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading document descriptor {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("parsing document descriptor {}", path.display()))
}
