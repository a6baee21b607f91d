//! Printer selection and the raw print flow
//!
//! Built on [`PrinterHandle`]:
//! - printer enumeration and name resolution
//! - one-shot raw jobs (`SpoolPrinter::print_sync`)
//! - the async [`Printer`] adapter

use tracing::{info, instrument, warn};

use crate::driver::DriverInfo;
use crate::error::{PrintError, PrintResult};
use crate::handle::PrinterHandle;
use crate::job::{DocumentInfo, PrinterDefaults};
use crate::spooler::{JobId, Spooler};

/// Trait for printer adapters
#[allow(async_fn_in_trait)]
pub trait Printer {
    /// Send raw data to the printer as one job
    async fn print(&self, data: &[u8]) -> PrintResult<()>;

    /// Check if the printer can be reached
    async fn is_online(&self) -> bool;
}

/// Check if a port is a virtual printer port
fn is_virtual_port(port: &str) -> bool {
    let p = port.to_lowercase();
    p == "file:"
        || p == "portprompt:"
        || p == "xpsport:"
        || p.starts_with("onenote")
        || p == "nul:"
        || p.starts_with("wfsport:")
}

/// List available printers (filters out virtual printers)
pub fn printer_names<S: Spooler>(spooler: &S) -> PrintResult<Vec<String>> {
    let entries = spooler
        .enum_printers()
        .ok_or_else(|| PrintError::EnumerationFailed {
            code: spooler.last_error(),
        })?;

    Ok(entries
        .into_iter()
        .filter(|entry| !is_virtual_port(&entry.port))
        .map(|entry| entry.name)
        .collect())
}

/// Resolve a printer name - returns the name if valid, or default/first available
pub fn resolve_printer<S: Spooler>(spooler: &S, name: Option<&str>) -> PrintResult<String> {
    if let Some(name) = name {
        let printers = printer_names(spooler)?;
        if printers.iter().any(|p| p == name) {
            return Ok(name.to_string());
        }
        return Err(PrintError::PrinterNotFound(name.to_string()));
    }

    if let Some(default) = spooler.default_printer() {
        return Ok(default);
    }

    printer_names(spooler)?
        .into_iter()
        .next()
        .ok_or(PrintError::NoPrinters)
}

/// A named spooler printer
///
/// Each job opens its own handle and releases it before returning.
#[derive(Debug, Clone)]
pub struct SpoolPrinter<S> {
    spooler: S,
    name: String,
    defaults: PrinterDefaults,
    document: DocumentInfo,
}

impl<S: Spooler> SpoolPrinter<S> {
    /// Create a printer with a specific name
    pub fn new(spooler: S, name: &str) -> Self {
        Self {
            spooler,
            name: name.to_string(),
            defaults: PrinterDefaults::default(),
            document: DocumentInfo::default(),
        }
    }

    /// Resolve the printer (explicit, default, then first listed) and wrap it
    pub fn resolve(spooler: S, name: Option<&str>) -> PrintResult<Self> {
        let name = resolve_printer(&spooler, name)?;
        Ok(Self::new(spooler, &name))
    }

    pub fn with_defaults(mut self, defaults: PrinterDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn with_document(mut self, document: DocumentInfo) -> Self {
        self.document = document;
        self
    }

    /// Get the printer name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn document(&self) -> &DocumentInfo {
        &self.document
    }

    fn open(&self) -> PrintResult<PrinterHandle<&S>> {
        PrinterHandle::open(&self.spooler, &self.name, &self.defaults)
    }

    /// Send raw data as a single-page job and wait for the spooler to take it
    ///
    /// After a failure inside the document the open page and document are
    /// ended on a best-effort basis; the first error is the one returned.
    #[instrument(skip(self, data), fields(printer = %self.name, data_len = data.len()))]
    pub fn print_sync(&self, data: &[u8]) -> PrintResult<JobId> {
        let mut handle = self.open()?;
        let job = handle.start_document(&self.document)?;

        if let Err(e) = handle.start_page() {
            finish_best_effort(&mut handle, false);
            return Err(e);
        }
        if let Err(e) = handle.write(data) {
            finish_best_effort(&mut handle, true);
            return Err(e);
        }
        if let Err(e) = handle.end_page() {
            finish_best_effort(&mut handle, false);
            return Err(e);
        }
        handle.end_document()?;
        handle.close();

        info!(job = job.0, "Print job sent successfully");
        Ok(job)
    }

    /// Dependent files of this printer's driver
    pub fn dependent_files(&self) -> PrintResult<Vec<String>> {
        self.open()?.dependent_files()
    }

    pub fn driver_info(&self) -> PrintResult<DriverInfo> {
        self.open()?.driver_info()
    }
}

fn finish_best_effort<S: Spooler>(handle: &mut PrinterHandle<S>, page_open: bool) {
    if page_open && let Err(e) = handle.end_page() {
        warn!(error = %e, "Failed to end page after error");
    }
    if let Err(e) = handle.end_document() {
        warn!(error = %e, "Failed to end document after error");
    }
}

impl<S> Printer for SpoolPrinter<S>
where
    S: Spooler + Clone + Send + 'static,
{
    async fn print(&self, data: &[u8]) -> PrintResult<()> {
        // Spooler calls block, run the whole job on the blocking pool
        let printer = self.clone();
        let data = data.to_vec();

        tokio::task::spawn_blocking(move || printer.print_sync(&data).map(|_| ()))
            .await
            .map_err(|e| PrintError::Task(format!("Task join failed: {}", e)))?
    }

    async fn is_online(&self) -> bool {
        let printer = self.clone();
        tokio::task::spawn_blocking(move || printer.open().is_ok())
            .await
            .unwrap_or(false)
    }
}
