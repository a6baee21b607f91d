//! # rawprint
//!
//! Raw job submission to the Windows print spooler.
//!
//! ## Scope
//!
//! This crate handles the spooler side of raw printing:
//! - owning a printer handle and releasing it exactly once
//! - document/page framing and verbatim byte writes
//! - printer driver introspection (dependent files)
//! - printer selection and a one-shot print flow
//!
//! Job content (ESC/POS, PCL, PostScript) is opaque and never inspected.
//!
//! ## Example
//!
//! ```ignore
//! use rawprint::{DocumentInfo, PrinterDefaults, PrinterHandle, WinSpool};
//!
//! let mut printer = PrinterHandle::open(WinSpool, "PRN-A", &PrinterDefaults::default())?;
//! printer.start_document(&DocumentInfo::new("job1"))?;
//! printer.start_page()?;
//! printer.write(&[0x1B, 0x40])?;
//! printer.end_page()?;
//! printer.end_document()?;
//! printer.close();
//! ```

mod driver;
mod error;
mod handle;
mod job;
pub mod multi_sz;
mod printer;
mod spooler;

#[cfg(test)]
mod testing;

#[cfg(windows)]
mod winspool;

// Re-exports
pub use driver::DriverInfo;
pub use error::{PrintError, PrintResult};
pub use handle::PrinterHandle;
pub use job::{AccessMask, DATATYPE_RAW, DEFAULT_DOCUMENT_NAME, DocumentInfo, PrinterDefaults};
pub use printer::{Printer, SpoolPrinter, printer_names, resolve_printer};
pub use spooler::{
    DRIVER_INFO_LEVEL, DriverInfoHeader, ERROR_INSUFFICIENT_BUFFER, ERROR_INVALID_HANDLE,
    ERROR_INVALID_PRINTER_NAME, JobId, PrinterEntry, RawHandle, Spooler,
};

#[cfg(windows)]
pub use winspool::WinSpool;
