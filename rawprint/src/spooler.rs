//! Native spooler surface
//!
//! [`Spooler`] mirrors the winspool calls the printer handle needs, in their
//! native shape: a call reports success as a boolean (or a non-zero value)
//! and the failure detail is read afterwards from [`Spooler::last_error`].
//! Turning that into typed errors is the job of the handle, not of the
//! implementations.

use crate::job::{DocumentInfo, PrinterDefaults};

/// `ERROR_INVALID_HANDLE`
pub const ERROR_INVALID_HANDLE: u32 = 6;
/// `ERROR_INSUFFICIENT_BUFFER`
pub const ERROR_INSUFFICIENT_BUFFER: u32 = 122;
/// `ERROR_INVALID_PRINTER_NAME`
pub const ERROR_INVALID_PRINTER_NAME: u32 = 1801;

/// Driver info level that carries the dependent-files list
pub const DRIVER_INFO_LEVEL: u32 = 8;

/// Opaque native printer handle
///
/// Zero is the "no handle" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(pub usize);

impl RawHandle {
    pub const NULL: RawHandle = RawHandle(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Spooler job identifier returned by StartDocPrinter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(pub u32);

/// A printer queue as reported by enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterEntry {
    pub name: String,
    pub port: String,
}

/// Outcome of the size probe that opens a two-call spooler query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SizeProbe {
    /// The call succeeded without a buffer
    Complete,
    /// The spooler wants a buffer of this many bytes
    Needs(u32),
    /// Any other failure, including a zero size alongside the expected code
    Failed(u32),
}

impl SizeProbe {
    pub(crate) fn classify(ok: bool, needed: u32, code: u32) -> Self {
        if ok {
            return SizeProbe::Complete;
        }
        if code == ERROR_INSUFFICIENT_BUFFER && needed > 0 {
            SizeProbe::Needs(needed)
        } else {
            SizeProbe::Failed(code)
        }
    }
}

/// Leading fields of `DRIVER_INFO_8W`
///
/// The string fields point into the same block the descriptor was written
/// to, or are null.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DriverInfoHeader {
    pub version: u32,
    pub name: *const u16,
    pub environment: *const u16,
    pub driver_path: *const u16,
    pub data_file: *const u16,
    pub config_file: *const u16,
    pub help_file: *const u16,
    pub dependent_files: *const u16,
    pub monitor_name: *const u16,
    pub default_data_type: *const u16,
}

/// Blocking winspool operations
///
/// Handles passed in are always ones this spooler returned from
/// [`Spooler::open_printer`] and that have not been closed yet.
pub trait Spooler {
    /// OpenPrinter; `None` on failure
    fn open_printer(&self, name: &str, defaults: &PrinterDefaults) -> Option<RawHandle>;

    /// ClosePrinter
    fn close_printer(&self, handle: RawHandle) -> bool;

    /// StartDocPrinter (level 1); returns the job id, zero on failure
    fn start_doc(&self, handle: RawHandle, doc: &DocumentInfo) -> u32;

    /// EndDocPrinter
    fn end_doc(&self, handle: RawHandle) -> bool;

    /// AbortPrinter
    fn abort_doc(&self, handle: RawHandle) -> bool;

    /// StartPagePrinter
    fn start_page(&self, handle: RawHandle) -> bool;

    /// EndPagePrinter
    fn end_page(&self, handle: RawHandle) -> bool;

    /// WritePrinter; `written` receives the byte count the spooler accepted
    fn write(&self, handle: RawHandle, data: &[u8], written: &mut u32) -> bool;

    /// GetPrinterDriver for the current environment
    ///
    /// With `buf == None` this is a size probe; `needed` receives the
    /// required size in bytes either way.
    fn get_printer_driver(
        &self,
        handle: RawHandle,
        level: u32,
        buf: Option<&mut [u8]>,
        needed: &mut u32,
    ) -> bool;

    /// Error code of the last failed call on this thread
    fn last_error(&self) -> u32;

    /// Name of the user's default printer, if one is set
    fn default_printer(&self) -> Option<String>;

    /// Local and connected printers; `None` on failure
    fn enum_printers(&self) -> Option<Vec<PrinterEntry>>;
}

impl<S: Spooler + ?Sized> Spooler for &S {
    fn open_printer(&self, name: &str, defaults: &PrinterDefaults) -> Option<RawHandle> {
        (**self).open_printer(name, defaults)
    }

    fn close_printer(&self, handle: RawHandle) -> bool {
        (**self).close_printer(handle)
    }

    fn start_doc(&self, handle: RawHandle, doc: &DocumentInfo) -> u32 {
        (**self).start_doc(handle, doc)
    }

    fn end_doc(&self, handle: RawHandle) -> bool {
        (**self).end_doc(handle)
    }

    fn abort_doc(&self, handle: RawHandle) -> bool {
        (**self).abort_doc(handle)
    }

    fn start_page(&self, handle: RawHandle) -> bool {
        (**self).start_page(handle)
    }

    fn end_page(&self, handle: RawHandle) -> bool {
        (**self).end_page(handle)
    }

    fn write(&self, handle: RawHandle, data: &[u8], written: &mut u32) -> bool {
        (**self).write(handle, data, written)
    }

    fn get_printer_driver(
        &self,
        handle: RawHandle,
        level: u32,
        buf: Option<&mut [u8]>,
        needed: &mut u32,
    ) -> bool {
        (**self).get_printer_driver(handle, level, buf, needed)
    }

    fn last_error(&self) -> u32 {
        (**self).last_error()
    }

    fn default_printer(&self) -> Option<String> {
        (**self).default_printer()
    }

    fn enum_printers(&self) -> Option<Vec<PrinterEntry>> {
        (**self).enum_printers()
    }
}
