//! Error types for the spooler library

use thiserror::Error;

/// Printer error types
///
/// Variants raised by a native call carry the Win32 error code captured
/// right after the failing call.
#[derive(Debug, Error)]
pub enum PrintError {
    /// OpenPrinter failed (unknown printer, access denied, spooler down)
    #[error("Failed to open printer '{printer}' (win32 error {code})")]
    OpenFailed { printer: String, code: u32 },

    #[error("StartDocPrinter failed (win32 error {code})")]
    DocumentStartFailed { code: u32 },

    #[error("EndDocPrinter failed (win32 error {code})")]
    DocumentEndFailed { code: u32 },

    #[error("AbortPrinter failed (win32 error {code})")]
    DocumentAbortFailed { code: u32 },

    #[error("StartPagePrinter failed (win32 error {code})")]
    PageStartFailed { code: u32 },

    #[error("EndPagePrinter failed (win32 error {code})")]
    PageEndFailed { code: u32 },

    /// WritePrinter failed or wrote fewer bytes than requested
    #[error("WritePrinter failed after {written} bytes (win32 error {code})")]
    WriteFailed { code: u32, written: u32 },

    /// Requested write length exceeds the supplied buffer
    #[error("Write length {requested} exceeds buffer length {available}")]
    LengthOutOfBounds { requested: usize, available: usize },

    /// GetPrinterDriver probe or fetch failed
    #[error("GetPrinterDriver failed (win32 error {code})")]
    DriverQueryFailed { code: u32 },

    /// Driver metadata block does not match its declared layout
    #[error("Malformed driver info: {0}")]
    MalformedDriverInfo(String),

    /// Operation on a handle that was never opened or is already released
    #[error("Printer handle is not open")]
    InvalidHandle,

    /// EnumPrinters failed
    #[error("Printer enumeration failed (win32 error {code})")]
    EnumerationFailed { code: u32 },

    #[error("Printer not found: {0}")]
    PrinterNotFound(String),

    #[error("No printers available")]
    NoPrinters,

    /// Blocking print task failed to join
    #[error("Print task failed: {0}")]
    Task(String),
}

impl PrintError {
    /// Native error code carried by this error, if any
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::OpenFailed { code, .. }
            | Self::DocumentStartFailed { code }
            | Self::DocumentEndFailed { code }
            | Self::DocumentAbortFailed { code }
            | Self::PageStartFailed { code }
            | Self::PageEndFailed { code }
            | Self::WriteFailed { code, .. }
            | Self::DriverQueryFailed { code }
            | Self::EnumerationFailed { code } => Some(*code),
            _ => None,
        }
    }
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
