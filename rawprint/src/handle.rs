//! Owned printer handle and raw job framing
//!
//! A raw job is framed as
//!
//! ```text
//! open ─ start_document ─┬─ start_page ─ write* ─ end_page ─┬─ end_document ─ close
//!                        └──────────── (repeat) ────────────┘
//! ```
//!
//! The handle does not track which session is open. Out-of-order calls are
//! passed to the spooler and come back as whatever error it reports, and
//! closing with a document still open is left to the spooler as well.

use tracing::{debug, instrument, warn};

use crate::error::{PrintError, PrintResult};
use crate::job::{DocumentInfo, PrinterDefaults};
use crate::spooler::{
    ERROR_INVALID_HANDLE, ERROR_INVALID_PRINTER_NAME, JobId, RawHandle, Spooler,
};

/// An open printer handle
///
/// Owns exactly one native handle and closes it once, either through
/// [`PrinterHandle::close`] or on drop. After closing every operation fails
/// with [`PrintError::InvalidHandle`].
pub struct PrinterHandle<S: Spooler> {
    spooler: S,
    raw: RawHandle,
    printer: String,
}

impl<S: Spooler> PrinterHandle<S> {
    /// Open a printer by name
    ///
    /// An empty name opens the default printer.
    #[instrument(skip(spooler, defaults), fields(access = defaults.desired_access.0))]
    pub fn open(spooler: S, name: &str, defaults: &PrinterDefaults) -> PrintResult<Self> {
        let printer = if name.is_empty() {
            spooler
                .default_printer()
                .ok_or_else(|| PrintError::OpenFailed {
                    printer: String::new(),
                    code: ERROR_INVALID_PRINTER_NAME,
                })?
        } else {
            name.to_string()
        };

        let raw = match spooler.open_printer(&printer, defaults) {
            Some(raw) if !raw.is_null() => raw,
            _ => {
                // A null handle reported as success leaves no error code behind
                let code = match spooler.last_error() {
                    0 => ERROR_INVALID_HANDLE,
                    code => code,
                };
                return Err(PrintError::OpenFailed { printer, code });
            }
        };

        debug!(printer = %printer, "Printer opened");
        Ok(Self {
            spooler,
            raw,
            printer,
        })
    }

    /// Name of the printer this handle was opened for
    pub fn printer(&self) -> &str {
        &self.printer
    }

    /// Whether the handle is still open
    pub fn is_valid(&self) -> bool {
        !self.raw.is_null()
    }

    pub(crate) fn spooler(&self) -> &S {
        &self.spooler
    }

    pub(crate) fn live(&self) -> PrintResult<RawHandle> {
        if self.raw.is_null() {
            return Err(PrintError::InvalidHandle);
        }
        Ok(self.raw)
    }

    /// Map a native boolean outcome to a result, capturing the last error on failure
    pub(crate) fn check(
        &self,
        ok: bool,
        err: impl FnOnce(u32) -> PrintError,
    ) -> PrintResult<()> {
        if ok {
            return Ok(());
        }
        Err(err(self.spooler.last_error()))
    }

    /// Start a document (print job) on this printer
    pub fn start_document(&mut self, doc: &DocumentInfo) -> PrintResult<JobId> {
        let raw = self.live()?;
        let job = self.spooler.start_doc(raw, doc);
        self.check(job != 0, |code| PrintError::DocumentStartFailed { code })?;
        debug!(printer = %self.printer, job, doc = %doc.name, "Document started");
        Ok(JobId(job))
    }

    pub fn end_document(&mut self) -> PrintResult<()> {
        let raw = self.live()?;
        let ok = self.spooler.end_doc(raw);
        self.check(ok, |code| PrintError::DocumentEndFailed { code })?;
        debug!(printer = %self.printer, "Document ended");
        Ok(())
    }

    /// Cancel the open document; the spooler discards what was written
    pub fn abort_document(&mut self) -> PrintResult<()> {
        let raw = self.live()?;
        let ok = self.spooler.abort_doc(raw);
        self.check(ok, |code| PrintError::DocumentAbortFailed { code })?;
        debug!(printer = %self.printer, "Document aborted");
        Ok(())
    }

    pub fn start_page(&mut self) -> PrintResult<()> {
        let raw = self.live()?;
        let ok = self.spooler.start_page(raw);
        self.check(ok, |code| PrintError::PageStartFailed { code })
    }

    pub fn end_page(&mut self) -> PrintResult<()> {
        let raw = self.live()?;
        let ok = self.spooler.end_page(raw);
        self.check(ok, |code| PrintError::PageEndFailed { code })
    }

    /// Write the whole buffer into the open page
    pub fn write(&mut self, data: &[u8]) -> PrintResult<()> {
        self.write_exact(data, data.len())
    }

    /// Write the first `len` bytes of `data` into the open page
    ///
    /// Bytes go to the spooler verbatim. A short write is an error; nothing is
    /// retried or resumed.
    pub fn write_exact(&mut self, data: &[u8], len: usize) -> PrintResult<()> {
        let raw = self.live()?;
        if len > data.len() {
            return Err(PrintError::LengthOutOfBounds {
                requested: len,
                available: data.len(),
            });
        }
        // WritePrinter takes a DWORD count
        let Ok(requested) = u32::try_from(len) else {
            return Err(PrintError::LengthOutOfBounds {
                requested: len,
                available: u32::MAX as usize,
            });
        };

        let mut written = 0u32;
        let ok = self.spooler.write(raw, &data[..len], &mut written);
        self.check(ok, |code| PrintError::WriteFailed { code, written })?;
        if written != requested {
            warn!(printer = %self.printer, requested, written, "Incomplete write");
            return Err(PrintError::WriteFailed { code: 0, written });
        }

        debug!(printer = %self.printer, bytes = written, "Data written");
        Ok(())
    }

    /// Close the native handle
    ///
    /// Safe to call repeatedly: only the first call reaches the spooler. Open
    /// sessions are not ended first. A failed release is logged and reported
    /// as `false`, never raised, so this is usable from drop.
    pub fn close(&mut self) -> bool {
        if self.raw.is_null() {
            return true;
        }

        let raw = std::mem::replace(&mut self.raw, RawHandle::NULL);
        if self.spooler.close_printer(raw) {
            debug!(printer = %self.printer, "Printer closed");
            return true;
        }

        let code = self.spooler.last_error();
        warn!(printer = %self.printer, code, "ClosePrinter failed, handle released anyway");
        false
    }
}

impl<S: Spooler> Drop for PrinterHandle<S> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<S: Spooler> std::fmt::Debug for PrinterHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrinterHandle")
            .field("printer", &self.printer)
            .field("raw", &self.raw)
            .finish()
    }
}
