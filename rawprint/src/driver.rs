//! Printer driver introspection
//!
//! `GetPrinterDriver` cannot report the block size and fill the block in one
//! call, so the query probes with no buffer first, expecting
//! `ERROR_INSUFFICIENT_BUFFER`, then fetches into a block of the reported
//! size. The strings in the level-8 descriptor point back into that block;
//! every pointer is checked against the block bounds before it is read and
//! everything is copied out before the block is dropped.

use std::mem::size_of;

use tracing::{debug, instrument};

use crate::error::{PrintError, PrintResult};
use crate::handle::PrinterHandle;
use crate::multi_sz;
use crate::spooler::{DRIVER_INFO_LEVEL, DriverInfoHeader, SizeProbe, Spooler};

/// Installed driver of a printer (`DRIVER_INFO_8`, owned)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverInfo {
    pub version: u32,
    pub name: Option<String>,
    pub environment: Option<String>,
    pub driver_path: Option<String>,
    pub data_file: Option<String>,
    pub config_file: Option<String>,
    pub help_file: Option<String>,
    /// Additional files the driver needs, in spooler order
    pub dependent_files: Vec<String>,
    pub monitor_name: Option<String>,
    pub default_data_type: Option<String>,
}

impl<S: Spooler> PrinterHandle<S> {
    /// Files the printer's driver depends on beyond its main binaries
    pub fn dependent_files(&self) -> PrintResult<Vec<String>> {
        Ok(self.driver_info()?.dependent_files)
    }

    /// Describe the printer's installed driver
    #[instrument(skip(self), fields(printer = %self.printer()))]
    pub fn driver_info(&self) -> PrintResult<DriverInfo> {
        let block = self.fetch_driver_block()?;
        let info = block.decode()?;
        debug!(
            driver = info.name.as_deref().unwrap_or_default(),
            dependent_files = info.dependent_files.len(),
            "Driver info decoded"
        );
        Ok(info)
    }

    fn fetch_driver_block(&self) -> PrintResult<DriverBlock> {
        let raw = self.live()?;
        let spooler = self.spooler();

        let mut needed = 0u32;
        let ok = spooler.get_printer_driver(raw, DRIVER_INFO_LEVEL, None, &mut needed);
        let size = match SizeProbe::classify(ok, needed, spooler.last_error()) {
            SizeProbe::Needs(size) => size,
            // A probe that succeeds has told us nothing about the size
            SizeProbe::Complete => return Err(PrintError::DriverQueryFailed { code: 0 }),
            SizeProbe::Failed(code) => return Err(PrintError::DriverQueryFailed { code }),
        };

        let mut block = DriverBlock::zeroed(size as usize);
        let ok = spooler.get_printer_driver(
            raw,
            DRIVER_INFO_LEVEL,
            Some(block.bytes_mut()),
            &mut needed,
        );
        self.check(ok, |code| PrintError::DriverQueryFailed { code })?;

        debug!(bytes = block.len(), "Driver block fetched");
        Ok(block)
    }
}

/// Driver metadata block filled by `GetPrinterDriver`
///
/// Freed when dropped, on every path out of the query.
struct DriverBlock {
    buf: Vec<u8>,
}

impl DriverBlock {
    fn zeroed(len: usize) -> Self {
        Self { buf: vec![0; len] }
    }

    fn len(&self) -> usize {
        self.buf.len()
    }

    fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    fn header(&self) -> PrintResult<DriverInfoHeader> {
        if self.buf.len() < size_of::<DriverInfoHeader>() {
            return Err(PrintError::MalformedDriverInfo(format!(
                "block of {} bytes is smaller than the descriptor",
                self.buf.len()
            )));
        }
        // SAFETY: length checked above; the header is plain data and any bit
        // pattern is a valid value for it. Pointers are validated before use.
        Ok(unsafe { std::ptr::read_unaligned(self.buf.as_ptr() as *const DriverInfoHeader) })
    }

    /// Bytes from `ptr` to the end of the block; `None` for a null pointer
    fn tail(&self, ptr: *const u16, field: &str) -> PrintResult<Option<&[u8]>> {
        if ptr.is_null() {
            return Ok(None);
        }

        let base = self.buf.as_ptr() as usize;
        let addr = ptr as usize;
        match addr.checked_sub(base) {
            Some(offset) if offset < self.buf.len() => Ok(Some(&self.buf[offset..])),
            _ => Err(PrintError::MalformedDriverInfo(format!(
                "{field} points outside the driver block"
            ))),
        }
    }

    fn string(&self, ptr: *const u16, field: &str) -> PrintResult<Option<String>> {
        let Some(bytes) = self.tail(ptr, field)? else {
            return Ok(None);
        };

        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
            .take_while(|unit| *unit != 0)
            .collect();
        // take_while stopped early only if it found the NUL
        if units.len() * 2 + 2 > bytes.len() {
            return Err(PrintError::MalformedDriverInfo(format!(
                "{field} is not terminated"
            )));
        }
        Ok(Some(String::from_utf16_lossy(&units)))
    }

    fn decode(&self) -> PrintResult<DriverInfo> {
        let header = self.header()?;

        let dependent_files = match self.tail(header.dependent_files, "dependent files")? {
            Some(bytes) => multi_sz::decode_bytes(bytes)
                .map_err(|e| PrintError::MalformedDriverInfo(format!("dependent files: {e}")))?,
            None => Vec::new(),
        };

        Ok(DriverInfo {
            version: header.version,
            name: self.string(header.name, "driver name")?,
            environment: self.string(header.environment, "environment")?,
            driver_path: self.string(header.driver_path, "driver path")?,
            data_file: self.string(header.data_file, "data file")?,
            config_file: self.string(header.config_file, "config file")?,
            help_file: self.string(header.help_file, "help file")?,
            dependent_files,
            monitor_name: self.string(header.monitor_name, "monitor name")?,
            default_data_type: self.string(header.default_data_type, "default data type")?,
        })
    }
}
