//! winspool-backed [`Spooler`]

use core::ffi::c_void;

use windows::Win32::Foundation::GetLastError;
use windows::Win32::Graphics::Printing::{
    AbortPrinter, ClosePrinter, DOC_INFO_1W, EndDocPrinter, EndPagePrinter, EnumPrintersW,
    GetDefaultPrinterW, GetPrinterDriverW, OpenPrinterW, PRINTER_ACCESS_RIGHTS,
    PRINTER_DEFAULTSW, PRINTER_ENUM_CONNECTIONS, PRINTER_ENUM_LOCAL, PRINTER_HANDLE,
    PRINTER_INFO_5W, StartDocPrinterW, StartPagePrinter, WritePrinter,
};
use windows::core::{PCWSTR, PWSTR};

use crate::job::{DocumentInfo, PrinterDefaults};
use crate::spooler::{PrinterEntry, RawHandle, SizeProbe, Spooler};

/// The local print spooler
#[derive(Debug, Clone, Copy, Default)]
pub struct WinSpool;

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Keeps an optional wide string alive while a PWSTR borrows it
fn to_wide_opt(s: Option<&str>) -> Option<Vec<u16>> {
    s.map(to_wide)
}

fn as_pwstr(wide: &Option<Vec<u16>>) -> PWSTR {
    match wide {
        Some(w) => PWSTR(w.as_ptr() as *mut _),
        None => PWSTR::null(),
    }
}

fn native(handle: RawHandle) -> PRINTER_HANDLE {
    PRINTER_HANDLE {
        Value: handle.0 as *mut c_void,
    }
}

fn read_pwstr(s: PWSTR) -> String {
    if s.is_null() {
        return String::new();
    }
    // SAFETY: non-null strings in spooler output blocks are NUL-terminated
    unsafe { s.to_string().unwrap_or_default() }
}

impl Spooler for WinSpool {
    fn open_printer(&self, name: &str, defaults: &PrinterDefaults) -> Option<RawHandle> {
        let name_w = to_wide(name);
        let datatype_w = to_wide_opt(defaults.data_type.as_deref());
        let pd = PRINTER_DEFAULTSW {
            pDatatype: as_pwstr(&datatype_w),
            DesiredAccess: PRINTER_ACCESS_RIGHTS(defaults.desired_access.0),
            ..Default::default()
        };

        let mut handle = PRINTER_HANDLE::default();
        unsafe {
            OpenPrinterW(
                PCWSTR::from_raw(name_w.as_ptr()),
                &mut handle,
                Some(&pd as *const PRINTER_DEFAULTSW),
            )
            .ok()?;
        }
        Some(RawHandle(handle.Value as usize))
    }

    fn close_printer(&self, handle: RawHandle) -> bool {
        unsafe { ClosePrinter(native(handle)).is_ok() }
    }

    fn start_doc(&self, handle: RawHandle, doc: &DocumentInfo) -> u32 {
        let doc_name_w = to_wide(&doc.name);
        let output_w = to_wide_opt(doc.output_file.as_deref());
        let datatype_w = to_wide_opt(doc.data_type.as_deref());
        let doc_info = DOC_INFO_1W {
            pDocName: PWSTR(doc_name_w.as_ptr() as *mut _),
            pOutputFile: as_pwstr(&output_w),
            pDatatype: as_pwstr(&datatype_w),
        };

        unsafe { StartDocPrinterW(native(handle), 1, &doc_info as *const DOC_INFO_1W) }
    }

    fn end_doc(&self, handle: RawHandle) -> bool {
        unsafe { EndDocPrinter(native(handle)).as_bool() }
    }

    fn abort_doc(&self, handle: RawHandle) -> bool {
        unsafe { AbortPrinter(native(handle)).as_bool() }
    }

    fn start_page(&self, handle: RawHandle) -> bool {
        unsafe { StartPagePrinter(native(handle)).as_bool() }
    }

    fn end_page(&self, handle: RawHandle) -> bool {
        unsafe { EndPagePrinter(native(handle)).as_bool() }
    }

    fn write(&self, handle: RawHandle, data: &[u8], written: &mut u32) -> bool {
        unsafe {
            WritePrinter(
                native(handle),
                data.as_ptr() as *const c_void,
                data.len() as u32,
                written,
            )
            .as_bool()
        }
    }

    fn get_printer_driver(
        &self,
        handle: RawHandle,
        level: u32,
        buf: Option<&mut [u8]>,
        needed: &mut u32,
    ) -> bool {
        unsafe { GetPrinterDriverW(native(handle), PCWSTR::null(), level, buf, needed).is_ok() }
    }

    fn last_error(&self) -> u32 {
        unsafe { GetLastError().0 }
    }

    fn default_printer(&self) -> Option<String> {
        unsafe {
            let mut needed: u32 = 0;
            let _ = GetDefaultPrinterW(None, &mut needed);
            if needed == 0 {
                return None;
            }

            let mut buf: Vec<u16> = vec![0; needed as usize];
            if !GetDefaultPrinterW(Some(PWSTR(buf.as_mut_ptr())), &mut needed).as_bool() {
                return None;
            }

            PWSTR(buf.as_mut_ptr()).to_string().ok()
        }
    }

    fn enum_printers(&self) -> Option<Vec<PrinterEntry>> {
        unsafe {
            let flags = PRINTER_ENUM_LOCAL | PRINTER_ENUM_CONNECTIONS;
            let mut needed: u32 = 0;
            let mut returned: u32 = 0;

            let ok = EnumPrintersW(flags, None, 5, None, &mut needed, &mut returned).is_ok();
            match SizeProbe::classify(ok, needed, GetLastError().0) {
                SizeProbe::Needs(_) => {}
                SizeProbe::Complete => return Some(Vec::new()),
                // Error code stays in the thread's last error for the caller
                SizeProbe::Failed(_) => return None,
            }

            let mut buf: Vec<u8> = vec![0; needed as usize];
            EnumPrintersW(
                flags,
                None,
                5,
                Some(buf.as_mut_slice()),
                &mut needed,
                &mut returned,
            )
            .ok()?;

            let infos = std::slice::from_raw_parts(
                buf.as_ptr() as *const PRINTER_INFO_5W,
                returned as usize,
            );
            let entries = infos
                .iter()
                .filter(|info| !info.pPrinterName.is_null())
                .map(|info| PrinterEntry {
                    name: read_pwstr(info.pPrinterName),
                    port: read_pwstr(info.pPortName),
                })
                .collect();
            Some(entries)
        }
    }
}
