//! In-memory spooler for tests

use std::collections::{HashMap, HashSet};
use std::mem::size_of;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::job::{DocumentInfo, PrinterDefaults};
use crate::multi_sz::encode_multi_sz;
use crate::spooler::{
    DRIVER_INFO_LEVEL, DriverInfoHeader, ERROR_INSUFFICIENT_BUFFER, ERROR_INVALID_HANDLE,
    ERROR_INVALID_PRINTER_NAME, PrinterEntry, RawHandle, Spooler,
};

pub const ERROR_INVALID_LEVEL: u32 = 124;
pub const ERROR_UNKNOWN_PRINTER_DRIVER: u32 = 1797;
pub const ERROR_INVALID_PRINTER_STATE: u32 = 1906;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Open,
    Close,
    StartDoc,
    EndDoc,
    AbortDoc,
    StartPage,
    EndPage,
    Write,
    DriverProbe,
    DriverFetch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(String),
    Close(RawHandle),
    StartDoc(DocumentInfo),
    EndDoc,
    AbortDoc,
    StartPage,
    EndPage,
    Write(Vec<u8>),
    DriverProbe,
    DriverFetch,
}

impl Call {
    fn op(&self) -> Op {
        match self {
            Call::Open(_) => Op::Open,
            Call::Close(_) => Op::Close,
            Call::StartDoc(_) => Op::StartDoc,
            Call::EndDoc => Op::EndDoc,
            Call::AbortDoc => Op::AbortDoc,
            Call::StartPage => Op::StartPage,
            Call::EndPage => Op::EndPage,
            Call::Write(_) => Op::Write,
            Call::DriverProbe => Op::DriverProbe,
            Call::DriverFetch => Op::DriverFetch,
        }
    }
}

/// Installed driver as the fake lays it out in a level-8 block
#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    pub version: u32,
    pub name: Option<String>,
    pub environment: Option<String>,
    pub driver_path: Option<String>,
    pub data_file: Option<String>,
    pub config_file: Option<String>,
    pub help_file: Option<String>,
    pub monitor_name: Option<String>,
    pub default_data_type: Option<String>,
    /// `None` leaves the dependent-files pointer null
    pub dependent_files: Option<Vec<String>>,
}

impl FakeDriver {
    pub fn generic(dependent_files: &[&str]) -> Self {
        Self {
            version: 3,
            name: Some("Generic / Text Only".to_string()),
            environment: Some("Windows x64".to_string()),
            driver_path: Some("C:\\drivers\\unidrv.dll".to_string()),
            data_file: Some("C:\\drivers\\TTY.GPD".to_string()),
            config_file: Some("C:\\drivers\\unidrvui.dll".to_string()),
            help_file: Some("C:\\drivers\\unidrv.hlp".to_string()),
            monitor_name: None,
            default_data_type: Some("RAW".to_string()),
            dependent_files: Some(dependent_files.iter().map(|s| s.to_string()).collect()),
        }
    }
}

/// Ways the fake can break the driver block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corruption {
    /// Dependent-files pointer aims past the end of the block
    PointerOutside,
    /// Final terminator of the dependent-files list is cut off
    Unterminated,
    /// Block reported smaller than the descriptor itself
    Truncated,
}

#[derive(Default)]
struct State {
    printers: Vec<PrinterEntry>,
    default_printer: Option<String>,
    enum_fails: bool,
    failures: HashMap<Op, u32>,
    short_write: Option<u32>,
    probe_succeeds: bool,
    probe_reports_zero: bool,
    open_returns_null: bool,
    driver: Option<FakeDriver>,
    corruption: Option<Corruption>,
    next_handle: usize,
    next_job: u32,
    open: HashSet<RawHandle>,
    docs: HashSet<RawHandle>,
    pages: HashSet<RawHandle>,
    calls: Vec<Call>,
    last_error: u32,
}

impl State {
    fn fail(&mut self, op: Op) -> bool {
        match self.failures.get(&op) {
            Some(code) => {
                self.last_error = *code;
                true
            }
            None => false,
        }
    }

    fn reject(&mut self, code: u32) -> bool {
        self.last_error = code;
        false
    }
}

#[derive(Clone, Default)]
pub struct FakeSpooler {
    state: Arc<Mutex<State>>,
}

impl FakeSpooler {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn with_printer(self, name: &str, port: &str) -> Self {
        self.state().printers.push(PrinterEntry {
            name: name.to_string(),
            port: port.to_string(),
        });
        self
    }

    pub fn with_default(self, name: &str) -> Self {
        self.state().default_printer = Some(name.to_string());
        self
    }

    pub fn with_driver(self, driver: FakeDriver) -> Self {
        self.state().driver = Some(driver);
        self
    }

    pub fn fail(self, op: Op, code: u32) -> Self {
        self.state().failures.insert(op, code);
        self
    }

    pub fn fail_enumeration(self) -> Self {
        self.state().enum_fails = true;
        self
    }

    pub fn short_write(self, accepted: u32) -> Self {
        self.state().short_write = Some(accepted);
        self
    }

    pub fn probe_succeeds(self) -> Self {
        self.state().probe_succeeds = true;
        self
    }

    /// Probe fails with `ERROR_INSUFFICIENT_BUFFER` but reports no size
    pub fn probe_reports_zero(self) -> Self {
        self.state().probe_reports_zero = true;
        self
    }

    /// OpenPrinter reports success with a null handle and no error code
    pub fn open_returns_null(self) -> Self {
        self.state().open_returns_null = true;
        self
    }

    pub fn corrupt(self, corruption: Corruption) -> Self {
        self.state().corruption = Some(corruption);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn count(&self, op: Op) -> usize {
        self.state().calls.iter().filter(|c| c.op() == op).count()
    }

    pub fn open_handles(&self) -> usize {
        self.state().open.len()
    }

    pub fn open_documents(&self) -> usize {
        self.state().docs.len()
    }

    /// Bytes accepted by all writes, in order
    pub fn written(&self) -> Vec<u8> {
        self.state()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Write(data) => Some(data.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

impl Spooler for FakeSpooler {
    fn open_printer(&self, name: &str, _defaults: &PrinterDefaults) -> Option<RawHandle> {
        let mut state = self.state();
        state.calls.push(Call::Open(name.to_string()));
        if state.fail(Op::Open) {
            return None;
        }
        if state.open_returns_null {
            state.last_error = 0;
            return Some(RawHandle::NULL);
        }
        if !state.printers.iter().any(|p| p.name == name) {
            state.reject(ERROR_INVALID_PRINTER_NAME);
            return None;
        }

        state.next_handle += 1;
        let handle = RawHandle(0x1000 + state.next_handle);
        state.open.insert(handle);
        Some(handle)
    }

    fn close_printer(&self, handle: RawHandle) -> bool {
        let mut state = self.state();
        state.calls.push(Call::Close(handle));
        if !state.open.remove(&handle) {
            return state.reject(ERROR_INVALID_HANDLE);
        }
        state.docs.remove(&handle);
        state.pages.remove(&handle);
        !state.fail(Op::Close)
    }

    fn start_doc(&self, handle: RawHandle, doc: &DocumentInfo) -> u32 {
        let mut state = self.state();
        state.calls.push(Call::StartDoc(doc.clone()));
        if !state.open.contains(&handle) {
            state.reject(ERROR_INVALID_HANDLE);
            return 0;
        }
        if state.fail(Op::StartDoc) {
            return 0;
        }
        if !state.docs.insert(handle) {
            state.reject(ERROR_INVALID_PRINTER_STATE);
            return 0;
        }
        state.next_job += 1;
        state.next_job
    }

    fn end_doc(&self, handle: RawHandle) -> bool {
        let mut state = self.state();
        state.calls.push(Call::EndDoc);
        if state.fail(Op::EndDoc) {
            return false;
        }
        if !state.docs.remove(&handle) {
            return state.reject(ERROR_INVALID_PRINTER_STATE);
        }
        state.pages.remove(&handle);
        true
    }

    fn abort_doc(&self, handle: RawHandle) -> bool {
        let mut state = self.state();
        state.calls.push(Call::AbortDoc);
        if state.fail(Op::AbortDoc) {
            return false;
        }
        if !state.docs.remove(&handle) {
            return state.reject(ERROR_INVALID_PRINTER_STATE);
        }
        state.pages.remove(&handle);
        true
    }

    fn start_page(&self, handle: RawHandle) -> bool {
        let mut state = self.state();
        state.calls.push(Call::StartPage);
        if state.fail(Op::StartPage) {
            return false;
        }
        if !state.docs.contains(&handle) || !state.pages.insert(handle) {
            return state.reject(ERROR_INVALID_PRINTER_STATE);
        }
        true
    }

    fn end_page(&self, handle: RawHandle) -> bool {
        let mut state = self.state();
        state.calls.push(Call::EndPage);
        if state.fail(Op::EndPage) {
            return false;
        }
        if !state.pages.remove(&handle) {
            return state.reject(ERROR_INVALID_PRINTER_STATE);
        }
        true
    }

    fn write(&self, handle: RawHandle, data: &[u8], written: &mut u32) -> bool {
        let mut state = self.state();
        *written = 0;
        if state.fail(Op::Write) {
            state.calls.push(Call::Write(Vec::new()));
            return false;
        }
        if !state.pages.contains(&handle) {
            state.calls.push(Call::Write(Vec::new()));
            return state.reject(ERROR_INVALID_PRINTER_STATE);
        }

        let accepted = match state.short_write {
            Some(limit) => (limit as usize).min(data.len()),
            None => data.len(),
        };
        state.calls.push(Call::Write(data[..accepted].to_vec()));
        *written = accepted as u32;
        true
    }

    fn get_printer_driver(
        &self,
        handle: RawHandle,
        level: u32,
        buf: Option<&mut [u8]>,
        needed: &mut u32,
    ) -> bool {
        let mut state = self.state();
        let probing = buf.is_none();
        state.calls.push(if probing {
            Call::DriverProbe
        } else {
            Call::DriverFetch
        });

        if !state.open.contains(&handle) {
            return state.reject(ERROR_INVALID_HANDLE);
        }
        if level != DRIVER_INFO_LEVEL {
            return state.reject(ERROR_INVALID_LEVEL);
        }
        if state.fail(if probing { Op::DriverProbe } else { Op::DriverFetch }) {
            return false;
        }
        let Some(driver) = state.driver.clone() else {
            return state.reject(ERROR_UNKNOWN_PRINTER_DRIVER);
        };
        let corruption = state.corruption;

        let required = match corruption {
            Some(Corruption::Truncated) => 4,
            _ => block_size(&driver, corruption),
        };

        let Some(buf) = buf else {
            if state.probe_succeeds {
                return true;
            }
            *needed = if state.probe_reports_zero { 0 } else { required };
            return state.reject(ERROR_INSUFFICIENT_BUFFER);
        };

        if (buf.len() as u32) < required {
            *needed = required;
            return state.reject(ERROR_INSUFFICIENT_BUFFER);
        }
        if corruption != Some(Corruption::Truncated) {
            lay_out(buf, &driver, corruption);
        }
        true
    }

    fn last_error(&self) -> u32 {
        self.state().last_error
    }

    fn default_printer(&self) -> Option<String> {
        self.state().default_printer.clone()
    }

    fn enum_printers(&self) -> Option<Vec<PrinterEntry>> {
        let mut state = self.state();
        if state.enum_fails {
            state.reject(ERROR_INVALID_HANDLE);
            return None;
        }
        Some(state.printers.clone())
    }
}

fn single_units(value: &Option<String>) -> Option<Vec<u16>> {
    value
        .as_ref()
        .map(|s| s.encode_utf16().chain(std::iter::once(0)).collect())
}

fn dependent_units(driver: &FakeDriver, corruption: Option<Corruption>) -> Option<Vec<u16>> {
    let mut units = encode_multi_sz(driver.dependent_files.as_ref()?);
    if corruption == Some(Corruption::Unterminated) {
        units.pop();
    }
    Some(units)
}

fn regions(driver: &FakeDriver, corruption: Option<Corruption>) -> [Option<Vec<u16>>; 9] {
    // Dependent files go last so an unterminated list runs into the block end
    [
        single_units(&driver.name),
        single_units(&driver.environment),
        single_units(&driver.driver_path),
        single_units(&driver.data_file),
        single_units(&driver.config_file),
        single_units(&driver.help_file),
        single_units(&driver.monitor_name),
        single_units(&driver.default_data_type),
        dependent_units(driver, corruption),
    ]
}

fn block_size(driver: &FakeDriver, corruption: Option<Corruption>) -> u32 {
    let strings: usize = regions(driver, corruption)
        .iter()
        .flatten()
        .map(|units| units.len() * 2)
        .sum();
    (size_of::<DriverInfoHeader>() + strings) as u32
}

/// Write the descriptor and its strings into `buf`, pointers aimed at `buf`
fn lay_out(buf: &mut [u8], driver: &FakeDriver, corruption: Option<Corruption>) {
    let base = buf.as_mut_ptr();
    let mut offset = size_of::<DriverInfoHeader>();
    let mut pointers = [std::ptr::null::<u16>(); 9];

    for (slot, region) in regions(driver, corruption).iter().enumerate() {
        let Some(units) = region else { continue };
        pointers[slot] = base.wrapping_add(offset) as *const u16;
        for unit in units {
            buf[offset..offset + 2].copy_from_slice(&unit.to_ne_bytes());
            offset += 2;
        }
    }

    if corruption == Some(Corruption::PointerOutside) {
        pointers[8] = base.wrapping_add(buf.len() + 64) as *const u16;
    }

    let header = DriverInfoHeader {
        version: driver.version,
        name: pointers[0],
        environment: pointers[1],
        driver_path: pointers[2],
        data_file: pointers[3],
        config_file: pointers[4],
        help_file: pointers[5],
        monitor_name: pointers[6],
        default_data_type: pointers[7],
        dependent_files: pointers[8],
    };
    // SAFETY: the caller checked `buf` holds at least `block_size` bytes.
    unsafe { std::ptr::write_unaligned(buf.as_mut_ptr() as *mut DriverInfoHeader, header) };
}
