//! Job configuration: printer defaults and document descriptors

use serde::{Deserialize, Serialize};

/// Spooler data type for payloads the driver must pass through untouched
pub const DATATYPE_RAW: &str = "RAW";

/// Document name used when the caller does not provide one
pub const DEFAULT_DOCUMENT_NAME: &str = "Raw Document";

/// Printer access rights requested at open time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessMask(pub u32);

impl AccessMask {
    /// `PRINTER_ACCESS_USE`: enough to print
    pub const USE: AccessMask = AccessMask(0x0000_0008);
    /// `PRINTER_ACCESS_ADMINISTER`
    pub const ADMINISTER: AccessMask = AccessMask(0x0000_0004);
    /// `PRINTER_ALL_ACCESS`
    pub const ALL: AccessMask = AccessMask(0x000F_000C);
}

impl Default for AccessMask {
    fn default() -> Self {
        Self::USE
    }
}

/// Defaults passed to OpenPrinter (`PRINTER_DEFAULTS`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterDefaults {
    pub desired_access: AccessMask,
    pub data_type: Option<String>,
}

impl PrinterDefaults {
    pub fn with_access(mut self, access: AccessMask) -> Self {
        self.desired_access = access;
        self
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }
}

/// Document descriptor passed to StartDocPrinter (`DOC_INFO_1`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentInfo {
    /// Job name shown in the print queue
    pub name: String,
    /// Redirect output to this file instead of the port
    pub output_file: Option<String>,
    /// Spooler data type, `RAW` unless the payload needs processing
    pub data_type: Option<String>,
}

impl DocumentInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn with_output_file(mut self, path: impl Into<String>) -> Self {
        self.output_file = Some(path.into());
        self
    }
}

impl Default for DocumentInfo {
    fn default() -> Self {
        Self {
            name: DEFAULT_DOCUMENT_NAME.to_string(),
            output_file: None,
            data_type: Some(DATATYPE_RAW.to_string()),
        }
    }
}
