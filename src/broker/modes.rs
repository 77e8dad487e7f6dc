//! Open modes
//!
//! Translates the mode vocabulary into open semantics.

use std::fmt;
use std::fs::OpenOptions;
use std::str::FromStr;

use crate::error::BrokerError;

/// Requested read/write/create/truncate/append combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// `r`: read-only, must already exist
    Read,
    /// `w`: write-only, create, truncate
    Write,
    /// `wt`: same as `w`
    WriteTruncate,
    /// `wa`: write-only, create, append
    WriteAppend,
    /// `rw`: read-write, create, keep content
    ReadWrite,
    /// `rwt`: read-write, create, truncate
    ReadWriteTruncate,
}

impl AccessMode {
    pub const ALL: [AccessMode; 6] = [
        AccessMode::Read,
        AccessMode::Write,
        AccessMode::WriteTruncate,
        AccessMode::WriteAppend,
        AccessMode::ReadWrite,
        AccessMode::ReadWriteTruncate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessMode::Read => "r",
            AccessMode::Write => "w",
            AccessMode::WriteTruncate => "wt",
            AccessMode::WriteAppend => "wa",
            AccessMode::ReadWrite => "rw",
            AccessMode::ReadWriteTruncate => "rwt",
        }
    }

    pub fn is_readable(&self) -> bool {
        matches!(
            self,
            AccessMode::Read | AccessMode::ReadWrite | AccessMode::ReadWriteTruncate
        )
    }

    pub fn is_writable(&self) -> bool {
        !matches!(self, AccessMode::Read)
    }

    /// Every writable mode creates a missing file.
    pub fn may_create(&self) -> bool {
        self.is_writable()
    }

    pub fn truncates(&self) -> bool {
        matches!(
            self,
            AccessMode::Write | AccessMode::WriteTruncate | AccessMode::ReadWriteTruncate
        )
    }

    pub fn appends(&self) -> bool {
        matches!(self, AccessMode::WriteAppend)
    }

    /// Open options implementing this mode.
    pub fn open_options(&self) -> OpenOptions {
        let mut options = OpenOptions::new();
        options
            .read(self.is_readable())
            .create(self.may_create())
            .truncate(self.truncates());
        if self.appends() {
            options.append(true);
        } else {
            options.write(self.is_writable());
        }
        options
    }
}

impl FromStr for AccessMode {
    type Err = BrokerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" => Ok(AccessMode::Read),
            "w" => Ok(AccessMode::Write),
            "wt" => Ok(AccessMode::WriteTruncate),
            "wa" => Ok(AccessMode::WriteAppend),
            "rw" => Ok(AccessMode::ReadWrite),
            "rwt" => Ok(AccessMode::ReadWriteTruncate),
            _ => Err(BrokerError::InvalidArgument(format!("Invalid mode: {}", s))),
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
