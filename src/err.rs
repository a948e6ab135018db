//! Error type and helper functions.

use std::io;
use std::fmt;

use std::error::Error;

#[derive(Debug)]
pub enum HLError {
    IOError     { cause: io::Error, detail: String },
    NixError    { cause: nix::Error, detail: String },
    ExecError   { cause: nix::Error, detail: String },
    ParseError  { line: u32, detail: String },
    ConfigError { detail: String },
}

impl fmt::Display for HLError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            HLError::IOError { ref cause, ref detail } => {
                write!(f, "{}: {}.", detail, cause)
            },
            HLError::NixError { ref cause, ref detail } => {
                write!(f, "{}: {}.", detail, cause.desc())
            },
            HLError::ExecError { ref cause, ref detail } => {
                write!(f, "failed to execute {}: {}.", detail, cause.desc())
            },
            HLError::ParseError { line, ref detail } => {
                write!(f, "configuration file error on line {}: {}.",
                       line, detail)
            },
            HLError::ConfigError { ref detail } => {
                write!(f, "{}.", detail)
            },
        }
    }
}

impl Error for HLError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match *self {
            HLError::IOError     { ref cause, .. } => Some(cause),
            HLError::NixError    { ref cause, .. } => Some(cause),
            HLError::ExecError   { ref cause, .. } => Some(cause),
            HLError::ParseError  { .. } => None,
            HLError::ConfigError { .. } => None,
        }
    }
}

impl HLError {
    /// Short category name.
    pub fn kind(&self) -> &'static str {
        match *self {
            HLError::IOError     { .. } => "I/O error",
            HLError::NixError    { .. } => "System error",
            HLError::ExecError   { .. } => "Exec failure",
            HLError::ParseError  { .. } => "Parse error",
            HLError::ConfigError { .. } => "Configuration error",
        }
    }
}

pub fn map_io_err (cause: io::Error, detail: String) -> HLError {
    HLError::IOError { cause: cause, detail: detail }
}
pub fn map_nix_err (cause: nix::Error, detail: String) -> HLError {
    HLError::NixError { cause: cause, detail: detail }
}
pub fn map_exec_err (cause: nix::Error, detail: String) -> HLError {
    HLError::ExecError { cause: cause, detail: detail }
}
pub fn parse_err (line: u32, detail: &str) -> HLError {
    HLError::ParseError { line: line, detail: String::from(detail) }
}
pub fn config_err (detail: String) -> HLError {
    HLError::ConfigError { detail: detail }
}
