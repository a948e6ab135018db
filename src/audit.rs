//! The audit trail: one syslog record per launch.
//!
//! Neither nix nor the standard library wraps syslog(3), so this goes
//! straight to libc.

use std::ffi::{CString, OsStr};
use std::path::Path;

use libc::c_char;

use crate::err::*;

pub const TOOL_NAME: &str = "chpersroot";

// openlog() keeps the pointer, so this must live forever.
static IDENT: &[u8] = b"chpersroot\0";

/// Connect to the log socket now, while host paths are still visible.
/// LOG_NDELAY matters: without it the connection would be made lazily,
/// after the chroot.
pub fn open() {
    unsafe {
        libc::openlog(IDENT.as_ptr() as *const c_char,
                      libc::LOG_PID | libc::LOG_NDELAY,
                      libc::LOG_AUTHPRIV);
    }
}

pub fn record(message: &str) -> Result<(), HLError> {
    let message = CString::new(message).map_err(|_| {
        config_err(String::from("audit record contains a NUL byte"))
    })?;
    unsafe {
        libc::syslog(libc::LOG_NOTICE,
                     b"%s\0".as_ptr() as *const c_char,
                     message.as_ptr());
    }
    Ok(())
}

pub fn close() {
    unsafe {
        libc::closelog();
    }
}

/// Escape a field value for the record.  `"` and control characters
/// are written as `\xNN` (newline as `\n`), so the first `"` after a
/// field's opening quote always closes it.  Everything else, backslashes
/// included, is copied as is.
fn escape_field(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '"' => out.push_str("\\x22"),
            c if c.is_control() => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            },
            c => out.push(c),
        }
    }
    out
}

/// The text of the record for one launch.  The command appears exactly
/// as it was handed to the shell unless it holds a `"` or a control
/// character.
pub fn format_record(user: &str, command: &OsStr, root: &Path) -> String {
    format!("[{} user=\"{}\" command=\"{}\" root=\"{}\"]",
            TOOL_NAME, escape_field(user),
            escape_field(&command.to_string_lossy()),
            escape_field(&root.to_string_lossy()))
}
