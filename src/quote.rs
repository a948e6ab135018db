//! Turning an argument vector back into a single `sh -c` string.

use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};

use crate::err::*;

/// Quote each of `args` for a POSIX shell and join them with spaces.
/// Every argument is wrapped in single quotes; `'` and `!` are moved
/// outside the quotes and backslash-escaped, so that neither quote
/// removal nor history expansion can change them.
///
/// `limit` is the largest result (counting a terminating NUL) the
/// caller can pass to exec; anything longer is an error rather than
/// being truncated.
pub fn quote<S: AsRef<OsStr>>(args: &[S], limit: usize)
                              -> Result<OsString, HLError> {
    let mut out: Vec<u8> = Vec::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(b' ');
        }
        out.push(b'\'');
        for &c in arg.as_ref().as_bytes() {
            if c == b'\'' || c == b'!' {
                out.extend_from_slice(&[b'\'', b'\\', c, b'\'']);
            } else {
                out.push(c);
            }
        }
        out.push(b'\'');
        if out.len() + 1 > limit {
            return Err(config_err(format!(
                "command line too long (limit is {} bytes)", limit)));
        }
    }
    Ok(OsString::from_vec(out))
}
