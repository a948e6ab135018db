//! Copying files from the host into a jail.
//!
//! The copy is written to a temporary file beside the destination and
//! renamed into place once complete, so nobody inside the jail ever
//! sees a partly written file.

use std::ffi::OsString;
use std::fs::{File, Permissions};
use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::{fchown, MetadataExt, PermissionsExt};
use std::path::Path;

use crate::err::*;

const CHUNK_SIZE: usize = 1024;

/// Copy `src` to `dst`, giving the copy the owner, group and mode of
/// the original.  On failure `dst` is untouched and the temporary file
/// is removed.
pub fn copy_file(src: &Path, dst: &Path) -> Result<(), HLError> {
    let mut input = File::open(src)
        .map_err(|e| map_io_err(e, format!("open {}", src.display())))?;

    let (dir, name) = match (dst.parent(), dst.file_name()) {
        (Some(d), Some(n)) => (d, n),
        _ => return Err(config_err(format!("cannot copy {} to {}",
                                           src.display(), dst.display()))),
    };
    let mut prefix = OsString::from(name);
    prefix.push(".");

    let mut tmp = tempfile::Builder::new()
        .prefix(&prefix)
        .rand_bytes(6)
        .tempfile_in(dir)
        .map_err(|e| map_io_err(e, format!("create temporary file for {}",
                                           dst.display())))?;

    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(map_io_err(e, format!("read {}",
                                                       src.display()))),
        };
        // write_all retries short writes
        tmp.as_file_mut().write_all(&buf[..n])
            .map_err(|e| map_io_err(e, format!("write {}",
                                               tmp.path().display())))?;
    }

    let meta = input.metadata()
        .map_err(|e| map_io_err(e, format!("stat {}", src.display())))?;
    // Owner first: chown may clear the set-id bits.
    fchown(tmp.as_file(), Some(meta.uid()), Some(meta.gid()))
        .map_err(|e| map_io_err(e, format!("chown {}",
                                           tmp.path().display())))?;
    tmp.as_file().set_permissions(Permissions::from_mode(meta.mode() & 0o7777))
        .map_err(|e| map_io_err(e, format!("chmod {}",
                                           tmp.path().display())))?;

    tmp.into_temp_path().persist(dst)
        .map_err(|e| map_io_err(e.error, format!("rename into {}",
                                                 dst.display())))?;
    Ok(())
}
