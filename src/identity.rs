//! Who invoked us.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// The fields of a password database entry that the launcher uses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Passwd {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
    pub home: PathBuf,
    pub shell: PathBuf,
}

/// The invoking user, recorded before any privilege change and never
/// modified afterward.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub uid: u32,
    pub gid: u32,
    pub name: String,
    pub home: PathBuf,
    pub shell: PathBuf,
    pub groups: Vec<u32>,
}

impl Identity {
    pub fn new(uid: u32, pw: Passwd, groups: Vec<u32>) -> Identity {
        Identity {
            uid: uid,
            gid: pw.gid,
            name: pw.name,
            home: pw.home,
            shell: pw.shell,
            groups: groups,
        }
    }

    pub fn is_root(&self) -> bool {
        self.uid == 0
    }

    /// The login shell; an empty passwd field means /bin/sh.
    pub fn shell_path(&self) -> &Path {
        if self.shell.as_os_str().is_empty() {
            Path::new("/bin/sh")
        } else {
            &self.shell
        }
    }

    /// argv[0] for the shell: its base name with a leading `-`, which
    /// tells it to act as a login shell.
    pub fn login_name(&self) -> OsString {
        let shell = self.shell_path();
        let mut name = OsString::from("-");
        name.push(shell.file_name().unwrap_or(shell.as_os_str()));
        name
    }

    pub fn field(&self, field: Field) -> &OsStr {
        match field {
            Field::Home => self.home.as_os_str(),
            Field::Shell => self.shell_path().as_os_str(),
            Field::Name => OsStr::new(&self.name),
        }
    }
}

/// Identity fields that are exported to the environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    Home,
    Shell,
    Name,
}
