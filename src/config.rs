//! The jail configuration file.
//!
//! Each section of the file names one jail; the launcher picks the
//! section whose name matches the name it was invoked under.
//!
//! ```text
//! [web]
//! rootdir     = /srv/web
//! personality = linux32
//! copyfile    = /etc/resolv.conf
//! copyfile    = /etc/hosts
//! ```
//!
//! Because the launcher runs setuid root, the file is only honored if it
//! is owned by root and cannot be written by anyone else.

use std::fs::File;
use std::io;
use std::io::{ErrorKind, Read, Write};
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use crate::err::*;
use crate::ini::{self, IniHandler};
use crate::personality::Personality;

/// Location of the configuration file.
pub const CONFIG_PATH: &str = match option_env!("CHPERSROOT_CONFIG") {
    Some(p) => p,
    None => "/etc/chpersroot.conf",
};

/// Jail used when there is no configuration file at all.  A build
/// without CHPERSROOT_ROOT_DIR refuses to run in that case.
pub const BUILTIN_ROOT_DIR: Option<&str> = option_env!("CHPERSROOT_ROOT_DIR");
pub const BUILTIN_PERSONALITY: Option<&str> =
    option_env!("CHPERSROOT_PERSONALITY");

/// One section of the configuration file, as written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JailConfig {
    pub name: String,
    pub root_dir: Option<String>,
    pub personality: Option<Personality>,
    pub copy_in_files: Vec<String>,
}

/// Everything read from one configuration file.
#[derive(Clone, Debug, Default)]
pub struct JailConfigSet {
    pub jails: Vec<JailConfig>,
    pub warnings: Vec<String>,
}

/// A jail that has been checked and is ready to launch into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Jail {
    pub name: String,
    pub root_dir: PathBuf,
    pub personality: Option<Personality>,
    pub copy_in_files: Vec<PathBuf>,
}

impl IniHandler for JailConfigSet {
    fn begin_section(&mut self, name: &str) -> Result<(), HLError> {
        self.jails.push(JailConfig {
            name: String::from(name),
            ..JailConfig::default()
        });
        Ok(())
    }

    fn value_pair(&mut self, key: &str, value: &str) -> Result<(), HLError> {
        // The parser will not produce a pair before the first heading.
        let entry = match self.jails.last_mut() {
            Some(e) => e,
            None => return Ok(()),
        };

        if key.eq_ignore_ascii_case("rootdir") {
            entry.root_dir = Some(String::from(value));
        } else if key.eq_ignore_ascii_case("personality") {
            let pers = Personality::from_name(value).ok_or_else(|| {
                config_err(format!("unknown personality: {}", value))
            })?;
            entry.personality = Some(pers);
        } else if key.eq_ignore_ascii_case("copyfile") {
            entry.copy_in_files.push(String::from(value));
        } else {
            self.warnings.push(format!("unknown configuration key: {}", key));
        }
        Ok(())
    }
}

impl JailConfigSet {
    /// First jail whose name matches `name`, ignoring ASCII case.
    pub fn find(&self, name: &str) -> Option<&JailConfig> {
        self.jails.iter().find(|j| j.name.eq_ignore_ascii_case(name))
    }

    /// The jail to launch when invoked as `program`.
    pub fn resolve(&self, program: &str) -> Result<Jail, HLError> {
        match self.find(program) {
            Some(entry) => entry.to_jail(),
            None => Err(config_err(format!("no jail configured for '{}'",
                                           program))),
        }
    }
}

impl JailConfig {
    pub fn to_jail(&self) -> Result<Jail, HLError> {
        let root = match self.root_dir {
            Some(ref r) => r,
            None => return Err(config_err(format!("jail '{}' has no rootdir",
                                                  self.name))),
        };
        Jail::new(&self.name, root, self.personality,
                  self.copy_in_files.iter().map(|s| s.as_str()))
    }
}

impl Jail {
    fn new<'a, I>(name: &str, root_dir: &str,
                  personality: Option<Personality>, files: I)
                  -> Result<Jail, HLError>
        where I: Iterator<Item = &'a str>
    {
        let root_dir = PathBuf::from(root_dir);
        if !root_dir.is_absolute() {
            return Err(config_err(format!(
                "jail '{}': rootdir {} is not an absolute path",
                name, root_dir.display())));
        }
        let mut copy_in_files = Vec::new();
        for f in files {
            let f = PathBuf::from(f);
            if !f.is_absolute() {
                return Err(config_err(format!(
                    "jail '{}': copyfile {} is not an absolute path",
                    name, f.display())));
            }
            copy_in_files.push(f);
        }
        Ok(Jail {
            name: String::from(name),
            root_dir: root_dir,
            personality: personality,
            copy_in_files: copy_in_files,
        })
    }

    /// The jail compiled into the program, for use without a
    /// configuration file.
    pub fn builtin(root_dir: Option<&str>, personality: Option<&str>)
                   -> Result<Jail, HLError> {
        let root_dir = root_dir.ok_or_else(|| config_err(format!(
            "{} does not exist and no default jail was built in",
            CONFIG_PATH)))?;
        let personality = match personality {
            Some(name) => Some(Personality::from_name(name).ok_or_else(
                || config_err(format!("unknown personality: {}", name)))?),
            None => None,
        };
        Jail::new("builtin", root_dir, personality, std::iter::empty())
    }

    /// Where the host file `src` goes inside the jail.
    pub fn destination(&self, src: &Path) -> PathBuf {
        self.root_dir.join(src.strip_prefix("/").unwrap_or(src))
    }
}

/// Refuse a configuration file that anyone but root could have written.
pub fn check_trusted(path: &Path, uid: u32, gid: u32, mode: u32)
                     -> Result<(), HLError> {
    if uid != 0 || gid != 0 {
        return Err(config_err(format!(
            "{} must be owned by root:root (owner is {}:{})",
            path.display(), uid, gid)));
    }
    if mode & 0o022 != 0 {
        return Err(config_err(format!(
            "{} must not be group- or world-writable (mode {:o})",
            path.display(), mode & 0o7777)));
    }
    Ok(())
}

/// Parse configuration text without any ownership checks.
pub fn parse<R: Read>(input: R) -> Result<JailConfigSet, HLError> {
    let mut set = JailConfigSet::default();
    ini::parse(input, &mut set)?;
    Ok(set)
}

/// Read the configuration file at `path`.  Returns `Ok(None)` if it does
/// not exist.  Warnings are written to stderr and kept in the result.
pub fn load(path: &Path) -> Result<Option<JailConfigSet>, HLError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(ref e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(map_io_err(e, format!("open {}",
                                                   path.display()))),
    };

    // Check the file we actually opened, not whatever is at `path` now.
    let meta = file.metadata()
        .map_err(|e| map_io_err(e, format!("stat {}", path.display())))?;
    if !meta.is_file() {
        return Err(config_err(format!("{} is not a regular file",
                                      path.display())));
    }
    check_trusted(path, meta.uid(), meta.gid(), meta.mode())?;

    let set = parse(file)?;
    for w in set.warnings.iter() {
        writeln!(io::stderr(), "warning: {}", w).ok();
    }
    Ok(Some(set))
}
