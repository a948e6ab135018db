//! Everything the launcher asks of the operating system, behind one
//! trait so that the launch sequence can be exercised without root.

use std::convert::Infallible;
use std::ffi::{CString, OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use nix::unistd;
use nix::unistd::{Gid, Uid};

use crate::audit;
use crate::config::{self, Jail, JailConfigSet};
use crate::copyin;
use crate::err::*;
use crate::identity::Passwd;
use crate::personality::{self, Personality};

/// ARG_MAX to assume if sysconf cannot tell us.
const FALLBACK_ARG_MAX: usize = 131072;

pub trait Host {
    fn real_uid(&self) -> u32;
    fn passwd(&self, uid: u32) -> Result<Passwd, HLError>;
    fn groups(&self) -> Result<Vec<u32>, HLError>;

    /// The configuration file, or `None` if there is none.
    fn load_config(&mut self) -> Result<Option<JailConfigSet>, HLError>;
    /// The jail to use when there is no configuration file.
    fn builtin_jail(&self) -> Result<Jail, HLError>;

    fn set_personality(&mut self, pers: Personality) -> Result<(), HLError>;
    fn setuid(&mut self, uid: u32) -> Result<(), HLError>;
    fn setgid(&mut self, gid: u32) -> Result<(), HLError>;
    fn setgroups(&mut self, groups: &[u32]) -> Result<(), HLError>;
    fn chroot(&mut self, dir: &Path) -> Result<(), HLError>;
    fn chdir(&mut self, dir: &Path) -> Result<(), HLError>;
    fn copy_file(&mut self, src: &Path, dst: &Path) -> Result<(), HLError>;

    fn open_audit(&mut self);
    fn audit(&mut self, message: &str) -> Result<(), HLError>;
    fn close_audit(&mut self);

    /// Longest argument-plus-environment block exec will accept.
    fn arg_max(&self) -> usize;

    /// Replace the process image.  Only returns on failure.
    fn exec(&mut self, path: &Path, argv: &[OsString],
            env: &[(OsString, OsString)]) -> Result<Infallible, HLError>;
}

/// The real thing.
pub struct SystemHost;

fn cstring(s: &OsStr) -> Result<CString, HLError> {
    CString::new(s.as_bytes()).map_err(|_| config_err(format!(
        "{:?} contains a NUL byte", s)))
}

impl Host for SystemHost {
    fn real_uid(&self) -> u32 {
        unistd::getuid().as_raw()
    }

    fn passwd(&self, uid: u32) -> Result<Passwd, HLError> {
        let user = unistd::User::from_uid(Uid::from_raw(uid))
            .map_err(|e| map_nix_err(e, format!("getpwuid({})", uid)))?
            .ok_or_else(|| config_err(format!(
                "uid {} has no password database entry", uid)))?;
        Ok(Passwd {
            name: user.name,
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
            home: user.dir,
            shell: user.shell,
        })
    }

    fn groups(&self) -> Result<Vec<u32>, HLError> {
        unistd::getgroups()
            .map(|gs| gs.into_iter().map(|g| g.as_raw()).collect())
            .map_err(|e| map_nix_err(e, String::from("getgroups")))
    }

    fn load_config(&mut self) -> Result<Option<JailConfigSet>, HLError> {
        config::load(Path::new(config::CONFIG_PATH))
    }

    fn builtin_jail(&self) -> Result<Jail, HLError> {
        Jail::builtin(config::BUILTIN_ROOT_DIR, config::BUILTIN_PERSONALITY)
    }

    fn set_personality(&mut self, pers: Personality) -> Result<(), HLError> {
        personality::set_personality(pers)
    }

    fn setuid(&mut self, uid: u32) -> Result<(), HLError> {
        unistd::setuid(Uid::from_raw(uid))
            .map_err(|e| map_nix_err(e, format!("setuid({})", uid)))
    }

    fn setgid(&mut self, gid: u32) -> Result<(), HLError> {
        unistd::setgid(Gid::from_raw(gid))
            .map_err(|e| map_nix_err(e, format!("setgid({})", gid)))
    }

    fn setgroups(&mut self, groups: &[u32]) -> Result<(), HLError> {
        let gids: Vec<Gid> = groups.iter().map(|&g| Gid::from_raw(g)).collect();
        unistd::setgroups(&gids)
            .map_err(|e| map_nix_err(e, String::from("setgroups")))
    }

    fn chroot(&mut self, dir: &Path) -> Result<(), HLError> {
        unistd::chroot(dir)
            .map_err(|e| map_nix_err(e, format!("chroot {}", dir.display())))
    }

    fn chdir(&mut self, dir: &Path) -> Result<(), HLError> {
        unistd::chdir(dir)
            .map_err(|e| map_nix_err(e, format!("chdir {}", dir.display())))
    }

    fn copy_file(&mut self, src: &Path, dst: &Path) -> Result<(), HLError> {
        copyin::copy_file(src, dst)
    }

    fn open_audit(&mut self) {
        audit::open()
    }

    fn audit(&mut self, message: &str) -> Result<(), HLError> {
        audit::record(message)
    }

    fn close_audit(&mut self) {
        audit::close()
    }

    fn arg_max(&self) -> usize {
        match unistd::sysconf(unistd::SysconfVar::ARG_MAX) {
            Ok(Some(n)) if n > 0 => n as usize,
            _ => FALLBACK_ARG_MAX,
        }
    }

    fn exec(&mut self, path: &Path, argv: &[OsString],
            env: &[(OsString, OsString)]) -> Result<Infallible, HLError> {
        let c_path = cstring(path.as_os_str())?;
        let c_argv = argv.iter()
            .map(|a| cstring(a))
            .collect::<Result<Vec<CString>, HLError>>()?;
        let c_env = env.iter()
            .map(|&(ref k, ref v)| {
                let mut kv = k.clone();
                kv.push("=");
                kv.push(v);
                cstring(&kv)
            })
            .collect::<Result<Vec<CString>, HLError>>()?;

        unistd::execve(&c_path, &c_argv, &c_env)
            .map_err(|e| map_exec_err(e, path.display().to_string()))
    }
}
