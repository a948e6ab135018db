//! The launch sequence: from a setuid-root process to a shell running
//! as the invoking user inside the jail.
//!
//! The order of the steps is the whole point of this module.  Every
//! step either succeeds or ends the launch; nothing is retried and
//! nothing after a failure runs.
//!
//!  1. Record who we are (uid, passwd entry, groups).
//!  2. Pick the jail.  Nothing privileged has happened yet, so a bad
//!     or missing configuration costs nothing.
//!  3. Switch personality, if the jail asks for one.
//!  4. setuid(0): the real uid becomes root too, which chroot needs.
//!  5. Copy files in, using host paths for the sources.
//!  6. Open the audit log, using the host's log socket.
//!  7. chroot, then chdir to "/" and then to the home directory, so no
//!     working directory outside the jail survives.
//!  8. setgroups, setuid, setgid, in that order.  setgroups needs root;
//!     setgid comes last so that it only succeeds if the setuid did.
//!  9. Build the environment from scratch.
//! 10. Build the shell's argument vector.
//! 11. Write the audit record and close the log.
//! 12. exec.

use std::convert::Infallible;
use std::env;
use std::ffi::OsString;
use std::path::Path;

use crate::audit;
use crate::config::Jail;
use crate::environ::sanitized_env;
use crate::err::*;
use crate::host::Host;
use crate::identity::Identity;
use crate::quote::quote;

/// How we were invoked.
#[derive(Clone, Debug, Default)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub env: Vec<(OsString, OsString)>,
}

impl Invocation {
    pub fn from_env() -> Invocation {
        let mut args = env::args_os();
        let program = args.next().unwrap_or_default();
        Invocation {
            program: program,
            args: args.collect(),
            env: env::vars_os().collect(),
        }
    }

    /// The jail name: the base name of argv[0].
    pub fn jail_name(&self) -> String {
        let prog = Path::new(&self.program);
        prog.file_name()
            .unwrap_or(prog.as_os_str())
            .to_string_lossy()
            .into_owned()
    }
}

/// Capture the invoking user's identity.  Must run before anything
/// changes our credentials.
pub fn capture_identity<H: Host>(host: &H) -> Result<Identity, HLError> {
    let uid = host.real_uid();
    let pw = host.passwd(uid)?;
    let groups = host.groups()?;
    Ok(Identity::new(uid, pw, groups))
}

/// Find the jail to enter.  The parsed configuration is dropped before
/// this returns.
pub fn select_jail<H: Host>(host: &mut H, inv: &Invocation)
                            -> Result<Jail, HLError> {
    match host.load_config()? {
        Some(set) => set.resolve(&inv.jail_name()),
        None => host.builtin_jail(),
    }
}

/// Run the whole launch.  Only returns if something went wrong.
pub fn launch<H: Host>(host: &mut H, inv: &Invocation)
                       -> Result<Infallible, HLError> {
    let id = capture_identity(host)?;
    let jail = select_jail(host, inv)?;

    if let Some(pers) = jail.personality {
        host.set_personality(pers)?;
    }
    host.setuid(0)?;

    for src in jail.copy_in_files.iter() {
        host.copy_file(src, &jail.destination(src))?;
    }

    host.open_audit();

    host.chroot(&jail.root_dir)?;
    host.chdir(Path::new("/"))?;
    host.chdir(&id.home)?;

    host.setgroups(&id.groups)?;
    host.setuid(id.uid)?;
    host.setgid(id.gid)?;

    let env = sanitized_env(&id, &inv.env);

    let shell = id.shell_path().to_path_buf();
    let (argv, command) = if inv.args.is_empty() {
        (vec![id.login_name()], shell.clone().into_os_string())
    } else {
        let command = quote(&inv.args[..], host.arg_max())?;
        (vec![id.login_name(), OsString::from("-c"), command.clone()],
         command)
    };

    let record = audit::format_record(&id.name, &command, &jail.root_dir);
    let logged = host.audit(&record);
    host.close_audit();
    logged?;

    host.exec(&shell, &argv, &env)
}
