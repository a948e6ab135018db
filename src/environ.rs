//! The environment handed to the jailed program.
//!
//! Nothing is inherited wholesale.  PATH is fixed, the identity
//! variables come from the password database, and only a handful of
//! terminal-related variables are copied from the caller (and only if
//! the caller has them).

use std::ffi::{OsStr, OsString};

use crate::identity::{Field, Identity};

pub const ROOT_PATH: &str =
    "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";
pub const USER_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

const IDENTITY_VARS: &[(&str, Field)] = &[
    ("HOME",    Field::Home),
    ("SHELL",   Field::Shell),
    ("USER",    Field::Name),
    ("LOGNAME", Field::Name),
];

const PASSTHROUGH_VARS: &[&str] = &[
    "TERM",
    "COLORTERM",
    "DISPLAY",
    "XAUTHORITY",
];

fn lookup<'a>(env: &'a [(OsString, OsString)], name: &str)
              -> Option<&'a OsStr> {
    env.iter()
        .find(|&&(ref k, _)| k.as_os_str() == OsStr::new(name))
        .map(|&(_, ref v)| v.as_os_str())
}

/// Build the environment for `id`, given the caller's environment.
pub fn sanitized_env(id: &Identity, caller: &[(OsString, OsString)])
                     -> Vec<(OsString, OsString)> {
    let mut env = Vec::new();

    let path = if id.is_root() { ROOT_PATH } else { USER_PATH };
    env.push((OsString::from("PATH"), OsString::from(path)));

    for &(name, field) in IDENTITY_VARS {
        env.push((OsString::from(name), id.field(field).to_os_string()));
    }
    for &name in PASSTHROUGH_VARS {
        if let Some(v) = lookup(caller, name) {
            env.push((OsString::from(name), v.to_os_string()));
        }
    }
    env
}
