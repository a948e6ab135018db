/* Enter a chroot jail, optionally under a different personality, as
 * yourself.
 *
 * Copyright © 2016 Zack Weinberg
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 * http://www.apache.org/licenses/LICENSE-2.0
 * There is NO WARRANTY.
 *
 *    JAIL [args...]
 *
 * where JAIL is this program, installed (or linked) under the name of
 * a section of the configuration file, /etc/chpersroot.conf unless
 * overridden at build time with CHPERSROOT_CONFIG.  The section gives
 * the jail's root directory, and optionally a personality (e.g.
 * "linux32", to run 32-bit userlands on a 64-bit kernel) and a list
 * of host files to copy into the jail before entering it:
 *
 *     [web]
 *     rootdir     = /srv/web
 *     personality = linux32
 *     copyfile    = /etc/resolv.conf
 *
 * With no arguments, the invoking user's login shell is started inside
 * the jail as a login shell.  Otherwise the arguments are quoted and
 * handed to the shell with -c.  The shell runs with the invoking user's
 * uid, gid and supplementary groups, in their home directory (relative
 * to the jail), with an environment containing only PATH, HOME, SHELL,
 * USER, LOGNAME, and -- if set -- TERM, COLORTERM, DISPLAY and
 * XAUTHORITY.  Each launch is logged to syslog (authpriv.notice).
 *
 * The configuration file must be owned by root:root and not writable
 * by group or other; otherwise it is ignored with an error.  If it
 * does not exist at all, the jail given at build time by
 * CHPERSROOT_ROOT_DIR (and CHPERSROOT_PERSONALITY) is used regardless
 * of the program name; a build without one refuses to run.
 *
 * This program is to be installed setuid root.
 *
 * This program is Linux-specific (personality(2)).
 */

use std::io;
use std::process;

use std::io::Write;

use chroot_jail_tools::host::SystemHost;
use chroot_jail_tools::launch::{launch, Invocation};

fn main() {
    let inv = Invocation::from_env();
    let err = match launch(&mut SystemHost, &inv) {
        Ok(never) => match never {},
        Err(e) => e,
    };
    writeln!(io::stderr(), "{}: {}", inv.jail_name(), err).unwrap();
    process::exit(1);
}
