//! Execution domains ("personalities") a jail may request.
//!
//! Neither nix nor libc exposes the PER_* constants, so the values from
//! <linux/personality.h> are reproduced here.

use std::fmt;

use crate::err::*;

const ADDR_LIMIT_32BIT: u32 = 0x0800000;
const ADDR_LIMIT_3GB:   u32 = 0x8000000;
const FDPIC_FUNCPTRS:   u32 = 0x0080000;
const MMAP_PAGE_ZERO:   u32 = 0x0100000;
const SHORT_INODE:      u32 = 0x1000000;
const STICKY_TIMEOUTS:  u32 = 0x4000000;
const WHOLE_SECONDS:    u32 = 0x2000000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Personality {
    name: &'static str,
    value: u32,
}

static PERSONALITIES: &[Personality] = &[
    Personality { name: "linux",       value: 0x0000 },
    Personality { name: "linux-32bit", value: 0x0000 | ADDR_LIMIT_32BIT },
    Personality { name: "linux-fdpic", value: 0x0000 | FDPIC_FUNCPTRS },
    Personality { name: "svr4",
                  value: 0x0001 | STICKY_TIMEOUTS | MMAP_PAGE_ZERO },
    Personality { name: "svr3",
                  value: 0x0002 | STICKY_TIMEOUTS | SHORT_INODE },
    Personality { name: "scosvr3",
                  value: 0x0003 | STICKY_TIMEOUTS | WHOLE_SECONDS
                                | SHORT_INODE },
    Personality { name: "osr5",
                  value: 0x0003 | STICKY_TIMEOUTS | WHOLE_SECONDS },
    Personality { name: "wysev386",
                  value: 0x0004 | STICKY_TIMEOUTS | SHORT_INODE },
    Personality { name: "iscr4",       value: 0x0005 | STICKY_TIMEOUTS },
    Personality { name: "bsd",         value: 0x0006 },
    Personality { name: "sunos",       value: 0x0006 | STICKY_TIMEOUTS },
    Personality { name: "xenix",
                  value: 0x0007 | STICKY_TIMEOUTS | SHORT_INODE },
    Personality { name: "linux32",     value: 0x0008 },
    Personality { name: "linux32-3gb", value: 0x0008 | ADDR_LIMIT_3GB },
    Personality { name: "irix32",      value: 0x0009 | STICKY_TIMEOUTS },
    Personality { name: "irixn32",     value: 0x000a | STICKY_TIMEOUTS },
    Personality { name: "irix64",      value: 0x000b | STICKY_TIMEOUTS },
    Personality { name: "riscos",      value: 0x000c },
    Personality { name: "solaris",     value: 0x000d | STICKY_TIMEOUTS },
    Personality { name: "uw7",
                  value: 0x000e | STICKY_TIMEOUTS | MMAP_PAGE_ZERO },
    Personality { name: "osf4",        value: 0x000f },
    Personality { name: "hpux",        value: 0x0010 },
];

impl Personality {
    /// Look up a personality by name, ignoring case.
    pub fn from_name(name: &str) -> Option<Personality> {
        PERSONALITIES.iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn name(&self) -> &'static str { self.name }
    pub fn value(&self) -> u32 { self.value }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Switch the calling process to `pers`.  Takes effect for everything
/// exec'd afterward.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn set_personality(pers: Personality) -> Result<(), HLError> {
    use nix::errno::Errno;

    let rv = unsafe { libc::personality(pers.value as libc::c_ulong) };
    if rv == -1 {
        Err(map_nix_err(Errno::last(), format!("personality {}", pers)))
    } else {
        Ok(())
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub fn set_personality(pers: Personality) -> Result<(), HLError> {
    Err(map_nix_err(nix::errno::Errno::ENOSYS,
                    format!("personality {}", pers)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let p = Personality::from_name("LiNuX32").unwrap();
        assert_eq!(p.name(), "linux32");
        assert_eq!(p.value(), 8);
        assert_eq!(Personality::from_name("linux").unwrap().value(), 0);
    }

    #[test]
    fn unknown_names() {
        assert!(Personality::from_name("windows").is_none());
        assert!(Personality::from_name("").is_none());
        assert!(Personality::from_name("linux32 ").is_none());
    }

    #[test]
    fn flagged_values() {
        assert_eq!(Personality::from_name("sunos").unwrap().value(),
                   0x0400_0006);
        assert_eq!(Personality::from_name("linux32-3gb").unwrap().value(),
                   0x0800_0008);
    }
}
