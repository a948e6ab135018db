//! The launch sequence, run against a host that only records what it
//! is asked to do.

use std::convert::Infallible;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chroot_jail_tools::*;
use chroot_jail_tools::config::{self, Jail, JailConfigSet};
use chroot_jail_tools::environ::USER_PATH;
use chroot_jail_tools::host::Host;
use chroot_jail_tools::identity::Passwd;
use chroot_jail_tools::launch::{launch, Invocation};
use chroot_jail_tools::personality::Personality;

const WEB: &str = "[web]\n\
                   rootdir = /srv/web\n\
                   personality = 'linux32'\n\
                   copyfile = /etc/resolv.conf\n\
                   copyfile = /etc/hosts\n\
                   [bare]\n\
                   personality = linux\n";

struct FakeHost {
    config: Option<&'static str>,
    fail_on: Option<&'static str>,
    arg_max: usize,
    calls: Vec<String>,
    exec_argv: Vec<OsString>,
    exec_env: Vec<(OsString, OsString)>,
}

impl FakeHost {
    fn new(config: Option<&'static str>) -> FakeHost {
        FakeHost {
            config: config,
            fail_on: None,
            arg_max: 4096,
            calls: Vec::new(),
            exec_argv: Vec::new(),
            exec_env: Vec::new(),
        }
    }

    fn failing(config: Option<&'static str>, prefix: &'static str)
               -> FakeHost {
        FakeHost { fail_on: Some(prefix), ..FakeHost::new(config) }
    }

    fn call(&mut self, what: String) -> Result<(), HLError> {
        let fail = self.fail_on.map_or(false, |f| what.starts_with(f));
        self.calls.push(what.clone());
        if fail {
            Err(map_nix_err(nix::Error::EPERM, what))
        } else {
            Ok(())
        }
    }

    fn called(&self, prefix: &str) -> bool {
        self.calls.iter().any(|c| c.starts_with(prefix))
    }
}

impl Host for FakeHost {
    fn real_uid(&self) -> u32 {
        1000
    }

    fn passwd(&self, uid: u32) -> Result<Passwd, HLError> {
        Ok(Passwd {
            name: String::from("alice"),
            uid: uid,
            gid: 100,
            home: PathBuf::from("/home/alice"),
            shell: PathBuf::from("/bin/bash"),
        })
    }

    fn groups(&self) -> Result<Vec<u32>, HLError> {
        Ok(vec![100, 24])
    }

    fn load_config(&mut self) -> Result<Option<JailConfigSet>, HLError> {
        match self.config {
            Some(text) => config::parse(text.as_bytes()).map(Some),
            None => Ok(None),
        }
    }

    fn builtin_jail(&self) -> Result<Jail, HLError> {
        Jail::builtin(Some("/srv/builtin"), Some("linux32"))
    }

    fn set_personality(&mut self, pers: Personality) -> Result<(), HLError> {
        self.call(format!("personality {}", pers))
    }

    fn setuid(&mut self, uid: u32) -> Result<(), HLError> {
        self.call(format!("setuid {}", uid))
    }

    fn setgid(&mut self, gid: u32) -> Result<(), HLError> {
        self.call(format!("setgid {}", gid))
    }

    fn setgroups(&mut self, groups: &[u32]) -> Result<(), HLError> {
        self.call(format!("setgroups {:?}", groups))
    }

    fn chroot(&mut self, dir: &Path) -> Result<(), HLError> {
        self.call(format!("chroot {}", dir.display()))
    }

    fn chdir(&mut self, dir: &Path) -> Result<(), HLError> {
        self.call(format!("chdir {}", dir.display()))
    }

    fn copy_file(&mut self, src: &Path, dst: &Path) -> Result<(), HLError> {
        self.call(format!("copy {} {}", src.display(), dst.display()))
    }

    fn open_audit(&mut self) {
        self.calls.push(String::from("openlog"));
    }

    fn audit(&mut self, message: &str) -> Result<(), HLError> {
        self.call(format!("syslog {}", message))
    }

    fn close_audit(&mut self) {
        self.calls.push(String::from("closelog"));
    }

    fn arg_max(&self) -> usize {
        self.arg_max
    }

    fn exec(&mut self, path: &Path, argv: &[OsString],
            env: &[(OsString, OsString)]) -> Result<Infallible, HLError> {
        self.calls.push(format!("exec {}", path.display()));
        self.exec_argv = argv.to_vec();
        self.exec_env = env.to_vec();
        Err(map_exec_err(nix::Error::ENOENT, path.display().to_string()))
    }
}

fn inv(program: &str, args: &[&str], env: &[(&str, &str)]) -> Invocation {
    Invocation {
        program: OsString::from(program),
        args: args.iter().map(OsString::from).collect(),
        env: env.iter()
            .map(|&(k, v)| (OsString::from(k), OsString::from(v)))
            .collect(),
    }
}

fn os(v: &[&str]) -> Vec<OsString> {
    v.iter().map(OsString::from).collect()
}

fn expect_exec_failure(r: Result<Infallible, HLError>) {
    match r {
        Err(HLError::ExecError { .. }) => (),
        other => panic!("expected exec failure, got {:?}", other),
    }
}

fn expect_config_error(r: Result<Infallible, HLError>) {
    match r {
        Err(HLError::ConfigError { .. }) => (),
        other => panic!("expected configuration error, got {:?}", other),
    }
}

#[test]
fn full_sequence_with_command() {
    let mut host = FakeHost::new(Some(WEB));
    let cmd = r"'echo' 'it'\''s'\!''";

    expect_exec_failure(launch(&mut host,
                               &inv("/usr/local/bin/web", &["echo", "it's!"],
                                    &[("TERM", "xterm")])));

    let expected: Vec<String> = vec![
        String::from("personality linux32"),
        String::from("setuid 0"),
        String::from("copy /etc/resolv.conf /srv/web/etc/resolv.conf"),
        String::from("copy /etc/hosts /srv/web/etc/hosts"),
        String::from("openlog"),
        String::from("chroot /srv/web"),
        String::from("chdir /"),
        String::from("chdir /home/alice"),
        String::from("setgroups [100, 24]"),
        String::from("setuid 1000"),
        String::from("setgid 100"),
        format!("syslog [chpersroot user=\"alice\" command=\"{}\" \
                 root=\"/srv/web\"]", cmd),
        String::from("closelog"),
        String::from("exec /bin/bash"),
    ];
    assert_eq!(host.calls, expected);
    assert_eq!(host.exec_argv, os(&["-bash", "-c", cmd]));
}

#[test]
fn interactive_shell_without_arguments() {
    let mut host = FakeHost::new(Some(WEB));
    expect_exec_failure(launch(&mut host, &inv("web", &[], &[])));

    assert_eq!(host.exec_argv, os(&["-bash"]));
    assert!(host.called("syslog [chpersroot user=\"alice\" \
                         command=\"/bin/bash\" root=\"/srv/web\"]"));
}

#[test]
fn jail_name_ignores_case() {
    let mut host = FakeHost::new(Some(WEB));
    expect_exec_failure(launch(&mut host, &inv("/opt/bin/WEB", &[], &[])));
    assert!(host.called("chroot /srv/web"));
}

#[test]
fn environment_is_rebuilt() {
    let mut host = FakeHost::new(Some(WEB));
    expect_exec_failure(launch(&mut host, &inv("web", &[], &[
        ("PATH", "/tmp/evil"), ("LD_PRELOAD", "/tmp/evil.so"),
        ("DISPLAY", ":0"), ("HOME", "/root"), ("IFS", "x"),
    ])));

    let expected: Vec<(OsString, OsString)> = [
        ("PATH", USER_PATH),
        ("HOME", "/home/alice"),
        ("SHELL", "/bin/bash"),
        ("USER", "alice"),
        ("LOGNAME", "alice"),
        ("DISPLAY", ":0"),
    ].iter().map(|&(k, v)| (OsString::from(k), OsString::from(v))).collect();
    assert_eq!(host.exec_env, expected);
}

#[test]
fn unknown_jail_fails_before_any_privilege_change() {
    let mut host = FakeHost::new(Some(WEB));
    expect_config_error(launch(&mut host, &inv("mail", &[], &[])));
    assert!(host.calls.is_empty());
}

#[test]
fn jail_without_rootdir_fails_before_any_privilege_change() {
    let mut host = FakeHost::new(Some(WEB));
    expect_config_error(launch(&mut host, &inv("bare", &[], &[])));
    assert!(host.calls.is_empty());
}

#[test]
fn bad_configuration_fails_before_any_privilege_change() {
    let mut host = FakeHost::new(Some("[web]\nrootdir=/srv/web\n\
                                       personality=beos\n"));
    expect_config_error(launch(&mut host, &inv("web", &[], &[])));
    assert!(host.calls.is_empty());

    let mut host = FakeHost::new(Some("[web]\nrootdir='/srv/web\n"));
    match launch(&mut host, &inv("web", &[], &[])) {
        Err(HLError::ParseError { line: 2, .. }) => (),
        other => panic!("unexpected {:?}", other),
    }
    assert!(host.calls.is_empty());
}

#[test]
fn builtin_jail_without_configuration() {
    let mut host = FakeHost::new(None);
    expect_exec_failure(launch(&mut host, &inv("whatever", &[], &[])));
    assert_eq!(&host.calls[..4],
               &["personality linux32", "setuid 0", "openlog",
                 "chroot /srv/builtin"]);
}

#[test]
fn failed_copy_aborts_the_launch() {
    let mut host = FakeHost::failing(Some(WEB), "copy /etc/hosts");
    match launch(&mut host, &inv("web", &[], &[])) {
        Err(HLError::NixError { .. }) => (),
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(host.calls.last().unwrap(),
               "copy /etc/hosts /srv/web/etc/hosts");
    assert!(!host.called("chroot"));
    assert!(!host.called("exec"));
}

#[test]
fn failed_chroot_stops_everything() {
    let mut host = FakeHost::failing(Some(WEB), "chroot");
    assert!(launch(&mut host, &inv("web", &[], &[])).is_err());
    assert_eq!(host.calls.last().unwrap(), "chroot /srv/web");
    assert!(!host.called("setuid 1000"));
}

#[test]
fn failed_setgroups_never_reaches_setuid() {
    let mut host = FakeHost::failing(Some(WEB), "setgroups");
    assert!(launch(&mut host, &inv("web", &[], &[])).is_err());
    assert!(!host.called("setuid 1000"));
    assert!(!host.called("setgid"));
    assert!(!host.called("exec"));
}

#[test]
fn failed_setuid_never_reaches_exec() {
    let mut host = FakeHost::failing(Some(WEB), "setuid 1000");
    assert!(launch(&mut host, &inv("web", &[], &[])).is_err());
    assert!(!host.called("setgid"));
    assert!(!host.called("exec"));
}

#[test]
fn failed_audit_closes_log_and_does_not_exec() {
    let mut host = FakeHost::failing(Some(WEB), "syslog");
    assert!(launch(&mut host, &inv("web", &[], &[])).is_err());
    assert_eq!(host.calls.last().unwrap(), "closelog");
    assert!(!host.called("exec"));
}

#[test]
fn overlong_command_is_refused() {
    let mut host = FakeHost::new(Some(WEB));
    host.arg_max = 64;
    let long = "x".repeat(100);
    expect_config_error(launch(&mut host, &inv("web", &[long.as_str()], &[])));
    assert!(!host.called("syslog"));
    assert!(!host.called("exec"));
}
