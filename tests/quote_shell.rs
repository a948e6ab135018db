//! Hand quoted command lines to a real shell and check that it splits
//! them back into the original words.

use std::process::Command;

use chroot_jail_tools::quote::quote;

fn shell_words(args: &[&str]) -> Vec<String> {
    let quoted = quote(args, 65536).unwrap().into_string().unwrap();
    let script = format!("for w in {}; do printf '<%s>\\n' \"$w\"; done",
                         quoted);
    let out = Command::new("/bin/sh")
        .arg("-c")
        .arg(&script)
        .env_clear()
        .env("HOME", "/nonexistent")
        .output()
        .unwrap();
    assert!(out.status.success(), "sh failed on {}", script);
    String::from_utf8(out.stdout).unwrap()
        .lines()
        .map(|l| String::from(&l[1..l.len() - 1]))
        .collect()
}

fn roundtrip(args: &[&str]) {
    let expected: Vec<String> = args.iter().map(|s| String::from(*s)).collect();
    assert_eq!(shell_words(args), expected);
}

#[test]
fn simple_words() {
    roundtrip(&["echo", "hello", "world"]);
}

#[test]
fn quotes_and_history_characters() {
    roundtrip(&["echo", "it's!"]);
    roundtrip(&["'", "!", "''!!''", "!$", "a'b'c"]);
}

#[test]
fn shell_metacharacters() {
    roundtrip(&["$HOME", "`id`", "$(id)", "a b  c", "x;y|z&", "*", "~",
                "\\", "\"", "#not a comment", "{a,b}", "<>"]);
}

#[test]
fn empty_word() {
    roundtrip(&["", "x", ""]);
}
