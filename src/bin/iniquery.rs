/* Look up a key in an INI file, using the same parser as chpersroot.
 *
 * Copyright © 2016 Zack Weinberg
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 * http://www.apache.org/licenses/LICENSE-2.0
 * There is NO WARRANTY.
 *
 *     iniquery FILE SECTION KEY
 *
 * prints every value of KEY within SECTION (both compared ignoring
 * case), one per line, in file order.  If FILE cannot be parsed the
 * error, with its line number, goes to stderr and the exit status is 1.
 * Values printed before the error was found are still printed.
 *
 * Useful for checking a configuration file before installing it.  No
 * ownership checks are made.
 */

use std::fs::File;
use std::io;
use std::process;

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;

use chroot_jail_tools::*;
use chroot_jail_tools::ini::{self, KeyLookup};

#[derive(Parser)]
#[command(name = "iniquery")]
#[command(about = "Print the values of one key in one section of an INI file")]
struct Args {
    /// File to read
    file: PathBuf,
    /// Section name
    section: String,
    /// Key name
    key: String,
}

fn run(args: &Args) -> Result<(), HLError> {
    let file = File::open(&args.file)
        .map_err(|e| map_io_err(e, format!("open {}", args.file.display())))?;
    let mut lookup = KeyLookup::new(&args.section, &args.key);
    let result = ini::parse(file, &mut lookup);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for v in lookup.values.iter() {
        writeln!(out, "{}", v)
            .map_err(|e| map_io_err(e, String::from("stdout")))?;
    }
    result
}

fn main() {
    let args = Args::parse();
    process::exit(match run(&args) {
        Ok(_) => 0,
        Err(e) => {
            writeln!(io::stderr(), "iniquery: {}", e).unwrap();
            1
        }
    });
}
