//! Shared code for the chroot launcher and its helper programs.

#![cfg(unix)]

extern crate nix;
extern crate libc;

mod err;
pub use err::*;

pub mod ini;
pub mod config;
pub mod personality;
pub mod copyin;
pub mod quote;
pub mod identity;
pub mod environ;
pub mod audit;
pub mod host;
pub mod launch;
