//! Front-end for the tinyasm teaching machine
//!
//! Runs programs either in-process or on a remote execution backend, and keeps
//! the console log and state panels a user looks at.

pub mod backend;
pub mod client;
pub mod console;
pub mod protocol;
pub mod transport;
