//! Command-line surface of the `objinfo` binary

pub mod args;
pub mod output;

pub use args::{Args, BackendArg, Command};
pub use output::ObjectReport;
