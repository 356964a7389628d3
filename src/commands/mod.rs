//! # CLI Command Implementations
//!
//! Each subcommand of `bulk-pr` lives in its own file with:
//! - an `Args` struct derived with `clap`,
//! - an `execute` function that runs the command by calling into the
//!   `bulk_pr` library and prints the results.

pub mod apply;
pub mod completions;
pub mod run;
pub mod validate;
