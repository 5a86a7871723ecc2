//! Shared pieces of the `albedo-*` command-line tools.

pub mod args;
pub mod output;
