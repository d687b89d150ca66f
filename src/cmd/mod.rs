//! Subcommands of the `pprofiler` binary.

mod cache_cmd;
mod inspect_cmd;

pub use cache_cmd::*;
pub use inspect_cmd::*;
