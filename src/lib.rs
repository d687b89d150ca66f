//! pprofiler: replay and inspect line-level execution profiles.

mod aggregate;
mod cache;
mod cmd;
mod config;
mod error;
mod fsutil;
mod highlight;
mod model;
mod query;
mod render;
mod resolve;

pub use aggregate::*;
pub use cache::*;
pub use cmd::*;
pub use config::*;
pub use error::*;
pub use fsutil::*;
pub use highlight::*;
pub use model::*;
pub use query::*;
pub use render::*;
pub use resolve::*;
