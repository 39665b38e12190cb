pub mod config;
pub mod source;

pub use config::Config;
pub use source::{HtmlSnapshotSource, PageInfo, SnapshotSource};
