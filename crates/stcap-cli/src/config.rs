//! Layered configuration: built-in defaults, then the TOML file, then command-line
//! flags, then `-S key=value` overrides.

mod builder;
mod defaults;
mod file;
mod models;

pub use builder::{build_annotate_config, build_search_config};
pub use models::{AnnotateAppConfig, BatchSettings, SearchAppConfig};
