use stcap::engine::config::{AnnotationConfig, SearchConfig};
use std::path::PathBuf;
use std::time::Duration;

/// How a batch is run, independent of what each item computes.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSettings {
    pub structures_dir: PathBuf,
    pub output_path: PathBuf,
    pub jobs: usize,
    pub checkpoint_interval: usize,
    pub item_timeout: Duration,
}

pub struct SearchAppConfig {
    pub batch: BatchSettings,
    pub search: SearchConfig,
}

pub struct AnnotateAppConfig {
    pub batch: BatchSettings,
    pub annotation: AnnotationConfig,
}
