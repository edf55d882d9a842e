/// Values the batch driver falls back to when neither the config file nor the
/// command line sets them. Search thresholds default inside the core builder.
pub struct DefaultsConfig {
    pub jobs: usize,
    pub checkpoint_interval: usize,
    pub item_timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            jobs: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            checkpoint_interval: 50,
            item_timeout_secs: 300,
        }
    }
}
