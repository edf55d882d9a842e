use indicatif::{ProgressBar, ProgressState, ProgressStyle};
use stcap::engine::progress::{Progress, ProgressCallback};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// One bar for the whole batch. Per-structure workflow events arrive from worker
/// threads through [`CliProgressHandler::get_callback`]; hits are printed above the
/// bar, phase changes only show up in the debug log.
#[derive(Clone)]
pub struct CliProgressHandler {
    pb: Arc<Mutex<ProgressBar>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        let pb = ProgressBar::new(0)
            .with_style(Self::bar_style())
            .with_message("Waiting...");
        pb.set_draw_target(indicatif::ProgressDrawTarget::stderr());
        pb.finish_and_clear();

        Self {
            pb: Arc::new(Mutex::new(pb)),
        }
    }

    fn with_bar(&self, f: impl FnOnce(&mut ProgressBar)) {
        match self.pb.lock() {
            Ok(mut guard) => f(&mut guard),
            Err(_) => warn!("Progress bar mutex was poisoned. Cannot update progress."),
        }
    }

    pub fn start_batch(&self, label: &str, total_items: u64) {
        self.with_bar(|pb| {
            pb.reset();
            pb.set_length(total_items);
            pb.set_position(0);
            pb.set_message(label.to_string());
        });
    }

    pub fn item_finished(&self, structure_id: &str) {
        self.with_bar(|pb| {
            pb.inc(1);
            pb.set_message(structure_id.to_string());
        });
    }

    pub fn note(&self, message: &str) {
        self.with_bar(|pb| pb.println(format!("  {}", message)));
    }

    pub fn finish(&self, summary: &str) {
        self.with_bar(|pb| pb.finish_with_message(format!("✓ {}", summary)));
    }

    /// Callback for one structure's workflow run.
    pub fn get_callback(&self, structure_id: String) -> ProgressCallback<'static> {
        let handler = self.clone();

        Box::new(move |progress: Progress| match progress {
            Progress::HitFound {
                chain_id,
                start_index,
                subtype,
            } => {
                handler.note(&format!(
                    "{} {}:{} {}",
                    structure_id, chain_id, start_index, subtype
                ));
            }
            Progress::Message(msg) => handler.note(&format!("{}: {}", structure_id, msg)),
            Progress::PhaseStart { name } => {
                debug!(structure = %structure_id, phase = name, "Phase started");
            }
            Progress::PhaseFinish
            | Progress::TaskStart { .. }
            | Progress::TaskIncrement
            | Progress::TaskFinish => {}
        })
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg:<20} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key(
                "eta",
                |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                    let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
                },
            )
            .progress_chars("##-")
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}
