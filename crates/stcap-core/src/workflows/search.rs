use crate::core::models::system::MolecularSystem;
use crate::engine::config::SearchConfig;
use crate::engine::error::EngineError;
use crate::engine::interface::chain_interface_indices;
use crate::engine::motif::{MotifHit, ResidueOutcome, scan_chain};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::surface::annotate_surface;
use crate::workflows::prepare::{self, SkipReason};
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub candidates: usize,
    pub hits: usize,
    pub unmatched: usize,
    pub skipped: usize,
    pub surface_hits: usize,
    pub hydrogens_added: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Completed { hits: Vec<MotifHit>, stats: ScanStats },
    Skipped(SkipReason),
}

/// Searches one chain of a structure for Serine/Threonine capping loops.
///
/// # Arguments
///
/// * `system` - The structure as read from file; it is not modified.
/// * `structure_id` - Identifier copied into every hit.
/// * `chain_id` - The chain to scan.
/// * `config` - Contact thresholds, chain filters and interface settings.
/// * `reporter` - Receives phase and hit events.
///
/// # Return
///
/// [`SearchOutcome::Completed`] with the hits in residue order, or
/// [`SearchOutcome::Skipped`] when the chain is absent or fails a filter.
///
/// # Errors
///
/// Returns [`EngineError`] if the interface calculation fails.
#[instrument(skip_all, name = "search_workflow", fields(structure = structure_id, chain = %chain_id))]
pub fn run(
    system: &MolecularSystem,
    structure_id: &str,
    chain_id: char,
    config: &SearchConfig,
    reporter: &ProgressReporter,
) -> Result<SearchOutcome, EngineError> {
    // === Phase 0: Preparation and chain filters ===
    let prepared = match prepare::run(system, chain_id, &config.chain_filter, reporter) {
        Ok(prepared) => prepared,
        Err(reason) => {
            info!(%reason, "Chain skipped.");
            return Ok(SearchOutcome::Skipped(reason));
        }
    };

    // === Phase 1: Motif scan ===
    let scan = reporter.phase("Motif scan", || {
        scan_chain(&prepared.system, structure_id, prepared.target, config)
    });
    for hit in &scan.hits {
        reporter.report(Progress::HitFound {
            chain_id: hit.chain_id,
            start_index: hit.start_index,
            subtype: hit.subtype,
        });
    }

    let mut stats = ScanStats {
        candidates: scan.candidates(),
        hits: scan.hits.len(),
        unmatched: scan
            .outcomes
            .iter()
            .filter(|(_, o)| matches!(o, ResidueOutcome::NoMatchingRule(_)))
            .count(),
        skipped: scan.skipped(),
        surface_hits: 0,
        hydrogens_added: prepared.hydrogens_added,
    };
    let mut hits = scan.hits;

    // === Phase 2: Interface detection and surface flags ===
    if !hits.is_empty() && !config.skip_interface {
        let indices = reporter.phase("Interface detection", || {
            chain_interface_indices(&prepared.system, chain_id, &config.interface)
        })?;
        stats.surface_hits = annotate_surface(&mut hits, &indices);
    }

    info!(
        candidates = stats.candidates,
        hits = stats.hits,
        surface = stats.surface_hits,
        "Search complete."
    );
    Ok(SearchOutcome::Completed { hits, stats })
}
