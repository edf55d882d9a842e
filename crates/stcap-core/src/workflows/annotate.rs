use crate::core::models::system::MolecularSystem;
use crate::engine::annotation::{DsspAssigner, HitAnnotation, annotate_hit};
use crate::engine::config::AnnotationConfig;
use crate::engine::error::EngineError;
use crate::engine::motif::MotifHit;
use crate::engine::progress::{Progress, ProgressReporter};
use tracing::{info, instrument, warn};

#[derive(Debug, Default)]
pub struct AnnotationReport {
    pub annotations: Vec<HitAnnotation>,
    pub failures: Vec<(MotifHit, EngineError)>,
}

/// Annotates the hits of one structure.
///
/// Secondary structure is assigned once for the whole structure. A hit that cannot
/// be annotated is recorded in [`AnnotationReport::failures`] and the rest go on.
#[instrument(skip_all, name = "annotate_workflow", fields(hits = hits.len()))]
pub fn run(
    system: &MolecularSystem,
    hits: &[MotifHit],
    config: &AnnotationConfig,
    reporter: &ProgressReporter,
) -> AnnotationReport {
    let assigner = reporter.phase("Secondary structure", || DsspAssigner::new(system));

    reporter.report(Progress::TaskStart {
        total_steps: hits.len() as u64,
    });
    let mut report = AnnotationReport::default();
    for hit in hits {
        match annotate_hit(system, hit, &assigner, config) {
            Ok(annotation) => report.annotations.push(annotation),
            Err(e) => {
                warn!(
                    structure = %hit.structure_id,
                    chain = %hit.chain_id,
                    residue = hit.start_index,
                    error = %e,
                    "Hit could not be annotated."
                );
                report.failures.push((hit.clone(), e));
            }
        }
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);

    info!(
        annotated = report.annotations.len(),
        failed = report.failures.len(),
        "Annotation complete."
    );
    report
}
