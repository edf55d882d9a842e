use crate::batch::{self, BatchTally, ItemResult};
use crate::cli::AnnotateArgs;
use crate::config::{AnnotateAppConfig, build_annotate_config};
use crate::error::Result;
use crate::records::{self, AnnotatedHitRecord, CheckpointWriter};
use crate::utils::progress::CliProgressHandler;
use stcap::{
    core::io::{pdb::PdbFile, traits::MolecularFile},
    engine::{config::AnnotationConfig, motif::MotifHit, progress::ProgressReporter},
    workflows::annotate::{self, AnnotationReport},
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// The hits of one structure, annotated together so the structure is read once.
#[derive(Debug, Clone)]
pub struct StructureHits {
    pub structure_id: String,
    pub hits: Vec<MotifHit>,
}

#[derive(Debug)]
pub enum AnnotateOutcome {
    MissingFile(PathBuf),
    Unreadable(String),
    Annotated(AnnotationReport),
}

/// Groups hits by structure, keeping structures in order of first appearance and
/// hits in table order.
pub fn group_by_structure(hits: Vec<MotifHit>) -> Vec<StructureHits> {
    let mut groups: Vec<StructureHits> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for hit in hits {
        let position = *positions
            .entry(hit.structure_id.clone())
            .or_insert_with(|| {
                groups.push(StructureHits {
                    structure_id: hit.structure_id.clone(),
                    hits: Vec::new(),
                });
                groups.len() - 1
            });
        groups[position].hits.push(hit);
    }
    groups
}

pub async fn run(args: AnnotateArgs) -> Result<()> {
    let app = build_annotate_config(&args)?;

    info!("Reading hits from {:?}", &args.hits);
    let hits = records::read_hits(&args.hits)?;
    let hit_count = hits.len();
    let groups = group_by_structure(hits);

    println!(
        "Annotating {} hit(s) across {} structure(s)...",
        hit_count,
        groups.len()
    );

    let progress = CliProgressHandler::new();
    let tally = annotate_batch(groups, &app, &progress).await?;
    progress.finish(&tally.to_string());

    println!(
        "Annotation complete: {}. Table written to {}",
        tally,
        app.batch.output_path.display()
    );
    Ok(())
}

pub fn annotate_structure(
    structures_dir: &Path,
    group: &StructureHits,
    config: &AnnotationConfig,
    progress: &CliProgressHandler,
) -> AnnotateOutcome {
    let path = records::structure_path(structures_dir, &group.structure_id);
    if !path.is_file() {
        return AnnotateOutcome::MissingFile(path);
    }
    let system = match PdbFile::read_from_path(&path) {
        Ok((system, _)) => system,
        Err(e) => return AnnotateOutcome::Unreadable(e.to_string()),
    };

    let reporter = ProgressReporter::with_callback(progress.get_callback(group.structure_id.clone()));
    AnnotateOutcome::Annotated(annotate::run(&system, &group.hits, config, &reporter))
}

/// Annotates every group and writes the annotated table, checkpointing as it goes.
pub async fn annotate_batch(
    groups: Vec<StructureHits>,
    app: &AnnotateAppConfig,
    progress: &CliProgressHandler,
) -> Result<BatchTally> {
    progress.start_batch("Annotating", groups.len() as u64);

    let mut writer: CheckpointWriter<AnnotatedHitRecord> =
        CheckpointWriter::new(&app.batch.output_path, app.batch.checkpoint_interval);
    let mut tally = BatchTally::default();

    let config = app.annotation;
    let structures_dir = app.batch.structures_dir.clone();
    let worker_progress = progress.clone();

    let abandoned = batch::run_items(
        groups,
        app.batch.jobs,
        app.batch.item_timeout,
        move |group: StructureHits| {
            annotate_structure(&structures_dir, &group, &config, &worker_progress)
        },
        |group, result| {
            let id = &group.structure_id;
            match result {
                ItemResult::Finished(AnnotateOutcome::Annotated(report)) => {
                    if !report.failures.is_empty() {
                        warn!(
                            structure = %id,
                            failed = report.failures.len(),
                            "Some hits could not be annotated and were left out."
                        );
                    }
                    writer.extend(report.annotations.iter().map(AnnotatedHitRecord::from));
                    tally.completed += 1;
                }
                ItemResult::Finished(AnnotateOutcome::MissingFile(path)) => {
                    warn!(structure = %id, "Structure file not found: {:?}", path);
                    tally.skipped += 1;
                }
                ItemResult::Finished(AnnotateOutcome::Unreadable(reason)) => {
                    warn!(structure = %id, "Structure file could not be parsed: {}", reason);
                    tally.skipped += 1;
                }
                ItemResult::TimedOut => {
                    warn!(structure = %id, "Annotation timed out.");
                    tally.timed_out += 1;
                }
                ItemResult::Panicked(reason) => {
                    error!(structure = %id, "Annotation aborted: {}", reason);
                    tally.failed += 1;
                }
            }
            progress.item_finished(id);
            writer.item_done()?;
            Ok(())
        },
    )
    .await?;
    tally.abandoned = abandoned;

    let rows = writer.finish()?;
    info!(rows, %tally, "Annotated table written.");
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{capped_structure, write_structure};
    use crate::config::BatchSettings;
    use stcap::engine::motif::MotifSubtype;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn hit(structure_id: &str, chain_id: char, start_index: isize) -> MotifHit {
        MotifHit {
            structure_id: structure_id.to_string(),
            chain_id,
            start_index,
            subtype: MotifSubtype::C4,
            surface: None,
        }
    }

    #[test]
    fn grouping_keeps_first_appearance_order() {
        let groups = group_by_structure(vec![
            hit("2XYZ", 'A', 5),
            hit("1ABC", 'A', 3),
            hit("2XYZ", 'B', 9),
        ]);
        let ids: Vec<&str> = groups.iter().map(|g| g.structure_id.as_str()).collect();
        assert_eq!(ids, vec!["2XYZ", "1ABC"]);
        let starts: Vec<isize> = groups[0].hits.iter().map(|h| h.start_index).collect();
        assert_eq!(starts, vec![5, 9]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn batch_annotates_hits_and_skips_missing_structures() {
        let dir = tempdir().unwrap();
        let app = AnnotateAppConfig {
            batch: BatchSettings {
                structures_dir: dir.path().join("pdb"),
                output_path: dir.path().join("annotated.csv"),
                jobs: 2,
                checkpoint_interval: 50,
                item_timeout: Duration::from_secs(60),
            },
            annotation: AnnotationConfig::default(),
        };
        write_structure(&app.batch.structures_dir, "1CAP", &capped_structure());

        let groups = group_by_structure(vec![
            hit("1CAP", 'A', 2),
            hit("1CAP", 'Q', 3),
            hit("7MIS", 'A', 5),
        ]);
        let tally = annotate_batch(groups, &app, &CliProgressHandler::new())
            .await
            .unwrap();
        assert_eq!(tally.completed, 1);
        assert_eq!(tally.skipped, 1);

        let mut reader = csv::Reader::from_path(&app.batch.output_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                "structure_id",
                "chain_id",
                "start_index",
                "subtype",
                "surface",
                "sequence",
                "secondary_structure",
                "phi_psi",
            ]
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "1CAP");
        assert_eq!(&rows[0][2], "2");
        assert_eq!(&rows[0][5], "LEU;SER;LEU;ALA;ALA;ALA;LEU");
        assert!(!rows[0][6].is_empty());
        assert!(fs::metadata(&app.batch.output_path).unwrap().len() > 0);
    }
}
