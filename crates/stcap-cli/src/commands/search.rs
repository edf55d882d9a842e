use crate::batch::{self, BatchTally, ItemResult};
use crate::cli::SearchArgs;
use crate::config::{SearchAppConfig, build_search_config};
use crate::error::{CliError, Result};
use crate::records::{self, CheckpointWriter, HitRecord, ManifestEntry};
use crate::utils::progress::CliProgressHandler;
use stcap::{
    core::io::{pdb::PdbFile, traits::MolecularFile},
    engine::{config::SearchConfig, error::EngineError, progress::ProgressReporter},
    workflows::search::{self, SearchOutcome},
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// What happened to one manifest row.
#[derive(Debug)]
pub enum StructureOutcome {
    MissingFile(PathBuf),
    Unreadable(String),
    Searched(SearchOutcome),
    Failed(EngineError),
}

pub async fn run(args: SearchArgs) -> Result<()> {
    if let (Some(start), Some(end)) = (args.start, args.end) {
        if start > end {
            return Err(CliError::Argument(format!(
                "--start ({}) is after --end ({})",
                start, end
            )));
        }
    }
    let app = build_search_config(&args)?;

    info!("Reading manifest from {:?}", &args.manifest);
    let manifest = records::read_manifest(&args.manifest)?;
    let manifest_rows = manifest.len();
    let selected = records::select_rows(manifest, args.start, args.end);

    let skip_ids = match &args.skip_list {
        Some(path) => records::read_skip_list(path)?,
        None => HashSet::new(),
    };
    let (entries, listed): (Vec<_>, Vec<_>) = selected
        .into_iter()
        .partition(|entry| !skip_ids.contains(&entry.structure_id));
    if !listed.is_empty() {
        info!(count = listed.len(), "Rows excluded by the skip list.");
    }

    println!(
        "Searching {} of {} manifest rows with {} job(s)...",
        entries.len(),
        manifest_rows,
        app.batch.jobs
    );

    let progress = CliProgressHandler::new();
    let tally = search_batch(entries, &app, &progress).await?;
    progress.finish(&tally.to_string());

    println!(
        "Search complete for {} row(s): {}. Hits written to {}",
        tally.total(),
        tally,
        app.batch.output_path.display()
    );
    Ok(())
}

/// Loads one structure and searches the requested chain.
pub fn search_structure(
    structures_dir: &Path,
    entry: &ManifestEntry,
    config: &SearchConfig,
    progress: &CliProgressHandler,
) -> StructureOutcome {
    let path = records::structure_path(structures_dir, &entry.structure_id);
    if !path.is_file() {
        return StructureOutcome::MissingFile(path);
    }

    let system = match PdbFile::read_from_path(&path) {
        Ok((system, _)) => system,
        Err(e) => return StructureOutcome::Unreadable(e.to_string()),
    };
    debug!(
        structure = %entry.structure_id,
        atoms = system.atom_count(),
        "Structure loaded"
    );

    let reporter = ProgressReporter::with_callback(progress.get_callback(entry.structure_id.clone()));
    match search::run(&system, &entry.structure_id, entry.chain_id, config, &reporter) {
        Ok(outcome) => StructureOutcome::Searched(outcome),
        Err(e) => StructureOutcome::Failed(e),
    }
}

/// Searches every entry and writes the hits table, checkpointing as it goes.
pub async fn search_batch(
    entries: Vec<ManifestEntry>,
    app: &SearchAppConfig,
    progress: &CliProgressHandler,
) -> Result<BatchTally> {
    progress.start_batch("Searching", entries.len() as u64);

    let mut writer: CheckpointWriter<HitRecord> =
        CheckpointWriter::new(&app.batch.output_path, app.batch.checkpoint_interval);
    let mut tally = BatchTally::default();

    let config = app.search.clone();
    let structures_dir = app.batch.structures_dir.clone();
    let worker_progress = progress.clone();

    let abandoned = batch::run_items(
        entries,
        app.batch.jobs,
        app.batch.item_timeout,
        move |entry: ManifestEntry| {
            search_structure(&structures_dir, &entry, &config, &worker_progress)
        },
        |entry, result| {
            let id = &entry.structure_id;
            match result {
                ItemResult::Finished(StructureOutcome::Searched(SearchOutcome::Completed {
                    hits,
                    stats,
                })) => {
                    info!(
                        structure = %id,
                        chain = %entry.chain_id,
                        hits = stats.hits,
                        surface = stats.surface_hits,
                        "Chain searched."
                    );
                    writer.extend(hits.iter().map(HitRecord::from));
                    tally.completed += 1;
                }
                ItemResult::Finished(StructureOutcome::Searched(SearchOutcome::Skipped(
                    reason,
                ))) => {
                    info!(structure = %id, %reason, "Chain skipped.");
                    tally.skipped += 1;
                }
                ItemResult::Finished(StructureOutcome::MissingFile(path)) => {
                    warn!(structure = %id, "Structure file not found: {:?}", path);
                    tally.skipped += 1;
                }
                ItemResult::Finished(StructureOutcome::Unreadable(reason)) => {
                    warn!(structure = %id, "Structure file could not be parsed: {}", reason);
                    tally.skipped += 1;
                }
                ItemResult::Finished(StructureOutcome::Failed(e)) => {
                    error!(structure = %id, "Search failed: {}", e);
                    tally.failed += 1;
                }
                ItemResult::TimedOut => {
                    warn!(structure = %id, "Search timed out.");
                    tally.timed_out += 1;
                }
                ItemResult::Panicked(reason) => {
                    error!(structure = %id, "Search aborted: {}", reason);
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
    info!(rows, %tally, "Hits table written.");
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{capped_structure, write_structure};
    use crate::config::BatchSettings;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    fn app(dir: &Path) -> SearchAppConfig {
        SearchAppConfig {
            batch: BatchSettings {
                structures_dir: dir.join("pdb"),
                output_path: dir.join("hits.csv"),
                jobs: 2,
                checkpoint_interval: 1,
                item_timeout: Duration::from_secs(60),
            },
            search: SearchConfig::default(),
        }
    }

    fn entry(structure_id: &str, chain_id: char) -> ManifestEntry {
        ManifestEntry {
            structure_id: structure_id.to_string(),
            chain_id,
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn batch_writes_hits_and_skips_what_it_cannot_search() {
        let dir = tempdir().unwrap();
        let app = app(dir.path());
        write_structure(&app.batch.structures_dir, "1CAP", &capped_structure());
        write_structure(&app.batch.structures_dir, "2BAD", "ATOM  garbage\nEND\n");

        let entries = vec![
            entry("1CAP", 'A'),
            entry("9NOP", 'A'),
            entry("1CAP", 'Z'),
            entry("2BAD", 'A'),
        ];
        let tally = search_batch(entries, &app, &CliProgressHandler::new())
            .await
            .unwrap();

        assert_eq!(
            tally,
            BatchTally {
                completed: 1,
                skipped: 3,
                timed_out: 0,
                failed: 0,
                abandoned: 0,
            }
        );
        let content = fs::read_to_string(&app.batch.output_path).unwrap();
        assert_eq!(
            content.lines().collect::<Vec<_>>(),
            vec![
                "structure_id,chain_id,start_index,subtype,surface",
                "1CAP,A,2,C4,",
            ]
        );
    }

    #[test]
    fn missing_and_unreadable_files_are_distinguished() {
        let dir = tempdir().unwrap();
        let pdb_dir = dir.path().join("pdb");
        write_structure(&pdb_dir, "2BAD", "ATOM  garbage\nEND\n");
        let config = SearchConfig::default();
        let progress = CliProgressHandler::new();

        assert!(matches!(
            search_structure(&pdb_dir, &entry("9NOP", 'A'), &config, &progress),
            StructureOutcome::MissingFile(_)
        ));
        assert!(matches!(
            search_structure(&pdb_dir, &entry("2BAD", 'A'), &config, &progress),
            StructureOutcome::Unreadable(_)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn empty_batch_still_writes_a_header() {
        let dir = tempdir().unwrap();
        let app = app(dir.path());
        let tally = search_batch(Vec::new(), &app, &CliProgressHandler::new())
            .await
            .unwrap();
        assert_eq!(tally.total(), 0);
        assert!(app.batch.output_path.is_file());
    }
}
