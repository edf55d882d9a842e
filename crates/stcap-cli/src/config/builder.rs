use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileGranularity};
use super::models::{AnnotateAppConfig, BatchSettings, SearchAppConfig};
use crate::cli::{AnnotateArgs, BatchArgs, SearchArgs};
use crate::error::{CliError, Result};
use stcap::engine::config::{self as core_config, AnnotationConfig, SearchConfigBuilder};
use stcap::engine::motif::CapResidue;
use std::str::FromStr;
use std::time::Duration;

pub fn build_search_config(args: &SearchArgs) -> Result<SearchAppConfig> {
    let mut file_config = load_file_config(&args.batch)?;
    let batch = merge_batch(&args.batch, &file_config)?;

    let mut builder = SearchConfigBuilder::new();

    if let Some(names) = file_config.cap_residues.take() {
        builder = builder.cap_residues(parse_cap_residues(&names)?);
    }

    let contacts = file_config.contacts.take().unwrap_or_default();
    if let Some(v) = args.max_distance.or(contacts.max_distance) {
        builder = builder.max_distance(v);
    }
    if let Some(v) = args.min_angle.or(contacts.min_angle) {
        builder = builder.min_angle(v);
    }
    if let Some(v) = contacts.hydrogen_search_radius {
        builder = builder.hydrogen_search_radius(v);
    }

    let filter = file_config.chain_filter.take().unwrap_or_default();
    if let Some(v) = filter.min_residues {
        builder = builder.min_residues(v);
    }
    if let Some(v) = filter.min_atoms_per_residue {
        builder = builder.min_atoms_per_residue(v);
    }

    let interface = file_config.interface.take().unwrap_or_default();
    if let Some(v) = args.interface_cutoff.or(interface.cutoff) {
        builder = builder.interface_cutoff(v);
    }
    if let Some(g) = interface.granularity {
        builder = builder.granularity(g.into());
    }
    if let Some(v) = interface.probe_radius {
        builder = builder.probe_radius(v);
    }
    if let Some(v) = interface.sphere_points {
        builder = builder.sphere_points(v);
    }
    if let Some(v) = interface.include_hydrogens {
        builder = builder.include_hydrogens(v);
    }
    let skip_interface = args.no_interface || interface.skip.unwrap_or(false);
    builder = builder.skip_interface(skip_interface);

    let search = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    Ok(SearchAppConfig { batch, search })
}

pub fn build_annotate_config(args: &AnnotateArgs) -> Result<AnnotateAppConfig> {
    let mut file_config = load_file_config(&args.batch)?;
    let batch = merge_batch(&args.batch, &file_config)?;

    let defaults = AnnotationConfig::default();
    let file_annotation = file_config.annotation.take().unwrap_or_default();
    let annotation = AnnotationConfig {
        sequence_window: merge_window(
            "annotation.sequence-window",
            file_annotation.sequence_window.map(Into::into),
            defaults.sequence_window,
        )?,
        secondary_structure_window: merge_window(
            "annotation.secondary-structure-window",
            file_annotation.secondary_structure_window.map(Into::into),
            defaults.secondary_structure_window,
        )?,
        dihedral_window: merge_window(
            "annotation.dihedral-window",
            file_annotation.dihedral_window.map(Into::into),
            defaults.dihedral_window,
        )?,
    };

    Ok(AnnotateAppConfig { batch, annotation })
}

fn load_file_config(args: &BatchArgs) -> Result<FileConfig> {
    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };
    apply_set_values(file_config, &args.set_values)
}

fn merge_batch(args: &BatchArgs, file_config: &FileConfig) -> Result<BatchSettings> {
    let defaults = DefaultsConfig::default();
    let file_batch = file_config.batch.clone().unwrap_or_default();

    let jobs = args.jobs.or(file_batch.jobs).unwrap_or(defaults.jobs);
    let checkpoint_interval = args
        .checkpoint_interval
        .or(file_batch.checkpoint_interval)
        .unwrap_or(defaults.checkpoint_interval);
    let item_timeout_secs = args
        .item_timeout_secs
        .or(file_batch.item_timeout_secs)
        .unwrap_or(defaults.item_timeout_secs);

    if jobs == 0 {
        return Err(CliError::Config("`jobs` must be at least 1".to_string()));
    }
    if checkpoint_interval == 0 {
        return Err(CliError::Config(
            "`checkpoint-interval` must be at least 1".to_string(),
        ));
    }
    if item_timeout_secs == 0 {
        return Err(CliError::Config(
            "`item-timeout-secs` must be at least 1".to_string(),
        ));
    }

    Ok(BatchSettings {
        structures_dir: args.structures.clone(),
        output_path: args.output.clone(),
        jobs,
        checkpoint_interval,
        item_timeout: Duration::from_secs(item_timeout_secs),
    })
}

fn merge_window(
    key: &str,
    file_val: Option<core_config::OffsetWindow>,
    default: core_config::OffsetWindow,
) -> Result<core_config::OffsetWindow> {
    let window = file_val.unwrap_or(default);
    if window.start > window.end {
        return Err(CliError::Config(format!(
            "`{}` starts after it ends: [{}, {}]",
            key, window.start, window.end
        )));
    }
    Ok(window)
}

fn parse_cap_residues(names: &[String]) -> Result<Vec<CapResidue>> {
    names
        .iter()
        .map(|name| {
            CapResidue::from_str(name)
                .map_err(|_| CliError::Config(format!("Unsupported cap residue: '{}'", name)))
        })
        .collect()
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value)))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value_str)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        };

        match key {
            "cap-residues" => {
                config.cap_residues = Some(
                    value_str
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect(),
                );
            }
            "contacts.max-distance" => {
                config.contacts.get_or_insert_with(Default::default).max_distance =
                    Some(parse_value(key, value_str, "float")?);
            }
            "contacts.min-angle" => {
                config.contacts.get_or_insert_with(Default::default).min_angle =
                    Some(parse_value(key, value_str, "float")?);
            }
            "contacts.hydrogen-search-radius" => {
                config
                    .contacts
                    .get_or_insert_with(Default::default)
                    .hydrogen_search_radius = Some(parse_value(key, value_str, "float")?);
            }
            "chain-filter.min-residues" => {
                config
                    .chain_filter
                    .get_or_insert_with(Default::default)
                    .min_residues = Some(parse_value(key, value_str, "integer")?);
            }
            "chain-filter.min-atoms-per-residue" => {
                config
                    .chain_filter
                    .get_or_insert_with(Default::default)
                    .min_atoms_per_residue = Some(parse_value(key, value_str, "float")?);
            }
            "interface.cutoff" => {
                config.interface.get_or_insert_with(Default::default).cutoff =
                    Some(parse_value(key, value_str, "float")?);
            }
            "interface.granularity" => {
                let granularity = match value_str.trim() {
                    "atom" => FileGranularity::Atom,
                    "residue" => FileGranularity::Residue,
                    other => {
                        return Err(CliError::Config(format!(
                            "Invalid value for {}: '{}' (expected 'atom' or 'residue')",
                            key, other
                        )));
                    }
                };
                config.interface.get_or_insert_with(Default::default).granularity =
                    Some(granularity);
            }
            "interface.probe-radius" => {
                config.interface.get_or_insert_with(Default::default).probe_radius =
                    Some(parse_value(key, value_str, "float")?);
            }
            "interface.sphere-points" => {
                config.interface.get_or_insert_with(Default::default).sphere_points =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "interface.include-hydrogens" => {
                config
                    .interface
                    .get_or_insert_with(Default::default)
                    .include_hydrogens = Some(parse_value(key, value_str, "boolean")?);
            }
            "interface.skip" => {
                config.interface.get_or_insert_with(Default::default).skip =
                    Some(parse_value(key, value_str, "boolean")?);
            }
            "batch.jobs" => {
                config.batch.get_or_insert_with(Default::default).jobs =
                    Some(parse_value(key, value_str, "integer")?);
            }
            "batch.checkpoint-interval" => {
                config
                    .batch
                    .get_or_insert_with(Default::default)
                    .checkpoint_interval = Some(parse_value(key, value_str, "integer")?);
            }
            "batch.item-timeout-secs" => {
                config
                    .batch
                    .get_or_insert_with(Default::default)
                    .item_timeout_secs = Some(parse_value(key, value_str, "integer")?);
            }
            _ => {
                return Err(CliError::Config(format!(
                    "Unsupported configuration key for --set: '{}'",
                    key
                )));
            }
        }
    }
    Ok(config)
}
