use super::defaults::DefaultsConfig;
use super::file::{FileAveraging, FileConfig, FileField, FileLeadingSlot};
use super::models::AppConfig;
use crate::cli::ConfigArgs;
use crate::error::{CliError, Result};
use crate::utils::parser::{self, ParseError};
use hnfeat::engine::config as core_config;
use hnfeat::workflows::featurize::EnsembleSizing;
use std::path::PathBuf;
use tracing::debug;

/// Ensemble size handed to the library when each input supplies its own.
const PLACEHOLDER_ENSEMBLE_SIZE: usize = 1;

/// Resolves the final configuration with precedence CLI > `--set` > file > defaults.
pub fn build_config(args: &ConfigArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let search_file = file_config.search.take().unwrap_or_default();
    let frame_file = file_config.frame.take().unwrap_or_default();
    let transform_file = file_config.transform.take().unwrap_or_default();
    let aggregation_file = file_config.aggregation.take().unwrap_or_default();
    let encoding_file = file_config.encoding.take().unwrap_or_default();
    let input_file = file_config.input.take().unwrap_or_default();

    let ensemble_size = args.ensemble_size.or(aggregation_file.ensemble_size);
    let sizing = if ensemble_size.is_some() {
        EnsembleSizing::Configured
    } else {
        EnsembleSizing::PerInput
    };

    let include_confidence = match (
        args.include_confidence.with_confidence,
        args.include_confidence.no_confidence,
    ) {
        (true, false) => true,
        (false, true) => false,
        _ => encoding_file
            .include_confidence
            .unwrap_or(defaults.include_confidence),
    };

    let fields = args
        .fields
        .clone()
        .or(encoding_file.fields)
        .map(|fields| fields.into_iter().map(Into::into).collect())
        .unwrap_or(defaults.fields);

    let core_config = core_config::FeaturizationConfigBuilder::new()
        .neighbor_count(
            args.neighbor_count
                .or(search_file.neighbor_count)
                .unwrap_or(defaults.neighbor_count),
        )
        .query_count(
            args.query_count
                .or(search_file.query_count)
                .unwrap_or(defaults.query_count),
        )
        .exclude_hydrogens(
            args.exclude_hydrogens
                || search_file
                    .exclude_hydrogens
                    .unwrap_or(defaults.exclude_hydrogens),
        )
        .bond_cutoff(
            args.bond_cutoff
                .or(frame_file.bond_cutoff)
                .unwrap_or(defaults.bond_cutoff),
        )
        .min_displacement(
            transform_file
                .min_displacement
                .unwrap_or(defaults.min_displacement),
        )
        .scaling_constant(
            args.scaling_constant
                .or(transform_file.scaling_constant)
                .unwrap_or(defaults.scaling_constant),
        )
        .ensemble_size(ensemble_size.unwrap_or(PLACEHOLDER_ENSEMBLE_SIZE))
        .top_k(
            args.top_k
                .or(aggregation_file.top_k)
                .unwrap_or(defaults.top_k),
        )
        .averaging(
            args.averaging
                .or(aggregation_file.averaging)
                .map(Into::into)
                .unwrap_or(defaults.averaging),
        )
        .fields(fields)
        .leading_slot(
            args.leading_slot
                .or(encoding_file.leading_slot)
                .map(Into::into)
                .unwrap_or(defaults.leading_slot),
        )
        .include_confidence(include_confidence)
        .chain_id(args.chain.or(input_file.chain_id))
        .chemistry_map_path(args.chemistry_map.clone().or(input_file.chemistry_map))
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    debug!(?sizing, "Resolved featurization configuration: {:?}", core_config);
    Ok(AppConfig {
        core_config,
        sizing,
    })
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        apply_set_value(&mut config, kv_pair).map_err(|e| CliError::Config(e.to_string()))?;
    }
    Ok(config)
}

fn apply_set_value(config: &mut FileConfig, kv_pair: &str) -> std::result::Result<(), ParseError> {
    const INTEGER: &str = "a non-negative integer";
    const FLOAT: &str = "a number";
    const BOOL: &str = "true or false";

    let (key, value) = parser::parse_assignment(kv_pair)?;

    match key {
        "search.neighbor-count" => {
            config.search.get_or_insert_with(Default::default).neighbor_count =
                Some(parser::parse_value(key, value, INTEGER)?);
        }
        "search.query-count" => {
            config.search.get_or_insert_with(Default::default).query_count =
                Some(parser::parse_value(key, value, INTEGER)?);
        }
        "search.exclude-hydrogens" => {
            config.search.get_or_insert_with(Default::default).exclude_hydrogens =
                Some(parser::parse_value(key, value, BOOL)?);
        }
        "frame.bond-cutoff" => {
            config.frame.get_or_insert_with(Default::default).bond_cutoff =
                Some(parser::parse_value(key, value, FLOAT)?);
        }
        "transform.min-displacement" => {
            config.transform.get_or_insert_with(Default::default).min_displacement =
                Some(parser::parse_value(key, value, FLOAT)?);
        }
        "transform.scaling-constant" => {
            config.transform.get_or_insert_with(Default::default).scaling_constant =
                Some(parser::parse_value(key, value, FLOAT)?);
        }
        "aggregation.ensemble-size" => {
            config.aggregation.get_or_insert_with(Default::default).ensemble_size =
                Some(parser::parse_value(key, value, INTEGER)?);
        }
        "aggregation.top-k" => {
            config.aggregation.get_or_insert_with(Default::default).top_k =
                Some(parser::parse_value(key, value, INTEGER)?);
        }
        "aggregation.averaging" => {
            config.aggregation.get_or_insert_with(Default::default).averaging =
                Some(parser::parse_enum::<FileAveraging>(key, value, "an averaging policy")?);
        }
        "encoding.fields" => {
            config.encoding.get_or_insert_with(Default::default).fields = Some(
                parser::parse_enum_list::<FileField>(key, value, "comma-separated field names")?,
            );
        }
        "encoding.leading-slot" => {
            config.encoding.get_or_insert_with(Default::default).leading_slot =
                Some(parser::parse_enum::<FileLeadingSlot>(key, value, "a slot layout")?);
        }
        "encoding.include-confidence" => {
            config.encoding.get_or_insert_with(Default::default).include_confidence =
                Some(parser::parse_value(key, value, BOOL)?);
        }
        "input.chain-id" => {
            config.input.get_or_insert_with(Default::default).chain_id =
                Some(parser::parse_value(key, value, "a single character")?);
        }
        "input.chemistry-map" => {
            config.input.get_or_insert_with(Default::default).chemistry_map =
                Some(PathBuf::from(value));
        }
        _ => {
            return Err(ParseError::InvalidValue {
                key: "--set".to_string(),
                value: key.to_string(),
                expected: "a supported configuration key",
            });
        }
    }
    Ok(())
}
