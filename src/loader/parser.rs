use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::error::Result;

/// Parses a JSON file into a given type `T`.
///
/// Errors are automatically converted into `crate::error::Error` variants:
/// - `Error::IoError` if the file cannot be read.
/// - `Error::DeserializationError` if the JSON is malformed.
pub fn parse_json_file<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let data = fs::read_to_string(file_path)?;
    let parsed_data: T = serde_json::from_str(&data)?;

    Ok(parsed_data)
}

/// Parses a YAML file into a given type `T`.
pub fn parse_yaml_file<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let data = fs::read_to_string(file_path)?;
    let parsed_data: T = serde_yaml::from_str(&data)?;

    Ok(parsed_data)
}

/// Parses a configuration file, choosing the format by extension.
///
/// `.json` files are read as JSON, everything else as YAML (a superset that also
/// accepts most JSON documents).
pub fn parse_config_file<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let is_json = file_path.extension().and_then(|ext| ext.to_str()).is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json { parse_json_file(file_path) } else { parse_yaml_file(file_path) }
}
