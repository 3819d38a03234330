//! Physical layout resolution.
//!
//! The external table is declared over the dataset root: the ancestor
//! directory above any `column=value` partition segments. The writer does
//! not report that directory, so it is reconstructed from a sampled data
//! file key, the same reconstruction an external engine has to rely on.

use crate::config::DATA_FILE_SUFFIX;
use crate::error::CheckError;

/// Pick a data file among the store keys of a dataset
pub fn find_data_file<'a>(dataset_id: &str, keys: &'a [String]) -> Result<&'a str, CheckError> {
    keys.iter()
        .map(String::as_str)
        .find(|key| key.ends_with(DATA_FILE_SUFFIX))
        .ok_or_else(|| CheckError::NoDataFileFound {
            dataset: dataset_id.to_string(),
            suffix: DATA_FILE_SUFFIX,
        })
}

/// Resolve the dataset root from one discovered file key.
///
/// Unpartitioned datasets root at the file's parent directory. For a
/// partitioned dataset, each partition column contributes one `name=value`
/// segment between root and file: take the rightmost segment carrying each
/// column's `name=` prefix, cut the key just before it, and keep the
/// shortest (most ancestral) cut across all columns.
///
/// A partition value that itself embeds another column's `name=` text makes
/// the rightmost match ambiguous; that case is not detected here.
pub fn resolve_dataset_root(
    file_key: &str,
    partition_columns: &[String],
) -> Result<String, CheckError> {
    let parent = match file_key.rfind('/') {
        Some(idx) => &file_key[..idx],
        None => "",
    };
    if partition_columns.is_empty() {
        return Ok(parent.to_string());
    }

    let mut root: Option<&str> = None;
    for column in partition_columns {
        let needle = format!("{column}=");
        let mut cut = None;
        let mut offset = 0;
        for segment in parent.split('/') {
            if segment.starts_with(&needle) {
                cut = Some(offset);
            }
            offset += segment.len() + 1;
        }
        let cut = cut.ok_or_else(|| CheckError::AmbiguousPartitionRoot {
            key: file_key.to_string(),
            column: column.clone(),
        })?;
        let prefix = parent[..cut].trim_end_matches('/');
        root = Some(match root {
            Some(current) if current.len() <= prefix.len() => current,
            _ => prefix,
        });
    }

    Ok(root.unwrap_or("").to_string())
}
