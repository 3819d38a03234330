//! Parquet dataset writer and baseline reader.
//!
//! Datasets are persisted hive-style: one directory level per partition
//! column, named `col=value`, with the partition columns removed from the
//! file payload. The reader reverses that layout, parsing the partition
//! values back out of the directory names, and is the trusted source of the
//! comparison baseline.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::*;
use arrow::compute;
use arrow::datatypes::{
    DataType, Date32Type, Field, Int8Type, Int16Type, Int32Type, Int64Type, Schema, UInt8Type,
    UInt16Type, UInt32Type,
};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::file::properties::WriterProperties;
use tracing::info;
use uuid::Uuid;

use crate::config::{DATA_FILE_SUFFIX, HIVE_DATE_FORMAT};
use crate::dataset::store::Store;
use crate::error::CheckError;

/// Handle to a stored dataset, returned by [`store_dataset`]
#[derive(Debug, Clone)]
pub struct DatasetHandle {
    pub dataset_id: String,
    /// Partition column names with their in-memory types, in layout order
    pub partitions: Vec<(String, DataType)>,
}

/// Persist record batches as a Parquet dataset under `dataset_id`.
///
/// Every batch becomes at least one file; with partition columns, each batch
/// is split by distinct partition value combination and one file is written
/// per combination, under `col=value` directories. Partition columns do not
/// appear in the file payload.
pub fn store_dataset(
    store: &dyn Store,
    dataset_id: &str,
    batches: &[RecordBatch],
    partition_columns: &[String],
) -> Result<DatasetHandle> {
    let first = match batches.first() {
        Some(batch) => batch,
        None => bail!("cannot store an empty dataset: no batches given"),
    };
    if batches.iter().any(|b| b.schema() != first.schema()) {
        bail!("all batches of a dataset must share one schema");
    }

    let schema = first.schema();
    let mut partitions = Vec::with_capacity(partition_columns.len());
    for name in partition_columns {
        let field = schema
            .fields()
            .iter()
            .find(|f| f.name() == name)
            .ok_or_else(|| CheckError::MissingColumn {
                column: name.clone(),
            })?;
        partitions.push((name.clone(), field.data_type().clone()));
    }
    let payload_indices: Vec<usize> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| !partition_columns.contains(f.name()))
        .map(|(idx, _)| idx)
        .collect();

    let mut files_written = 0usize;
    for batch in batches {
        if partition_columns.is_empty() {
            let key = format!("{dataset_id}/{}{DATA_FILE_SUFFIX}", Uuid::new_v4());
            write_file(store, &key, batch)?;
            files_written += 1;
            continue;
        }

        for (values, group) in partition_groups(batch, partition_columns)? {
            let dirs: Vec<String> = partition_columns
                .iter()
                .zip(&values)
                .map(|(name, value)| format!("{name}={value}"))
                .collect();
            let key = format!(
                "{dataset_id}/{}/{}{DATA_FILE_SUFFIX}",
                dirs.join("/"),
                Uuid::new_v4()
            );
            let payload = group
                .project(&payload_indices)
                .context("failed to strip partition columns from the payload")?;
            write_file(store, &key, &payload)?;
            files_written += 1;
        }
    }

    info!(dataset_id, files_written, "stored dataset");
    Ok(DatasetHandle {
        dataset_id: dataset_id.to_string(),
        partitions,
    })
}

impl DatasetHandle {
    /// All store keys under this dataset
    pub fn file_keys(&self, store: &dyn Store) -> Result<Vec<String>> {
        store.iter_keys(&self.dataset_id)
    }

    /// Read the whole dataset back into one batch, partition columns
    /// reattached from the directory names.
    pub fn read_table(&self, store: &dyn Store) -> Result<RecordBatch> {
        let keys = self.file_keys(store)?;
        let data_keys: Vec<&String> = keys
            .iter()
            .filter(|key| key.ends_with(DATA_FILE_SUFFIX))
            .collect();
        if data_keys.is_empty() {
            return Err(CheckError::NoDataFileFound {
                dataset: self.dataset_id.clone(),
                suffix: DATA_FILE_SUFFIX,
            }
            .into());
        }

        let mut pieces = Vec::new();
        for key in data_keys {
            let values = self.partition_values_of(key)?;
            for batch in read_parquet_file(&store.location(key))? {
                pieces.push(self.attach_partitions(&batch, &values)?);
            }
        }
        if pieces.is_empty() {
            bail!("dataset `{}` contains no rows", self.dataset_id);
        }

        let schema = pieces[0].schema();
        compute::concat_batches(&schema, &pieces).context("failed to concatenate dataset files")
    }

    /// Parse this dataset's partition values out of a file key
    fn partition_values_of(&self, key: &str) -> Result<Vec<String>> {
        let parent = key.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
        self.partitions
            .iter()
            .map(|(name, _)| {
                let needle = format!("{name}=");
                parent
                    .split('/')
                    .rev()
                    .find_map(|segment| segment.strip_prefix(needle.as_str()))
                    .map(str::to_string)
                    .ok_or_else(|| {
                        CheckError::AmbiguousPartitionRoot {
                            key: key.to_string(),
                            column: name.clone(),
                        }
                        .into()
                    })
            })
            .collect()
    }

    fn attach_partitions(&self, batch: &RecordBatch, values: &[String]) -> Result<RecordBatch> {
        if self.partitions.is_empty() {
            return Ok(batch.clone());
        }
        let mut fields: Vec<Field> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        let mut arrays = batch.columns().to_vec();
        for ((name, data_type), raw) in self.partitions.iter().zip(values) {
            fields.push(Field::new(name, data_type.clone(), false));
            arrays.push(partition_array(name, data_type, raw, batch.num_rows())?);
        }
        RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
            .context("failed to reattach partition columns")
    }
}

/// Split a batch into per-partition-value groups, deterministically ordered
fn partition_groups(
    batch: &RecordBatch,
    partition_columns: &[String],
) -> Result<Vec<(Vec<String>, RecordBatch)>> {
    let columns: Vec<&ArrayRef> = partition_columns
        .iter()
        .map(|name| {
            batch.column_by_name(name).ok_or_else(|| {
                CheckError::MissingColumn {
                    column: name.clone(),
                }
                .into()
            })
        })
        .collect::<Result<_>>()?;

    let mut groups: BTreeMap<Vec<String>, Vec<u32>> = BTreeMap::new();
    for row in 0..batch.num_rows() {
        let values = columns
            .iter()
            .zip(partition_columns)
            .map(|(column, name)| render_partition_value(name, column, row))
            .collect::<Result<Vec<String>>>()?;
        groups.entry(values).or_default().push(row as u32);
    }

    groups
        .into_iter()
        .map(|(values, rows)| {
            let indices = UInt32Array::from(rows);
            let taken = batch
                .columns()
                .iter()
                .map(|column| compute::take(column.as_ref(), &indices, None))
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("failed to slice partition group")?;
            let group = RecordBatch::try_new(batch.schema(), taken)?;
            Ok((values, group))
        })
        .collect()
}

/// Render one partition cell as its `col=value` directory text
fn render_partition_value(name: &str, column: &ArrayRef, row: usize) -> Result<String> {
    if column.is_null(row) {
        bail!("partition column `{name}` holds a null at row {row}");
    }
    let rendered = match column.data_type() {
        DataType::Boolean => as_boolean_array(column).value(row).to_string(),
        DataType::Int8 => as_primitive_array::<Int8Type>(column).value(row).to_string(),
        DataType::Int16 => as_primitive_array::<Int16Type>(column).value(row).to_string(),
        DataType::Int32 => as_primitive_array::<Int32Type>(column).value(row).to_string(),
        DataType::Int64 => as_primitive_array::<Int64Type>(column).value(row).to_string(),
        DataType::UInt8 => as_primitive_array::<UInt8Type>(column).value(row).to_string(),
        DataType::UInt16 => as_primitive_array::<UInt16Type>(column).value(row).to_string(),
        DataType::UInt32 => as_primitive_array::<UInt32Type>(column).value(row).to_string(),
        DataType::Utf8 => as_string_array(column).value(row).to_string(),
        DataType::Date32 => {
            let days = as_primitive_array::<Date32Type>(column).value(row);
            date_from_days(days).format(HIVE_DATE_FORMAT).to_string()
        }
        other => {
            return Err(CheckError::UnsupportedPartitionColumn {
                column: name.to_string(),
                data_type: other.to_string(),
            }
            .into());
        }
    };
    Ok(rendered)
}

/// Build a constant column of `len` rows from a partition value string
fn partition_array(
    name: &str,
    data_type: &DataType,
    raw: &str,
    len: usize,
) -> Result<ArrayRef> {
    let parse_context = || format!("bad partition value `{raw}` for column `{name}`");
    let array: ArrayRef = match data_type {
        DataType::Boolean => Arc::new(BooleanArray::from(vec![
            raw.parse::<bool>().with_context(parse_context)?;
            len
        ])),
        DataType::Int8 => Arc::new(Int8Array::from(vec![
            raw.parse::<i8>().with_context(parse_context)?;
            len
        ])),
        DataType::Int16 => Arc::new(Int16Array::from(vec![
            raw.parse::<i16>().with_context(parse_context)?;
            len
        ])),
        DataType::Int32 => Arc::new(Int32Array::from(vec![
            raw.parse::<i32>().with_context(parse_context)?;
            len
        ])),
        DataType::Int64 => Arc::new(Int64Array::from(vec![
            raw.parse::<i64>().with_context(parse_context)?;
            len
        ])),
        DataType::UInt8 => Arc::new(UInt8Array::from(vec![
            raw.parse::<u8>().with_context(parse_context)?;
            len
        ])),
        DataType::UInt16 => Arc::new(UInt16Array::from(vec![
            raw.parse::<u16>().with_context(parse_context)?;
            len
        ])),
        DataType::UInt32 => Arc::new(UInt32Array::from(vec![
            raw.parse::<u32>().with_context(parse_context)?;
            len
        ])),
        DataType::Utf8 => Arc::new(StringArray::from(vec![raw; len])),
        DataType::Date32 => {
            let date = NaiveDate::parse_from_str(raw, HIVE_DATE_FORMAT).with_context(parse_context)?;
            let days = (date - NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()).num_days() as i32;
            Arc::new(Date32Array::from(vec![days; len]))
        }
        other => {
            return Err(CheckError::UnsupportedPartitionColumn {
                column: name.to_string(),
                data_type: other.to_string(),
            }
            .into());
        }
    };
    Ok(array)
}

fn write_file(store: &dyn Store, key: &str, batch: &RecordBatch) -> Result<()> {
    let path = store.location(key);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = fs::File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let batch = storable(batch)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("failed to open Parquet writer")?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Rewrite columns with no physical representation before writing.
///
/// All-null marker columns carry the Null type in memory; on disk they
/// become all-null FLOAT columns, matching their DDL declaration.
fn storable(batch: &RecordBatch) -> Result<RecordBatch> {
    if !batch
        .schema()
        .fields()
        .iter()
        .any(|f| f.data_type() == &DataType::Null)
    {
        return Ok(batch.clone());
    }

    let mut fields = Vec::with_capacity(batch.num_columns());
    let mut arrays = Vec::with_capacity(batch.num_columns());
    for (field, array) in batch.schema().fields().iter().zip(batch.columns()) {
        if field.data_type() == &DataType::Null {
            fields.push(Field::new(field.name(), DataType::Float32, true));
            arrays.push(compute::cast(array, &DataType::Float32)?);
        } else {
            fields.push(field.as_ref().clone());
            arrays.push(array.clone());
        }
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).map_err(Into::into)
}

/// Read every record batch of one Parquet file
pub(crate) fn read_parquet_file(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("failed to read Parquet metadata")?
        .build()
        .context("failed to build Parquet reader")?;
    let batches = reader
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to read record batches")?;
    Ok(batches)
}

fn date_from_days(days: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + chrono::Duration::days(days as i64)
}
