//! Partition column derivation.
//!
//! A partition column is synthesized from an existing source column: either
//! a straight copy (its DDL type inherited from the source's mapping) or a
//! cast-to-text copy declared STRING. Synthesized columns are named
//! `partition_<idx>` so they can never collide with payload columns, and the
//! source column always stays in the file payload.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::Array;
use arrow::compute;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::ddl::types::{self, HiveType, LogicalType};
use crate::error::CheckError;

/// A requested partition column, as given on the command line
#[derive(Debug, Clone)]
pub struct PartitionRequest {
    pub source: String,
    pub cast_to_text: bool,
}

/// A derived partition column
#[derive(Debug, Clone)]
pub struct PartitionColumn {
    pub name: String,
    pub source: String,
    pub cast_to_text: bool,
    pub hive_type: HiveType,
}

/// Ordered set of partition columns for one dataset
#[derive(Debug, Clone)]
pub struct PartitionSpec {
    pub columns: Vec<PartitionColumn>,
}

impl PartitionSpec {
    /// Derive partition columns from the requested sources.
    ///
    /// Sources must exist in the schema and must have a stable text encoding
    /// for `col=value` directory names; binary, float, and timestamp sources
    /// are rejected.
    pub fn derive(requests: &[PartitionRequest], schema: &Schema) -> Result<Self, CheckError> {
        let mut columns = Vec::with_capacity(requests.len());
        for (idx, request) in requests.iter().enumerate() {
            let field = schema
                .fields()
                .iter()
                .find(|f| f.name() == &request.source)
                .ok_or_else(|| CheckError::MissingColumn {
                    column: request.source.clone(),
                })?;
            let logical = LogicalType::from_arrow(field.name(), field.data_type())?;

            let hive_type = if request.cast_to_text {
                HiveType::String
            } else {
                if !is_partitionable(logical) {
                    return Err(CheckError::UnsupportedPartitionColumn {
                        column: request.source.clone(),
                        data_type: logical.name().to_string(),
                    });
                }
                types::hive_type_for(field.name(), logical)?
            };

            columns.push(PartitionColumn {
                name: format!("partition_{idx}"),
                source: request.source.clone(),
                cast_to_text: request.cast_to_text,
                hive_type,
            });
        }
        Ok(Self { columns })
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Materialize the partition columns on a batch.
    ///
    /// Appends one column per configured partition: a cast-to-text copy of the source
    /// for STRING overrides, a plain copy otherwise.
    pub fn apply(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        let mut fields: Vec<Field> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.as_ref().clone())
            .collect();
        let mut arrays = batch.columns().to_vec();

        for column in &self.columns {
            let source = batch
                .column_by_name(&column.source)
                .ok_or_else(|| CheckError::MissingColumn {
                    column: column.source.clone(),
                })?;
            let array = if column.cast_to_text {
                compute::cast(source, &DataType::Utf8).with_context(|| {
                    format!("failed to cast `{}` to text for partitioning", column.source)
                })?
            } else {
                source.clone()
            };
            fields.push(Field::new(&column.name, array.data_type().clone(), false));
            arrays.push(array);
        }

        let schema = Arc::new(Schema::new(fields));
        RecordBatch::try_new(schema, arrays).context("failed to attach partition columns")
    }
}

fn is_partitionable(logical: LogicalType) -> bool {
    matches!(
        logical,
        LogicalType::Bool
            | LogicalType::Date
            | LogicalType::Int8
            | LogicalType::Int16
            | LogicalType::Int32
            | LogicalType::Int64
            | LogicalType::UInt8
            | LogicalType::UInt16
            | LogicalType::UInt32
            | LogicalType::Utf8
    )
}
