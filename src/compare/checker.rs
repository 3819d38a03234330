//! The equivalence check itself.
//!
//! The two systems encode several types differently by design, not by bug,
//! so engine rows are normalized before anything is compared: integer
//! timestamps are converted from the engine's unit, date text is parsed, and
//! numeric widths have already collapsed in the canonical representation.
//! What is left after normalization must match cell for cell.

use arrow::record_batch::RecordBatch;
use tracing::info;

use crate::compare::frame::ComparisonFrame;
use crate::compare::value::{TimestampUnit, Value};
use crate::config::HIVE_DATE_FORMAT;
use crate::ddl::types::LogicalType;
use crate::engine::EngineValue;
use crate::error::CheckError;

pub struct EquivalenceChecker {
    /// Column both row sets are sorted on before pairing
    pub sort_key: String,
    /// Unit of the integer timestamps in the engine rows. This is the unit
    /// of the read-back leg specifically; the written values have their own
    /// unit and the two need not agree.
    pub engine_timestamp_unit: TimestampUnit,
}

impl EquivalenceChecker {
    /// Assert that the engine rows and the source table agree on
    /// `compared_columns`. Returns the number of compared rows.
    pub fn assert_equivalent(
        &self,
        table_name: &str,
        engine_rows: Vec<Vec<EngineValue>>,
        source: &RecordBatch,
        compared_columns: &[String],
    ) -> Result<usize, CheckError> {
        let mut expected = ComparisonFrame::from_batch(source, compared_columns)?;
        let logical = column_types(source, compared_columns)?;
        let mut engine = self.normalize(engine_rows, &logical)?;

        // An empty read-back must fail loudly; empty-vs-empty would pass an
        // unregistered partition without noticing.
        if engine.is_empty() && !expected.is_empty() {
            return Err(CheckError::EmptyResultSet {
                table: table_name.to_string(),
            });
        }
        if engine.len() != expected.len() {
            return Err(CheckError::RowCountMismatch {
                engine: engine.len(),
                expected: expected.len(),
            });
        }

        engine.sort_by(&self.sort_key)?;
        expected.sort_by(&self.sort_key)?;

        for (row, (engine_row, expected_row)) in
            engine.rows.iter().zip(&expected.rows).enumerate()
        {
            for (idx, column) in compared_columns.iter().enumerate() {
                if engine_row[idx] != expected_row[idx] {
                    return Err(CheckError::EquivalenceMismatch {
                        column: column.clone(),
                        row,
                        engine: engine_row[idx].to_string(),
                        expected: expected_row[idx].to_string(),
                    });
                }
            }
        }

        info!(
            table_name,
            rows = engine.len(),
            columns = compared_columns.len(),
            "row sets are equivalent"
        );
        Ok(engine.len())
    }

    /// Reduce raw engine rows to canonical values, guided by the source
    /// table's logical column types
    fn normalize(
        &self,
        rows: Vec<Vec<EngineValue>>,
        columns: &[(String, LogicalType)],
    ) -> Result<ComparisonFrame, CheckError> {
        let mut normalized = Vec::with_capacity(rows.len());
        for (row_idx, row) in rows.into_iter().enumerate() {
            let mut cells = Vec::with_capacity(columns.len());
            for (col_idx, (name, logical)) in columns.iter().enumerate() {
                let cell = row.get(col_idx).cloned().unwrap_or(EngineValue::Null);
                cells.push(self.normalize_cell(name, row_idx, *logical, cell)?);
            }
            normalized.push(cells);
        }
        Ok(ComparisonFrame::from_rows(
            columns.iter().map(|(name, _)| name.clone()).collect(),
            normalized,
        ))
    }

    fn normalize_cell(
        &self,
        column: &str,
        row: usize,
        logical: LogicalType,
        cell: EngineValue,
    ) -> Result<Value, CheckError> {
        let mismatch = |cell: &EngineValue| CheckError::EquivalenceMismatch {
            column: column.to_string(),
            row,
            engine: cell.to_string(),
            expected: format!("a {} value", logical.name()),
        };

        let value = match (logical, cell) {
            (_, EngineValue::Null) => Value::Null,
            // The engine returns timestamps as integers in its own unit
            (LogicalType::Timestamp, EngineValue::Int(v)) => {
                Value::Timestamp(self.engine_timestamp_unit.to_micros(v))
            }
            // The engine renders dates as text
            (LogicalType::Date, EngineValue::Text(s)) => {
                match chrono::NaiveDate::parse_from_str(&s, HIVE_DATE_FORMAT) {
                    Ok(date) => Value::Date(date),
                    Err(_) => return Err(mismatch(&EngineValue::Text(s))),
                }
            }
            (
                LogicalType::Int8
                | LogicalType::Int16
                | LogicalType::Int32
                | LogicalType::Int64
                | LogicalType::UInt8
                | LogicalType::UInt16
                | LogicalType::UInt32,
                EngineValue::Int(v),
            ) => Value::Int(v),
            (LogicalType::Float32 | LogicalType::Float64 | LogicalType::Null, cell) => {
                match cell {
                    EngineValue::Float(v) => Value::Float(v),
                    EngineValue::Int(v) => Value::Float(v as f64),
                    other => return Err(mismatch(&other)),
                }
            }
            (LogicalType::Bool, EngineValue::Bool(v)) => Value::Bool(v),
            (LogicalType::Utf8, EngineValue::Text(s)) => Value::Text(s),
            (LogicalType::Binary, EngineValue::Bytes(b)) => Value::Bytes(b),
            (_, other) => return Err(mismatch(&other)),
        };
        Ok(value)
    }
}

/// Logical types of the compared columns, read off the source schema
fn column_types(
    source: &RecordBatch,
    compared_columns: &[String],
) -> Result<Vec<(String, LogicalType)>, CheckError> {
    compared_columns
        .iter()
        .map(|name| {
            let field = source
                .schema()
                .fields()
                .iter()
                .find(|f| f.name() == name)
                .cloned()
                .ok_or_else(|| CheckError::MissingColumn {
                    column: name.clone(),
                })?;
            let logical = LogicalType::from_arrow(name, field.data_type())?;
            Ok((name.clone(), logical))
        })
        .collect()
}
