//! In-process stand-in for the external query engine, used by tests.
//!
//! Instead of mocking result sets, it evaluates the DDL it receives against
//! the real files on disk: CREATE EXTERNAL TABLE registers a location, MSCK
//! REPAIR makes `name=value` directories visible, and SELECT reads the
//! Parquet files exactly where the statement said they are. Cells come back
//! with the engine's wire semantics: integer timestamps in the configured
//! unit and dates rendered as text.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use arrow::array::*;
use arrow::datatypes::{
    DataType, Date32Type, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type,
    TimeUnit, TimestampMicrosecondType, UInt8Type, UInt16Type, UInt32Type,
};
use arrow::record_batch::RecordBatch;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::compare::TimestampUnit;
use crate::config::HIVE_DATE_FORMAT;
use crate::dataset::writer::read_parquet_file;
use crate::ddl::types::{HiveColumn, HiveType};
use crate::engine::{EngineValue, QueryEngine};

pub(crate) struct FakeTable {
    pub columns: Vec<HiveColumn>,
    pub partitions: Vec<HiveColumn>,
    pub location: PathBuf,
    pub repaired: bool,
}

pub(crate) struct FakeHive {
    pub tables: HashMap<String, FakeTable>,
    /// Every statement received, in order
    pub statements: Vec<String>,
    pub timestamp_unit: TimestampUnit,
}

impl FakeHive {
    pub fn new() -> Self {
        Self::with_timestamp_unit(TimestampUnit::Microseconds)
    }

    pub fn with_timestamp_unit(timestamp_unit: TimestampUnit) -> Self {
        Self {
            tables: HashMap::new(),
            statements: Vec::new(),
            timestamp_unit,
        }
    }

    fn parse_create(&mut self, statement: &str) -> Result<()> {
        let rest = statement
            .strip_prefix("CREATE EXTERNAL TABLE ")
            .context("malformed CREATE EXTERNAL TABLE")?;

        let open = rest.find('(').context("missing column list")?;
        let name = rest[..open].trim().to_string();
        let close = rest[open..].find(')').context("unterminated column list")? + open;
        let columns = parse_column_list(&rest[open + 1..close])?;

        let partitions = match rest.find("PARTITIONED BY") {
            Some(pos) => {
                let tail = &rest[pos..];
                let p_open = tail.find('(').context("missing partition list")?;
                let p_close = tail.find(')').context("unterminated partition list")?;
                parse_column_list(&tail[p_open + 1..p_close])?
            }
            None => Vec::new(),
        };

        let loc_pos = rest.rfind("LOCATION").context("missing LOCATION clause")?;
        let tail = &rest[loc_pos..];
        let q_open = tail.find('\'').context("missing location quote")?;
        let q_close = tail[q_open + 1..]
            .find('\'')
            .context("unterminated location")?
            + q_open
            + 1;
        let location = PathBuf::from(&tail[q_open + 1..q_close]);

        if self.tables.contains_key(&name) {
            bail!("table `{name}` already exists");
        }
        self.tables.insert(
            name,
            FakeTable {
                columns,
                partitions,
                location,
                repaired: false,
            },
        );
        Ok(())
    }

    /// Files a SELECT can currently see, with their partition values.
    ///
    /// Unpartitioned tables read the files directly inside the location.
    /// Partitioned tables see nothing until repaired; repair walks one
    /// `name=value` directory level per declared partition column and
    /// ignores anything that does not match, as the engine does.
    fn visible_files(table: &FakeTable) -> Result<Vec<(PathBuf, Vec<String>)>> {
        if table.partitions.is_empty() {
            let mut files = data_files_in(&table.location)?;
            files.sort();
            return Ok(files.into_iter().map(|path| (path, Vec::new())).collect());
        }
        if !table.repaired {
            return Ok(Vec::new());
        }

        fn walk(
            dir: &Path,
            partitions: &[HiveColumn],
            values: &mut Vec<String>,
            out: &mut Vec<(PathBuf, Vec<String>)>,
        ) -> Result<()> {
            match partitions {
                [] => {
                    for path in data_files_in(dir)? {
                        out.push((path, values.clone()));
                    }
                    Ok(())
                }
                [first, rest @ ..] => {
                    if !dir.exists() {
                        return Ok(());
                    }
                    let needle = format!("{}=", first.name);
                    for entry in fs::read_dir(dir)? {
                        let path = entry?.path();
                        let segment = match path.file_name().and_then(|n| n.to_str()) {
                            Some(segment) => segment.to_string(),
                            None => continue,
                        };
                        if let Some(value) = segment.strip_prefix(needle.as_str()) {
                            if path.is_dir() {
                                values.push(value.to_string());
                                walk(&path, rest, values, out)?;
                                values.pop();
                            }
                        }
                    }
                    Ok(())
                }
            }
        }

        let mut files = Vec::new();
        let mut values = Vec::new();
        walk(&table.location, &table.partitions, &mut values, &mut files)?;
        files.sort();
        Ok(files)
    }

    fn batch_rows(
        &self,
        table: &FakeTable,
        batch: &RecordBatch,
        partition_values: &[String],
        selected: &[String],
    ) -> Result<Vec<Vec<EngineValue>>> {
        let mut rows = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let mut cells = Vec::with_capacity(selected.len());
            for name in selected {
                let partition_idx = table.partitions.iter().position(|p| &p.name == name);
                let cell = match partition_idx {
                    Some(idx) => partition_cell(
                        table.partitions[idx].hive_type,
                        &partition_values[idx],
                    )?,
                    None => {
                        let column = batch.column_by_name(name).with_context(|| {
                            format!("column `{name}` missing from data file")
                        })?;
                        file_cell(column, row, self.timestamp_unit)?
                    }
                };
                cells.push(cell);
            }
            rows.push(cells);
        }
        Ok(rows)
    }
}

#[async_trait]
impl QueryEngine for FakeHive {
    async fn execute(&mut self, statement: &str) -> Result<()> {
        self.statements.push(statement.to_string());
        let trimmed = statement.trim();

        if let Some(name) = trimmed.strip_prefix("DROP TABLE IF EXISTS ") {
            self.tables.remove(name.trim());
            Ok(())
        } else if trimmed.starts_with("CREATE EXTERNAL TABLE ") {
            self.parse_create(trimmed)
        } else if let Some(name) = trimmed.strip_prefix("MSCK REPAIR TABLE ") {
            let table = self
                .tables
                .get_mut(name.trim())
                .with_context(|| format!("cannot repair unknown table `{}`", name.trim()))?;
            table.repaired = true;
            Ok(())
        } else {
            bail!("unsupported statement: {statement}")
        }
    }

    async fn fetch_rows(
        &mut self,
        query: &str,
        _columns: &[HiveColumn],
    ) -> Result<Vec<Vec<EngineValue>>> {
        let rest = query
            .strip_prefix("SELECT ")
            .with_context(|| format!("unsupported query: {query}"))?;
        let (column_list, table_name) = rest
            .split_once(" FROM ")
            .with_context(|| format!("unsupported query: {query}"))?;
        let selected: Vec<String> = column_list
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();
        let table_name = table_name.trim();
        let table = self
            .tables
            .get(table_name)
            .with_context(|| format!("unknown table `{table_name}`"))?;

        for name in &selected {
            let declared = table.columns.iter().any(|c| &c.name == name)
                || table.partitions.iter().any(|c| &c.name == name);
            if !declared {
                bail!("column `{name}` is not declared on table `{table_name}`");
            }
        }

        let mut rows = Vec::new();
        for (path, partition_values) in Self::visible_files(table)? {
            for batch in read_parquet_file(&path)? {
                rows.extend(self.batch_rows(table, &batch, &partition_values, &selected)?);
            }
        }
        Ok(rows)
    }
}

fn data_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file()
            && path
                .extension()
                .map_or(false, |ext| ext == "parquet")
        {
            files.push(path);
        }
    }
    Ok(files)
}

fn parse_column_list(raw: &str) -> Result<Vec<HiveColumn>> {
    raw.split(',')
        .filter(|decl| !decl.trim().is_empty())
        .map(|decl| {
            let mut tokens = decl.split_whitespace();
            let name = tokens.next().context("empty column declaration")?;
            let type_name = tokens
                .next()
                .with_context(|| format!("column `{name}` has no type"))?;
            let hive_type = HiveType::parse(type_name)
                .with_context(|| format!("unknown DDL type `{type_name}`"))?;
            Ok(HiveColumn {
                name: name.to_string(),
                hive_type,
            })
        })
        .collect()
}

/// A partition cell, decoded from its directory value by declared type
fn partition_cell(hive_type: HiveType, raw: &str) -> Result<EngineValue> {
    let cell = match hive_type {
        HiveType::Boolean => EngineValue::Bool(raw.parse()?),
        HiveType::Tinyint | HiveType::Smallint | HiveType::Int | HiveType::Bigint => {
            EngineValue::Int(raw.parse()?)
        }
        HiveType::Float | HiveType::Double => EngineValue::Float(raw.parse()?),
        // Dates travel as text on the wire either way
        HiveType::String | HiveType::Date => EngineValue::Text(raw.to_string()),
        HiveType::Binary => bail!("BINARY partition values are not supported"),
    };
    Ok(cell)
}

/// A payload cell, read from the file with the engine's wire semantics
fn file_cell(column: &ArrayRef, row: usize, unit: TimestampUnit) -> Result<EngineValue> {
    if column.is_null(row) {
        return Ok(EngineValue::Null);
    }
    let cell = match column.data_type() {
        DataType::Boolean => EngineValue::Bool(as_boolean_array(column).value(row)),
        DataType::Int8 => EngineValue::Int(as_primitive_array::<Int8Type>(column).value(row) as i64),
        DataType::Int16 => {
            EngineValue::Int(as_primitive_array::<Int16Type>(column).value(row) as i64)
        }
        DataType::Int32 => {
            EngineValue::Int(as_primitive_array::<Int32Type>(column).value(row) as i64)
        }
        DataType::Int64 => EngineValue::Int(as_primitive_array::<Int64Type>(column).value(row)),
        DataType::UInt8 => {
            EngineValue::Int(as_primitive_array::<UInt8Type>(column).value(row) as i64)
        }
        DataType::UInt16 => {
            EngineValue::Int(as_primitive_array::<UInt16Type>(column).value(row) as i64)
        }
        DataType::UInt32 => {
            EngineValue::Int(as_primitive_array::<UInt32Type>(column).value(row) as i64)
        }
        DataType::Float32 => {
            EngineValue::Float(f64::from(as_primitive_array::<Float32Type>(column).value(row)))
        }
        DataType::Float64 => {
            EngineValue::Float(as_primitive_array::<Float64Type>(column).value(row))
        }
        DataType::Utf8 => EngineValue::Text(as_string_array(column).value(row).to_string()),
        DataType::Binary => {
            EngineValue::Bytes(as_generic_binary_array::<i32>(column).value(row).to_vec())
        }
        DataType::Date32 => {
            let days = as_primitive_array::<Date32Type>(column).value(row);
            let date = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
                + chrono::Duration::days(days as i64);
            EngineValue::Text(date.format(HIVE_DATE_FORMAT).to_string())
        }
        // Stored as microseconds; returned as an integer in the engine unit
        DataType::Timestamp(TimeUnit::Microsecond, _) => {
            let micros = as_primitive_array::<TimestampMicrosecondType>(column).value(row);
            EngineValue::Int(micros_to_unit(micros, unit))
        }
        other => bail!("unsupported data type in file: {other}"),
    };
    Ok(cell)
}

fn micros_to_unit(micros: i64, unit: TimestampUnit) -> i64 {
    match unit {
        TimestampUnit::Seconds => micros / 1_000_000,
        TimestampUnit::Milliseconds => micros / 1_000,
        TimestampUnit::Microseconds => micros,
        TimestampUnit::Nanoseconds => micros * 1_000,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_registers_columns_partitions_and_location() {
        let mut engine = FakeHive::new();
        engine
            .execute(
                "CREATE EXTERNAL TABLE test (\n  bool BOOLEAN,\n  int32 INT\n)\nPARTITIONED BY (partition_0 STRING)\nSTORED AS PARQUET\nLOCATION '/data/test'",
            )
            .await
            .unwrap();

        let table = &engine.tables["test"];
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[1].hive_type, HiveType::Int);
        assert_eq!(table.partitions.len(), 1);
        assert_eq!(table.partitions[0].name, "partition_0");
        assert_eq!(table.location, PathBuf::from("/data/test"));
        assert!(!table.repaired);
    }

    #[tokio::test]
    async fn test_drop_is_idempotent_and_repair_requires_the_table() {
        let mut engine = FakeHive::new();
        engine
            .execute("DROP TABLE IF EXISTS missing")
            .await
            .unwrap();
        assert!(engine.execute("MSCK REPAIR TABLE missing").await.is_err());
    }

    #[tokio::test]
    async fn test_unknown_ddl_is_rejected() {
        let mut engine = FakeHive::new();
        assert!(engine.execute("TRUNCATE TABLE t").await.is_err());
    }
}
