//! Canonical verification table.
//!
//! One column per supported logical type, with deterministic per-row values
//! and a unique binary identifier usable as the comparison sort key. `date`
//! and `null` are reserved words in HiveQL, hence the `date_` and `null_`
//! column names.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{
    ArrayRef, BinaryArray, BooleanArray, Date32Array, Float32Array, Float64Array, Int8Array,
    Int16Array, Int32Array, Int64Array, NullArray, StringArray, TimestampMicrosecondArray,
    UInt8Array, UInt16Array, UInt32Array, UInt64Array,
};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;

/// Build the canonical table with `rows` rows
pub fn not_nested(rows: usize) -> Result<RecordBatch> {
    build(rows, false)
}

/// Build the canonical table plus an unsigned 64-bit column.
///
/// The extra column has no safe DDL representation; tables built with it are
/// expected to be rejected before registration.
pub fn not_nested_with_uint64(rows: usize) -> Result<RecordBatch> {
    build(rows, true)
}

fn build(rows: usize, include_uint64: bool) -> Result<RecordBatch> {
    let base_date = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap();
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    let base_days = (base_date - epoch).num_days() as i32;
    let base_micros = base_date
        .and_hms_opt(10, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp_micros();

    let mut fields = vec![
        Field::new("bool", DataType::Boolean, false),
        Field::new("bytes", DataType::Binary, false),
        Field::new("date_", DataType::Date32, false),
        Field::new(
            "datetime64",
            DataType::Timestamp(TimeUnit::Microsecond, None),
            false,
        ),
        Field::new("float32", DataType::Float32, false),
        Field::new("float64", DataType::Float64, false),
        Field::new("int8", DataType::Int8, false),
        Field::new("int16", DataType::Int16, false),
        Field::new("int32", DataType::Int32, false),
        Field::new("int64", DataType::Int64, false),
        Field::new("uint8", DataType::UInt8, false),
        Field::new("uint16", DataType::UInt16, false),
        Field::new("uint32", DataType::UInt32, false),
        Field::new("unicode", DataType::Utf8, false),
        Field::new("null_", DataType::Null, true),
    ];

    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(BooleanArray::from(
            (0..rows).map(|i| i % 2 == 0).collect::<Vec<_>>(),
        )),
        Arc::new(BinaryArray::from_iter_values(
            (0..rows).map(|i| format!("id_{i:06}").into_bytes()),
        )),
        Arc::new(Date32Array::from_iter_values(
            (0..rows).map(|i| base_days + (i % 366) as i32),
        )),
        Arc::new(TimestampMicrosecondArray::from_iter_values(
            (0..rows).map(|i| base_micros + i as i64 * 1_000_000),
        )),
        Arc::new(Float32Array::from_iter_values(
            (0..rows).map(|i| i as f32 + 0.5),
        )),
        Arc::new(Float64Array::from_iter_values(
            (0..rows).map(|i| i as f64 * 1.5),
        )),
        Arc::new(Int8Array::from_iter_values(
            (0..rows).map(|i| (i % 127) as i8),
        )),
        Arc::new(Int16Array::from_iter_values(
            (0..rows).map(|i| (i % 32_000) as i16),
        )),
        Arc::new(Int32Array::from_iter_values((0..rows).map(|i| i as i32))),
        Arc::new(Int64Array::from_iter_values(
            (0..rows).map(|i| i as i64 * 1_000),
        )),
        Arc::new(UInt8Array::from_iter_values(
            (0..rows).map(|i| (i % 251) as u8),
        )),
        Arc::new(UInt16Array::from_iter_values(
            (0..rows).map(|i| (i % 65_000) as u16),
        )),
        Arc::new(UInt32Array::from_iter_values((0..rows).map(|i| i as u32))),
        Arc::new(StringArray::from_iter_values(
            (0..rows).map(|i| format!("ünïcode_{i}")),
        )),
        Arc::new(NullArray::new(rows)),
    ];

    if include_uint64 {
        fields.push(Field::new("uint64", DataType::UInt64, false));
        // Values above i64::MAX, the reason the type is excluded
        arrays.push(Arc::new(UInt64Array::from_iter_values(
            (0..rows).map(|i| u64::MAX - i as u64),
        )));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)
        .context("failed to build fixture table")
}
