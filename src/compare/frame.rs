//! Canonicalized row sets.
//!
//! A frame is a projection of either side of the comparison onto the
//! compared columns, with every cell reduced to a canonical [`Value`].

use arrow::array::*;
use arrow::datatypes::{
    DataType, Date32Type, Date64Type, Float32Type, Float64Type, Int8Type, Int16Type, Int32Type,
    Int64Type, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType, UInt8Type, UInt16Type, UInt32Type,
};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;

use crate::compare::value::{self, Value};
use crate::error::CheckError;

/// A row set projected and canonicalized for comparison
#[derive(Debug, Clone)]
pub struct ComparisonFrame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ComparisonFrame {
    /// Project a batch onto `columns`, in that order, canonicalizing cells
    pub fn from_batch(batch: &RecordBatch, columns: &[String]) -> Result<Self, CheckError> {
        let mut extracted = Vec::with_capacity(columns.len());
        for name in columns {
            let array = batch
                .column_by_name(name)
                .ok_or_else(|| CheckError::MissingColumn {
                    column: name.clone(),
                })?;
            extracted.push(column_values(name, array)?);
        }

        let rows = (0..batch.num_rows())
            .map(|row| extracted.iter().map(|col| col[row].clone()).collect())
            .collect();
        Ok(Self {
            columns: columns.to_vec(),
            rows,
        })
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sort rows by the given key column
    pub fn sort_by(&mut self, key: &str) -> Result<(), CheckError> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == key)
            .ok_or_else(|| CheckError::MissingColumn {
                column: key.to_string(),
            })?;
        self.rows.sort_by(|a, b| value::compare(&a[idx], &b[idx]));
        Ok(())
    }
}

/// Canonicalize one Arrow column
fn column_values(name: &str, array: &ArrayRef) -> Result<Vec<Value>, CheckError> {
    let mut values = Vec::with_capacity(array.len());

    macro_rules! extract {
        ($arr:expr, $wrap:expr) => {
            for i in 0..$arr.len() {
                values.push(if $arr.is_null(i) {
                    Value::Null
                } else {
                    $wrap($arr.value(i))
                });
            }
        };
    }

    match array.data_type() {
        DataType::Boolean => {
            let arr = as_boolean_array(array);
            extract!(arr, Value::Bool);
        }
        DataType::Int8 => {
            let arr = as_primitive_array::<Int8Type>(array);
            extract!(arr, |v| Value::Int(v as i64));
        }
        DataType::Int16 => {
            let arr = as_primitive_array::<Int16Type>(array);
            extract!(arr, |v| Value::Int(v as i64));
        }
        DataType::Int32 => {
            let arr = as_primitive_array::<Int32Type>(array);
            extract!(arr, |v| Value::Int(v as i64));
        }
        DataType::Int64 => {
            let arr = as_primitive_array::<Int64Type>(array);
            extract!(arr, Value::Int);
        }
        DataType::UInt8 => {
            let arr = as_primitive_array::<UInt8Type>(array);
            extract!(arr, |v| Value::Int(v as i64));
        }
        DataType::UInt16 => {
            let arr = as_primitive_array::<UInt16Type>(array);
            extract!(arr, |v| Value::Int(v as i64));
        }
        DataType::UInt32 => {
            let arr = as_primitive_array::<UInt32Type>(array);
            extract!(arr, |v| Value::Int(v as i64));
        }
        DataType::Float32 => {
            let arr = as_primitive_array::<Float32Type>(array);
            extract!(arr, |v| Value::Float(f64::from(v)));
        }
        DataType::Float64 => {
            let arr = as_primitive_array::<Float64Type>(array);
            extract!(arr, Value::Float);
        }
        DataType::Utf8 => {
            let arr = as_string_array(array);
            extract!(arr, |v: &str| Value::Text(v.to_string()));
        }
        DataType::LargeUtf8 => {
            let arr = as_largestring_array(array);
            extract!(arr, |v: &str| Value::Text(v.to_string()));
        }
        DataType::Binary => {
            let arr = as_generic_binary_array::<i32>(array);
            extract!(arr, |v: &[u8]| Value::Bytes(v.to_vec()));
        }
        DataType::LargeBinary => {
            let arr = as_generic_binary_array::<i64>(array);
            extract!(arr, |v: &[u8]| Value::Bytes(v.to_vec()));
        }
        DataType::Date32 => {
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
            let arr = as_primitive_array::<Date32Type>(array);
            extract!(arr, |days: i32| Value::Date(
                epoch + chrono::Duration::days(days as i64)
            ));
        }
        DataType::Date64 => {
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
            let arr = as_primitive_array::<Date64Type>(array);
            extract!(arr, |millis: i64| Value::Date(
                epoch + chrono::Duration::milliseconds(millis)
            ));
        }
        DataType::Timestamp(unit, _) => match unit {
            TimeUnit::Second => {
                let arr = as_primitive_array::<TimestampSecondType>(array);
                extract!(arr, |v: i64| Value::Timestamp(v * 1_000_000));
            }
            TimeUnit::Millisecond => {
                let arr = as_primitive_array::<TimestampMillisecondType>(array);
                extract!(arr, |v: i64| Value::Timestamp(v * 1_000));
            }
            TimeUnit::Microsecond => {
                let arr = as_primitive_array::<TimestampMicrosecondType>(array);
                extract!(arr, Value::Timestamp);
            }
            TimeUnit::Nanosecond => {
                let arr = as_primitive_array::<TimestampNanosecondType>(array);
                extract!(arr, |v: i64| Value::Timestamp(v / 1_000));
            }
        },
        DataType::Null => {
            for _ in 0..array.len() {
                values.push(Value::Null);
            }
        }
        other => {
            return Err(CheckError::UnsupportedType {
                column: name.to_string(),
                data_type: other.to_string(),
            });
        }
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    fn batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("key", DataType::Binary, false),
            Field::new("n32", DataType::Int32, false),
            Field::new("n64", DataType::Int64, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(BinaryArray::from_iter_values([b"b", b"a", b"c"])),
                Arc::new(Int32Array::from(vec![2, 1, 3])),
                Arc::new(Int64Array::from(vec![2, 1, 3])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_projection_keeps_column_order() {
        let frame = ComparisonFrame::from_batch(
            &batch(),
            &["n64".to_string(), "key".to_string()],
        )
        .unwrap();
        assert_eq!(frame.columns, vec!["n64", "key"]);
        assert_eq!(frame.rows[0][0], Value::Int(2));
        assert_eq!(frame.rows[0][1], Value::Bytes(b"b".to_vec()));
    }

    #[test]
    fn test_widths_collapse_to_the_same_value() {
        let frame = ComparisonFrame::from_batch(
            &batch(),
            &["n32".to_string(), "n64".to_string()],
        )
        .unwrap();
        for row in &frame.rows {
            assert_eq!(row[0], row[1]);
        }
    }

    #[test]
    fn test_sort_by_key() {
        let mut frame = ComparisonFrame::from_batch(
            &batch(),
            &["key".to_string(), "n32".to_string()],
        )
        .unwrap();
        frame.sort_by("key").unwrap();
        assert_eq!(frame.rows[0][1], Value::Int(1));
        assert_eq!(frame.rows[2][1], Value::Int(3));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let err =
            ComparisonFrame::from_batch(&batch(), &["absent".to_string()]).unwrap_err();
        assert!(matches!(err, CheckError::MissingColumn { .. }));

        let mut frame =
            ComparisonFrame::from_batch(&batch(), &["n32".to_string()]).unwrap();
        assert!(frame.sort_by("absent").is_err());
    }
}
