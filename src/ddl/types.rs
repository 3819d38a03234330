//! Mapping between the writer's logical column types and Hive DDL types.
//!
//! The map is total over the supported enumeration except for unsigned
//! 64-bit integers: BIGINT is the widest integer the engine offers and
//! cannot hold the upper half of the u64 range, so asking for a mapping is
//! an error rather than a silent truncation.

use arrow::datatypes::{DataType, Schema};

use crate::error::CheckError;

/// Logical column types the writer emits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalType {
    Bool,
    Binary,
    Date,
    Timestamp,
    Float32,
    Float64,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Utf8,
    /// All-null marker column with no intrinsic value type
    Null,
}

impl LogicalType {
    pub const ALL: &'static [LogicalType] = &[
        LogicalType::Bool,
        LogicalType::Binary,
        LogicalType::Date,
        LogicalType::Timestamp,
        LogicalType::Float32,
        LogicalType::Float64,
        LogicalType::Int8,
        LogicalType::Int16,
        LogicalType::Int32,
        LogicalType::Int64,
        LogicalType::UInt8,
        LogicalType::UInt16,
        LogicalType::UInt32,
        LogicalType::UInt64,
        LogicalType::Utf8,
        LogicalType::Null,
    ];

    /// Classify an Arrow data type into the supported enumeration
    pub fn from_arrow(column: &str, data_type: &DataType) -> Result<Self, CheckError> {
        let logical = match data_type {
            DataType::Boolean => LogicalType::Bool,
            DataType::Binary | DataType::LargeBinary => LogicalType::Binary,
            DataType::Date32 | DataType::Date64 => LogicalType::Date,
            DataType::Timestamp(_, _) => LogicalType::Timestamp,
            DataType::Float32 => LogicalType::Float32,
            DataType::Float64 => LogicalType::Float64,
            DataType::Int8 => LogicalType::Int8,
            DataType::Int16 => LogicalType::Int16,
            DataType::Int32 => LogicalType::Int32,
            DataType::Int64 => LogicalType::Int64,
            DataType::UInt8 => LogicalType::UInt8,
            DataType::UInt16 => LogicalType::UInt16,
            DataType::UInt32 => LogicalType::UInt32,
            DataType::UInt64 => LogicalType::UInt64,
            DataType::Utf8 | DataType::LargeUtf8 => LogicalType::Utf8,
            DataType::Null => LogicalType::Null,
            other => {
                return Err(CheckError::UnsupportedType {
                    column: column.to_string(),
                    data_type: other.to_string(),
                });
            }
        };
        Ok(logical)
    }

    pub fn name(&self) -> &'static str {
        match self {
            LogicalType::Bool => "bool",
            LogicalType::Binary => "binary",
            LogicalType::Date => "date",
            LogicalType::Timestamp => "timestamp",
            LogicalType::Float32 => "float32",
            LogicalType::Float64 => "float64",
            LogicalType::Int8 => "int8",
            LogicalType::Int16 => "int16",
            LogicalType::Int32 => "int32",
            LogicalType::Int64 => "int64",
            LogicalType::UInt8 => "uint8",
            LogicalType::UInt16 => "uint16",
            LogicalType::UInt32 => "uint32",
            LogicalType::UInt64 => "uint64",
            LogicalType::Utf8 => "unicode",
            LogicalType::Null => "null",
        }
    }
}

/// Hive DDL data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HiveType {
    Boolean,
    Binary,
    Date,
    Bigint,
    Float,
    Double,
    Tinyint,
    Smallint,
    Int,
    String,
}

impl HiveType {
    /// Returns the DDL type name
    pub fn as_ddl(&self) -> &'static str {
        match self {
            HiveType::Boolean => "BOOLEAN",
            HiveType::Binary => "BINARY",
            HiveType::Date => "DATE",
            HiveType::Bigint => "BIGINT",
            HiveType::Float => "FLOAT",
            HiveType::Double => "DOUBLE",
            HiveType::Tinyint => "TINYINT",
            HiveType::Smallint => "SMALLINT",
            HiveType::Int => "INT",
            HiveType::String => "STRING",
        }
    }

    /// Reverse lookup from a DDL type name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_uppercase().as_str() {
            "BOOLEAN" => Some(HiveType::Boolean),
            "BINARY" => Some(HiveType::Binary),
            "DATE" => Some(HiveType::Date),
            "BIGINT" => Some(HiveType::Bigint),
            "FLOAT" => Some(HiveType::Float),
            "DOUBLE" => Some(HiveType::Double),
            "TINYINT" => Some(HiveType::Tinyint),
            "SMALLINT" => Some(HiveType::Smallint),
            "INT" => Some(HiveType::Int),
            "STRING" => Some(HiveType::String),
            _ => None,
        }
    }
}

/// A column as declared in DDL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiveColumn {
    pub name: String,
    pub hive_type: HiveType,
}

/// Map a logical type to its DDL type.
///
/// Timestamps land on BIGINT because the engine has no native microsecond
/// timestamp; the consumer reinterprets the integer. The all-null marker
/// lands on FLOAT, the only numeric type wide enough to also represent an
/// all-null column.
pub fn hive_type_for(column: &str, logical: LogicalType) -> Result<HiveType, CheckError> {
    let hive = match logical {
        LogicalType::Bool => HiveType::Boolean,
        LogicalType::Binary => HiveType::Binary,
        LogicalType::Date => HiveType::Date,
        LogicalType::Timestamp => HiveType::Bigint,
        LogicalType::Float32 => HiveType::Float,
        LogicalType::Float64 => HiveType::Double,
        LogicalType::Int8 => HiveType::Tinyint,
        LogicalType::Int16 => HiveType::Smallint,
        LogicalType::Int32 => HiveType::Int,
        LogicalType::Int64 => HiveType::Bigint,
        LogicalType::UInt8 => HiveType::Smallint,
        LogicalType::UInt16 => HiveType::Int,
        LogicalType::UInt32 => HiveType::Bigint,
        LogicalType::Utf8 => HiveType::String,
        LogicalType::Null => HiveType::Float,
        // BIGINT cannot represent the upper half of the u64 range
        LogicalType::UInt64 => {
            return Err(CheckError::UnsupportedType {
                column: column.to_string(),
                data_type: LogicalType::UInt64.name().to_string(),
            });
        }
    };
    Ok(hive)
}

/// Reverse direction of the map: the logical types that land on a DDL type
pub fn logical_sources(hive: HiveType) -> Vec<LogicalType> {
    LogicalType::ALL
        .iter()
        .copied()
        .filter(|logical| hive_type_for("", *logical).ok() == Some(hive))
        .collect()
}

/// Map every column of an Arrow schema to its DDL declaration, in order.
///
/// Fails before any DDL is issued if any column is excluded or outside the
/// supported enumeration.
pub fn map_schema(schema: &Schema) -> Result<Vec<HiveColumn>, CheckError> {
    schema
        .fields()
        .iter()
        .map(|field| {
            let logical = LogicalType::from_arrow(field.name(), field.data_type())?;
            let hive_type = hive_type_for(field.name(), logical)?;
            Ok(HiveColumn {
                name: field.name().clone(),
                hive_type,
            })
        })
        .collect()
}
