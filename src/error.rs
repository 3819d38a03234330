//! Failure kinds for a verification run.
//!
//! Every variant is fatal: each one reflects either a configuration mistake
//! or a genuine incompatibility between the writer and the query engine, so
//! nothing here is retried.

use thiserror::Error;

/// Boxed source for errors that wrap a collaborator failure.
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum CheckError {
    /// A column's logical type has no safe DDL representation.
    #[error("column `{column}` has type {data_type}, which has no safe Hive representation")]
    UnsupportedType { column: String, data_type: String },

    /// Path discovery could not locate a written data file.
    #[error("no data file ending in `{suffix}` found under dataset `{dataset}`")]
    NoDataFileFound { dataset: String, suffix: &'static str },

    /// The dataset root could not be determined from a sampled file key.
    #[error("cannot determine dataset root from `{key}`: no `{column}=` segment in the path")]
    AmbiguousPartitionRoot { key: String, column: String },

    /// The query engine rejected a DDL statement.
    #[error("DDL execution failed for statement:\n{statement}")]
    DdlExecution {
        statement: String,
        #[source]
        source: BoxedSource,
    },

    /// Read-back produced zero rows although the source dataset has rows.
    #[error("engine returned no rows for table `{table}` although the source dataset is non-empty")]
    EmptyResultSet { table: String },

    /// The engine and the source disagree on how many rows exist.
    #[error("engine returned {engine} rows, the source table holds {expected}")]
    RowCountMismatch { engine: usize, expected: usize },

    /// A cell diverged after normalization.
    #[error(
        "value mismatch in column `{column}` at row {row}: engine read {engine}, source holds {expected}"
    )]
    EquivalenceMismatch {
        column: String,
        row: usize,
        engine: String,
        expected: String,
    },

    /// A compared or sort-key column is absent from a frame.
    #[error("column `{column}` is not present in the compared data")]
    MissingColumn { column: String },

    /// A partition source column has no stable text encoding for `col=value`
    /// directory names.
    #[error("column `{column}` of type {data_type} cannot be used as a partition source")]
    UnsupportedPartitionColumn { column: String, data_type: String },
}
