//! Query-engine seam - the connection the verifier issues DDL and reads
//! rows through

pub mod sql;

#[cfg(test)]
pub(crate) mod fake;

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;

pub use crate::ddl::types::{HiveColumn, HiveType, LogicalType, logical_sources};

/// A cell as the engine driver hands it back, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum EngineValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

impl fmt::Display for EngineValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineValue::Null => write!(f, "NULL"),
            EngineValue::Bool(v) => write!(f, "{v}"),
            EngineValue::Int(v) => write!(f, "{v}"),
            EngineValue::Float(v) => write!(f, "{v}"),
            EngineValue::Text(v) => write!(f, "{v:?}"),
            EngineValue::Bytes(v) => write!(f, "0x{}", hex::encode(v)),
        }
    }
}

/// Connection to the external query engine.
///
/// One connection is acquired per run and used for every statement. A hung
/// statement is a hard failure of the run; timeouts are the calling
/// harness's concern.
#[async_trait]
pub trait QueryEngine: Send {
    /// Execute a DDL statement
    async fn execute(&mut self, statement: &str) -> Result<()>;

    /// Execute a query and return its rows, decoded per the declared column
    /// types
    async fn fetch_rows(
        &mut self,
        query: &str,
        columns: &[HiveColumn],
    ) -> Result<Vec<Vec<EngineValue>>>;
}
