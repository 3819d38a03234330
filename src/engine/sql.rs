//! SQL-protocol engine connection.
//!
//! A thin wrapper over a single database connection: the verifier issues a
//! handful of statements per run, so there is no pooling and no retry. Row
//! cells are decoded by the declared DDL type of each column, which is how
//! the engine's BIGINT timestamps and text-rendered dates reach the checker
//! unchanged.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::postgres::{PgConnectOptions, PgRow};
use sqlx::{ConnectOptions, Connection, Row};

use crate::config::{CONNECT_TIMEOUT, HIVE_DATE_FORMAT};
use crate::ddl::types::{HiveColumn, HiveType};
use crate::engine::{EngineValue, QueryEngine};

pub struct SqlEngine {
    conn: sqlx::PgConnection,
}

impl SqlEngine {
    /// Connect to the engine endpoint. The connection is held for the whole
    /// run and closed on drop.
    pub async fn connect(host: &str, port: u16, username: &str, database: &str) -> Result<Self> {
        let options = PgConnectOptions::new()
            .host(host)
            .port(port)
            .username(username)
            .database(database);

        let conn = tokio::time::timeout(CONNECT_TIMEOUT, options.connect())
            .await
            .map_err(|_| anyhow!("Timed out connecting to query engine at {host}:{port}"))?
            .with_context(|| format!("Failed to connect to query engine at {host}:{port}"))?;

        tracing::info!(host, port, "connected to query engine");
        Ok(Self { conn })
    }

    pub async fn close(self) -> Result<()> {
        self.conn.close().await.map_err(Into::into)
    }
}

#[async_trait]
impl QueryEngine for SqlEngine {
    async fn execute(&mut self, statement: &str) -> Result<()> {
        sqlx::query(statement)
            .execute(&mut self.conn)
            .await
            .context("engine rejected statement")?;
        Ok(())
    }

    async fn fetch_rows(
        &mut self,
        query: &str,
        columns: &[HiveColumn],
    ) -> Result<Vec<Vec<EngineValue>>> {
        let rows = sqlx::query(query)
            .fetch_all(&mut self.conn)
            .await
            .with_context(|| format!("query failed: {query}"))?;

        rows.iter().map(|row| decode_row(row, columns)).collect()
    }
}

fn decode_row(row: &PgRow, columns: &[HiveColumn]) -> Result<Vec<EngineValue>> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            decode_cell(row, idx, column.hive_type)
                .with_context(|| format!("failed to decode column `{}`", column.name))
        })
        .collect()
}

fn decode_cell(row: &PgRow, idx: usize, hive_type: HiveType) -> Result<EngineValue> {
    let value = match hive_type {
        HiveType::Boolean => row
            .try_get::<Option<bool>, _>(idx)?
            .map_or(EngineValue::Null, EngineValue::Bool),
        HiveType::Tinyint | HiveType::Smallint => row
            .try_get::<Option<i16>, _>(idx)?
            .map_or(EngineValue::Null, |v| EngineValue::Int(v as i64)),
        HiveType::Int => row
            .try_get::<Option<i32>, _>(idx)?
            .map_or(EngineValue::Null, |v| EngineValue::Int(v as i64)),
        HiveType::Bigint => row
            .try_get::<Option<i64>, _>(idx)?
            .map_or(EngineValue::Null, EngineValue::Int),
        HiveType::Float => row
            .try_get::<Option<f32>, _>(idx)?
            .map_or(EngineValue::Null, |v| EngineValue::Float(f64::from(v))),
        HiveType::Double => row
            .try_get::<Option<f64>, _>(idx)?
            .map_or(EngineValue::Null, EngineValue::Float),
        HiveType::String => row
            .try_get::<Option<String>, _>(idx)?
            .map_or(EngineValue::Null, EngineValue::Text),
        // The driver surfaces DATE values; the checker expects the engine's
        // text rendering
        HiveType::Date => row
            .try_get::<Option<NaiveDate>, _>(idx)?
            .map_or(EngineValue::Null, |v| {
                EngineValue::Text(v.format(HIVE_DATE_FORMAT).to_string())
            }),
        HiveType::Binary => row
            .try_get::<Option<Vec<u8>>, _>(idx)?
            .map_or(EngineValue::Null, EngineValue::Bytes),
    };
    Ok(value)
}
