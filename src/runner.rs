//! High-level runner API for the verifier.
//!
//! This module provides the public interface that sequences a full
//! verification run: write the dataset, discover its root, register the
//! external table, read it back through the engine, and compare against the
//! writer's own read-back. Every step is fatal on failure; this is a
//! single-shot correctness check, not a resilient pipeline.

use anyhow::{Context, Result};
use derive_builder::Builder;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{info, warn};

use crate::compare::EquivalenceChecker;
use crate::config;
use crate::dataset::store::{LocalStore, Store, StoreUrl};
use crate::dataset::{fixture, layout, writer};
use crate::ddl::registrar::TableRegistrar;
use crate::ddl::types::{self, HiveColumn};
use crate::ddl::PartitionSpec;
use crate::engine::QueryEngine;
use crate::report::{ColumnReport, PartitionReport};

pub use crate::compare::TimestampUnit;
pub use crate::ddl::PartitionRequest;
pub use crate::error::CheckError;
pub use crate::report::VerifyReport;

/// Arguments for one verification run.
///
/// There is no process-wide state: everything a run needs flows through
/// this struct, one instance per run.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct VerifyArgs {
    /// Dataset id the files are stored under
    pub dataset_id: String,

    /// External table name, unique per verification run
    pub table_name: String,

    /// Store URL (`hfs://`, `file://`, or a bare directory path). A
    /// temporary directory is used when absent and removed afterwards.
    #[builder(default)]
    pub store_url: Option<String>,

    /// Rows in the generated table
    #[builder(default = "100")]
    pub rows: usize,

    /// How many copies of the table to write (each becomes its own file set)
    #[builder(default = "1")]
    pub copies: usize,

    /// Partition configuration, empty for an unpartitioned dataset
    #[builder(default)]
    pub partition_on: Vec<PartitionRequest>,

    /// Unit of the integer timestamps the engine returns
    #[builder(default = "config::DEFAULT_ENGINE_TIMESTAMP_UNIT")]
    pub engine_timestamp_unit: TimestampUnit,

    /// Column both row sets are sorted on before comparison
    #[builder(default = "config::DEFAULT_SORT_KEY.to_string()")]
    pub sort_key: String,

    /// Include the unsigned 64-bit column, which has no DDL mapping
    #[builder(default = "false")]
    pub include_uint64: bool,

    /// Keep a temporary store directory around when the run fails
    #[builder(default = "false")]
    pub keep_data_on_failure: bool,
}

/// Run a full write/register/compare cycle.
///
/// The store directory outlives every step of the run and is cleaned up on
/// both success and failure (a temporary store can be kept on failure for
/// debugging via `keep_data_on_failure`).
pub async fn run_verify(args: VerifyArgs, engine: &mut dyn QueryEngine) -> Result<VerifyReport> {
    let (temp_dir, store) = match &args.store_url {
        Some(url) => (None, LocalStore::open(&StoreUrl::parse(url)?)?),
        None => {
            let temp = TempDir::new().context("failed to create temporary store")?;
            let store = LocalStore::open(&StoreUrl::Local(temp.path().to_path_buf()))?;
            (Some(temp), store)
        }
    };

    let outcome = verify_with_store(&args, engine, &store).await;

    if outcome.is_err() && args.keep_data_on_failure {
        if let Some(temp) = temp_dir {
            let kept = temp.keep();
            warn!(path = %kept.display(), "verification failed, keeping dataset for inspection");
        }
    }
    outcome
}

async fn verify_with_store(
    args: &VerifyArgs,
    engine: &mut dyn QueryEngine,
    store: &LocalStore,
) -> Result<VerifyReport> {
    let start = Instant::now();

    // 1. Generate the source table
    let table = if args.include_uint64 {
        fixture::not_nested_with_uint64(args.rows)?
    } else {
        fixture::not_nested(args.rows)?
    };
    info!(rows = args.rows, "generated source table");

    // 2. Derive and materialize partition columns
    let partition_spec = if args.partition_on.is_empty() {
        None
    } else {
        Some(PartitionSpec::derive(
            &args.partition_on,
            table.schema().as_ref(),
        )?)
    };
    let table = match &partition_spec {
        Some(spec) => spec.apply(&table)?,
        None => table,
    };

    // 3. Map every column to its DDL type, before any DDL is issued
    let columns = types::map_schema(table.schema().as_ref())?;
    let partition_names = partition_spec
        .as_ref()
        .map(|spec| spec.names())
        .unwrap_or_default();

    // 4. Write the dataset
    let copies = args.copies.max(1);
    let batches = vec![table; copies];
    let handle = writer::store_dataset(store, &args.dataset_id, &batches, &partition_names)?;

    // 5. Discover the dataset root from the store keys
    let keys = handle.file_keys(store)?;
    let sample = layout::find_data_file(&args.dataset_id, &keys)?;
    let root_key = layout::resolve_dataset_root(sample, &partition_names)?;
    let dataset_root = store.location(&root_key);
    let dataset_root = dataset_root
        .to_str()
        .context("dataset root is not valid UTF-8")?;
    info!(dataset_root, "resolved dataset root");

    // 6. Register the external table (drop, create, repair partitions)
    let registrar = TableRegistrar::new(&args.table_name);
    registrar
        .register(engine, &columns, partition_spec.as_ref(), dataset_root)
        .await?;

    // 7. Read every declared column back through the engine
    let select = select_statement(&args.table_name, &columns);
    let engine_rows = engine.fetch_rows(&select, &columns).await?;

    // 8. Baseline through the writer's own reader
    let baseline = handle.read_table(store)?;

    // 9. Compare
    let compared: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
    let checker = EquivalenceChecker {
        sort_key: args.sort_key.clone(),
        engine_timestamp_unit: args.engine_timestamp_unit,
    };
    let rows_compared = checker.assert_equivalent(&args.table_name, engine_rows, &baseline, &compared)?;

    Ok(build_report(
        args,
        dataset_root,
        &columns,
        partition_spec.as_ref(),
        rows_compared,
        start,
    ))
}

fn select_statement(table_name: &str, columns: &[HiveColumn]) -> String {
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    format!("SELECT {} FROM {}", names.join(", "), table_name)
}

fn build_report(
    args: &VerifyArgs,
    dataset_root: &str,
    columns: &[HiveColumn],
    partition_spec: Option<&PartitionSpec>,
    rows_compared: usize,
    start: Instant,
) -> VerifyReport {
    let partitions: Vec<PartitionReport> = partition_spec
        .map(|spec| {
            spec.columns
                .iter()
                .map(|c| PartitionReport {
                    name: c.name.clone(),
                    source: c.source.clone(),
                    ddl_type: c.hive_type.as_ddl().to_string(),
                })
                .collect()
        })
        .unwrap_or_default();
    let partition_names: Vec<&str> = partitions.iter().map(|p| p.name.as_str()).collect();

    VerifyReport {
        table_name: args.table_name.clone(),
        dataset_id: args.dataset_id.clone(),
        dataset_root: dataset_root.to_string(),
        rows_compared,
        columns: columns
            .iter()
            .filter(|c| !partition_names.contains(&c.name.as_str()))
            .map(|c| ColumnReport {
                name: c.name.clone(),
                ddl_type: c.hive_type.as_ddl().to_string(),
            })
            .collect(),
        partitions,
        duration_ms: start.elapsed().as_millis() as u64,
    }
}
