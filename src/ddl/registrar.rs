//! External table registration.
//!
//! Declares an external table over the dataset root and makes partitioned
//! data queryable. Registration is idempotent per run: any pre-existing
//! table of the same name is dropped first. Statements are assembled from
//! first-class column lists, never recovered from formatted text.

use anyhow::Result;
use tracing::debug;

use crate::ddl::partition::PartitionSpec;
use crate::ddl::types::HiveColumn;
use crate::engine::QueryEngine;
use crate::error::CheckError;

pub struct TableRegistrar {
    table_name: String,
}

impl TableRegistrar {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
        }
    }

    /// Register the external table: drop, create, and discover partitions.
    ///
    /// DDL failures are fatal and propagate with the offending statement; a
    /// malformed schema means the verification itself is invalid, not a
    /// transient fault to retry.
    pub async fn register(
        &self,
        engine: &mut dyn QueryEngine,
        columns: &[HiveColumn],
        partition_spec: Option<&PartitionSpec>,
        dataset_root: &str,
    ) -> Result<()> {
        self.execute(engine, self.drop_statement()).await?;
        self.execute(engine, self.create_statement(columns, partition_spec, dataset_root))
            .await?;

        // External-table partition registration is not automatic on directory
        // creation; on-disk partitions stay invisible until repaired. On
        // Hive >= 4.0 discover.partitions can replace this statement.
        if partition_spec.is_some() {
            self.execute(engine, self.repair_statement()).await?;
        }
        Ok(())
    }

    async fn execute(&self, engine: &mut dyn QueryEngine, statement: String) -> Result<()> {
        debug!(statement = %statement, "executing DDL");
        engine
            .execute(&statement)
            .await
            .map_err(|source| CheckError::DdlExecution {
                statement,
                source: source.into(),
            })?;
        Ok(())
    }

    pub(crate) fn drop_statement(&self) -> String {
        format!("DROP TABLE IF EXISTS {}", self.table_name)
    }

    pub(crate) fn create_statement(
        &self,
        columns: &[HiveColumn],
        partition_spec: Option<&PartitionSpec>,
        dataset_root: &str,
    ) -> String {
        // A column is either a regular column or a partition column, never
        // both in the DDL body.
        let partition_names: Vec<&str> = partition_spec
            .map(|spec| spec.columns.iter().map(|c| c.name.as_str()).collect())
            .unwrap_or_default();
        let body = columns
            .iter()
            .filter(|c| !partition_names.contains(&c.name.as_str()))
            .map(|c| format!("  {} {}", c.name, c.hive_type.as_ddl()))
            .collect::<Vec<_>>()
            .join(",\n");

        let partitioned_by = partition_spec
            .map(|spec| {
                let decls = spec
                    .columns
                    .iter()
                    .map(|c| format!("{} {}", c.name, c.hive_type.as_ddl()))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("\nPARTITIONED BY ({decls})")
            })
            .unwrap_or_default();

        format!(
            "CREATE EXTERNAL TABLE {} (\n{}\n){}\nSTORED AS PARQUET\nLOCATION '{}'",
            self.table_name, body, partitioned_by, dataset_root
        )
    }

    pub(crate) fn repair_statement(&self) -> String {
        format!("MSCK REPAIR TABLE {}", self.table_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ddl::partition::PartitionRequest;
    use crate::ddl::types::HiveType;
    use arrow::datatypes::{DataType, Field, Schema};

    fn columns() -> Vec<HiveColumn> {
        vec![
            HiveColumn {
                name: "bool".to_string(),
                hive_type: HiveType::Boolean,
            },
            HiveColumn {
                name: "date_".to_string(),
                hive_type: HiveType::Date,
            },
            HiveColumn {
                name: "partition_0".to_string(),
                hive_type: HiveType::String,
            },
        ]
    }

    fn spec() -> PartitionSpec {
        let schema = Schema::new(vec![Field::new("date_", DataType::Date32, false)]);
        PartitionSpec::derive(
            &[PartitionRequest {
                source: "date_".to_string(),
                cast_to_text: true,
            }],
            &schema,
        )
        .unwrap()
    }

    #[test]
    fn test_unpartitioned_create_statement() {
        let registrar = TableRegistrar::new("test");
        let ddl = registrar.create_statement(&columns()[..2], None, "/data/test");
        assert_eq!(
            ddl,
            "CREATE EXTERNAL TABLE test (\n  bool BOOLEAN,\n  date_ DATE\n)\nSTORED AS PARQUET\nLOCATION '/data/test'"
        );
    }

    #[test]
    fn test_partition_columns_leave_the_body() {
        let registrar = TableRegistrar::new("test");
        let ddl = registrar.create_statement(&columns(), Some(&spec()), "/data/test");
        assert!(ddl.contains("PARTITIONED BY (partition_0 STRING)"));
        // Declared as a partition column only, never in the body list
        assert_eq!(ddl.matches("partition_0").count(), 1);
        assert!(ddl.contains("  bool BOOLEAN,\n  date_ DATE\n)"));
    }

    #[test]
    fn test_drop_and_repair_statements() {
        let registrar = TableRegistrar::new("roundtrip");
        assert_eq!(registrar.drop_statement(), "DROP TABLE IF EXISTS roundtrip");
        assert_eq!(registrar.repair_statement(), "MSCK REPAIR TABLE roundtrip");
    }
}
