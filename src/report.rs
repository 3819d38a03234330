//! Result of a completed verification run.

use serde::Serialize;

/// A verified payload column
#[derive(Debug, Clone, Serialize)]
pub struct ColumnReport {
    pub name: String,
    pub ddl_type: String,
}

/// A verified partition column
#[derive(Debug, Clone, Serialize)]
pub struct PartitionReport {
    pub name: String,
    pub source: String,
    pub ddl_type: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyReport {
    pub table_name: String,
    pub dataset_id: String,
    pub dataset_root: String,
    pub rows_compared: usize,
    pub columns: Vec<ColumnReport>,
    pub partitions: Vec<PartitionReport>,
    pub duration_ms: u64,
}

impl VerifyReport {
    /// One-line human summary of what was verified
    pub fn summary(&self) -> String {
        let partitioned = if self.partitions.is_empty() {
            String::new()
        } else {
            format!(
                " partitioned on {}",
                self.partitions
                    .iter()
                    .map(|p| format!("{} ({} as {})", p.name, p.source, p.ddl_type))
                    .collect::<Vec<_>>()
                    .join(" and ")
            )
        };
        let columns = self
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.ddl_type))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Verified {} rows of table `{}`{} for the following columns: {}",
            self.rows_compared, self.table_name, partitioned, columns
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_mentions_partitions_and_columns() {
        let report = VerifyReport {
            table_name: "test".to_string(),
            dataset_id: "test".to_string(),
            dataset_root: "/data/test".to_string(),
            rows_compared: 100,
            columns: vec![ColumnReport {
                name: "bool".to_string(),
                ddl_type: "BOOLEAN".to_string(),
            }],
            partitions: vec![PartitionReport {
                name: "partition_0".to_string(),
                source: "date_".to_string(),
                ddl_type: "STRING".to_string(),
            }],
            duration_ms: 12,
        };
        let summary = report.summary();
        assert!(summary.contains("100 rows"));
        assert!(summary.contains("partition_0 (date_ as STRING)"));
        assert!(summary.contains("bool BOOLEAN"));
    }

    #[test]
    fn test_unpartitioned_summary_has_no_partition_clause() {
        let report = VerifyReport {
            table_name: "test".to_string(),
            dataset_id: "test".to_string(),
            dataset_root: "/data/test".to_string(),
            rows_compared: 1,
            columns: Vec::new(),
            partitions: Vec::new(),
            duration_ms: 0,
        };
        assert!(!report.summary().contains("partitioned"));
    }
}
