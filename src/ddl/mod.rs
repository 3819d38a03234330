//! DDL layer - type mapping, partition specs, and external table registration

pub mod partition;
pub mod registrar;
pub mod types;

pub use partition::{PartitionRequest, PartitionSpec};
pub use registrar::TableRegistrar;
pub use types::{HiveColumn, HiveType, LogicalType};
