//! Configuration constants for the verifier
//!
//! This module centralizes all tunable parameters and constants used
//! throughout the application.

use std::time::Duration;

use crate::compare::TimestampUnit;

// ============================================================================
// Query Engine Configuration
// ============================================================================

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Unit of the integer timestamps the query engine hands back
///
/// The engine stores microsecond timestamps as plain integers (it has no
/// native microsecond timestamp type), and the unit of the value it returns
/// is engine-version dependent. This is the default for the deployments we
/// verify against; override it per run when the engine differs.
pub const DEFAULT_ENGINE_TIMESTAMP_UNIT: TimestampUnit = TimestampUnit::Microseconds;

/// Text rendering the engine uses for DATE values
pub const HIVE_DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Dataset Layout Configuration
// ============================================================================

/// Suffix that identifies data files among the store keys
pub const DATA_FILE_SUFFIX: &str = ".parquet";

/// Default sort key for row-set comparison
///
/// The fixture's binary identifier column: present in every generated table
/// and unique per row, so sorting both sides on it yields a stable pairing.
pub const DEFAULT_SORT_KEY: &str = "bytes";
