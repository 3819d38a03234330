//! Equivalence checking - canonical values, comparison frames, and the
//! tolerant row-set comparison

pub mod checker;
pub mod frame;
pub mod value;

pub use checker::EquivalenceChecker;
pub use frame::ComparisonFrame;
pub use value::{TimestampUnit, Value};
