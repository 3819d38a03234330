//! Dataset layer - store access, physical layout, writing, and fixtures

pub mod fixture;
pub mod layout;
pub mod store;
pub mod writer;

pub use store::{LocalStore, Store, StoreUrl};
pub use writer::DatasetHandle;
