//! Selection tables: what gets drawn for table-backed entity groups

pub mod registry;

pub use registry::{SelectionEntry, SelectionRegistry, SelectionTable};
