//! Accident case records and the read-only store that holds them

pub mod store;
pub mod types;

pub use store::{write_cases, CaseStore, LoadReport};
pub use types::{normalize_narrative, AccidentCase};
