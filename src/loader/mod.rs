// src/loader/mod.rs

//! The CSV bulk loader: streams a CSV file and translates each row into
//! store-write commands according to the target container type.

mod csv_loader;
mod planner;

pub use csv_loader::{CsvLoader, LoadSummary};
pub use planner::{RecordPlanner, TargetType};
