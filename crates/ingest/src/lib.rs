#![warn(clippy::unwrap_used)]

//! File ingestion: tabular readers, column auto-mapping, and record import.

pub mod importer;
pub mod mapping;
pub mod reader;

pub use importer::import_records;
pub use mapping::auto_map_columns;
pub use reader::{preview, read_csv_bytes, read_table, FilePreview, TableData};
