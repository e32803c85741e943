pub mod dto;
pub mod services;

pub use dto::ImportReport;
pub use services::{CsvSource, Importer};
