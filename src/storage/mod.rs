pub mod csv_source;
pub mod jsonl;

pub use csv_source::CsvSource;
pub use jsonl::JsonlSink;
