pub mod csv_reader;
pub mod dataset;
pub mod lag;
pub mod schema;
pub mod transform;
pub mod window;

pub use csv_reader::CsvRecordReader;
pub use dataset::SequenceDataSet;
pub use lag::{expand_dims, LaggedSeries};
pub use schema::{ColumnType, Schema};
pub use transform::{TransformProcess, TransformStep};
pub use window::{sliding_windows, window_sequences};
