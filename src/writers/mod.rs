pub mod forecast_writer;
pub mod parquet_writer;

pub use forecast_writer::{ForecastFormat, ForecastWriter};
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
