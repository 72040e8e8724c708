use crate::error::{ProcessingError, Result};
use crate::models::{
    HsriResult, RiskTier, ScoredObservation, StationMetadata, WeatherObservation,
};
use crate::readers::StationRegistry;
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::{Array, Float64Array, StringArray, TimestampMillisecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const UTC: &str = "UTC";

/// Writes scored observations, one row per station-hour, joined with the
/// station's registry entry
pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
    registry: StationRegistry,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            registry: StationRegistry::nyc_metro(),
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    pub fn with_registry(mut self, registry: StationRegistry) -> Self {
        self.registry = registry;
        self
    }

    fn writer_properties(&self) -> WriterProperties {
        WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build()
    }

    /// Write scored observations to a Parquet file
    pub fn write_scored(&self, records: &[ScoredObservation], path: &Path) -> Result<()> {
        self.write_scored_batched(records, path, records.len().max(1))
    }

    /// Write scored observations in batches of `batch_size` rows
    pub fn write_scored_batched(
        &self,
        records: &[ScoredObservation],
        path: &Path,
        batch_size: usize,
    ) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let schema = Self::schema();
        let file = File::create(path)?;
        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(self.writer_properties()))?;

        for chunk in records.chunks(batch_size.max(1)) {
            let batch = self.records_to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }

        writer.close()?;
        debug!(rows = records.len(), path = %path.display(), "Wrote scored observations");
        Ok(())
    }

    /// Arrow schema of the scored-observation file
    pub fn schema() -> Arc<Schema> {
        let fields = vec![
            Field::new("station_id", DataType::Utf8, false),
            Field::new("site_name", DataType::Utf8, false),
            Field::new("county", DataType::Utf8, false),
            Field::new("latitude", DataType::Float64, false),
            Field::new("longitude", DataType::Float64, false),
            Field::new(
                "timestamp",
                DataType::Timestamp(TimeUnit::Millisecond, Some(UTC.into())),
                false,
            ),
            Field::new("temperature_f", DataType::Float64, false),
            Field::new("relative_humidity_pct", DataType::Float64, false),
            Field::new("wind_speed_mph", DataType::Float64, false),
            Field::new("solar_radiation_wm2", DataType::Float64, true),
            Field::new("uv_index", DataType::Float64, true),
            Field::new("cloud_cover_pct", DataType::Float64, true),
            Field::new("heat_index", DataType::Float64, false),
            Field::new("hsri", DataType::Float64, false),
            Field::new("risk_tier", DataType::Utf8, false),
        ];

        Arc::new(Schema::new(fields))
    }

    fn records_to_batch(
        &self,
        records: &[ScoredObservation],
        schema: Arc<Schema>,
    ) -> Result<RecordBatch> {
        let stations: Vec<StationMetadata> = records
            .iter()
            .map(|r| self.registry.lookup(&r.observation.station_id))
            .collect();

        let observed = |f: fn(&WeatherObservation) -> f64| -> Arc<dyn Array> {
            Arc::new(Float64Array::from(
                records.iter().map(|r| f(&r.observation)).collect::<Vec<_>>(),
            ))
        };
        let optional = |f: fn(&WeatherObservation) -> Option<f64>| -> Arc<dyn Array> {
            Arc::new(Float64Array::from(
                records.iter().map(|r| f(&r.observation)).collect::<Vec<_>>(),
            ))
        };

        let timestamps: Vec<i64> = records
            .iter()
            .map(|r| r.observation.timestamp.timestamp_millis())
            .collect();

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from_iter_values(
                    stations.iter().map(|s| s.station_id.as_str()),
                )),
                Arc::new(StringArray::from_iter_values(
                    stations.iter().map(|s| s.site_name.as_str()),
                )),
                Arc::new(StringArray::from_iter_values(
                    stations.iter().map(|s| s.county.as_str()),
                )),
                Arc::new(Float64Array::from_iter_values(
                    stations.iter().map(|s| s.latitude),
                )),
                Arc::new(Float64Array::from_iter_values(
                    stations.iter().map(|s| s.longitude),
                )),
                Arc::new(TimestampMillisecondArray::from(timestamps).with_timezone(UTC)),
                observed(|o| o.temperature_f),
                observed(|o| o.relative_humidity_pct),
                observed(|o| o.wind_speed_mph),
                optional(|o| o.solar_radiation_wm2),
                optional(|o| o.uv_index),
                optional(|o| o.cloud_cover_pct),
                Arc::new(Float64Array::from_iter_values(
                    records.iter().map(|r| r.result.heat_index),
                )),
                Arc::new(Float64Array::from_iter_values(
                    records.iter().map(|r| r.result.hsri),
                )),
                Arc::new(StringArray::from_iter_values(
                    records.iter().map(|r| r.result.risk_tier.name()),
                )),
            ],
        )?;

        Ok(batch)
    }

    /// Read up to `limit` rows back, paired with the stored station metadata
    pub fn read_sample(
        &self,
        path: &Path,
        limit: usize,
    ) -> Result<Vec<(StationMetadata, ScoredObservation)>> {
        let file = File::open(path)?;
        let parquet_reader = ParquetRecordBatchReaderBuilder::try_new(file)?
            .with_batch_size(limit.clamp(1, 8192))
            .build()?;

        let mut records = Vec::new();

        for batch_result in parquet_reader {
            if records.len() >= limit {
                break;
            }
            let batch = batch_result?;

            let station_ids = column::<StringArray>(&batch, "station_id")?;
            let site_names = column::<StringArray>(&batch, "site_name")?;
            let counties = column::<StringArray>(&batch, "county")?;
            let latitudes = column::<Float64Array>(&batch, "latitude")?;
            let longitudes = column::<Float64Array>(&batch, "longitude")?;
            let timestamps = column::<TimestampMillisecondArray>(&batch, "timestamp")?;
            let temperatures = column::<Float64Array>(&batch, "temperature_f")?;
            let humidities = column::<Float64Array>(&batch, "relative_humidity_pct")?;
            let winds = column::<Float64Array>(&batch, "wind_speed_mph")?;
            let solars = column::<Float64Array>(&batch, "solar_radiation_wm2")?;
            let uvs = column::<Float64Array>(&batch, "uv_index")?;
            let clouds = column::<Float64Array>(&batch, "cloud_cover_pct")?;
            let heat_indices = column::<Float64Array>(&batch, "heat_index")?;
            let hsris = column::<Float64Array>(&batch, "hsri")?;
            let tiers = column::<StringArray>(&batch, "risk_tier")?;

            let rows = batch.num_rows().min(limit - records.len());
            for i in 0..rows {
                let timestamp = DateTime::from_timestamp_millis(timestamps.value(i))
                    .ok_or_else(|| {
                        ProcessingError::InvalidFormat("Invalid timestamp in Parquet file".to_string())
                    })?;
                let risk_tier = RiskTier::parse(tiers.value(i)).ok_or_else(|| {
                    ProcessingError::InvalidFormat(format!(
                        "Unknown risk tier '{}'",
                        tiers.value(i)
                    ))
                })?;

                let station = StationMetadata::new(
                    station_ids.value(i).to_string(),
                    site_names.value(i).to_string(),
                    counties.value(i).to_string(),
                    latitudes.value(i),
                    longitudes.value(i),
                );
                let observation = WeatherObservation {
                    station_id: station.station_id.clone(),
                    timestamp,
                    temperature_f: temperatures.value(i),
                    relative_humidity_pct: humidities.value(i),
                    wind_speed_mph: winds.value(i),
                    solar_radiation_wm2: nullable(solars, i),
                    uv_index: nullable(uvs, i),
                    cloud_cover_pct: nullable(clouds, i),
                };
                let result = HsriResult {
                    heat_index: heat_indices.value(i),
                    hsri: hsris.value(i),
                    risk_tier,
                };

                records.push((station, ScoredObservation::new(observation, result)));
            }
        }

        Ok(records)
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let row_group_sizes: Vec<i64> = (0..row_groups)
            .map(|i| metadata.row_group(i).num_rows())
            .collect();
        let compression = metadata
            .row_groups()
            .first()
            .and_then(|rg| rg.columns().first())
            .map(|c| c.compression())
            .unwrap_or(self.compression);

        Ok(ParquetFileInfo {
            total_rows: metadata.file_metadata().num_rows(),
            row_groups,
            row_group_sizes,
            file_size: std::fs::metadata(path)?.len(),
            compression,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn column<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid {} column", name)))
}

fn nullable(array: &Float64Array, i: usize) -> Option<f64> {
    (!array.is_null(i)).then(|| array.value(i))
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: usize,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };

        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0, // Convert to MB
            self.compression,
            avg_rows
        )
    }
}
