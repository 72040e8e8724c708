/// NWS Rothfusz regression coefficients, c1..c9
pub const ROTHFUSZ_COEFFICIENTS: [f64; 9] = [
    -42.379,
    2.04901523,
    10.14333127,
    -0.22475541,
    -0.00683783,
    -0.05481717,
    0.00122874,
    0.00085282,
    -0.00000199,
];

/// Below this temperature (°F) the heat index is the raw temperature
pub const HEAT_INDEX_THRESHOLD_F: f64 = 80.0;

/// HSRI component weights
pub const UV_WEIGHT: f64 = 0.3;
pub const SOLAR_WEIGHT: f64 = 8.0;
pub const WIND_WEIGHT: f64 = 4.0;
pub const CLOUD_WEIGHT: f64 = 0.05;

/// W/m² per unit of effective solar radiation
pub const SOLAR_SCALE_WM2: f64 = 1000.0;

/// HSRI bounds
pub const HSRI_MIN: f64 = -100.0;
pub const HSRI_MAX: f64 = 100.0;

/// Risk tier lower bounds (inclusive)
pub const CRITICAL_THRESHOLD: f64 = 85.0;
pub const HIGH_THRESHOLD: f64 = 75.0;
pub const MODERATE_THRESHOLD: f64 = 65.0;
pub const LOW_THRESHOLD: f64 = 50.0;
pub const COOL_THRESHOLD: f64 = 30.0;

/// Forecasting
pub const MIN_FORECAST_HISTORY: usize = 10;
pub const DAILY_FEATURE_DRIFT: f64 = 0.02;
pub const MAX_HORIZON_DAYS: u32 = 3;
pub const DEFAULT_HORIZON_DAYS: u32 = 3;
pub const DEFAULT_HISTORY_WINDOW: usize = 50;

/// Eigenvalues of the normal matrix below this fraction of the raw
/// feature energy are treated as zero
pub const RANK_TOLERANCE: f64 = 1e-12;

/// Dashboard defaults
pub const DEFAULT_RISK_THRESHOLD: f64 = 65.0;
/// Peak HSRI at which emergency departments are warned
pub const HEALTHCARE_ALERT_THRESHOLD: f64 = HIGH_THRESHOLD;
pub const ALL_AREAS: &str = "All Areas";
pub const UNKNOWN_COUNTY: &str = "Other";
pub const UNKNOWN_SITE_PREFIX: &str = "Location-";
pub const NYC_CENTER_LAT: f64 = 40.7128;
pub const NYC_CENTER_LON: f64 = -74.0060;

/// Input column names
pub const COL_TEMP: &str = "temp";
pub const COL_HUMIDITY: &str = "humidity";
pub const COL_WIND: &str = "windspeed";
pub const COL_SOLAR: &str = "solarradiation";
pub const COL_UV: &str = "uvindex";
pub const COL_CLOUD: &str = "cloudcover";

/// Processing defaults
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
