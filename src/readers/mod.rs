pub mod observation_reader;
pub mod station_registry;

pub use observation_reader::{parse_timestamp, LoadReport, ObservationBatch, ObservationReader};
pub use station_registry::StationRegistry;
