pub mod loader;
pub mod record;

pub use loader::{load_endpoint_records, load_service_host_mapping, RecordBatch, ServiceHostMapping};
pub use record::RawEndpointRecord;
