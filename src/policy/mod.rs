pub mod cors;

pub use cors::{load_allow_origins, CorsAccumulator, CorsPolicy};
