pub mod config;
pub mod endpoint;
pub mod error;
pub mod generator;
pub mod mapping;
pub mod output;
pub mod policy;

pub use error::{GeneratorError, RecordRejection};
pub use generator::{generate, GenerationReport};
