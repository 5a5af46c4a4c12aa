pub mod writer;

pub use writer::{assemble, to_pretty_json, write_document};
