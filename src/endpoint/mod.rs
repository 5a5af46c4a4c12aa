pub mod merge;
pub mod normalize;
pub mod types;

pub use merge::{EndpointSet, MergeOutcome};
pub use normalize::{normalize, NormalizeContext};
pub use types::{Backend, EndpointKey, NormalizedEndpoint};
