pub mod prediction;
pub mod workflow;

pub use prediction::{ClientError, PredictionClient};
pub use workflow::*;
