//! Per-view coordination for CropClock
//!
//! Location resolution with last-trigger-wins semantics, the shared N/P/K
//! store, and the prediction workflows that read from both.

pub mod agronomic;
pub mod error;
mod error_mapping;
pub mod latest;
pub mod orchestrator;
pub mod resolver;
pub mod session;

pub use agronomic::{AgronomicTriple, InvalidNumber, Nutrient, SharedAgronomicState, TripleUpdate};
pub use error::{OrchestratorError, ResolveError};
pub use latest::{Latest, Ticket};
pub use orchestrator::{
    CropInputs, FertilizerInputs, PredictionOrchestrator, PredictionOutcome, PriceInputs,
};
pub use resolver::{
    LocationResolver, LocationStatus, Resolution, ResolverSettings, SuggestionList,
    SuggestionUpdate,
};
pub use session::{Session, SessionResolver};
