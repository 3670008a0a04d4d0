//! Session-wide N/P/K store shared by every prediction view.
//!
//! Views receive a clone of [`SharedAgronomicState`] when they are built,
//! read it when they mount, and write every local edit through it. Changes
//! are pushed to subscribers so other mounted views refresh without polling.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Nitrogen, phosphorus and potassium levels. Any field may be empty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgronomicTriple {
    pub nitrogen: Option<f64>,
    pub phosphorus: Option<f64>,
    pub potassium: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nutrient {
    Nitrogen,
    Phosphorus,
    Potassium,
}

/// Text that is neither blank nor a number.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("'{0}' is not a number")]
pub struct InvalidNumber(pub String);

/// A partial triple. `None` leaves a field untouched; `Some(None)` empties it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TripleUpdate {
    pub nitrogen: Option<Option<f64>>,
    pub phosphorus: Option<Option<f64>>,
    pub potassium: Option<Option<f64>>,
}

impl TripleUpdate {
    /// Change a single field
    pub fn field(nutrient: Nutrient, value: Option<f64>) -> Self {
        let mut update = Self::default();
        match nutrient {
            Nutrient::Nitrogen => update.nitrogen = Some(value),
            Nutrient::Phosphorus => update.phosphorus = Some(value),
            Nutrient::Potassium => update.potassium = Some(value),
        }
        update
    }

    /// Change a single field from a text input. Blank input empties the field.
    pub fn parse_field(nutrient: Nutrient, input: &str) -> Result<Self, InvalidNumber> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(Self::field(nutrient, None));
        }
        let value = trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| InvalidNumber(input.to_string()))?;
        Ok(Self::field(nutrient, Some(value)))
    }

    fn apply(self, triple: &mut AgronomicTriple) {
        if let Some(v) = self.nitrogen {
            triple.nitrogen = v;
        }
        if let Some(v) = self.phosphorus {
            triple.phosphorus = v;
        }
        if let Some(v) = self.potassium {
            triple.potassium = v;
        }
    }
}

/// Cloning shares the same underlying store.
#[derive(Debug, Clone)]
pub struct SharedAgronomicState {
    tx: Arc<watch::Sender<AgronomicTriple>>,
}

impl Default for SharedAgronomicState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedAgronomicState {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AgronomicTriple::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn get(&self) -> AgronomicTriple {
        *self.tx.borrow()
    }

    /// Merge the given fields; untouched fields keep their value.
    pub fn update(&self, update: TripleUpdate) {
        self.tx.send_modify(|triple| update.apply(triple));
        tracing::debug!("Agronomic state updated: {:?}", self.get());
    }

    /// Overwrite all three fields at once.
    pub fn replace(&self, triple: AgronomicTriple) {
        self.tx.send_replace(triple);
        tracing::debug!("Agronomic state replaced: {:?}", triple);
    }

    pub fn subscribe(&self) -> watch::Receiver<AgronomicTriple> {
        self.tx.subscribe()
    }
}
