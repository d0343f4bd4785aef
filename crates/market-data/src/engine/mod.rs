//! Price resolution entry point.

mod config;
mod price_engine;

pub use config::EngineConfig;
pub use price_engine::{PriceResolutionEngine, Resolution, ResolutionOutcome};
