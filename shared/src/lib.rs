//! Shared types and pure domain logic for the Crop Health Advisory platform
//!
//! This crate contains the field observation records, training rows, crop
//! lifecycle data and the advisory template engine. It is shared between the
//! backend and the WASM client module, so nothing in here performs I/O.

pub mod advisory;
pub mod models;
pub mod validation;

pub use advisory::*;
pub use models::*;
pub use validation::*;
