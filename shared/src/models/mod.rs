//! Domain models for the Crop Health Advisory platform

mod crop;
mod label;
mod record;
mod request;
mod training;

pub use crop::*;
pub use label::*;
pub use record::*;
pub use request::*;
pub use training::*;
