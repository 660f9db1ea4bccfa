//! HTTP handlers

pub mod health;
pub mod model;
pub mod suggest;

pub use health::health_check;
pub use model::model_info;
pub use suggest::suggest;
