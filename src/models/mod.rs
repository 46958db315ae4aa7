// Module exports for models
// Records sourced from the data provider plus local configuration

pub mod challenge;
pub mod event;
pub mod settings;
