// Service module exports

pub mod board;
pub mod cache;
pub mod database;
pub mod provider;
pub mod refresh;
pub mod settings;
pub mod status;
