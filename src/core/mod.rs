//! Core recipe logic — model, loading, acquisition, resolution, hand-off.

pub mod fetcher;
pub mod handoff;
pub mod parser;
pub mod resolver;
pub mod types;
