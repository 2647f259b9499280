//! Append-only provenance of resolution runs.

pub mod eventlog;
