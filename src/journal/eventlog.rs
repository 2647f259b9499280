//! Append-only JSONL log of resolution runs.
//!
//! Records which parameters were asked and whether they were skipped, never
//! the answers themselves.

use crate::core::resolver::Resolution;
use crate::core::types::{ResolutionEvent, TimestampedEvent};
use chrono::{SecondsFormat, Utc};
use std::io::Write;
use std::path::{Path, PathBuf};

/// RFC 3339 UTC timestamp, second precision.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Generate a run ID.
pub fn generate_run_id() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
    format!("r-{:012x}", nanos & 0xFFFF_FFFF_FFFF)
}

/// Append one event to the log at `path`, creating parent directories.
pub fn append_event(path: &Path, event: ResolutionEvent) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| format!("cannot create log dir: {}", e))?;
    }

    let te = TimestampedEvent {
        ts: now_rfc3339(),
        event,
    };
    let json = serde_json::to_string(&te).map_err(|e| format!("JSON serialize error: {}", e))?;

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("cannot open event log {}: {}", path.display(), e))?;

    writeln!(file, "{}", json).map_err(|e| format!("write error: {}", e))?;
    Ok(())
}

/// Event log bound to one resolution run.
#[derive(Debug, Clone)]
pub struct RunLog {
    path: PathBuf,
    run_id: String,
}

impl RunLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            run_id: generate_run_id(),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn started(&self, recipe: &str) -> Result<(), String> {
        append_event(
            &self.path,
            ResolutionEvent::ResolutionStarted {
                run_id: self.run_id.clone(),
                recipe: recipe.to_string(),
            },
        )
    }

    /// One event per answered prompt, then the run summary.
    pub fn finished(&self, resolution: &Resolution) -> Result<(), String> {
        for p in &resolution.prompted {
            append_event(
                &self.path,
                ResolutionEvent::InputCollected {
                    run_id: self.run_id.clone(),
                    name: p.name.clone(),
                    skipped: p.skipped,
                },
            )?;
        }
        append_event(
            &self.path,
            ResolutionEvent::ResolutionFinished {
                run_id: self.run_id.clone(),
                collected: resolution.answers.len(),
                outcome: resolution.outcome(),
            },
        )
    }
}
