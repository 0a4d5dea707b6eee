//! Scan report templates.
//!
//! The report is static text apart from the timestamp and the optional target
//! echoed into the first pattern line.

use std::fmt;

use chrono::{DateTime, Utc};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

const SIGNAL_READ: &str = "Core pulse steady but compressed; collective jitter contained.";
const DEFAULT_ANCHOR: &str = "Anchor nodes steady; subtle pull toward overextension.";
const OVERLAY: &str = "Collective overlay shows mild unrest but no hard spikes.";
const CLARITY: &str = "Signal clarity improves when one channel stays prioritized.";
const FUNCTIONAL_LEVER: &str =
    "Slow breath, pick one priority to stabilize, and tighten boundary before moving.";
const NEXT_STEP: &str =
    "Ready to lock onto a specific person, archetype, or field-event on your cue.";

/// One scan report, rendered line by line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanReport {
    pub timestamp: String,
    pub pattern_map: [String; 3],
}

impl ScanReport {
    pub fn new(target: &str, now: DateTime<Utc>) -> Self {
        Self {
            timestamp: now.format(TIMESTAMP_FORMAT).to_string(),
            pattern_map: pattern_map(target),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(7);
        lines.push(format!("Signal read ({}): {SIGNAL_READ}", self.timestamp));
        lines.push("Pattern map:".to_string());
        lines.extend(self.pattern_map.iter().map(|p| format!("- {p}")));
        lines.push(format!("Functional lever: {FUNCTIONAL_LEVER}"));
        lines.push(format!("Next: {NEXT_STEP}"));
        lines
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines().join("\n"))
    }
}

/// The three pattern lines; the first one anchors on `target` when given.
pub fn pattern_map(target: &str) -> [String; 3] {
    let anchor = if target.is_empty() {
        DEFAULT_ANCHOR.to_string()
    } else {
        format!("Anchor nodes steady around {target}; subtle pull toward overextension.")
    };
    [anchor, OVERLAY.to_string(), CLARITY.to_string()]
}

pub fn format_report(target: &str) -> String {
    format_report_at(target, Utc::now())
}

pub fn format_report_at(target: &str, now: DateTime<Utc>) -> String {
    ScanReport::new(target, now).to_string()
}
