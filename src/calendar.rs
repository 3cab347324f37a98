//! Duty calendar accumulation and deterministic JSON output.

use crate::error::{Result, ScraperError};
use crate::registry;
use crate::types::{DutyCalendar, DutyEntry, Pharmacy};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Date key format used in the output document.
const DATE_KEY_FORMAT: &str = "%d/%m/%Y";

/// Outcome of resolving extracted entries against the registry.
#[derive(Debug, Default)]
pub struct CalendarBuild {
    pub dates: BTreeMap<String, Vec<String>>,
    pub matched: usize,
    pub unmatched: usize,
}

/// Resolves extracted entries against the registry and accumulates the
/// date → [pharmacy id] mapping. Unresolved entries are dropped (counted,
/// not errored); two entries resolving to different pharmacies on the same
/// date both keep their slot.
pub fn build(entries: &[DutyEntry], pharmacies: &[Pharmacy]) -> CalendarBuild {
    let mut outcome = CalendarBuild::default();
    for entry in entries {
        let Some(pharmacy) = registry::resolve(pharmacies, entry) else {
            debug!(
                "No registry match for {} ({}), dropping entry",
                entry.date, entry.address
            );
            outcome.unmatched += 1;
            continue;
        };
        outcome.matched += 1;
        let key = entry.date.format(DATE_KEY_FORMAT).to_string();
        let ids = outcome.dates.entry(key).or_default();
        if !ids.contains(&pharmacy.id) {
            ids.push(pharmacy.id.clone());
        }
    }
    outcome
}

/// Renders the calendar document as deterministic JSON: sorted keys,
/// 4-space indentation, non-ASCII preserved literally. A non-finite
/// `updated` timestamp fails instead of being emitted.
pub fn to_json_string(calendar: &DutyCalendar) -> Result<String> {
    if !calendar.updated.is_finite() {
        return Err(ScraperError::Serialization(
            "updated timestamp is not a finite number".to_string(),
        ));
    }
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    calendar.serialize(&mut serializer)?;
    String::from_utf8(buf)
        .map_err(|e| ScraperError::Serialization(format!("output is not valid UTF-8: {}", e)))
}

/// Writes the calendar document with an atomic replace: the JSON lands in
/// a sibling temp file first and is renamed over the target, so a failed
/// run never leaves partial output behind.
pub fn write(calendar: &DutyCalendar, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = to_json_string(calendar)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json)?;
    fs::rename(&tmp_path, path)?;

    info!(
        "Wrote duty calendar with {} dates to {}",
        calendar.calendar.len(),
        path.display()
    );
    Ok(())
}
