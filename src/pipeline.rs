//! The single `update` operation: load registry, fetch + extract, match,
//! write the duty calendar.

use crate::error::{Result, ScraperError};
use crate::types::{DutyCalendar, DutyEntry, DutySource};
use crate::{calendar, registry};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct UpdateOptions {
    pub registry_file: PathBuf,
    pub calendar_file: PathBuf,
    /// Additional fetch attempts after a failed HTTP request. Parse
    /// failures are never retried.
    pub fetch_retries: u32,
}

/// Summary of one update run, for the caller's report.
#[derive(Debug, Default)]
pub struct UpdateResult {
    pub extracted: usize,
    pub matched_dates: usize,
    pub unmatched: usize,
    /// Path written, or `None` when the run was a no-op
    pub output_file: Option<PathBuf>,
}

/// Runs one idempotent update pass.
///
/// An empty registry is a deliberate no-op, as is a run in which nothing
/// matched; in both cases any previously written calendar is left
/// untouched. The write itself is all-or-nothing.
pub async fn run_update(source: &dyn DutySource, options: &UpdateOptions) -> Result<UpdateResult> {
    let pharmacies = registry::load(&options.registry_file)?;
    if pharmacies.is_empty() {
        info!("Registry is empty; nothing to reconcile against");
        return Ok(UpdateResult::default());
    }

    let entries = fetch_with_retries(source, options.fetch_retries).await?;

    let outcome = calendar::build(&entries, &pharmacies);

    if outcome.dates.is_empty() {
        info!("No entry matched the registry; leaving previous calendar untouched");
        return Ok(UpdateResult {
            extracted: entries.len(),
            unmatched: outcome.unmatched,
            ..UpdateResult::default()
        });
    }

    let matched_dates = outcome.dates.len();
    let document = DutyCalendar {
        calendar: outcome.dates,
        source: source.source_url().to_string(),
        updated: unix_timestamp()?,
    };
    calendar::write(&document, &options.calendar_file)?;

    Ok(UpdateResult {
        extracted: entries.len(),
        matched_dates,
        unmatched: outcome.unmatched,
        output_file: Some(options.calendar_file.clone()),
    })
}

async fn fetch_with_retries(
    source: &dyn DutySource,
    retries: u32,
) -> Result<Vec<DutyEntry>> {
    let mut attempt = 0;
    loop {
        match source.fetch_duty_entries().await {
            Ok(entries) => return Ok(entries),
            Err(error @ ScraperError::Http(_)) if attempt < retries => {
                attempt += 1;
                warn!(
                    "Fetch from {} failed (attempt {}/{}): {}",
                    source.source_url(),
                    attempt,
                    retries + 1,
                    error
                );
            }
            Err(error) => return Err(error),
        }
    }
}

/// Wall-clock seconds since the Unix epoch, fractional.
fn unix_timestamp() -> Result<f64> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| ScraperError::Serialization(format!("system clock before epoch: {}", e)))?;
    Ok(elapsed.as_secs_f64())
}
