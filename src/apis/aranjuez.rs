//! Crawler for the Aranjuez town hall on-duty pharmacy page.
//!
//! The page is a WordPress entry whose body alternates month-header
//! paragraphs ("Enero") with day-listing paragraphs in which each
//! `<strong>` span ("Viernes, 30") is followed by free text holding the
//! pharmacy address and phone. The text arrives with a handful of known
//! encoding artifacts which [`crate::normalize`] repairs.

use crate::constants::{ARANJUEZ_DUTY_URL, ARANJUEZ_SOURCE};
use crate::error::{Result, ScraperError};
use crate::normalize::{
    canonical_weekday, month_number, normalize_address, normalize_phone, resolve_date,
};
use crate::types::{DutyEntry, DutySource};
use chrono::{Datelike, Utc};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct AranjuezCrawler {
    client: reqwest::Client,
    url: String,
}

impl AranjuezCrawler {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_url(ARANJUEZ_DUTY_URL, timeout)
    }

    pub fn with_url(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl DutySource for AranjuezCrawler {
    fn source_name(&self) -> &'static str {
        ARANJUEZ_SOURCE
    }

    fn source_url(&self) -> &str {
        &self.url
    }

    async fn fetch_duty_entries(&self) -> Result<Vec<DutyEntry>> {
        info!("Fetching on-duty schedule from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;

        let entries = parse_schedule(&body, Utc::now().year())?;
        info!("Parsed {} duty entries", entries.len());
        if entries.is_empty() {
            warn!("No duty entries found - the page structure may have changed");
        }
        Ok(entries)
    }
}

/// Parses the schedule page body into duty entries.
///
/// `base_year` anchors year disambiguation: the page dates entries by
/// weekday and day number only, so each is tried against `base_year`, the
/// year before and the year after, keeping the first whose weekday agrees
/// with the declared one.
///
/// Entry-level problems (malformed spans, unresolvable dates) are logged
/// and skipped; only a missing schedule container is an error.
pub fn parse_schedule(html: &str, base_year: i32) -> Result<Vec<DutyEntry>> {
    let document = Html::parse_document(html);
    let entry_selector = Selector::parse("div.entry").unwrap();
    let p_selector = Selector::parse("p").unwrap();
    let strong_selector = Selector::parse("strong").unwrap();

    let container = document.select(&entry_selector).next().ok_or_else(|| {
        ScraperError::PageStructure("schedule container div.entry not found".to_string())
    })?;

    let mut entries = Vec::new();
    // None: awaiting a month header. Some: awaiting that month's day listing.
    let mut current_month: Option<(String, u32)> = None;

    for block in container.select(&p_selector) {
        match current_month.clone() {
            None => {
                if let Some(name) = month_header(block, &strong_selector) {
                    match month_number(&name) {
                        Some(number) => current_month = Some((name, number)),
                        None => warn!("Unrecognized month header '{}', skipping section", name),
                    }
                }
            }
            Some((month_name, month)) => {
                let spans: Vec<ElementRef> = block.select(&strong_selector).collect();
                if spans.is_empty() {
                    // neither header nor day listing; state unchanged
                    continue;
                }
                for span in spans {
                    if let Some(entry) = parse_day_span(span, &month_name, month, base_year) {
                        entries.push(entry);
                    }
                }
                current_month = None;
            }
        }
    }

    Ok(entries)
}

/// A block is a month header when its first `<strong>` is its only content.
fn month_header(block: ElementRef, strong_selector: &Selector) -> Option<String> {
    let strong = block.select(strong_selector).next()?;
    let strong_text: String = strong.text().collect();
    let block_text: String = block.text().collect();
    let name = strong_text.trim();
    if !name.is_empty() && name == block_text.trim() {
        Some(name.to_string())
    } else {
        None
    }
}

/// Turns one `<strong>` weekday/day span and its trailing sibling text into
/// a duty entry, or `None` when the span should be skipped.
fn parse_day_span(
    span: ElementRef,
    month_name: &str,
    month: u32,
    base_year: i32,
) -> Option<DutyEntry> {
    let label: String = span.text().collect();
    let label = label.trim();

    // Overflow/continuation spans mark extra text, not calendar entries
    if label.starts_with('+') {
        return None;
    }

    let parts: Vec<&str> = label.split(',').collect();
    if parts.len() < 2 {
        debug!("Span '{}' is not a weekday/day pair, skipping", label);
        return None;
    }

    let weekday = canonical_weekday(parts[0]);
    let day: u32 = match parts[1].trim().parse() {
        Ok(day) => day,
        Err(_) => {
            warn!("Unparseable day number in span '{}', skipping", label);
            return None;
        }
    };

    let Some(date) = resolve_date(month, day, &weekday, base_year) else {
        warn!(
            "No year in range puts {} {} on a '{}', skipping",
            day, month_name, weekday
        );
        return None;
    };

    let payload = span
        .next_sibling()
        .and_then(|node| node.value().as_text().map(|text| text.to_string()));
    let Some(payload) = payload else {
        debug!("Span '{}' has no trailing pharmacy text, skipping", label);
        return None;
    };
    let payload = payload.trim();
    let payload = payload.strip_prefix(':').map(str::trim).unwrap_or(payload);
    // Some lines separate the day span from the address with a dash
    // instead of a colon; drop it so the address piece is not empty
    let payload = payload.trim_start_matches(['–', '—']).trim_start();

    let mut pieces = payload.split(['–', '—']);
    let address = normalize_address(pieces.next().unwrap_or(""));
    let phone = pieces.next().and_then(normalize_phone);

    if address.is_empty() && phone.is_none() {
        warn!("Entry for {} carries no address or phone, skipping", date);
        return None;
    }

    Some(DutyEntry {
        date,
        address,
        phone,
    })
}
