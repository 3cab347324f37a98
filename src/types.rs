use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A pharmacy from the authoritative registry. Loaded once per run and
/// immutable for its duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pharmacy {
    pub id: String,
    pub name: String,
    pub address: String,
    pub contact: Contact,
    #[serde(default)]
    pub location: Option<GeoLocation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default, rename = "webSite")]
    pub web_site: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// One on-duty slot parsed from the schedule page. Transient: consumed by
/// the reconciler, never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DutyEntry {
    pub date: NaiveDate,
    pub address: String,
    pub phone: Option<String>,
}

/// The persisted output document: `DD/MM/YYYY` date keys mapped to the ids
/// of the pharmacies on duty that day, plus provenance metadata.
///
/// Fields are declared in sorted order and the map is a `BTreeMap` so the
/// rendered JSON is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyCalendar {
    pub calendar: BTreeMap<String, Vec<String>>,
    pub source: String,
    pub updated: f64,
}

/// A source of on-duty schedule data.
#[async_trait::async_trait]
pub trait DutySource: Send + Sync {
    /// Unique identifier for this source
    fn source_name(&self) -> &'static str;

    /// URL the schedule is fetched from, recorded as provenance
    fn source_url(&self) -> &str;

    /// Fetch and parse the schedule into duty entries
    async fn fetch_duty_entries(&self) -> Result<Vec<DutyEntry>>;
}
