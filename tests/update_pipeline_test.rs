use anyhow::Result;
use chrono::NaiveDate;
use fdg_scraper::error::{Result as ScraperResult, ScraperError};
use fdg_scraper::pipeline::{run_update, UpdateOptions};
use fdg_scraper::types::{DutyEntry, DutySource};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::tempdir;

const REGISTRY_JSON: &str = r#"[
    {
        "id": "farmacia-abastos",
        "name": "Farmacia Abastos",
        "address": "Calle Abastos 98, 28300 Aranjuez",
        "contact": {"telephone": "+34918910000", "webSite": "https://farmacia-abastos.example.es"},
        "location": {"latitude": 40.0312, "longitude": -3.6023}
    },
    {
        "id": "farmacia-peñas",
        "name": "Farmacia Peñas",
        "address": "Calle Mayor 3, Aranjuez",
        "contact": {"telephone": null, "webSite": null},
        "location": null
    }
]"#;

struct StubSource {
    url: String,
    entries: Vec<DutyEntry>,
    fail: bool,
    calls: AtomicUsize,
}

impl StubSource {
    fn new(entries: Vec<DutyEntry>) -> Self {
        Self {
            url: "https://example.test/farmacias-guardia/".to_string(),
            entries,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        let mut stub = Self::new(Vec::new());
        stub.fail = true;
        stub
    }
}

#[async_trait::async_trait]
impl DutySource for StubSource {
    fn source_name(&self) -> &'static str {
        "stub"
    }

    fn source_url(&self) -> &str {
        &self.url
    }

    async fn fetch_duty_entries(&self) -> ScraperResult<Vec<DutyEntry>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ScraperError::PageStructure("stub failure".to_string()));
        }
        Ok(self.entries.clone())
    }
}

fn entry(date: (i32, u32, u32), address: &str, phone: Option<&str>) -> DutyEntry {
    DutyEntry {
        date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
        address: address.to_string(),
        phone: phone.map(str::to_string),
    }
}

fn options(dir: &Path, registry_json: &str) -> Result<UpdateOptions> {
    let registry_file = dir.join("pharmacies.json");
    fs::write(&registry_file, registry_json)?;
    Ok(UpdateOptions {
        registry_file,
        calendar_file: dir.join("pharmacies_calendar.json"),
        fetch_retries: 0,
    })
}

#[tokio::test]
async fn resolves_by_phone_then_address_and_drops_the_rest() -> Result<()> {
    let dir = tempdir()?;
    let options = options(dir.path(), REGISTRY_JSON)?;
    let source = StubSource::new(vec![
        entry((2024, 1, 15), "Abastos 98", Some("+34918910000")),
        entry((2024, 1, 17), "Calle Mayor 3", None),
        entry((2024, 1, 19), "Camino Inexistente 7", Some("+34999999999")),
    ]);

    let result = run_update(&source, &options).await?;
    assert_eq!(result.extracted, 3);
    assert_eq!(result.matched_dates, 2);
    assert_eq!(result.unmatched, 1);

    let written = fs::read_to_string(result.output_file.unwrap())?;
    let doc: serde_json::Value = serde_json::from_str(&written)?;
    assert_eq!(doc["calendar"]["15/01/2024"], serde_json::json!(["farmacia-abastos"]));
    assert_eq!(doc["calendar"]["17/01/2024"], serde_json::json!(["farmacia-peñas"]));
    assert!(doc["calendar"].get("19/01/2024").is_none());
    assert_eq!(doc["source"], source.url);
    assert!(doc["updated"].as_f64().unwrap() > 0.0);
    Ok(())
}

#[tokio::test]
async fn phone_match_wins_over_address_match() -> Result<()> {
    let dir = tempdir()?;
    let options = options(dir.path(), REGISTRY_JSON)?;
    // Address is a substring of farmacia-peñas's record, but the phone
    // belongs to farmacia-abastos
    let source = StubSource::new(vec![entry(
        (2024, 1, 15),
        "Calle Mayor 3",
        Some("+34918910000"),
    )]);

    run_update(&source, &options).await?;

    let written = fs::read_to_string(dir.path().join("pharmacies_calendar.json"))?;
    let doc: serde_json::Value = serde_json::from_str(&written)?;
    assert_eq!(doc["calendar"]["15/01/2024"], serde_json::json!(["farmacia-abastos"]));
    Ok(())
}

#[tokio::test]
async fn two_pharmacies_on_one_date_accumulate() -> Result<()> {
    let dir = tempdir()?;
    let options = options(dir.path(), REGISTRY_JSON)?;
    let source = StubSource::new(vec![
        entry((2024, 1, 15), "Abastos 98", None),
        entry((2024, 1, 15), "Calle Mayor 3", None),
    ]);

    run_update(&source, &options).await?;

    let written = fs::read_to_string(dir.path().join("pharmacies_calendar.json"))?;
    let doc: serde_json::Value = serde_json::from_str(&written)?;
    assert_eq!(
        doc["calendar"]["15/01/2024"],
        serde_json::json!(["farmacia-abastos", "farmacia-peñas"])
    );
    Ok(())
}

#[tokio::test]
async fn empty_registry_is_a_noop_without_fetching() -> Result<()> {
    let dir = tempdir()?;
    let options = options(dir.path(), "[]")?;
    let source = StubSource::new(vec![entry((2024, 1, 15), "Abastos 98", None)]);

    let result = run_update(&source, &options).await?;
    assert!(result.output_file.is_none());
    assert!(!options.calendar_file.exists());
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn nothing_written_when_no_entry_matches() -> Result<()> {
    let dir = tempdir()?;
    let options = options(dir.path(), REGISTRY_JSON)?;
    let source = StubSource::new(vec![entry((2024, 1, 15), "Camino Inexistente 7", None)]);

    let result = run_update(&source, &options).await?;
    assert!(result.output_file.is_none());
    assert_eq!(result.unmatched, 1);
    assert!(!options.calendar_file.exists());
    Ok(())
}

#[tokio::test]
async fn previous_calendar_survives_a_matchless_run() -> Result<()> {
    let dir = tempdir()?;
    let options = options(dir.path(), REGISTRY_JSON)?;

    let first = StubSource::new(vec![entry((2024, 1, 15), "Abastos 98", None)]);
    run_update(&first, &options).await?;
    let before = fs::read_to_string(&options.calendar_file)?;

    let second = StubSource::new(vec![entry((2024, 1, 19), "Camino Inexistente 7", None)]);
    run_update(&second, &options).await?;
    let after = fs::read_to_string(&options.calendar_file)?;
    assert_eq!(before, after);
    Ok(())
}

#[tokio::test]
async fn repeat_runs_produce_identical_calendar_content() -> Result<()> {
    let dir = tempdir()?;
    let options = options(dir.path(), REGISTRY_JSON)?;
    let entries = vec![
        entry((2024, 1, 15), "Abastos 98", Some("+34918910000")),
        entry((2024, 1, 17), "Calle Mayor 3", None),
    ];

    let source = StubSource::new(entries.clone());
    run_update(&source, &options).await?;
    let first: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&options.calendar_file)?)?;

    let source = StubSource::new(entries);
    run_update(&source, &options).await?;
    let second: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&options.calendar_file)?)?;

    // byte-identical up to the generation timestamp
    assert_eq!(first["calendar"], second["calendar"]);
    assert_eq!(first["source"], second["source"]);
    Ok(())
}

#[tokio::test]
async fn output_is_sorted_and_indented_with_four_spaces() -> Result<()> {
    let dir = tempdir()?;
    let options = options(dir.path(), REGISTRY_JSON)?;
    let source = StubSource::new(vec![
        entry((2024, 1, 17), "Calle Mayor 3", None),
        entry((2024, 1, 15), "Abastos 98", None),
    ]);

    run_update(&source, &options).await?;

    let written = fs::read_to_string(&options.calendar_file)?;
    assert!(written.starts_with("{\n    \"calendar\""));
    let first = written.find("15/01/2024").unwrap();
    let second = written.find("17/01/2024").unwrap();
    assert!(first < second);
    // non-ASCII ids are preserved literally
    assert!(written.contains("farmacia-peñas"));
    Ok(())
}

#[tokio::test]
async fn extractor_failure_propagates_and_is_not_retried() -> Result<()> {
    let dir = tempdir()?;
    let mut options = options(dir.path(), REGISTRY_JSON)?;
    options.fetch_retries = 3;
    let source = StubSource::failing();

    let error = run_update(&source, &options).await.unwrap_err();
    assert!(matches!(error, ScraperError::PageStructure(_)));
    // only HTTP errors qualify for the bounded retry loop
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert!(!options.calendar_file.exists());
    Ok(())
}
