//! Loading and querying the authoritative pharmacy registry.

use crate::error::Result;
use crate::types::{DutyEntry, Pharmacy};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Loads the registry JSON (an array of pharmacy records). An absent or
/// malformed file is a fatal startup error.
pub fn load(path: impl AsRef<Path>) -> Result<Vec<Pharmacy>> {
    let content = fs::read_to_string(path.as_ref())?;
    let pharmacies: Vec<Pharmacy> = serde_json::from_str(&content)?;
    debug!(
        "Loaded {} pharmacies from {}",
        pharmacies.len(),
        path.as_ref().display()
    );
    Ok(pharmacies)
}

/// Resolves a duty entry against the registry.
///
/// A phone match (exact equality against the stored telephone) always wins
/// over an address match (stored address containing the entry's normalized
/// address). Within each pass the first match in registry load order wins.
/// The candidate is scoped to this entry alone; nothing carries over
/// between calls.
pub fn resolve<'a>(registry: &'a [Pharmacy], entry: &DutyEntry) -> Option<&'a Pharmacy> {
    if let Some(phone) = &entry.phone {
        if let Some(pharmacy) = registry
            .iter()
            .find(|p| p.contact.telephone.as_deref() == Some(phone.as_str()))
        {
            return Some(pharmacy);
        }
    }

    // An empty address would substring-match every record; never fall
    // through to it.
    if entry.address.is_empty() {
        return None;
    }
    registry.iter().find(|p| p.address.contains(&entry.address))
}
