// Source identifiers
pub const ARANJUEZ_SOURCE: &str = "aranjuez";
pub const ARANJUEZ_DUTY_URL: &str = "https://www.aranjuez.es/farmacias-guardia/";

// Spain's international dialing prefix, prepended to every extracted phone
pub const COUNTRY_CALLING_CODE: &str = "+34";

// Default data locations, overridable via config.toml or CLI flags
pub const DEFAULT_REGISTRY_FILE: &str = "data/pharmacies/pharmacies.json";
pub const DEFAULT_CALENDAR_FILE: &str = "data/pharmacies/pharmacies_calendar.json";
