use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::models::FloorplanRecord;

static LOCATION_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"location\.href\s*=\s*(?:'([^']+)'|"([^"]+)")"#).expect("location.href regex")
});

/// Pulls the availability link out of a floorplan.
///
/// `location.href='<url>'` yields the quoted URL, any other non-empty value is
/// used as is, and an empty or missing value means the floorplan is skipped.
pub fn resolve_url(floorplan: &FloorplanRecord) -> Option<String> {
    let raw = floorplan.available_units_url.as_deref()?.trim();

    if let Some(captures) = LOCATION_HREF.captures(raw) {
        return captures
            .get(1)
            .or_else(|| captures.get(2))
            .map(|m| m.as_str().to_string());
    }

    (!raw.is_empty()).then(|| raw.to_string())
}

/// Makes a resolved link absolute against the page it was found on.
pub fn absolutize(link: &str, base: &str) -> Result<String> {
    if let Ok(url) = Url::parse(link) {
        return Ok(url.to_string());
    }

    let base_url = Url::parse(base).map_err(|source| ScrapeError::InvalidUrl {
        url: base.to_string(),
        source,
    })?;

    base_url
        .join(link)
        .map(|url| url.to_string())
        .map_err(|source| ScrapeError::InvalidUrl {
            url: link.to_string(),
            source,
        })
}
