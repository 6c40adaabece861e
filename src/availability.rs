use once_cell::sync::Lazy;
use rand::Rng;
use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, ScrapeError};
use crate::http::{Fetcher, Sleeper, Transport};
use crate::models::ApartmentRecord;

static ROW_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("tr.AvailUnitRow").expect("row selector"));
static APARTMENT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"td[data-label="Apartment"]"#).expect("apartment selector"));
static RENT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"td[data-label="Rent"]"#).expect("rent selector"));

/// Fetches one floorplan's availability page and reads its unit rows.
///
/// A page that cannot be fetched is `ScrapeError::Unreachable`; the caller
/// warns and carries on with the next floorplan.
pub fn scrape_units<T: Transport, R: Rng, S: Sleeper>(
    fetcher: &mut Fetcher<T, R, S>,
    url: &str,
    floorplan_name: &str,
) -> Result<Vec<ApartmentRecord>> {
    let response = fetcher
        .fetch(url)
        .ok_or_else(|| ScrapeError::Unreachable(url.to_string()))?;

    Ok(parse_units(&response.body, floorplan_name))
}

/// Reads every `AvailUnitRow` of an availability page.
///
/// Rows without both an Apartment and a Rent cell are skipped.
pub fn parse_units(html: &str, floorplan_name: &str) -> Vec<ApartmentRecord> {
    let document = Html::parse_document(html);
    let mut apartments = Vec::new();

    for row in document.select(&ROW_SELECTOR) {
        let apartment_cell = row.select(&APARTMENT_SELECTOR).next();
        let rent_cell = row.select(&RENT_SELECTOR).next();

        let (Some(apartment_cell), Some(rent_cell)) = (apartment_cell, rent_cell) else {
            tracing::debug!("Skipping availability row without apartment or rent cell");
            continue;
        };

        apartments.push(ApartmentRecord {
            apartment: cell_text(apartment_cell).replace('#', "").trim().to_string(),
            floorplan: floorplan_name.to_string(),
            rent: cell_text(rent_cell),
        });
    }

    apartments
}

/// Text of a cell with its inline fragments joined as written, then
/// whitespace runs collapsed to single spaces.
fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
