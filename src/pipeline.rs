//! One scraping run: entry page, embedded data, floorplans, availability
//! tables.

use std::io::Write;

use rand::Rng;

use crate::availability::scrape_units;
use crate::console::Console;
use crate::error::Result;
use crate::extract::{DataBlobExtractor, DEFAULT_IDENTIFIER};
use crate::filter::UnitCriteria;
use crate::http::{Fetcher, Sleeper, Transport};
use crate::links::{absolutize, resolve_url};
use crate::models::ScrapeOutcome;
use crate::parser::ObjectLiteralParser;

pub const DEFAULT_PROPERTY_NAME: &str = "100 House NJ";

/// Floorplan pages of the 100 House leasing portal, tried in order.
pub const DEFAULT_ENTRY_URLS: &[&str] = &[
    "https://100housejc.securecafe.com/onlineleasing/100house/oleapplication.aspx?stepname=floorplan",
    "https://100housejc.securecafe.com/onlineleasing/100house/floorplans.aspx",
];

#[derive(Debug, Clone)]
pub struct ScrapingOptions {
    pub entry_urls: Vec<String>,
    /// Script variable holding the floorplan data.
    pub identifier: String,
    pub criteria: UnitCriteria,
}

impl Default for ScrapingOptions {
    fn default() -> Self {
        Self {
            entry_urls: DEFAULT_ENTRY_URLS.iter().map(|url| url.to_string()).collect(),
            identifier: DEFAULT_IDENTIFIER.to_string(),
            criteria: UnitCriteria::default(),
        }
    }
}

pub struct Pipeline<T, R, S> {
    fetcher: Fetcher<T, R, S>,
    extractor: DataBlobExtractor,
    parser: ObjectLiteralParser,
    options: ScrapingOptions,
}

impl<T: Transport, R: Rng, S: Sleeper> Pipeline<T, R, S> {
    pub fn new(fetcher: Fetcher<T, R, S>, options: ScrapingOptions) -> Result<Self> {
        Ok(Self {
            fetcher,
            extractor: DataBlobExtractor::new(&options.identifier)?,
            parser: ObjectLiteralParser::default(),
            options,
        })
    }

    pub fn with_parser(mut self, parser: ObjectLiteralParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn fetcher(&self) -> &Fetcher<T, R, S> {
        &self.fetcher
    }

    /// Runs every stage once. Failures become `ScrapeOutcome::Failed`; a
    /// floorplan whose page cannot be read is skipped with a warning.
    pub fn run<W: Write>(&mut self, console: &mut Console<W>) -> ScrapeOutcome {
        let criteria = self.options.criteria;

        console.step("Fetching apartment data...");
        let Some(page) = self.fetcher.fetch_first(&self.options.entry_urls) else {
            let message = format!(
                "Could not fetch the floorplan page: {} URL(s) failed after {} attempt(s) each",
                self.options.entry_urls.len(),
                self.fetcher.policy().max_attempts.max(1)
            );
            console.failure(&message);
            return ScrapeOutcome::Failed(message);
        };

        let Some(blob) = self.extractor.extract(&page.body) else {
            console.failure("Could not find apartment data");
            return ScrapeOutcome::Failed(format!("Could not find apartment data on {}", page.url));
        };

        let floorplans = match self.parser.parse(blob) {
            Ok(floorplans) => floorplans,
            Err(e) => {
                console.failure("No floorplan data found");
                return ScrapeOutcome::Failed(format!("Could not read floorplans: {}", e));
            }
        };
        tracing::debug!("Parsed {} floorplans from {}", floorplans.len(), page.url);

        let targets = criteria.filter(&floorplans);
        if targets.is_empty() {
            console.warning(&format!("No {} floorplans found", criteria));
            return ScrapeOutcome::Apartments(Vec::new());
        }
        console.success(&format!("Found {} {} floorplan(s)", targets.len(), criteria));

        let mut apartments = Vec::new();
        for floorplan in &targets {
            let name = floorplan.display_name();

            let Some(link) = resolve_url(floorplan) else {
                tracing::debug!("Floorplan {} has no availability link, skipping", name);
                continue;
            };

            let url = match absolutize(&link, &page.url) {
                Ok(url) => url,
                Err(e) => {
                    console.warning(&format!("Error checking {}: {}", name, e));
                    continue;
                }
            };

            console.step(&format!("Checking {} apartments...", name));
            match scrape_units(&mut self.fetcher, &url, name) {
                Ok(units) => {
                    tracing::debug!("{} lists {} available units", name, units.len());
                    apartments.extend(units);
                }
                Err(e) => console.warning(&format!("Error checking {}: {}", name, e)),
            }
        }

        ScrapeOutcome::Apartments(apartments)
    }
}
