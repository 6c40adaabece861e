use serde::Serialize;

/// One floorplan as advertised in the leasing page's embedded script data.
///
/// Every field is optional because the fallback parser is best effort: a field
/// it could not read is left as `None` rather than defaulted.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorplanRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baths: Option<f64>,
    /// Either a URL or a `location.href='...'` navigation expression.
    #[serde(rename = "availableUnitsURL", skip_serializing_if = "Option::is_none")]
    pub available_units_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_count: Option<i64>,
}

impl FloorplanRecord {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown")
    }

    /// True when no field could be read at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// An available unit scraped from a floorplan's availability table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApartmentRecord {
    /// Unit number with any `#` removed.
    pub apartment: String,
    /// Name of the floorplan the unit was listed under.
    pub floorplan: String,
    /// Rent exactly as displayed ("$2,500", "$2,400 - $2,600", "Call for pricing").
    pub rent: String,
}

/// Result of one pipeline run, handed to the reporter.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    /// The run could not complete; the message is shown to the user.
    Failed(String),
    /// The run completed. An empty list is a legitimate "nothing available".
    Apartments(Vec<ApartmentRecord>),
}

impl ScrapeOutcome {
    pub fn apartments(&self) -> &[ApartmentRecord] {
        match self {
            ScrapeOutcome::Apartments(apartments) => apartments,
            ScrapeOutcome::Failed(_) => &[],
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ScrapeOutcome::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floorplan_serializes_with_site_field_names() {
        let record = FloorplanRecord {
            id: Some(7),
            name: Some("B2".to_string()),
            available_units_url: Some("https://x/u".to_string()),
            ..Default::default()
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["availableUnitsURL"], "https://x/u");
        assert!(json.get("beds").is_none());
        assert!(json.get("availableCount").is_none());
    }

    #[test]
    fn failed_outcome_has_no_apartments() {
        let outcome = ScrapeOutcome::Failed("blocked".to_string());
        assert!(outcome.is_failure());
        assert!(outcome.apartments().is_empty());
    }
}
