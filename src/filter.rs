use std::fmt;

use crate::models::FloorplanRecord;

/// Exact bedroom/bathroom match a floorplan must satisfy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitCriteria {
    pub beds: i64,
    pub baths: f64,
}

impl Default for UnitCriteria {
    fn default() -> Self {
        Self { beds: 2, baths: 2.0 }
    }
}

impl UnitCriteria {
    /// A record without beds or baths never matches.
    pub fn matches(&self, floorplan: &FloorplanRecord) -> bool {
        floorplan.beds == Some(self.beds) && floorplan.baths == Some(self.baths)
    }

    pub fn filter(&self, floorplans: &[FloorplanRecord]) -> Vec<FloorplanRecord> {
        floorplans
            .iter()
            .filter(|floorplan| self.matches(floorplan))
            .cloned()
            .collect()
    }
}

/// Renders as "2BR/2BA", or "2BR/1.5BA" for fractional baths.
impl fmt::Display for UnitCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}BR/{}BA", self.beds, self.baths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(id: i64, beds: Option<i64>, baths: Option<f64>) -> FloorplanRecord {
        FloorplanRecord {
            id: Some(id),
            name: Some(format!("Plan {}", id)),
            beds,
            baths,
            ..Default::default()
        }
    }

    fn sample() -> Vec<FloorplanRecord> {
        vec![
            plan(1, Some(2), Some(2.0)),
            plan(2, Some(1), Some(1.0)),
            plan(3, Some(3), Some(2.0)),
            plan(4, Some(2), Some(2.5)),
            plan(5, Some(2), Some(2.0)),
            plan(6, None, Some(2.0)),
            plan(7, Some(2), None),
        ]
    }

    #[test]
    fn keeps_exact_matches_in_order() {
        let kept = UnitCriteria::default().filter(&sample());
        let ids: Vec<_> = kept.iter().filter_map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 5]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let criteria = UnitCriteria::default();
        let once = criteria.filter(&sample());
        let twice = criteria.filter(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn records_missing_beds_or_baths_are_excluded() {
        let criteria = UnitCriteria::default();
        assert!(!criteria.matches(&plan(6, None, Some(2.0))));
        assert!(!criteria.matches(&plan(7, Some(2), None)));
        assert!(!criteria.matches(&FloorplanRecord::default()));
    }

    #[test]
    fn custom_criteria_and_label() {
        let criteria = UnitCriteria { beds: 2, baths: 2.5 };
        let kept = criteria.filter(&sample());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, Some(4));
        assert_eq!(criteria.to_string(), "2BR/2.5BA");
        assert_eq!(UnitCriteria::default().to_string(), "2BR/2BA");
    }
}
