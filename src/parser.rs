//! Turns the raw `pageData` object literal into floorplan records.
//!
//! The literal is JavaScript, not JSON, and its shape is owned by the leasing
//! site. Parsing therefore runs through an ordered list of strategies: a
//! lenient JSON5 parse first, then a regex fallback that reads one floorplan at
//! a time and keeps whatever fields it can find.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Result, ScrapeError};
use crate::models::FloorplanRecord;

/// Whether this build carries the lenient JSON5 strategy.
pub const LENIENT_AVAILABLE: bool = cfg!(feature = "json5");

pub trait ParseStrategy {
    fn name(&self) -> &'static str;
    fn parse(&self, blob: &str) -> Result<Vec<FloorplanRecord>>;
}

/// Relaxed-syntax parse of the whole literal (unquoted keys, single quotes,
/// trailing commas), projecting its `floorplans` array.
#[cfg(feature = "json5")]
pub struct Json5Strategy;

#[cfg(feature = "json5")]
impl ParseStrategy for Json5Strategy {
    fn name(&self) -> &'static str {
        "json5"
    }

    fn parse(&self, blob: &str) -> Result<Vec<FloorplanRecord>> {
        let data: serde_json::Value =
            json5::from_str(blob).map_err(|e| ScrapeError::Lenient(e.to_string()))?;

        let floorplans = data
            .get("floorplans")
            .and_then(serde_json::Value::as_array)
            .map(|entries| entries.iter().filter_map(project_floorplan).collect())
            .unwrap_or_default();

        Ok(floorplans)
    }
}

#[cfg(feature = "json5")]
fn project_floorplan(value: &serde_json::Value) -> Option<FloorplanRecord> {
    use serde_json::Value;

    fn integer(value: Option<&Value>) -> Option<i64> {
        let value = value?;
        value.as_i64().or_else(|| {
            value
                .as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        })
    }

    fn text(value: Option<&Value>) -> Option<String> {
        value?.as_str().map(str::to_string)
    }

    let object = value.as_object()?;
    let record = FloorplanRecord {
        id: integer(object.get("id")),
        name: text(object.get("name")),
        beds: integer(object.get("beds")),
        baths: object.get("baths").and_then(Value::as_f64),
        available_units_url: text(object.get("availableUnitsURL")),
        available_count: integer(object.get("availableCount")),
    };

    (!record.is_empty()).then_some(record)
}

static SIGNATURE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{\s*["']?id["']?\s*:\s*\d+"#).expect("signature regex"));
static ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bid["']?\s*:\s*(\d+)"#).expect("id regex"));
static NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bname["']?\s*:\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')"#)
        .expect("name regex")
});
static BEDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bbeds["']?\s*:\s*(\d+)"#).expect("beds regex"));
static BATHS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\bbaths["']?\s*:\s*([\d.]+)"#).expect("baths regex"));
static UNITS_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\bavailableUnitsURL["']?\s*:\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')"#,
    )
    .expect("availableUnitsURL regex")
});
static COUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bavailableCount["']?\s*:\s*(\d+)"#).expect("availableCount regex")
});

/// Best-effort regex extraction used when the lenient parse fails or finds
/// nothing.
///
/// A floorplan starts at `{ id: <digits>` and ends at its matching closing
/// brace, but never extends past the start of the next floorplan. An object
/// that is missing its `}` therefore cannot swallow its neighbours' fields.
pub struct PatternStrategy;

impl ParseStrategy for PatternStrategy {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn parse(&self, blob: &str) -> Result<Vec<FloorplanRecord>> {
        Ok(floorplan_spans(blob)
            .into_iter()
            .map(parse_span)
            .filter(|record| !record.is_empty())
            .collect())
    }
}

fn floorplan_spans(blob: &str) -> Vec<&str> {
    let starts: Vec<usize> = SIGNATURE.find_iter(blob).map(|m| m.start()).collect();

    starts
        .iter()
        .enumerate()
        .map(|(index, &start)| {
            let limit = starts.get(index + 1).copied().unwrap_or(blob.len());
            let end = matching_brace(&blob[start..limit])
                .map(|offset| start + offset + 1)
                .unwrap_or(limit);
            &blob[start..end]
        })
        .collect()
}

/// Byte offset of the brace closing the object that opens at offset 0.
/// Braces inside quoted strings are ignored.
fn matching_brace(span: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (offset, c) in span.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(offset);
                }
            }
            _ => {}
        }
    }

    None
}

fn quoted(regex: &Regex, span: &str) -> Option<String> {
    let captures = regex.captures(span)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| unescape(m.as_str()))
}

/// Resolves JavaScript string escapes. Unknown escapes yield the escaped
/// character itself; malformed `\u`/`\x` sequences are kept verbatim.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(escaped) = chars.next() else {
            out.push('\\');
            break;
        };

        match escaped {
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'v' => out.push('\u{b}'),
            '0' => out.push('\0'),
            'u' | 'x' => {
                let width = if escaped == 'u' { 4 } else { 2 };
                let digits: String = chars.clone().take(width).collect();
                let decoded = (digits.len() == width
                    && digits.chars().all(|d| d.is_ascii_hexdigit()))
                .then(|| u32::from_str_radix(&digits, 16).ok())
                .flatten()
                .and_then(char::from_u32);
                match decoded {
                    Some(decoded) => {
                        out.push(decoded);
                        chars.nth(width - 1);
                    }
                    None => {
                        out.push('\\');
                        out.push(escaped);
                    }
                }
            }
            '\n' => {}
            other => out.push(other),
        }
    }

    out
}

fn number<T: std::str::FromStr>(regex: &Regex, span: &str) -> Option<T> {
    regex.captures(span)?.get(1)?.as_str().parse().ok()
}

fn parse_span(span: &str) -> FloorplanRecord {
    FloorplanRecord {
        id: number(&ID, span),
        name: quoted(&NAME, span),
        beds: number(&BEDS, span),
        baths: number(&BATHS, span),
        available_units_url: quoted(&UNITS_URL, span),
        available_count: number(&COUNT, span),
    }
}

/// Runs its strategies in order and keeps the first non-empty result.
pub struct ObjectLiteralParser {
    strategies: Vec<Box<dyn ParseStrategy>>,
}

impl ObjectLiteralParser {
    pub fn new(strategies: Vec<Box<dyn ParseStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn parse(&self, blob: &str) -> Result<Vec<FloorplanRecord>> {
        for strategy in &self.strategies {
            match strategy.parse(blob) {
                Ok(records) if !records.is_empty() => {
                    tracing::debug!(
                        "{} strategy parsed {} floorplans",
                        strategy.name(),
                        records.len()
                    );
                    return Ok(records);
                }
                Ok(_) => tracing::debug!("{} strategy found no floorplans", strategy.name()),
                Err(e) => tracing::debug!("{} strategy failed: {}", strategy.name(), e),
            }
        }

        Err(ScrapeError::NoFloorplans)
    }
}

impl Default for ObjectLiteralParser {
    fn default() -> Self {
        let mut strategies: Vec<Box<dyn ParseStrategy>> = Vec::new();
        #[cfg(feature = "json5")]
        strategies.push(Box::new(Json5Strategy));
        strategies.push(Box::new(PatternStrategy));
        Self { strategies }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"{floorplans: [
        {id: 1, name: "A1", beds: 1, baths: 1.0, availableUnitsURL: "", availableCount: 0},
        {id: 2, name: 'B2', beds: 2, baths: 2.0, availableUnitsURL: "location.href='https://x/u2'", availableCount: 3},
        {id: 3, name: "C3 {corner}", beds: 2, baths: 2.5, availableUnitsURL: "https://x/u3", availableCount: 1},
    ], siteId: 9}"#;

    #[test]
    fn pattern_reads_every_field() {
        let records = PatternStrategy.parse(WELL_FORMED).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(
            records[1],
            FloorplanRecord {
                id: Some(2),
                name: Some("B2".to_string()),
                beds: Some(2),
                baths: Some(2.0),
                available_units_url: Some("location.href='https://x/u2'".to_string()),
                available_count: Some(3),
            }
        );
    }

    #[test]
    fn pattern_ignores_braces_inside_strings() {
        let records = PatternStrategy.parse(WELL_FORMED).unwrap();
        assert_eq!(records[2].name.as_deref(), Some("C3 {corner}"));
        assert_eq!(records[2].baths, Some(2.5));
        assert_eq!(records[2].available_count, Some(1));
    }

    #[test]
    fn pattern_omits_missing_fields() {
        let records = PatternStrategy.parse("{floorplans: [{id: 4, name: \"D\"}]}").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, Some(4));
        assert_eq!(records[0].beds, None);
        assert_eq!(records[0].baths, None);
        assert_eq!(records[0].available_units_url, None);
    }

    #[test]
    fn unclosed_floorplan_does_not_absorb_its_neighbour() {
        let blob = r#"{floorplans: [{id: 1, name: "Broken", beds: 1 {id: 2, name: "Next", beds: 2, baths: 2}]}"#;
        let records = PatternStrategy.parse(blob).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name.as_deref(), Some("Broken"));
        assert_eq!(records[0].beds, Some(1));
        assert_eq!(records[0].baths, None);
        assert_eq!(records[1].name.as_deref(), Some("Next"));
        assert_eq!(records[1].baths, Some(2.0));
    }

    #[test]
    fn nested_objects_stay_inside_their_floorplan() {
        let blob = r#"{floorplans: [{id: 5, pricing: {min: 1, max: 2}, beds: 2, baths: 2}]}"#;
        let records = PatternStrategy.parse(blob).unwrap();
        assert_eq!(records[0].beds, Some(2));
        assert_eq!(records[0].baths, Some(2.0));
    }

    #[test]
    fn pattern_reads_escaped_quotes_in_strings() {
        let blob = r#"{floorplans: [{id: 1, name: "The \"Loft\"", beds: 2, baths: 2.0, availableUnitsURL: 'location.href=\'https://x/u1\''}]}"#;
        let records = PatternStrategy.parse(blob).unwrap();

        assert_eq!(records[0].name.as_deref(), Some(r#"The "Loft""#));
        assert_eq!(
            records[0].available_units_url.as_deref(),
            Some("location.href='https://x/u1'")
        );
        assert_eq!(records[0].beds, Some(2));
    }

    #[test]
    fn unescape_handles_common_sequences() {
        assert_eq!(unescape(r"a\\b"), r"a\b");
        assert_eq!(unescape(r"caf\u00e9 \x41"), "café A");
        assert_eq!(unescape(r"tab\there"), "tab\there");
        assert_eq!(unescape(r"bad \u12"), r"bad \u12");
    }

    #[test]
    fn text_without_signatures_parses_to_nothing() {
        assert!(PatternStrategy.parse("{floorplans: []}").unwrap().is_empty());
    }

    #[test]
    fn parser_reports_no_floorplans_when_every_strategy_comes_up_empty() {
        let parser = ObjectLiteralParser::default();
        assert!(matches!(
            parser.parse("{floorplans: []}"),
            Err(ScrapeError::NoFloorplans)
        ));
    }

    #[test]
    fn parser_without_lenient_strategy_uses_patterns() {
        let parser = ObjectLiteralParser::new(vec![Box::new(PatternStrategy)]);
        assert_eq!(parser.strategy_names(), vec!["pattern"]);
        assert_eq!(parser.parse(WELL_FORMED).unwrap().len(), 3);
    }

    #[cfg(feature = "json5")]
    mod lenient {
        use super::*;

        #[test]
        fn json5_reads_relaxed_syntax() {
            let records = Json5Strategy.parse(WELL_FORMED).unwrap();
            assert_eq!(records.len(), 3);
            assert_eq!(records[1].name.as_deref(), Some("B2"));
            assert_eq!(records[1].beds, Some(2));
            assert_eq!(records[1].baths, Some(2.0));
            assert_eq!(records[1].available_count, Some(3));
        }

        #[test]
        fn json5_and_pattern_agree_on_core_fields() {
            let lenient = Json5Strategy.parse(WELL_FORMED).unwrap();
            let fallback = PatternStrategy.parse(WELL_FORMED).unwrap();

            assert_eq!(lenient.len(), fallback.len());
            for (l, f) in lenient.iter().zip(&fallback) {
                assert_eq!(l.id, f.id);
                assert_eq!(l.name, f.name);
                assert_eq!(l.beds, f.beds);
                assert_eq!(l.baths, f.baths);
            }
        }

        #[test]
        fn json5_and_pattern_agree_on_escaped_names() {
            let blob = r#"{floorplans: [{id: 1, name: "The \"Loft\"", beds: 2, baths: 2.0}, {id: 2, name: 'O\'Neil', beds: 1, baths: 1}]}"#;
            let lenient = Json5Strategy.parse(blob).unwrap();
            let fallback = PatternStrategy.parse(blob).unwrap();

            assert_eq!(lenient.len(), 2);
            assert_eq!(lenient[0].name.as_deref(), Some(r#"The "Loft""#));
            for (l, f) in lenient.iter().zip(&fallback) {
                assert_eq!(l.name, f.name);
                assert_eq!(l.beds, f.beds);
                assert_eq!(l.baths, f.baths);
            }
        }

        #[test]
        fn invalid_literal_is_an_error() {
            assert!(matches!(
                Json5Strategy.parse("{floorplans: [function() {}]}"),
                Err(ScrapeError::Lenient(_))
            ));
        }

        #[test]
        fn falls_back_when_lenient_parse_fails() {
            let blob = r#"{floorplans: [{id: 7, name: "G", beds: 2, baths: 2.0, onClick: function() { go(); }}]}"#;
            let records = ObjectLiteralParser::default().parse(blob).unwrap();
            assert_eq!(records[0].id, Some(7));
            assert_eq!(records[0].beds, Some(2));
        }

        #[test]
        fn falls_back_when_floorplans_key_is_missing() {
            let blob = r#"{plans: [{id: 8, name: "H", beds: 2, baths: 2}]}"#;
            assert!(Json5Strategy.parse(blob).unwrap().is_empty());

            let records = ObjectLiteralParser::default().parse(blob).unwrap();
            assert_eq!(records[0].name.as_deref(), Some("H"));
        }

        #[test]
        fn integral_floats_are_accepted_for_integer_fields() {
            let records = Json5Strategy
                .parse("{floorplans: [{id: 1, beds: 2.0, baths: 2}]}")
                .unwrap();
            assert_eq!(records[0].beds, Some(2));
            assert_eq!(records[0].baths, Some(2.0));
        }
    }
}
