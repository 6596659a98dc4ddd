use serde::Deserialize;
use serde_json::Value;

use super::record::Record;
use crate::error::{Result, SunburstError};

#[derive(Clone, Debug, Deserialize)]
struct RawRecord {
    #[serde(default, rename = "degree_name_1")]
    level: Option<Value>,
    #[serde(default, rename = "degree_name_2")]
    category: Option<Value>,
    #[serde(default)]
    year: Option<Value>,
    #[serde(default)]
    title: Option<Value>,
    #[serde(default)]
    downloads: Option<Value>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

impl RawRecord {
    fn into_record(self, index: usize) -> Result<Record> {
        let missing = |field| SunburstError::MalformedRecord { index, field };

        Ok(Record {
            level: text_field(self.level).ok_or_else(|| missing("degree_name_1"))?,
            category: text_field(self.category).ok_or_else(|| missing("degree_name_2"))?,
            year: text_field(self.year).ok_or_else(|| missing("year"))?,
            title: text_field(self.title).ok_or_else(|| missing("title"))?,
            downloads: count_field(self.downloads).ok_or_else(|| missing("downloads"))?,
            author: self.author.filter(|value| !value.is_empty()),
            url: self.url.filter(|value| !value.is_empty()),
        })
    }
}

/// Parses a JSON array of thesis rows, as exported from the ETD spreadsheet.
///
/// Categorical columns may be strings or numbers; `downloads` may be a number
/// or a numeric string. Empty or absent required columns are rejected.
pub fn parse_records(raw: &str) -> Result<Vec<Record>> {
    let rows: Vec<RawRecord> = serde_json::from_str(raw)?;
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| row.into_record(index))
        .collect()
}

fn text_field(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(text) if !text.is_empty() => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn count_field(value: Option<Value>) -> Option<u64> {
    match value? {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|v| *v >= 0.0).map(|v| v.round() as u64)),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records_accepts_mixed_types() {
        let raw = r#"[
            {"degree_name_1": "Masters", "degree_name_2": "Computer Science", "year": 2015,
             "title": "Graphs", "downloads": "42", "author": "Ada", "url": "http://x/1"},
            {"degree_name_1": "PhD", "degree_name_2": "Biology", "year": "2016",
             "title": "Cells", "downloads": 3}
        ]"#;

        let records = parse_records(raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].year, "2015");
        assert_eq!(records[0].downloads, 42);
        assert_eq!(records[0].author.as_deref(), Some("Ada"));
        assert_eq!(records[1].downloads, 3);
        assert_eq!(records[1].url, None);
    }

    #[test]
    fn test_parse_records_reports_missing_field() {
        let raw = r#"[
            {"degree_name_1": "PhD", "degree_name_2": "Biology", "year": "2016",
             "title": "A", "downloads": 1},
            {"degree_name_1": "PhD", "year": "2016", "title": "B", "downloads": 1}
        ]"#;

        let err = parse_records(raw).unwrap_err();
        assert!(matches!(
            err,
            SunburstError::MalformedRecord { index: 1, field: "degree_name_2" }
        ));
    }

    #[test]
    fn test_parse_records_rejects_empty_and_non_numeric() {
        let empty_title = r#"[{"degree_name_1": "PhD", "degree_name_2": "B",
            "year": "1", "title": "", "downloads": 1}]"#;
        assert!(matches!(
            parse_records(empty_title),
            Err(SunburstError::MalformedRecord { field: "title", .. })
        ));

        let bad_count = r#"[{"degree_name_1": "PhD", "degree_name_2": "B",
            "year": "1", "title": "T", "downloads": "many"}]"#;
        assert!(matches!(
            parse_records(bad_count),
            Err(SunburstError::MalformedRecord { field: "downloads", .. })
        ));
    }

    #[test]
    fn test_parse_records_rejects_non_array() {
        assert!(matches!(parse_records(r#"{"rows": []}"#), Err(SunburstError::Json(_))));
    }
}
