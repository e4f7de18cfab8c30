//! Server response payloads
//!
//! Both JSON endpoints report failures in-band through an `error` field whose
//! value is the string `"None"` when everything went fine.

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Value of the `error` field when the server reports success
pub const NO_ERROR: &str = "None";

fn no_error() -> String {
    NO_ERROR.to_string()
}

fn server_error(error: &str) -> Option<&str> {
    if error == NO_ERROR {
        None
    } else {
        Some(error)
    }
}

/// Results matrix: executable -> environment -> benchmark -> value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPayload {
    #[serde(default = "no_error")]
    pub error: String,
    #[serde(flatten)]
    pub results: BTreeMap<String, BTreeMap<String, BTreeMap<String, Option<f64>>>>,
}

impl ComparisonPayload {
    /// Server-reported error, if any
    pub fn error_message(&self) -> Option<&str> {
        server_error(&self.error)
    }

    /// Result of one executable/environment/benchmark; `None` when missing
    pub fn value(&self, executable: &str, environment: &str, benchmark: &str) -> Option<f64> {
        self.results
            .get(executable)
            .and_then(|envs| envs.get(environment))
            .and_then(|benches| benches.get(benchmark))
            .copied()
            .flatten()
    }
}

/// Response of the timeline endpoint
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TimelinePayload {
    #[serde(default = "no_error")]
    pub error: String,
    /// "M" when rows carry median statistics
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub timelines: Vec<Timeline>,
}

impl TimelinePayload {
    pub fn error_message(&self) -> Option<&str> {
        server_error(&self.error)
    }
}

/// Time series of one benchmark
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Timeline {
    #[serde(deserialize_with = "id_string")]
    pub benchmark_id: String,
    pub benchmark: String,
    #[serde(default)]
    pub benchmark_description: Option<String>,
    pub units: String,
    /// Suffix such as " (less is better)"
    pub lessisbetter: String,
    #[serde(default)]
    pub data_type: Option<String>,
    /// Flat reference line, `"None"` on the wire when absent
    #[serde(default, deserialize_with = "baseline_points")]
    pub baseline: Option<Vec<BaselinePoint>>,
    /// branch -> executable id -> rows (newest first)
    #[serde(default)]
    pub branches: BTreeMap<String, BTreeMap<String, Vec<TimelinePoint>>>,
}

impl Timeline {
    /// Whether rows carry median/quartile statistics
    pub fn is_median(&self, payload_kind: Option<&str>) -> bool {
        self.data_type.as_deref().or(payload_kind) == Some("M")
    }
}

/// A point of the baseline reference line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselinePoint(pub String, pub f64);

/// Statistics attached to a timeline row
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointStats {
    Mean {
        std_dev: Option<f64>,
    },
    Median {
        max: Option<f64>,
        q3: Option<f64>,
        q1: Option<f64>,
        min: Option<f64>,
    },
}

/// One row of a timeline series.
///
/// On the wire this is either `[date, value, std_dev, commit, tag]` or
/// `[date, value, max, q3, q1, min, commit, tag]`; empty strings stand for
/// missing statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePoint {
    pub date: String,
    pub value: f64,
    pub stats: PointStats,
    pub commit: String,
    pub tag: String,
}

impl TimelinePoint {
    /// Parsed commit date
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        parse_date(&self.date)
    }

    fn from_row(row: Vec<Value>) -> Result<Self, String> {
        let date = text(&row[0]);
        let value = row[1]
            .as_f64()
            .ok_or_else(|| format!("non-numeric value {} for {}", row[1], date))?;

        let stats = match row.len() {
            5 => PointStats::Mean {
                std_dev: number(&row[2]),
            },
            8 => PointStats::Median {
                max: number(&row[2]),
                q3: number(&row[3]),
                q1: number(&row[4]),
                min: number(&row[5]),
            },
            n => return Err(format!("unexpected row length {}", n)),
        };

        Ok(Self {
            date,
            value,
            stats,
            commit: text(&row[row.len() - 2]),
            tag: text(&row[row.len() - 1]),
        })
    }
}

impl<'de> Deserialize<'de> for TimelinePoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let row = Vec::<Value>::deserialize(deserializer)?;
        if row.len() < 2 {
            return Err(de::Error::custom(format!(
                "timeline row too short: {} items",
                row.len()
            )));
        }
        TimelinePoint::from_row(row).map_err(de::Error::custom)
    }
}

impl Serialize for TimelinePoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let stats: Vec<Option<f64>> = match self.stats {
            PointStats::Mean { std_dev } => vec![std_dev],
            PointStats::Median { max, q3, q1, min } => vec![max, q3, q1, min],
        };

        let mut seq = serializer.serialize_seq(Some(stats.len() + 4))?;
        seq.serialize_element(&self.date)?;
        seq.serialize_element(&self.value)?;
        for stat in stats {
            match stat {
                Some(v) => seq.serialize_element(&v)?,
                None => seq.serialize_element("")?,
            }
        }
        seq.serialize_element(&self.commit)?;
        seq.serialize_element(&self.tag)?;
        seq.end()
    }
}

/// Parse the date formats the timeline endpoint emits
pub fn parse_date(date: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f%:z",
    ];

    let date = date.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(date, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(text(&value))
}

fn baseline_points<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<BaselinePoint>>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Array(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(de::Error::custom),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_comparison_payload_flattened_matrix() {
        let json = r#"{
            "error": "None",
            "1+L+default": {"1": {"3": 1.5, "4": null}},
            "2+L+default": {"1": {"3": 3.0}}
        }"#;
        let payload: ComparisonPayload = serde_json::from_str(json).unwrap();

        assert_eq!(payload.error_message(), None);
        assert_eq!(payload.results.len(), 2);
        assert_eq!(payload.value("1+L+default", "1", "3"), Some(1.5));
        assert_eq!(payload.value("1+L+default", "1", "4"), None);
        assert_eq!(payload.value("9", "1", "3"), None);
    }

    #[test]
    fn test_comparison_payload_error() {
        let payload: ComparisonPayload =
            serde_json::from_str(r#"{"error": "Unknown error"}"#).unwrap();
        assert_eq!(payload.error_message(), Some("Unknown error"));
    }

    #[test]
    fn test_timeline_mean_rows() {
        let json = r#"{
            "error": "None",
            "timelines": [{
                "benchmark_id": 3,
                "benchmark": "float",
                "benchmark_description": "",
                "units": "seconds",
                "lessisbetter": " (less is better)",
                "baseline": "None",
                "branches": {"default": {"1": [
                    ["2011-05-12T10:22:33", 0.25, "", "abc123", "default"],
                    ["2011-05-11T10:22:33", 0.3, 0.01, "abc122", "default"]
                ]}}
            }]
        }"#;
        let payload: TimelinePayload = serde_json::from_str(json).unwrap();
        let timeline = &payload.timelines[0];

        assert_eq!(timeline.benchmark_id, "3");
        assert_eq!(timeline.baseline, None);
        assert!(!timeline.is_median(payload.data_type.as_deref()));

        let rows = &timeline.branches["default"]["1"];
        assert_eq!(rows[0].commit, "abc123");
        assert_eq!(rows[0].stats, PointStats::Mean { std_dev: None });
        assert_eq!(rows[1].stats, PointStats::Mean { std_dev: Some(0.01) });
    }

    #[test]
    fn test_timeline_median_rows_and_baseline() {
        let json = r#"{
            "error": "None",
            "data_type": "M",
            "timelines": [{
                "benchmark_id": "7",
                "benchmark": "ai",
                "units": "seconds",
                "lessisbetter": " (less is better)",
                "baseline": [["2011-05-01 00:00:00", 1.0], ["2011-05-12 00:00:00", 1.0]],
                "branches": {"default": {"2": [
                    ["2011-05-12 00:00:00", 1.1, 1.5, 1.3, 0.9, 0.8, "f00", "v1"]
                ]}}
            }]
        }"#;
        let payload: TimelinePayload = serde_json::from_str(json).unwrap();
        let timeline = &payload.timelines[0];

        assert!(timeline.is_median(payload.data_type.as_deref()));
        assert_eq!(timeline.baseline.as_ref().map(Vec::len), Some(2));

        let row = &timeline.branches["default"]["2"][0];
        assert_eq!(
            row.stats,
            PointStats::Median {
                max: Some(1.5),
                q3: Some(1.3),
                q1: Some(0.9),
                min: Some(0.8)
            }
        );
        assert_eq!(row.tag, "v1");
    }

    #[test]
    fn test_point_serializes_back_to_row() {
        let point = TimelinePoint {
            date: "2011-05-12 00:00:00".to_string(),
            value: 2.0,
            stats: PointStats::Mean { std_dev: None },
            commit: "abc".to_string(),
            tag: "".to_string(),
        };
        let json = serde_json::to_string(&point).unwrap();
        assert_eq!(json, r#"["2011-05-12 00:00:00",2.0,"","abc",""]"#);
    }

    #[test]
    fn test_bad_row_length_is_rejected() {
        let result: Result<TimelinePoint, _> =
            serde_json::from_str(r#"["2011-05-12", 1.0, 2.0]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_date_formats() {
        assert!(parse_date("2011-05-12T10:22:33").is_some());
        assert!(parse_date("2011-05-12 10:22:33").is_some());
        assert!(parse_date("2011/05/12 10:22:33").is_some());
        assert!(parse_date("2011-05-12").is_some());
        assert!(parse_date("yesterday").is_none());
    }
}
