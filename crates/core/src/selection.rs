//! Typed selection state of the three views
//!
//! A selection is what the input controls of a view currently say. Each
//! selection knows how to flatten itself into the query parameters its
//! server endpoint (and, for the timeline, the page URL) understands.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Join checked values the way a multi-select control submits them
pub fn join_values(values: &[String]) -> String {
    values.join(",")
}

/// Split a comma-separated parameter, dropping empty items
pub fn split_values(param: &str) -> Vec<String> {
    param
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a baseline parameter; "none", "undefined" and "" mean no baseline
pub fn parse_baseline(param: &str) -> Option<String> {
    match param.trim() {
        "" | "none" | "undefined" => None,
        key => Some(key.to_string()),
    }
}

fn baseline_param(baseline: &Option<String>) -> String {
    baseline.clone().unwrap_or_else(|| "none".to_string())
}

/// A checkbox rendered as "on"/"off" in URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    On,
    #[default]
    Off,
}

impl Toggle {
    pub fn is_on(self) -> bool {
        self == Toggle::On
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Toggle::On => "on",
            Toggle::Off => "off",
        }
    }
}

impl From<bool> for Toggle {
    fn from(checked: bool) -> Self {
        if checked {
            Toggle::On
        } else {
            Toggle::Off
        }
    }
}

impl FromStr for Toggle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "on" => Ok(Toggle::On),
            "off" => Ok(Toggle::Off),
            other => Err(Error::SelectionError {
                param: "toggle".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// Comparison chart flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChartType {
    #[default]
    #[serde(rename = "normal bars")]
    NormalBars,
    #[serde(rename = "stacked bars")]
    StackedBars,
    #[serde(rename = "relative bars")]
    RelativeBars,
}

impl ChartType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartType::NormalBars => "normal bars",
            ChartType::StackedBars => "stacked bars",
            ChartType::RelativeBars => "relative bars",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "normal bars" => Ok(ChartType::NormalBars),
            "stacked bars" => Ok(ChartType::StackedBars),
            "relative bars" => Ok(ChartType::RelativeBars),
            other => Err(Error::SelectionError {
                param: "chart".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// State of the timeline's benchmark radio group
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BenchmarkChoice {
    /// One benchmark, drawn as a full chart
    Single(String),
    /// One miniature chart per benchmark
    #[default]
    Grid,
    /// Nothing selected; show a prompt
    None,
}

impl BenchmarkChoice {
    pub fn as_param(&self) -> &str {
        match self {
            BenchmarkChoice::Single(name) => name,
            BenchmarkChoice::Grid => "grid",
            BenchmarkChoice::None => "show_none",
        }
    }
}

impl From<String> for BenchmarkChoice {
    fn from(value: String) -> Self {
        match value.as_str() {
            "grid" => BenchmarkChoice::Grid,
            "show_none" => BenchmarkChoice::None,
            _ => BenchmarkChoice::Single(value),
        }
    }
}

impl From<BenchmarkChoice> for String {
    fn from(choice: BenchmarkChoice) -> Self {
        choice.as_param().to_string()
    }
}

/// Controls of the changes view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeSelection {
    /// Trend depth in revisions
    pub trend: u32,
    /// Selected revision commit id
    pub revision: String,
    pub executable: String,
    pub environment: String,
}

impl ChangeSelection {
    /// Query for the table endpoint: `tre`, `rev`, `exe`, `env`
    pub fn to_query(&self) -> Vec<(String, String)> {
        vec![
            ("tre".to_string(), self.trend.to_string()),
            ("rev".to_string(), self.revision.clone()),
            ("exe".to_string(), self.executable.clone()),
            ("env".to_string(), self.environment.clone()),
        ]
    }
}

/// Controls of the comparison view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSelection {
    /// Executable keys
    pub executables: Vec<String>,
    /// Benchmark ids
    pub benchmarks: Vec<String>,
    /// Environment ids
    pub environments: Vec<String>,
    /// Horizontal bars
    pub horizontal: bool,
    /// Executable key to normalize against
    pub baseline: Option<String>,
    pub chart: ChartType,
}

impl ComparisonSelection {
    /// Permalink parameters: `exe`, `ben`, `env`, `hor`, `bas`, `chart`
    pub fn to_query(&self) -> Vec<(String, String)> {
        vec![
            ("exe".to_string(), join_values(&self.executables)),
            ("ben".to_string(), join_values(&self.benchmarks)),
            ("env".to_string(), join_values(&self.environments)),
            ("hor".to_string(), self.horizontal.to_string()),
            ("bas".to_string(), baseline_param(&self.baseline)),
            ("chart".to_string(), self.chart.as_str().to_string()),
        ]
    }
}

/// Controls of the timeline view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineSelection {
    /// Executable ids, in control order
    pub executables: Vec<String>,
    /// "<exe>+<rev>" baseline key
    pub baseline: Option<String>,
    pub benchmark: BenchmarkChoice,
    pub environment: String,
    /// Number of revisions to show
    pub revisions: u32,
    pub branches: Vec<String>,
    pub equidistant: Toggle,
    pub quartiles: Toggle,
    pub extrema: Toggle,
}

impl TimelineSelection {
    /// Query for the timeline endpoint and the page URL.
    ///
    /// `bran` is only present when at least one branch is checked.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![
            ("exe".to_string(), join_values(&self.executables)),
            ("base".to_string(), baseline_param(&self.baseline)),
            ("ben".to_string(), self.benchmark.as_param().to_string()),
            ("env".to_string(), self.environment.clone()),
            ("revs".to_string(), self.revisions.to_string()),
            ("equid".to_string(), self.equidistant.as_str().to_string()),
            ("quarts".to_string(), self.quartiles.as_str().to_string()),
            ("extr".to_string(), self.extrema.as_str().to_string()),
        ];
        if !self.branches.is_empty() {
            query.push(("bran".to_string(), join_values(&self.branches)));
        }
        query
    }
}

/// Values the timeline falls back to for parameters absent from the URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineDefaults {
    pub executables: Vec<String>,
    pub baseline: Option<String>,
    pub benchmark: BenchmarkChoice,
    pub environment: String,
    pub revisions: u32,
    pub branches: Vec<String>,
    pub equidistant: Toggle,
    pub quartiles: Toggle,
    pub extrema: Toggle,
}

impl Default for TimelineDefaults {
    fn default() -> Self {
        Self {
            executables: Vec::new(),
            baseline: None,
            benchmark: BenchmarkChoice::Grid,
            environment: String::new(),
            revisions: 10,
            branches: Vec::new(),
            equidistant: Toggle::Off,
            quartiles: Toggle::On,
            extrema: Toggle::Off,
        }
    }
}

impl TimelineDefaults {
    /// The selection a page shows before any URL parameter is applied
    pub fn selection(&self) -> TimelineSelection {
        TimelineSelection {
            executables: self.executables.clone(),
            baseline: self.baseline.clone(),
            benchmark: self.benchmark.clone(),
            environment: self.environment.clone(),
            revisions: self.revisions,
            branches: self.branches.clone(),
            equidistant: self.equidistant,
            quartiles: self.quartiles,
            extrema: self.extrema,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_values_drops_empty() {
        assert_eq!(split_values("1,,2,"), vec!["1", "2"]);
        assert!(split_values("").is_empty());
    }

    #[test]
    fn test_parse_baseline() {
        assert_eq!(parse_baseline("none"), None);
        assert_eq!(parse_baseline("undefined"), None);
        assert_eq!(parse_baseline("2+14"), Some("2+14".to_string()));
    }

    #[test]
    fn test_chart_type_parse() {
        assert_eq!("stacked bars".parse::<ChartType>().unwrap(), ChartType::StackedBars);
        assert!("pie".parse::<ChartType>().is_err());
    }

    #[test]
    fn test_benchmark_choice_params() {
        assert_eq!(BenchmarkChoice::from("grid".to_string()), BenchmarkChoice::Grid);
        assert_eq!(BenchmarkChoice::from("show_none".to_string()), BenchmarkChoice::None);
        assert_eq!(
            BenchmarkChoice::from("float".to_string()),
            BenchmarkChoice::Single("float".to_string())
        );
        assert_eq!(BenchmarkChoice::None.as_param(), "show_none");
    }

    #[test]
    fn test_change_query() {
        let selection = ChangeSelection {
            trend: 10,
            revision: "abc123".to_string(),
            executable: "1".to_string(),
            environment: "2".to_string(),
        };
        let keys: Vec<_> = selection.to_query().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["tre", "rev", "exe", "env"]);
    }

    #[test]
    fn test_timeline_query_omits_empty_branch() {
        let mut selection = TimelineDefaults::default().selection();
        selection.executables = vec!["1".to_string(), "3".to_string()];
        let query = selection.to_query();
        assert!(query.iter().all(|(k, _)| k != "bran"));
        assert!(query.contains(&("exe".to_string(), "1,3".to_string())));
        assert!(query.contains(&("base".to_string(), "none".to_string())));
        assert!(query.contains(&("quarts".to_string(), "on".to_string())));

        selection.branches = vec!["default".to_string()];
        assert!(selection
            .to_query()
            .contains(&("bran".to_string(), "default".to_string())));
    }

    #[test]
    fn test_comparison_query() {
        let selection = ComparisonSelection {
            executables: vec!["1+L+default".to_string()],
            benchmarks: vec!["3".to_string(), "4".to_string()],
            environments: vec!["1".to_string()],
            horizontal: true,
            baseline: None,
            chart: ChartType::RelativeBars,
        };
        let query = selection.to_query();
        assert_eq!(query[1], ("ben".to_string(), "3,4".to_string()));
        assert_eq!(query[3], ("hor".to_string(), "true".to_string()));
        assert_eq!(query[5], ("chart".to_string(), "relative bars".to_string()));
    }
}
