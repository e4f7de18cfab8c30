//! Timeline selection <-> page URL
//!
//! Every timeline selection change is written into the URL query and pushed
//! onto the navigation history. Loading a URL (initially, or through back and
//! forward) reads the parameters back, falling back to the configured
//! defaults for absent or empty ones.

use crate::event::encode_query;
use crate::selection::{
    parse_baseline, split_values, BenchmarkChoice, TimelineDefaults, TimelineSelection, Toggle,
};
use serde::Serialize;
use std::collections::HashMap;

/// Query string (with leading `?`) for a timeline selection
pub fn encode(selection: &TimelineSelection) -> String {
    format!("?{}", encode_query(&selection.to_query()))
}

/// Read a timeline selection from a URL query, with or without leading `?`
pub fn decode(query: &str, defaults: &TimelineDefaults) -> TimelineSelection {
    let query = query.trim_start_matches('?');
    let params: HashMap<String, String> = url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .filter(|(_, v)| !v.is_empty())
        .collect();
    let param = |name: &str| params.get(name).map(String::as_str);

    let toggle = |name: &str, default: Toggle| match param(name) {
        Some(value) => Toggle::from(value == "on"),
        None => default,
    };

    TimelineSelection {
        executables: param("exe")
            .map(split_values)
            .unwrap_or_else(|| defaults.executables.clone()),
        baseline: param("base")
            .map(parse_baseline)
            .unwrap_or_else(|| defaults.baseline.clone()),
        benchmark: param("ben")
            .map(|b| BenchmarkChoice::from(b.to_string()))
            .unwrap_or_else(|| defaults.benchmark.clone()),
        environment: param("env")
            .map(str::to_string)
            .unwrap_or_else(|| defaults.environment.clone()),
        revisions: param("revs")
            .and_then(|r| r.trim().parse().ok())
            .unwrap_or(defaults.revisions),
        branches: param("bran")
            .map(split_values)
            .unwrap_or_else(|| defaults.branches.clone()),
        equidistant: toggle("equid", defaults.equidistant),
        quartiles: toggle("quarts", defaults.quartiles),
        extrema: toggle("extr", defaults.extrema),
    }
}

/// Browser-style navigation history of URL states
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UrlHistory {
    entries: Vec<String>,
    cursor: usize,
}

impl UrlHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new state, dropping any forward entries
    pub fn push(&mut self, url: impl Into<String>) {
        let url = url.into();
        if self.current() == Some(url.as_str()) {
            return;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(url);
        self.cursor = self.entries.len() - 1;
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(String::as_str)
    }

    /// Step back; returns the state to re-apply
    pub fn back(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    /// Step forward; returns the state to re-apply
    pub fn forward(&mut self) -> Option<&str> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn defaults() -> TimelineDefaults {
        TimelineDefaults {
            executables: vec!["1".to_string()],
            environment: "1".to_string(),
            baseline: Some("2+14".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_round_trip_keeps_every_parameter() {
        let selection = TimelineSelection {
            executables: vec!["1".to_string(), "3".to_string()],
            baseline: None,
            benchmark: BenchmarkChoice::Single("float add".to_string()),
            environment: "2".to_string(),
            revisions: 50,
            branches: vec!["default".to_string(), "py3k".to_string()],
            equidistant: Toggle::On,
            quartiles: Toggle::Off,
            extrema: Toggle::On,
        };

        let url = encode(&selection);
        assert!(url.starts_with("?exe=1%2C3&base=none&ben=float+add"));
        assert_eq!(decode(&url, &defaults()), selection);
    }

    #[test]
    fn test_round_trip_of_default_toggles() {
        let mut selection = defaults().selection();
        selection.benchmark = BenchmarkChoice::None;
        assert_eq!(decode(&encode(&selection), &defaults()), selection);
    }

    #[test]
    fn test_absent_and_empty_params_use_defaults() {
        let selection = decode("exe=&revs=&ben=grid", &defaults());
        assert_eq!(selection, defaults().selection());

        let selection = decode("", &defaults());
        assert_eq!(selection.revisions, 10);
        assert_eq!(selection.quartiles, Toggle::On);
        assert_eq!(selection.baseline.as_deref(), Some("2+14"));
    }

    #[test]
    fn test_bad_values() {
        let selection = decode("?revs=many&equid=yes&base=undefined", &defaults());
        assert_eq!(selection.revisions, 10);
        assert_eq!(selection.equidistant, Toggle::Off);
        assert_eq!(selection.baseline, None);
    }

    #[test]
    fn test_history_back_and_forward() {
        let mut history = UrlHistory::new();
        assert_eq!(history.back(), None);

        history.push("?a");
        history.push("?b");
        history.push("?b");
        history.push("?c");
        assert_eq!(history.len(), 3);

        assert_eq!(history.back(), Some("?b"));
        assert_eq!(history.back(), Some("?a"));
        assert_eq!(history.back(), None);
        assert_eq!(history.forward(), Some("?b"));

        // A new state discards the forward entries
        history.push("?d");
        assert_eq!(history.entries(), &["?a", "?b", "?d"]);
        assert_eq!(history.forward(), None);
    }
}
