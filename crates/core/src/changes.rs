//! Changes view: threshold coloring of the results tables
//!
//! The table endpoint returns an HTML fragment with one
//! `<table class="tablesorter">` per unit type. Each data row carries the
//! percentage change over the previous result and over the trend window in
//! `data-change` and `data-trend`; the two trailing columns are colored from
//! those values.
//!
//! ```text
//! <table class="tablesorter" data-lessisbetter="True">
//!   <thead><tr><th>Benchmark</th>...<th>Change</th><th>Trend</th></tr></thead>
//!   <tbody><tr data-change="-4.2" data-trend="1.0"><td>float</td>...</tr></tbody>
//! </table>
//! ```

use crate::catalog::{Catalog, RevisionOption};
use crate::config::{DashboardConfig, Thresholds};
use crate::error::{Error, Result};
use crate::event::{encode_query, Controller, ControllerEvent, Effect, Endpoint, Event, Request};
use crate::notice::Notice;
use crate::selection::ChangeSelection;
use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::{debug, info};

/// Element the table fragment is loaded into
pub const CONTENT_WRAP: &str = "contentwrap";

/// Significance of a change against a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Regression,
    Improvement,
    Neutral,
}

impl Status {
    /// Classify `value` against the open interval `(lo, hi)`.
    ///
    /// Values equal to a bound and NaN are neutral.
    pub fn between(value: f64, lo: f64, hi: f64) -> Self {
        if value < lo {
            Status::Regression
        } else if value > hi {
            Status::Improvement
        } else {
            Status::Neutral
        }
    }

    /// Classify a percentage change against a symmetric threshold
    pub fn classify(value: Option<f64>, threshold: f64) -> Self {
        match value {
            Some(v) => Status::between(v, -threshold, threshold),
            None => Status::Neutral,
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Status::Regression => "status-red",
            Status::Improvement => "status-green",
            Status::Neutral => "status-none",
        }
    }
}

/// Zebra stripe of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stripe {
    Even,
    Odd,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    /// Visible text, tags stripped
    pub text: String,
    /// Inner markup as received
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// `data-change`, `None` when absent or not a number (e.g. "-")
    pub change: Option<f64>,
    pub trend: Option<f64>,
    pub cells: Vec<Cell>,
    pub stripe: Stripe,
    pub highlight: bool,
}

impl Row {
    /// Text of the first cell (the benchmark name)
    pub fn benchmark(&self) -> Option<&str> {
        self.cells.first().map(|c| c.text.as_str())
    }
}

/// Current sort column and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub column: usize,
    pub ascending: bool,
}

/// One results table of the fragment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsTable {
    /// Raw `data-lessisbetter` attribute
    pub lessisbetter: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortState>,
}

impl ResultsTable {
    /// Whether higher numbers are better for this table's unit
    pub fn more_is_better(&self) -> bool {
        self.lessisbetter == "False"
    }

    /// Color the change and trend columns of every row
    pub fn colorize(&mut self, thresholds: &Thresholds) {
        if self.headers.len() < 2 {
            return;
        }
        let index = self.headers.len() - 2;
        let flip = self.more_is_better();

        for row in &mut self.rows {
            let (mut change, mut trend) = (row.change, row.trend);
            if flip {
                change = change.map(|v| -v);
                trend = trend.map(|v| -v);
            }

            if let Some(cell) = row.cells.get_mut(index) {
                cell.status = Some(Status::classify(change, thresholds.change));
            }
            if let Some(cell) = row.cells.get_mut(index + 1) {
                cell.status = Some(Status::classify(trend, thresholds.trend));
            }
        }
    }

    /// Sort by a column; sorting the same column again reverses the order
    pub fn sort_by(&mut self, column: usize) {
        let ascending = match self.sort {
            Some(state) if state.column == column => !state.ascending,
            _ => true,
        };

        self.rows.sort_by(|a, b| {
            let ordering = compare_cells(a.cells.get(column), b.cells.get(column));
            if ascending {
                ordering
            } else {
                ordering.reverse()
            }
        });
        self.sort = Some(SortState { column, ascending });
        self.stripe();
    }

    /// Recompute zebra striping
    pub fn stripe(&mut self) {
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.stripe = if i % 2 == 0 { Stripe::Even } else { Stripe::Odd };
        }
    }

    fn set_highlight(&mut self, row: usize, on: bool) -> bool {
        match self.rows.get_mut(row) {
            Some(r) => {
                r.highlight = on;
                true
            }
            None => false,
        }
    }
}

fn sort_key(text: &str) -> Option<f64> {
    text.trim().trim_end_matches('%').trim().parse().ok()
}

fn compare_cells(a: Option<&Cell>, b: Option<&Cell>) -> Ordering {
    let a = a.map(|c| c.text.as_str()).unwrap_or("");
    let b = b.map(|c| c.text.as_str()).unwrap_or("");

    match (sort_key(a), sort_key(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

/// Parsed table fragment
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeTable {
    pub tables: Vec<ResultsTable>,
    /// Message the server sends instead of results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Parser for the rendered changes-table fragment
pub struct TableParser {
    table_regex: Regex,
    attr_regex: Regex,
    thead_regex: Regex,
    th_regex: Regex,
    row_regex: Regex,
    td_regex: Regex,
    tag_regex: Regex,
    message_regex: Regex,
}

impl TableParser {
    /// Create a new table parser
    pub fn new() -> Result<Self> {
        Ok(Self {
            table_regex: Regex::new(r"(?is)<table\b([^>]*)>(.*?)</table>")?,
            attr_regex: Regex::new(r#"([\w-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)?,
            thead_regex: Regex::new(r"(?is)<thead\b[^>]*>(.*?)</thead>")?,
            th_regex: Regex::new(r"(?is)<th\b[^>]*>(.*?)</th>")?,
            row_regex: Regex::new(r"(?is)<tr\b([^>]*)>(.*?)</tr>")?,
            td_regex: Regex::new(r"(?is)<td\b[^>]*>(.*?)</td>")?,
            tag_regex: Regex::new(r"(?s)<[^>]*>")?,
            message_regex: Regex::new(r#"(?is)<p\b[^>]*class\s*=\s*"errormessage"[^>]*>(.*?)</p>"#)?,
        })
    }

    /// Parse every results table of a fragment
    pub fn parse(&self, fragment: &str) -> Result<ChangeTable> {
        let mut tables = Vec::new();

        for captures in self.table_regex.captures_iter(fragment) {
            let attrs = self.attributes(captures.get(1).map_or("", |m| m.as_str()));
            let is_results = attrs
                .get("class")
                .map(|c| c.split_whitespace().any(|c| c == "tablesorter"))
                .unwrap_or(false);
            if !is_results {
                continue;
            }

            let body = captures.get(2).map_or("", |m| m.as_str());
            tables.push(self.parse_table(&attrs, body)?);
        }

        let message = self
            .message_regex
            .captures(fragment)
            .and_then(|c| c.get(1))
            .map(|m| self.text(m.as_str()))
            .filter(|m| !m.is_empty());

        if tables.is_empty() && message.is_none() && !fragment.trim().is_empty() {
            return Err(Error::TableParseError(
                "fragment contains no results table".to_string(),
            ));
        }

        Ok(ChangeTable { tables, message })
    }

    fn parse_table(&self, attrs: &HashMap<String, String>, body: &str) -> Result<ResultsTable> {
        let (headers, rows_html) = match self.thead_regex.captures(body) {
            Some(thead) => {
                let head = thead.get(1).map_or("", |m| m.as_str());
                let headers = self
                    .th_regex
                    .captures_iter(head)
                    .filter_map(|c| c.get(1))
                    .map(|m| self.text(m.as_str()))
                    .collect();
                let whole = thead.get(0).map_or(0..0, |m| m.range());
                let rest = format!("{}{}", &body[..whole.start], &body[whole.end..]);
                (headers, rest)
            }
            None => (Vec::new(), body.to_string()),
        };

        let mut rows = Vec::new();
        for row in self.row_regex.captures_iter(&rows_html) {
            let row_attrs = self.attributes(row.get(1).map_or("", |m| m.as_str()));
            let cells: Vec<Cell> = self
                .td_regex
                .captures_iter(row.get(2).map_or("", |m| m.as_str()))
                .filter_map(|c| c.get(1))
                .map(|m| Cell {
                    text: self.text(m.as_str()),
                    html: m.as_str().trim().to_string(),
                    status: None,
                })
                .collect();
            if cells.is_empty() {
                continue;
            }

            rows.push(Row {
                change: row_attrs.get("data-change").and_then(|v| v.trim().parse().ok()),
                trend: row_attrs.get("data-trend").and_then(|v| v.trim().parse().ok()),
                cells,
                stripe: Stripe::Even,
                highlight: false,
            });
        }

        let mut table = ResultsTable {
            lessisbetter: attrs.get("data-lessisbetter").cloned().unwrap_or_default(),
            headers,
            rows,
            sort: None,
        };
        table.stripe();
        Ok(table)
    }

    fn attributes(&self, raw: &str) -> HashMap<String, String> {
        self.attr_regex
            .captures_iter(raw)
            .filter_map(|c| {
                let name = c.get(1)?.as_str().to_lowercase();
                let value = c.get(2).or_else(|| c.get(3))?.as_str();
                Some((name, decode_entities(value)))
            })
            .collect()
    }

    fn text(&self, html: &str) -> String {
        let stripped = self.tag_regex.replace_all(html, "");
        decode_entities(stripped.trim())
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Changes-table gestures
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeInteraction {
    /// Header click on `column` of `table`
    Sort { table: usize, column: usize },
    /// Click on a data row
    RowClicked { table: usize, row: usize },
    /// Pointer entered (`true`) or left (`false`) a row
    RowHover { table: usize, row: usize, active: bool },
}

/// State of the changes page handed to the drawing layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeView {
    pub selection: ChangeSelection,
    /// Choices of the revision box
    pub revisions: Vec<RevisionOption>,
    /// The revision box was repopulated for a new project
    pub revisions_changed: bool,
    pub table: ChangeTable,
}

/// Controller of the changes view
pub struct ChangeTableController {
    config: DashboardConfig,
    catalog: Catalog,
    parser: TableParser,
    selection: ChangeSelection,
    project: Option<String>,
    revisions: Vec<RevisionOption>,
    revisions_changed: bool,
    table: Option<ChangeTable>,
}

impl ChangeTableController {
    pub fn new(config: DashboardConfig, catalog: Catalog, selection: ChangeSelection) -> Result<Self> {
        let project = catalog.project_of(&selection.executable).map(str::to_string);
        let revisions = project
            .as_deref()
            .map(|p| catalog.revisions_for(p).to_vec())
            .unwrap_or_default();

        Ok(Self {
            config,
            catalog,
            parser: TableParser::new()?,
            selection,
            project,
            revisions,
            revisions_changed: false,
            table: None,
        })
    }

    pub fn selection(&self) -> &ChangeSelection {
        &self.selection
    }

    pub fn table(&self) -> Option<&ChangeTable> {
        self.table.as_ref()
    }

    /// Query for the table endpoint
    pub fn build_selection_query(&self) -> Vec<(String, String)> {
        self.selection.to_query()
    }

    /// Swap the revision choices when the executable belongs to another project
    fn change_revisions(&mut self) {
        let project = self
            .catalog
            .project_of(&self.selection.executable)
            .map(str::to_string);
        if project == self.project {
            return;
        }

        self.revisions = project
            .as_deref()
            .map(|p| self.catalog.revisions_for(p).to_vec())
            .unwrap_or_default();
        debug!(
            project = ?project,
            revisions = self.revisions.len(),
            "Repopulated revision choices"
        );
        self.project = project;
        self.revisions_changed = true;

        let known = self
            .revisions
            .iter()
            .any(|r| r.commitid == self.selection.revision);
        if !known {
            if let Some(first) = self.revisions.first() {
                self.selection.revision = first.commitid.clone();
            }
        }
    }

    fn request_table(&self) -> Vec<Effect<ChangeView>> {
        info!(
            exe = %self.selection.executable,
            env = %self.selection.environment,
            "Requesting changes table"
        );
        vec![
            Effect::Notice(Notice::loading(CONTENT_WRAP, self.config.viewport.content_height)),
            Effect::Fetch(Request::new(Endpoint::Table, self.build_selection_query())),
        ]
    }

    fn view(&mut self) -> Vec<Effect<ChangeView>> {
        let Some(table) = &self.table else {
            return Vec::new();
        };
        let view = ChangeView {
            selection: self.selection.clone(),
            revisions: self.revisions.clone(),
            revisions_changed: self.revisions_changed,
            table: table.clone(),
        };
        self.revisions_changed = false;
        vec![Effect::Render(view)]
    }

    /// URL of the timeline for a clicked row
    fn timeline_link(&self, benchmark: &str) -> String {
        let query = encode_query(&[
            ("ben".to_string(), benchmark.to_string()),
            ("env".to_string(), self.selection.environment.clone()),
        ]);
        format!("{}?{}", self.config.pages.timeline, query)
    }

    fn interact(&mut self, interaction: ChangeInteraction) -> Vec<Effect<ChangeView>> {
        match interaction {
            ChangeInteraction::Sort { table, column } => {
                match self.table.as_mut().and_then(|t| t.tables.get_mut(table)) {
                    Some(t) => t.sort_by(column),
                    None => return Vec::new(),
                }
                self.view()
            }
            ChangeInteraction::RowClicked { table, row } => {
                let benchmark = self
                    .table
                    .as_ref()
                    .and_then(|t| t.tables.get(table))
                    .and_then(|t| t.rows.get(row))
                    .and_then(Row::benchmark)
                    .map(str::to_string);
                match benchmark {
                    Some(b) => vec![Effect::Navigate(self.timeline_link(&b))],
                    None => Vec::new(),
                }
            }
            ChangeInteraction::RowHover { table, row, active } => {
                let changed = self
                    .table
                    .as_mut()
                    .and_then(|t| t.tables.get_mut(table))
                    .map(|t| t.set_highlight(row, active))
                    .unwrap_or(false);
                if changed {
                    self.view()
                } else {
                    Vec::new()
                }
            }
        }
    }
}

impl Controller for ChangeTableController {
    type Selection = ChangeSelection;
    type Payload = String;
    type Interaction = ChangeInteraction;
    type View = ChangeView;

    fn update(&mut self, event: ControllerEvent<Self>) -> Vec<Effect<ChangeView>> {
        match event {
            Event::SelectionChanged(selection) => {
                self.selection = selection;
                self.change_revisions();
                self.request_table()
            }
            Event::RenderRequested => match self.table {
                Some(_) => self.view(),
                None => self.request_table(),
            },
            Event::DataLoaded(fragment) => match self.parser.parse(&fragment) {
                Ok(mut table) => {
                    for t in &mut table.tables {
                        t.colorize(&self.config.thresholds);
                    }
                    debug!(tables = table.tables.len(), "Colored changes table");
                    self.table = Some(table);
                    self.view()
                }
                Err(e) => vec![Effect::Notice(Notice::error(
                    CONTENT_WRAP,
                    e.to_string(),
                    self.config.viewport.content_height,
                ))],
            },
            Event::Interaction(interaction) => self.interact(interaction),
        }
    }

    fn decode(body: &str) -> Result<String> {
        Ok(body.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Entry;
    use pretty_assertions::assert_eq;

    const FRAGMENT: &str = r##"
<table class="tablesorter" data-lessisbetter="True">
<thead>
  <tr><th>Benchmark</th><th>Result</th><th>Change</th><th>Trend</th></tr>
</thead>
<tbody>
  <tr data-change="-10.0" data-trend="2.0"><td>float</td><td>0.25</td><td>-10.00%</td><td>2.00%</td></tr>
  <tr data-change="4.5" data-trend="-"><td>ai</td><td>1.50</td><td>4.50%</td><td>-</td></tr>
  <tr data-change="1.0" data-trend="6.0"><td><a href="#">chaos &amp; order</a></td><td>12.0</td><td>1.00%</td><td>6.00%</td></tr>
</tbody>
</table>
<table class="tablesorter" data-lessisbetter="False">
<thead><tr><th>Benchmark</th><th>Result</th><th>Change</th><th>Trend</th></tr></thead>
<tbody>
  <tr data-change="-10.0" data-trend="10.0"><td>requests</td><td>300</td><td>-10.00%</td><td>10.00%</td></tr>
</tbody>
</table>
"##;

    fn parser() -> TableParser {
        TableParser::new().unwrap()
    }

    fn thresholds() -> Thresholds {
        Thresholds::new(5.0, 5.0).unwrap()
    }

    fn status(row: &Row, col: usize) -> Option<Status> {
        row.cells[col].status
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(Status::between(-5.1, -5.0, 5.0), Status::Regression);
        assert_eq!(Status::between(5.1, -5.0, 5.0), Status::Improvement);
        assert_eq!(Status::between(-5.0, -5.0, 5.0), Status::Neutral);
        assert_eq!(Status::between(5.0, -5.0, 5.0), Status::Neutral);
        assert_eq!(Status::between(f64::NAN, -5.0, 5.0), Status::Neutral);
        assert_eq!(Status::classify(None, 3.0), Status::Neutral);
    }

    #[test]
    fn test_css_classes() {
        assert_eq!(Status::Regression.css_class(), "status-red");
        assert_eq!(Status::Improvement.css_class(), "status-green");
        assert_eq!(Status::Neutral.css_class(), "status-none");
    }

    #[test]
    fn test_parse_fragment() {
        let table = parser().parse(FRAGMENT).unwrap();
        assert_eq!(table.tables.len(), 2);

        let first = &table.tables[0];
        assert_eq!(first.headers, vec!["Benchmark", "Result", "Change", "Trend"]);
        assert_eq!(first.rows.len(), 3);
        assert_eq!(first.rows[0].change, Some(-10.0));
        assert_eq!(first.rows[1].trend, None);
        assert_eq!(first.rows[2].benchmark(), Some("chaos & order"));
        assert_eq!(first.rows[2].cells[0].html, r##"<a href="#">chaos &amp; order</a>"##);
        assert!(!first.more_is_better());
        assert!(table.tables[1].more_is_better());
    }

    #[test]
    fn test_colorize_trailing_columns() {
        let mut table = parser().parse(FRAGMENT).unwrap();
        for t in &mut table.tables {
            t.colorize(&thresholds());
        }

        let rows = &table.tables[0].rows;
        // Lower is better: a -10% change is a regression
        assert_eq!(status(&rows[0], 2), Some(Status::Regression));
        assert_eq!(status(&rows[0], 3), Some(Status::Neutral));
        // Non-numeric trend is neutral
        assert_eq!(status(&rows[1], 3), Some(Status::Neutral));
        assert_eq!(status(&rows[2], 3), Some(Status::Improvement));
        // Leading columns are untouched
        assert_eq!(status(&rows[0], 0), None);
        assert_eq!(status(&rows[0], 1), None);
    }

    #[test]
    fn test_more_is_better_flips_sign() {
        let mut table = parser().parse(FRAGMENT).unwrap();
        table.tables[1].colorize(&thresholds());

        let row = &table.tables[1].rows[0];
        assert_eq!(status(row, 2), Some(Status::Improvement));
        assert_eq!(status(row, 3), Some(Status::Regression));
    }

    #[test]
    fn test_sort_toggles_direction_and_restripes() {
        let mut table = parser().parse(FRAGMENT).unwrap().tables.remove(0);

        table.sort_by(1);
        let order: Vec<_> = table.rows.iter().filter_map(Row::benchmark).collect();
        assert_eq!(order, vec!["float", "ai", "chaos & order"]);
        assert_eq!(table.sort, Some(SortState { column: 1, ascending: true }));

        table.sort_by(1);
        let order: Vec<_> = table.rows.iter().filter_map(Row::benchmark).collect();
        assert_eq!(order, vec!["chaos & order", "ai", "float"]);
        assert_eq!(table.rows[0].stripe, Stripe::Even);
        assert_eq!(table.rows[1].stripe, Stripe::Odd);

        table.sort_by(0);
        let order: Vec<_> = table.rows.iter().filter_map(Row::benchmark).collect();
        assert_eq!(order, vec!["ai", "chaos & order", "float"]);
    }

    #[test]
    fn test_percent_cells_sort_numerically() {
        let mut table = parser().parse(FRAGMENT).unwrap().tables.remove(0);
        table.sort_by(2);
        let order: Vec<_> = table.rows.iter().filter_map(Row::benchmark).collect();
        assert_eq!(order, vec!["float", "chaos & order", "ai"]);
    }

    #[test]
    fn test_no_results_message() {
        let fragment = r#"<table id="results" class="tablesorter" style="height: 232px;"></table><p class="errormessage">No results for this parameters</p>"#;
        let table = parser().parse(fragment).unwrap();
        assert_eq!(table.tables[0].rows.len(), 0);
        assert_eq!(table.message.as_deref(), Some("No results for this parameters"));
    }

    #[test]
    fn test_fragment_without_table_is_an_error() {
        assert!(parser().parse("<div>oops</div>").is_err());
        assert!(parser().parse("").unwrap().tables.is_empty());
    }

    fn catalog() -> Catalog {
        let mut catalog = Catalog {
            executables: vec![
                Entry::new("1", "CPython").with_project("CPython"),
                Entry::new("2", "PyPy").with_project("PyPy"),
                Entry::new("3", "CPython-opt").with_project("CPython"),
            ],
            ..Default::default()
        };
        let revision = |label: &str, commit: &str| RevisionOption {
            label: label.to_string(),
            commitid: commit.to_string(),
        };
        catalog
            .revisions
            .insert("CPython".to_string(), vec![revision("r2", "c2"), revision("r1", "c1")]);
        catalog
            .revisions
            .insert("PyPy".to_string(), vec![revision("p9", "p9"), revision("p8", "p8")]);
        catalog
    }

    fn selection(exe: &str, rev: &str) -> ChangeSelection {
        ChangeSelection {
            trend: 10,
            revision: rev.to_string(),
            executable: exe.to_string(),
            environment: "1".to_string(),
        }
    }

    fn controller() -> ChangeTableController {
        ChangeTableController::new(DashboardConfig::default(), catalog(), selection("1", "c1"))
            .unwrap()
    }

    fn render(effects: Vec<Effect<ChangeView>>) -> ChangeView {
        match effects.into_iter().next() {
            Some(Effect::Render(view)) => view,
            other => panic!("expected a render, got {:?}", other),
        }
    }

    #[test]
    fn test_selection_change_shows_loader_then_fetches() {
        let mut controller = controller();
        let effects = controller.update(Event::SelectionChanged(selection("3", "c1")));

        assert_eq!(effects.len(), 2);
        assert!(matches!(&effects[0], Effect::Notice(n) if n.text == "Loading..."));
        match &effects[1] {
            Effect::Fetch(request) => {
                assert_eq!(request.endpoint, Endpoint::Table);
                assert_eq!(request.query_string(), "tre=10&rev=c1&exe=3&env=1");
            }
            other => panic!("unexpected effect {:?}", other),
        }
    }

    #[test]
    fn test_project_change_repopulates_revisions() {
        let mut controller = controller();

        // Same project: nothing changes
        controller.update(Event::SelectionChanged(selection("3", "c1")));
        let view = render(controller.update(Event::DataLoaded(FRAGMENT.to_string())));
        assert!(!view.revisions_changed);
        assert_eq!(view.revisions[0].commitid, "c2");

        let effects = controller.update(Event::SelectionChanged(selection("2", "c1")));
        match &effects[1] {
            Effect::Fetch(request) => assert!(request.query_string().contains("rev=p9")),
            other => panic!("unexpected effect {:?}", other),
        }

        let view = render(controller.update(Event::DataLoaded(FRAGMENT.to_string())));
        assert!(view.revisions_changed);
        assert_eq!(view.selection.revision, "p9");
        assert_eq!(view.revisions.len(), 2);

        // The cue is shown once
        let view = render(controller.update(Event::RenderRequested));
        assert!(!view.revisions_changed);
    }

    #[test]
    fn test_row_click_navigates_to_timeline() {
        let mut controller = controller();
        controller.update(Event::DataLoaded(FRAGMENT.to_string()));

        let effects = controller.update(Event::Interaction(ChangeInteraction::RowClicked {
            table: 0,
            row: 2,
        }));
        assert_eq!(
            effects,
            vec![Effect::Navigate("timeline/?ben=chaos+%26+order&env=1".to_string())]
        );

        let effects = controller.update(Event::Interaction(ChangeInteraction::RowClicked {
            table: 5,
            row: 0,
        }));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_row_hover_toggles_highlight() {
        let mut controller = controller();
        controller.update(Event::DataLoaded(FRAGMENT.to_string()));

        let view = render(controller.update(Event::Interaction(ChangeInteraction::RowHover {
            table: 0,
            row: 1,
            active: true,
        })));
        assert!(view.table.tables[0].rows[1].highlight);

        let view = render(controller.update(Event::Interaction(ChangeInteraction::RowHover {
            table: 0,
            row: 1,
            active: false,
        })));
        assert!(!view.table.tables[0].rows[1].highlight);
    }

    #[test]
    fn test_loaded_table_is_colored_with_configured_thresholds() {
        let mut controller = controller();
        let view = render(controller.update(Event::DataLoaded(FRAGMENT.to_string())));
        // Default change threshold is 3.0: +4.5% is an improvement
        assert_eq!(view.table.tables[0].rows[1].cells[2].status, Some(Status::Improvement));
    }

    #[test]
    fn test_unparseable_fragment_shows_error() {
        let mut controller = controller();
        let effects = controller.update(Event::DataLoaded("<div>Server Error</div>".to_string()));
        assert!(matches!(&effects[0], Effect::Notice(n) if n.text.contains("no results table")));
        assert!(controller.table().is_none());
    }
}
