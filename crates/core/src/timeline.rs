//! Timeline view: result history of one benchmark, or a grid of all of them
//!
//! The selection is mirrored into the page URL. Every change pushes a new
//! URL state and refetches; loading a URL (initially or through history
//! navigation) re-applies its parameters.

use crate::catalog::Catalog;
use crate::chart::{
    Axis, AxisRenderer, Band, Bound, ChartConfig, Highlighter, Legend, LegendLocation, Series,
    SeriesData,
};
use crate::config::DashboardConfig;
use crate::error::Result;
use crate::event::{encode_query, Controller, ControllerEvent, Effect, Endpoint, Event, Request};
use crate::notice::Notice;
use crate::payload::{
    parse_date, BaselinePoint, PointStats, Timeline, TimelinePayload, TimelinePoint,
};
use crate::selection::{BenchmarkChoice, TimelineSelection};
use crate::url_state;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Element the timeline plots are drawn into
pub const PLOT_GRID: &str = "plotgrid";

/// Color of the baseline reference line
pub const BASELINE_COLOR: &str = "#d8b83f";

/// Executable colors, assigned by catalog order
pub const SERIES_COLORS: [&str; 9] = [
    "#4bb2c5", "#EAA228", "#579575", "#953579", "#839557", "#ff5800", "#958c12", "#4b5de4",
    "#0085cc",
];

const SHADOW_ALPHA: f64 = 0.6;
const DATE_BOUND_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const MINIPLOT_PREFIX: &str = "plot_";

/// Palette color of an executable
pub fn executable_color(catalog: &Catalog, executable: &str) -> &'static str {
    let index = catalog.executable_index(executable).unwrap_or(0);
    SERIES_COLORS[index % SERIES_COLORS.len()]
}

/// `#rrggbb` scaled to `rgba(r, g, b, scale)`; other notations are returned as is
pub fn scale_color_alpha(color: &str, scale: f64) -> String {
    let hex = color.trim_start_matches('#');
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

    match (hex.len(), channel(0), channel(2), channel(4)) {
        (6, Some(r), Some(g), Some(b)) => format!("rgba({}, {}, {}, {})", r, g, b, scale),
        _ => color.to_string(),
    }
}

/// Decimals for the y axis: 2, plus one per power of ten the smallest latest
/// value sits below 1
pub fn significant_digits(latest_values: &[f64]) -> usize {
    let mut digits = 2;
    let mut value = latest_values.iter().copied().fold(f64::INFINITY, f64::min);
    if value > 0.0 && value.is_finite() {
        while value < 1.0 {
            value *= 10.0;
            digits += 1;
        }
    }
    digits
}

/// Enabled state of the timeline's input controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ControlState {
    pub revisions_enabled: bool,
    pub equidistant_enabled: bool,
    /// Quartile/extrema toggles, only meaningful for median data
    pub median_options_visible: bool,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            revisions_enabled: true,
            equidistant_enabled: true,
            median_options_visible: false,
        }
    }
}

impl ControlState {
    /// Controls for a benchmark mode; the grid has no revision range or
    /// equidistant axis
    pub fn for_mode(mode: &BenchmarkChoice) -> Self {
        let grid = *mode == BenchmarkChoice::Grid;
        Self {
            revisions_enabled: !grid,
            equidistant_enabled: !grid,
            median_options_visible: false,
        }
    }
}

/// What the plot grid shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "content", rename_all = "lowercase")]
pub enum TimelineContent {
    Message(Notice),
    /// One miniature chart per benchmark
    Grid(Vec<ChartConfig>),
    Single(ChartConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineView {
    pub controls: ControlState,
    pub content: TimelineContent,
}

/// Full chart of one timeline plus the executable behind each series
#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePlot {
    pub chart: ChartConfig,
    /// Executable id per series; `None` for the baseline
    pub series_index: Vec<Option<String>>,
    /// Label-less band series drawn beneath their primary series
    pub hidden_series: usize,
    pub median: bool,
}

fn highlighter(median: bool) -> Highlighter {
    let fields: &[&str] = if median {
        &["date", "median", "max", "Q3", "Q1", "min", "commit", "tag"]
    } else {
        &["date", "result", "std dev", "commit", "tag"]
    };
    Highlighter {
        show: true,
        y_values: fields.len(),
        fields: fields.iter().map(|f| f.to_string()).collect(),
    }
}

fn baseline_series(label: Option<String>) -> Series {
    Series {
        label,
        color: Some(BASELINE_COLOR.to_string()),
        show_marker: Some(false),
        line_width: Some(1.5),
        ..Default::default()
    }
}

/// Quartile and extrema bands of median rows
fn median_bands(rows: &[TimelinePoint]) -> (Band, Band) {
    let mut quartiles = Band {
        lower: Vec::new(),
        upper: Vec::new(),
    };
    let mut extrema = quartiles.clone();

    for row in rows {
        if let PointStats::Median { max, q3, q1, min } = row.stats {
            let point = |v: f64| BaselinePoint(row.date.clone(), v);
            extrema.lower.extend(min.map(point));
            extrema.upper.extend(max.map(point));
            quartiles.lower.extend(q1.map(point));
            quartiles.upper.extend(q3.map(point));
        }
    }
    (quartiles, extrema)
}

/// Oldest and newest commit date across all point series
fn date_bounds(data: &[SeriesData]) -> Option<(Bound, Bound)> {
    let dates: Vec<NaiveDateTime> = data
        .iter()
        .flat_map(|series| match series {
            SeriesData::Points(points) => {
                points.iter().filter_map(|p| p.timestamp()).collect::<Vec<_>>()
            }
            _ => Vec::new(),
        })
        .collect();

    let min = dates.iter().min()?;
    let max = dates.iter().max()?;
    Some((
        Bound::Date(min.format(DATE_BOUND_FORMAT).to_string()),
        Bound::Date(max.format(DATE_BOUND_FORMAT).to_string()),
    ))
}

/// Merged, chronologically sorted dates for the equidistant axis
fn merged_dates(data: &[SeriesData]) -> Vec<String> {
    let unique: BTreeSet<&str> = data
        .iter()
        .flat_map(|series| match series {
            SeriesData::Points(points) => points.iter().map(|p| p.date.as_str()).collect::<Vec<_>>(),
            _ => Vec::new(),
        })
        .collect();

    let mut dates: Vec<&str> = unique.into_iter().collect();
    dates.sort_by_key(|d| parse_date(d));
    dates.into_iter().map(str::to_string).collect()
}

/// Derive the full chart of a single timeline
pub fn render_plot(
    timeline: &Timeline,
    payload_kind: Option<&str>,
    selection: &TimelineSelection,
    catalog: &Catalog,
    config: &DashboardConfig,
) -> TimelinePlot {
    let median = timeline.is_median(payload_kind);
    let mut chart = ChartConfig::new("plot", timeline.benchmark.clone());
    let mut series_index = Vec::new();
    let mut latest_values = Vec::new();
    let mut hidden_series = 0;

    for executables in timeline.branches.values() {
        for (exe_id, rows) in executables {
            let color = executable_color(catalog, exe_id);
            let mut series = Series {
                label: Some(catalog.executable_label(exe_id)),
                color: Some(color.to_string()),
                ..Default::default()
            };

            if median {
                let (quartiles, extrema) = median_bands(rows);
                let show_quartiles = selection.quartiles.is_on();
                let show_extrema = selection.extrema.is_on();

                if show_quartiles && show_extrema {
                    chart.series.push(Series {
                        color: Some(scale_color_alpha(color, SHADOW_ALPHA)),
                        show_label: Some(false),
                        show_marker: Some(false),
                        band: Some(extrema),
                        ..Default::default()
                    });
                    chart.data.push(SeriesData::Points(rows.clone()));
                    series_index.push(Some(exe_id.clone()));
                    hidden_series += 1;
                    series.band = Some(quartiles);
                } else if show_quartiles {
                    series.band = Some(quartiles);
                } else if show_extrema {
                    series.band = Some(extrema);
                }
            }

            chart.series.push(series);
            chart.data.push(SeriesData::Points(rows.clone()));
            series_index.push(Some(exe_id.clone()));
            if let Some(latest) = rows.first() {
                latest_values.push(latest.value);
            }
        }
    }

    let digits = significant_digits(&latest_values);

    if let Some(description) = timeline.benchmark_description.as_deref() {
        if !description.is_empty() {
            chart.description = Some(format!("{}: {}", timeline.benchmark, description));
        }
    }

    if let Some(baseline) = &timeline.baseline {
        let label = selection
            .baseline
            .as_deref()
            .map(|b| catalog.baseline_label(b))
            .unwrap_or_else(|| "Baseline".to_string());
        chart.series.push(baseline_series(Some(label)));
        chart.data.push(SeriesData::Line(baseline.clone()));
        series_index.push(None);
    }

    chart.y_axis = Axis {
        renderer: AxisRenderer::Linear,
        label: Some(format!("{}{}", timeline.units, timeline.lessisbetter)),
        min: Some(Bound::Value(0.0)),
        tick_format: Some(format!("%.{}f", digits)),
        show_ticks: true,
        autoscale: true,
        ..Default::default()
    };

    let equidistant = selection.equidistant.is_on();
    chart.x_axis = Axis {
        renderer: if equidistant {
            AxisRenderer::Category
        } else {
            AxisRenderer::Date
        },
        label: Some("Commit date".to_string()),
        tick_format: Some("%b %d".to_string()),
        show_ticks: true,
        autoscale: true,
        pad: Some(1.01),
        ..Default::default()
    };
    if equidistant {
        chart.x_axis.ticks = merged_dates(&chart.data);
    } else if let Some((min, max)) = date_bounds(&chart.data) {
        chart.x_axis.min = Some(min);
        chart.x_axis.max = Some(max);
    }

    let mut legend = Legend::at(LegendLocation::Nw);
    let mut width = config.viewport.width;
    if chart.series.len() > 4 + hidden_series {
        let offset = chart.outside_legend_offset();
        legend.location = LegendLocation::Ne;
        legend.x_offset = Some(-offset);
        chart.geometry.margin_right = Some(offset + 10.0);
        width -= offset;
    }
    chart.legend = Some(legend);
    chart.highlighter = Some(highlighter(median));
    chart.zoom = true;
    chart.geometry.width = Some(width);
    chart.geometry.height = Some(config.viewport.plot_height);

    debug!(
        benchmark = %timeline.benchmark,
        series = chart.series.len(),
        hidden = hidden_series,
        digits,
        "Derived timeline chart"
    );

    TimelinePlot {
        chart,
        series_index,
        hidden_series,
        median,
    }
}

/// Derive a clickable miniature chart of a timeline
pub fn render_miniplot(timeline: &Timeline, catalog: &Catalog) -> ChartConfig {
    let mut chart = ChartConfig::new(
        format!("{}{}", MINIPLOT_PREFIX, timeline.benchmark_id),
        timeline.benchmark.clone(),
    );

    for executables in timeline.branches.values() {
        for (exe_id, rows) in executables {
            chart.series.push(Series {
                label: Some(catalog.executable_label(exe_id)),
                color: Some(executable_color(catalog, exe_id).to_string()),
                ..Default::default()
            });
            chart.data.push(SeriesData::Points(rows.clone()));
        }
    }
    if let Some(baseline) = &timeline.baseline {
        chart.series.push(baseline_series(None));
        chart.data.push(SeriesData::Line(baseline.clone()));
    }

    chart.y_axis = Axis {
        min: Some(Bound::Value(0.0)),
        autoscale: true,
        show_ticks: false,
        ..Default::default()
    };
    chart.x_axis = Axis {
        renderer: AxisRenderer::Date,
        pad: Some(1.01),
        autoscale: true,
        show_ticks: false,
        ..Default::default()
    };
    chart.pointer = true;
    chart
}

/// Timeline gestures
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineInteraction {
    /// The page URL was loaded or changed through back/forward
    UrlChanged(String),
    /// Click on point `point` of series `series` of the full chart
    MarkerClicked { series: usize, point: usize },
    /// Click on a miniature chart
    MiniplotClicked { plot_id: String },
    /// Reload the page with the selection in the URL
    Permalink,
}

/// Controller of the timeline view
#[derive(Debug, Clone)]
pub struct TimelineController {
    config: DashboardConfig,
    catalog: Catalog,
    selection: TimelineSelection,
    data: Option<TimelinePayload>,
    plot: Option<TimelinePlot>,
    controls: ControlState,
}

impl TimelineController {
    pub fn new(config: DashboardConfig, catalog: Catalog, selection: TimelineSelection) -> Self {
        Self {
            config,
            catalog,
            selection,
            data: None,
            plot: None,
            controls: ControlState::default(),
        }
    }

    /// Controller whose selection comes from the catalog's defaults
    pub fn with_defaults(config: DashboardConfig, catalog: Catalog) -> Self {
        let selection = catalog.timeline_defaults.selection();
        Self::new(config, catalog, selection)
    }

    pub fn selection(&self) -> &TimelineSelection {
        &self.selection
    }

    pub fn controls(&self) -> ControlState {
        self.controls
    }

    /// Query for the timeline endpoint
    pub fn build_selection_query(&self) -> Vec<(String, String)> {
        self.selection.to_query()
    }

    fn refresh_content(&self) -> Vec<Effect<TimelineView>> {
        info!(benchmark = %self.selection.benchmark.as_param(), "Requesting timeline");
        vec![
            Effect::Notice(Notice::loading(PLOT_GRID, self.config.viewport.content_height)),
            Effect::Fetch(Request::new(Endpoint::Timeline, self.build_selection_query())),
        ]
    }

    /// Write the selection into the URL, then refetch
    fn update_url(&self) -> Vec<Effect<TimelineView>> {
        let mut effects = vec![Effect::PushUrl(url_state::encode(&self.selection))];
        effects.extend(self.refresh_content());
        effects
    }

    fn message(&self, text: &str) -> TimelineContent {
        TimelineContent::Message(Notice::error(
            PLOT_GRID,
            text,
            self.config.viewport.content_height,
        ))
    }

    fn render(&mut self) -> Vec<Effect<TimelineView>> {
        let Some(data) = &self.data else {
            return Vec::new();
        };
        let mut controls = ControlState::default();
        self.plot = None;

        let content = if let Some(error) = data.error_message() {
            self.message(error)
        } else if self.selection.benchmark == BenchmarkChoice::None {
            self.message("Please select a benchmark on the left")
        } else if data.timelines.is_empty() {
            self.message("No data available")
        } else if self.selection.benchmark == BenchmarkChoice::Grid {
            controls = ControlState::for_mode(&BenchmarkChoice::Grid);
            TimelineContent::Grid(
                data.timelines
                    .iter()
                    .map(|t| render_miniplot(t, &self.catalog))
                    .collect(),
            )
        } else {
            let plot = render_plot(
                &data.timelines[0],
                data.data_type.as_deref(),
                &self.selection,
                &self.catalog,
                &self.config,
            );
            controls.median_options_visible = plot.median && !plot.series_index.is_empty();
            let chart = plot.chart.clone();
            self.plot = Some(plot);
            TimelineContent::Single(chart)
        };

        self.controls = controls;
        vec![Effect::Render(TimelineView { controls, content })]
    }

    /// Changes-view URL for a clicked marker
    fn marker_link(&self, series: usize, point: usize) -> Option<String> {
        let plot = self.plot.as_ref()?;
        let executable = plot.series_index.get(series)?.as_ref()?;
        let commit = match plot.chart.data.get(series)? {
            SeriesData::Points(points) => &points.get(point)?.commit,
            _ => return None,
        };

        let query = encode_query(&[
            ("rev".to_string(), commit.clone()),
            ("exe".to_string(), executable.clone()),
            ("env".to_string(), self.selection.environment.clone()),
        ]);
        Some(format!("{}?{}", self.config.pages.changes, query))
    }

    /// Benchmark name behind a miniature chart id
    fn miniplot_benchmark(&self, plot_id: &str) -> Option<String> {
        let id = plot_id.strip_prefix(MINIPLOT_PREFIX)?;
        let from_data = self
            .data
            .as_ref()
            .and_then(|d| d.timelines.iter().find(|t| t.benchmark_id == id))
            .map(|t| t.benchmark.clone());
        Some(from_data.unwrap_or_else(|| self.catalog.benchmark_label(id)))
    }

    fn interact(&mut self, interaction: TimelineInteraction) -> Vec<Effect<TimelineView>> {
        match interaction {
            TimelineInteraction::UrlChanged(query) => {
                self.selection = url_state::decode(&query, &self.catalog.timeline_defaults);
                debug!(query = %query, "Applied URL state");
                self.refresh_content()
            }
            TimelineInteraction::MarkerClicked { series, point } => {
                if matches!(
                    self.selection.benchmark,
                    BenchmarkChoice::Grid | BenchmarkChoice::None
                ) {
                    return Vec::new();
                }
                self.marker_link(series, point)
                    .map(|url| vec![Effect::Navigate(url)])
                    .unwrap_or_default()
            }
            TimelineInteraction::MiniplotClicked { plot_id } => {
                match self.miniplot_benchmark(&plot_id) {
                    Some(name) => {
                        self.selection.benchmark = BenchmarkChoice::Single(name);
                        self.update_url()
                    }
                    None => Vec::new(),
                }
            }
            TimelineInteraction::Permalink => {
                vec![Effect::Navigate(url_state::encode(&self.selection))]
            }
        }
    }
}

impl Controller for TimelineController {
    type Selection = TimelineSelection;
    type Payload = TimelinePayload;
    type Interaction = TimelineInteraction;
    type View = TimelineView;

    fn update(&mut self, event: ControllerEvent<Self>) -> Vec<Effect<TimelineView>> {
        match event {
            Event::SelectionChanged(selection) => {
                self.selection = selection;
                self.update_url()
            }
            Event::RenderRequested => match self.data {
                Some(_) => self.render(),
                None => self.refresh_content(),
            },
            Event::DataLoaded(payload) => {
                self.data = Some(payload);
                self.render()
            }
            Event::Interaction(interaction) => self.interact(interaction),
        }
    }

    fn decode(body: &str) -> Result<TimelinePayload> {
        Ok(serde_json::from_str(body)?)
    }
}
