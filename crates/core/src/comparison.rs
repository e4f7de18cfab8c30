//! Comparison view: one bar chart per benchmark-unit group
//!
//! The results matrix is fetched once and re-used for every later selection
//! change. For each unit group with at least one selected benchmark a chart
//! is derived: values (optionally normalized to a baseline executable),
//! titles, ticks, and a geometry that depends on bar orientation, the number
//! of bars and the available width.

use crate::catalog::{Catalog, UnitGroup};
use crate::chart::{
    Axis, AxisRenderer, BarDirection, BarOptions, Bound, ChartConfig, Legend, LegendLocation,
    Series, SeriesData,
};
use crate::config::{DashboardConfig, Viewport};
use crate::error::Result;
use crate::event::{encode_query, Controller, ControllerEvent, Effect, Endpoint, Event, Request};
use crate::notice::Notice;
use crate::payload::ComparisonPayload;
use crate::selection::{ChartType, ComparisonSelection};
use serde::Serialize;
use tracing::{debug, warn};

/// Stand-in ratio when a grouped or relative chart's baseline value is
/// missing or zero
pub const EMPTY_BASELINE_SENTINEL: f64 = 0.0001;

/// Element all comparison output is placed in
pub const PLOT_WRAPPER: &str = "plotwrapper";

const BAR_WIDTH: f64 = 20.0;

const WEIGHTED_SUM_NOTE: &str = "Normalized stacked bars actually represent the weighted \
arithmetic sum, useful to spot which individual benchmarks take up the most time. Choosing \
different weightings from the \"Normalization\" menu will change the totals relative to one \
another. For the correct way to calculate total bars, the geometric mean must be used.";

/// A chart that could not be drawn, shown as a bordered message instead
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbortedPlot {
    pub id: String,
    /// Chart title, shown in bold above the message
    pub title: String,
    pub message: String,
    pub border: &'static str,
    pub padding: &'static str,
    pub width: &'static str,
}

/// Replace the plot `id` with a bordered error message
pub fn abort_render(id: &str, title: &str, message: String) -> AbortedPlot {
    warn!(plot = id, "Aborting comparison chart: {}", message);
    AbortedPlot {
        id: id.to_string(),
        title: title.to_string(),
        message,
        border: "dashed 1px grey",
        padding: "1em",
        width: "400px",
    }
}

/// Result of deriving one chart
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "plot", rename_all = "lowercase")]
pub enum PlotOutcome {
    Chart(ChartConfig),
    Aborted(AbortedPlot),
}

/// Everything rendered into the plot wrapper
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonView {
    /// Informational note shown above the charts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<Notice>,
    pub plots: Vec<PlotOutcome>,
}

/// Check a selection before anything is drawn.
///
/// Returns the warning that aborts the render, or an optional note to show
/// above the charts.
pub fn validate(selection: &ComparisonSelection) -> std::result::Result<Option<Notice>, Notice> {
    let warning = |text: &str| Notice::warning(PLOT_WRAPPER, text);

    if selection.executables.is_empty() {
        return Err(warning("No executables selected"));
    }
    if selection.benchmarks.is_empty() {
        return Err(warning("No benchmarks selected"));
    }
    if selection.environments.is_empty() {
        return Err(warning("No environments selected"));
    }

    match (selection.chart, &selection.baseline) {
        (ChartType::RelativeBars, None) => Err(warning(
            "For relative bar charts, you must select a baseline to normalize to.",
        )),
        (ChartType::StackedBars, Some(_)) => Ok(Some(Notice::note(PLOT_WRAPPER, WEIGHTED_SUM_NOTE))),
        _ => Ok(None),
    }
}

/// Derive the charts for every unit group that has a selected benchmark
pub fn render_plots(
    selection: &ComparisonSelection,
    catalog: &Catalog,
    data: &ComparisonPayload,
    viewport: &Viewport,
) -> Vec<PlotOutcome> {
    let mut plots = Vec::new();

    for group in &catalog.bench_units {
        let benchmarks: Vec<String> = selection
            .benchmarks
            .iter()
            .filter(|b| group.benchmark_ids.contains(b))
            .cloned()
            .collect();
        if benchmarks.is_empty() {
            continue;
        }

        let id = format!("plot{}", plots.len() + 1);
        let outcome = match derive_chart(&id, group, benchmarks, selection, catalog, data, viewport) {
            Ok(chart) => PlotOutcome::Chart(chart),
            Err(aborted) => PlotOutcome::Aborted(aborted),
        };
        plots.push(outcome);
    }

    plots
}

fn titles(group: &UnitGroup, chart: ChartType, baseline_label: Option<&str>) -> (String, String) {
    match baseline_label {
        None => {
            let prefix = if chart == ChartType::StackedBars {
                "Cumulative "
            } else {
                ""
            };
            (
                format!("{}{}", prefix, group.title),
                format!("{}{}", group.units, group.lessisbetter),
            )
        }
        Some(label) => {
            let title = match chart {
                ChartType::StackedBars => {
                    format!("Cumulative {} normalized to {}", group.title, label)
                }
                ChartType::RelativeBars => format!("{} ratio to {}", group.title, label),
                ChartType::NormalBars => format!("{} normalized to {}", group.title, label),
            };
            (title, format!("Ratio {}", group.lessisbetter))
        }
    }
}

/// Derive one comparison chart, or the message that replaces it
pub fn derive_chart(
    id: &str,
    group: &UnitGroup,
    mut benchmarks: Vec<String>,
    selection: &ComparisonSelection,
    catalog: &Catalog,
    data: &ComparisonPayload,
    viewport: &Viewport,
) -> std::result::Result<ChartConfig, AbortedPlot> {
    let chart = selection.chart;
    let horizontal = selection.horizontal;
    let baseline = selection.baseline.as_deref();
    let baseline_label = baseline.map(|b| catalog.executable_label(b));
    let (title, mut axis_label) = titles(group, chart, baseline_label.as_deref());

    let mut baseline_is_empty = baseline.is_some();
    let mut executables = selection.executables.clone();
    let mut ticks = Vec::new();
    let mut series = Vec::new();
    let mut plot_data = Vec::new();
    let mut bar_count = 0usize;
    let mut bench_count = 0usize;

    match chart {
        ChartType::NormalBars | ChartType::RelativeBars => {
            if horizontal {
                benchmarks.reverse();
            }
            ticks = benchmarks.iter().map(|b| catalog.benchmark_label(b)).collect();

            for exe in &executables {
                for env in &selection.environments {
                    // The baseline itself would be a flat 1x row
                    if chart == ChartType::RelativeBars && Some(exe.as_str()) == baseline {
                        continue;
                    }
                    series.push(Series::labeled(format!(
                        "{} @ {}",
                        catalog.executable_label(exe),
                        catalog.environment_label(env)
                    )));
                    if baseline.is_some() && chart == ChartType::RelativeBars {
                        axis_label = "<- worse - better ->".to_string();
                    }

                    bench_count = 0;
                    let mut values = Vec::with_capacity(benchmarks.len());
                    for bench in &benchmarks {
                        bench_count += 1;
                        bar_count += 1;

                        let mut value = data.value(exe, env, bench);
                        if let Some(base) = baseline {
                            let base_value = data.value(base, env, bench);
                            if let Some(raw) = value {
                                value = Some(match base_value {
                                    Some(b) if b != 0.0 => {
                                        baseline_is_empty = false;
                                        let ratio = raw / b;
                                        if chart == ChartType::RelativeBars && ratio > 1.0 {
                                            -ratio
                                        } else {
                                            ratio
                                        }
                                    }
                                    _ => EMPTY_BASELINE_SENTINEL,
                                });
                            }
                        }
                        values.push(value);
                    }
                    plot_data.push(SeriesData::bars(values, horizontal));
                }
            }
        }
        ChartType::StackedBars => {
            if horizontal {
                executables.reverse();
            }
            for exe in &executables {
                for env in &selection.environments {
                    ticks.push(format!(
                        "{} @ {}",
                        catalog.executable_label(exe),
                        catalog.environment_label(env)
                    ));
                }
            }

            for bench in &benchmarks {
                let bench_label = catalog.benchmark_label(bench);
                series.push(Series::labeled(bench_label.clone()));

                bench_count = 0;
                bar_count = 1;
                let mut values = Vec::with_capacity(ticks.len());
                for exe in &executables {
                    for env in &selection.environments {
                        bench_count += 1;

                        let mut value = data.value(exe, env, bench);
                        if let Some(base) = baseline {
                            let base_value = data.value(base, env, bench);
                            if let Some(raw) = value {
                                match base_value {
                                    Some(b) if b != 0.0 => {
                                        baseline_is_empty = false;
                                        value = Some(raw / b);
                                    }
                                    _ => {
                                        let message = format!(
                                            "Could not render plot because baseline {} has empty results for benchmark {}",
                                            baseline_label.as_deref().unwrap_or(base),
                                            bench_label
                                        );
                                        return Err(abort_render(id, &title, message));
                                    }
                                }
                            }
                        }
                        values.push(value);
                    }
                }
                plot_data.push(SeriesData::bars(values, horizontal));
            }
        }
    }

    if baseline_is_empty {
        let message = format!(
            "Could not render plot because baseline {} is empty",
            baseline_label.as_deref().unwrap_or_default()
        );
        return Err(abort_render(id, &title, message));
    }

    let mut config = ChartConfig::new(id, title);
    config.data = plot_data;
    config.series = series;

    let layout = Layout {
        chart,
        horizontal,
        ticks,
        axis_label,
        bar_count,
        bench_count,
        benchmarks: benchmarks.len(),
    };
    layout.apply(&mut config, viewport);

    debug!(
        plot = id,
        series = config.series.len(),
        width = ?config.geometry.width,
        height = ?config.geometry.height,
        "Derived comparison chart"
    );
    Ok(config)
}

/// Inputs of the size and placement heuristics
struct Layout {
    chart: ChartType,
    horizontal: bool,
    ticks: Vec<String>,
    axis_label: String,
    /// Bars in the chart (1 for stacked charts)
    bar_count: usize,
    /// Bars per series
    bench_count: usize,
    /// Selected benchmarks in this group
    benchmarks: usize,
}

impl Layout {
    fn apply(self, config: &mut ChartConfig, viewport: &Viewport) {
        let plot_width = viewport.width;
        let mut bars = BarOptions {
            direction: BarDirection::Vertical,
            padding: 6.0,
            margin: 15.0,
            shadow: true,
            fill_to_zero: false,
            use_negative_colors: true,
        };
        let ratio_format = Some("%.1fx".to_string());
        let mut width;
        let mut height;

        if self.horizontal {
            bars.direction = BarDirection::Horizontal;
            bars.padding = 8.0;
            config.x_axis = Axis {
                renderer: AxisRenderer::Linear,
                label: Some(self.axis_label.clone()),
                min: Some(Bound::Value(0.0)),
                show_ticks: true,
                autoscale: true,
                tick_angle: Some(0.0),
                ..Default::default()
            };
            config.y_axis = Axis {
                renderer: AxisRenderer::Category,
                ticks: self.ticks.clone(),
                show_ticks: true,
                tick_angle: Some(0.0),
                ..Default::default()
            };

            if self.chart == ChartType::RelativeBars {
                config.x_axis.min = None;
                config.x_axis.tick_format = ratio_format;
            }

            height = if self.chart == ChartType::StackedBars {
                90.0 + self.ticks.len() as f64 * (bars.padding * 2.0 + BAR_WIDTH)
            } else {
                self.bar_count as f64 * (bars.padding * 2.0 + BAR_WIDTH)
                    + self.bench_count as f64 * bars.margin * 2.0
            };

            if height > 700.0 {
                height = (height / 2.0).clamp(700.0, 2000.0);
                bars.padding = 0.0;
                bars.margin = 8.0;
                bars.shadow = false;
            } else if height < 300.0 {
                height = 300.0;
                bars.padding = 14.0;
                bars.margin = 25.0;
            }
            width = plot_width;
        } else {
            config.x_axis = Axis {
                renderer: AxisRenderer::Category,
                ticks: self.ticks.clone(),
                tick_angle: Some(0.0),
                show_ticks: true,
                ..Default::default()
            };
            config.y_axis = Axis {
                renderer: AxisRenderer::Linear,
                label: Some(self.axis_label.clone()),
                min: Some(Bound::Value(0.0)),
                show_ticks: true,
                autoscale: true,
                ..Default::default()
            };

            width = self.bar_count as f64 * (bars.padding * 2.0 + BAR_WIDTH)
                + self.bench_count as f64 * bars.margin * 2.0
                + 60.0;
            height = viewport.plot_height;

            if width > plot_width + 75.0 {
                bars.padding = 0.0;
                bars.margin = 10.0;
                bars.shadow = false;
                config.x_axis.tick_angle = Some(-30.0);
            }
            if width > plot_width {
                width = plot_width;
            } else if width < 320.0 {
                width = 320.0;
                bars.padding = 15.0;
                bars.margin = 25.0;
            }

            match self.chart {
                ChartType::NormalBars if config.series.len() == 1 && self.benchmarks > 1 => {
                    config.x_axis.tick_angle = Some(-30.0);
                }
                ChartType::StackedBars => {
                    config.x_axis.tick_angle = Some(-60.0);
                    bars.margin += 5.0;
                    config.geometry.margin_left = Some(25.0);
                    height += 60.0;
                }
                ChartType::RelativeBars => {
                    config.y_axis.min = None;
                    config.y_axis.tick_format = ratio_format;
                    config.x_axis.tick_angle = Some(-30.0);
                }
                _ => {}
            }
        }

        // Legend placement
        let series_count = config.series.len();
        let mut legend = Legend::at(LegendLocation::Ne);
        let off_plot = if self.horizontal {
            series_count > 2 * self.ticks.len()
        } else {
            series_count > 4
        };

        if off_plot {
            let offset = config.outside_legend_offset();
            legend.x_offset = Some(-offset);
            config.geometry.margin_right = Some(offset + 10.0);
            if width + offset > plot_width {
                width = plot_width - offset - 20.0;
            }
        } else if !self.horizontal && self.ticks.len() <= 2 {
            legend = Legend::at(LegendLocation::Se);
        }
        config.legend = Some(legend);

        match self.chart {
            ChartType::StackedBars => config.stack_series = true,
            ChartType::RelativeBars => {
                bars.fill_to_zero = true;
                bars.use_negative_colors = false;
            }
            ChartType::NormalBars => {}
        }

        // Grow the bottom margin so a long legend doesn't overflow
        if series_count > 14 && (!self.horizontal || series_count > self.ticks.len()) {
            config.geometry.extra_margin_bottom = Some(4.0 + (series_count - 14) as f64 * 22.0);
        }

        config.bars = Some(bars);
        config.geometry.width = Some(width);
        config.geometry.height = Some(height);
    }
}

/// Comparison gestures that don't change the selection
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonInteraction {
    /// Reload the page with the current selection in the URL
    Permalink,
}

/// Controller of the comparison view
#[derive(Debug, Clone)]
pub struct ComparisonController {
    config: DashboardConfig,
    catalog: Catalog,
    selection: ComparisonSelection,
    data: Option<ComparisonPayload>,
    requested: bool,
}

impl ComparisonController {
    pub fn new(config: DashboardConfig, catalog: Catalog, selection: ComparisonSelection) -> Self {
        Self {
            config,
            catalog,
            selection,
            data: None,
            requested: false,
        }
    }

    pub fn selection(&self) -> &ComparisonSelection {
        &self.selection
    }

    /// Whether the results matrix has been loaded
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// `?`-prefixed permalink of the current selection
    pub fn permalink(&self) -> String {
        format!("?{}", encode_query(&self.selection.to_query()))
    }

    fn refresh(&mut self) -> Vec<Effect<ComparisonView>> {
        let note = match validate(&self.selection) {
            Ok(note) => note,
            Err(warning) => {
                debug!("Comparison selection rejected: {}", warning.text);
                return vec![Effect::Notice(warning)];
            }
        };

        let Some(data) = &self.data else {
            if self.requested {
                return Vec::new();
            }
            self.requested = true;
            return vec![
                Effect::Notice(Notice::loading(PLOT_WRAPPER, self.config.viewport.content_height)),
                Effect::Fetch(Request::new(Endpoint::Comparison, Vec::new())),
            ];
        };

        let plots = render_plots(&self.selection, &self.catalog, data, &self.config.viewport);
        vec![Effect::Render(ComparisonView { note, plots })]
    }
}

impl Controller for ComparisonController {
    type Selection = ComparisonSelection;
    type Payload = ComparisonPayload;
    type Interaction = ComparisonInteraction;
    type View = ComparisonView;

    fn update(&mut self, event: ControllerEvent<Self>) -> Vec<Effect<ComparisonView>> {
        match event {
            Event::SelectionChanged(selection) => {
                self.selection = selection;
                self.refresh()
            }
            Event::RenderRequested => self.refresh(),
            Event::DataLoaded(payload) => {
                self.requested = false;
                if let Some(error) = payload.error_message() {
                    return vec![Effect::Notice(Notice::error(
                        PLOT_WRAPPER,
                        error,
                        self.config.viewport.content_height,
                    ))];
                }
                self.data = Some(payload);
                self.refresh()
            }
            Event::Interaction(ComparisonInteraction::Permalink) => {
                vec![Effect::Navigate(self.permalink())]
            }
        }
    }

    fn decode(body: &str) -> Result<ComparisonPayload> {
        Ok(serde_json::from_str(body)?)
    }
}
