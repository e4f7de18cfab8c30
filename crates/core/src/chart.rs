//! Chart configuration handed to the charting widget
//!
//! These types describe *what* to draw: series data, per-series options,
//! axes, legend placement and pixel geometry. They are built fresh for every
//! render and serialized for the widget; nothing here is persisted.

use crate::payload::{BaselinePoint, TimelinePoint};
use serde::Serialize;

/// Data of one series
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesData {
    /// Vertical bars, one value per tick
    Bars(Vec<Option<f64>>),
    /// Horizontal bars as `[value, tick index]` (1-based)
    HorizontalBars(Vec<(Option<f64>, usize)>),
    /// Timeline rows
    Points(Vec<TimelinePoint>),
    /// Straight reference line
    Line(Vec<BaselinePoint>),
}

impl SeriesData {
    /// Bar data in the layout the bar direction needs
    pub fn bars(values: Vec<Option<f64>>, horizontal: bool) -> Self {
        if horizontal {
            SeriesData::HorizontalBars(
                values
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (v, i + 1))
                    .collect(),
            )
        } else {
            SeriesData::Bars(values)
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SeriesData::Bars(v) => v.len(),
            SeriesData::HorizontalBars(v) => v.len(),
            SeriesData::Points(v) => v.len(),
            SeriesData::Line(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Lower and upper edge of a shaded band around a line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Band {
    pub lower: Vec<BaselinePoint>,
    pub upper: Vec<BaselinePoint>,
}

/// Per-series drawing options
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_label: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_marker: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<Band>,
}

impl Series {
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    /// Length of the label in characters, 0 for unlabeled series
    pub fn label_len(&self) -> usize {
        self.label.as_ref().map(|l| l.chars().count()).unwrap_or(0)
    }
}

/// How an axis lays out its values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisRenderer {
    #[default]
    Linear,
    /// Evenly spaced named ticks
    Category,
    /// Calendar dates
    Date,
}

/// Axis bound: a number or a date string
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Bound {
    Value(f64),
    Date(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Axis {
    pub renderer: AxisRenderer,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<Bound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<Bound>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ticks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_angle: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_format: Option<String>,
    pub show_ticks: bool,
    pub autoscale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pad: Option<f64>,
}

/// Compass position of the legend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendLocation {
    Nw,
    Ne,
    Se,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Legend {
    pub show: bool,
    pub location: LegendLocation,
    /// Negative offsets push the legend outside the plot area
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_offset: Option<f64>,
}

impl Legend {
    pub fn at(location: LegendLocation) -> Self {
        Self {
            show: true,
            location,
            x_offset: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BarDirection {
    Vertical,
    Horizontal,
}

/// Bar renderer options
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BarOptions {
    pub direction: BarDirection,
    /// Space between bars of one group
    pub padding: f64,
    /// Space around a group of bars
    pub margin: f64,
    pub shadow: bool,
    pub fill_to_zero: bool,
    pub use_negative_colors: bool,
}

/// Tooltip shown when hovering a point
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlighter {
    pub show: bool,
    /// Number of y values each point carries
    pub y_values: usize,
    /// Row captions, in point order
    pub fields: Vec<String>,
}

/// Pixel size and margins of the plot element
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Geometry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_left: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin_right: Option<f64>,
    /// Added to the element's existing bottom margin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_margin_bottom: Option<f64>,
}

/// Everything the charting widget needs to draw one plot
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartConfig {
    /// Id of the element the plot is drawn into
    pub id: String,
    pub title: String,
    pub data: Vec<SeriesData>,
    pub series: Vec<Series>,
    pub x_axis: Axis,
    pub y_axis: Axis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bars: Option<BarOptions>,
    pub stack_series: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighter: Option<Highlighter>,
    /// Zoom cursor on the full timeline chart
    pub zoom: bool,
    /// Pointer cursor, for clickable miniature charts
    pub pointer: bool,
    pub geometry: Geometry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ChartConfig {
    /// An empty configuration for the element `id`
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            data: Vec::new(),
            series: Vec::new(),
            x_axis: Axis::default(),
            y_axis: Axis::default(),
            legend: None,
            bars: None,
            stack_series: false,
            highlighter: None,
            zoom: false,
            pointer: false,
            geometry: Geometry::default(),
            description: None,
        }
    }

    /// Longest series label, in characters
    pub fn longest_label(&self) -> usize {
        self.series.iter().map(Series::label_len).max().unwrap_or(0)
    }

    /// Width reserved for a legend drawn outside the plot area
    pub fn outside_legend_offset(&self) -> f64 {
        55.0 + self.longest_label() as f64 * 5.4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_bars_are_indexed_from_one() {
        let data = SeriesData::bars(vec![Some(1.0), None], true);
        assert_eq!(
            data,
            SeriesData::HorizontalBars(vec![(Some(1.0), 1), (None, 2)])
        );
        assert_eq!(serde_json::to_string(&data).unwrap(), "[[1.0,1],[null,2]]");
    }

    #[test]
    fn test_outside_legend_offset() {
        let mut chart = ChartConfig::new("plot1", "Time");
        chart.series.push(Series::labeled("abcdefghij"));
        chart.series.push(Series::default());
        assert_eq!(chart.longest_label(), 10);
        assert!((chart.outside_legend_offset() - 109.0).abs() < 1e-9);
    }

    #[test]
    fn test_series_skips_unset_options() {
        let json = serde_json::to_value(Series::labeled("CPython @ Dual Core")).unwrap();
        assert_eq!(json, serde_json::json!({"label": "CPython @ Dual Core"}));
    }
}
