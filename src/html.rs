//! HTML page generator with Chart.js

use crate::error::{Error, Result};
use crate::session::Page;
use benchview_core::comparison::PlotOutcome;
use benchview_core::timeline::TimelineContent;
use benchview_core::{ChangeView, ChartConfig, ComparisonView, Status, TimelineView};
use chrono::Utc;
use minijinja::{context, Environment};
use serde::Serialize;
use std::path::Path;

/// HTML template of a rendered page
const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{ title }}</title>
    <script src="https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js"></script>
    <script src="https://cdn.jsdelivr.net/npm/chartjs-adapter-date-fns@3.0.0/dist/chartjs-adapter-date-fns.bundle.min.js"></script>
    <style>
        :root {
            --bg-primary: #0d1117;
            --bg-secondary: #161b22;
            --text-primary: #c9d1d9;
            --text-secondary: #8b949e;
            --border-color: #30363d;
            --accent-green: #3fb950;
            --accent-red: #f85149;
        }

        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            margin: 0;
            padding: 2rem;
        }

        h1 { font-size: 1.8rem; font-weight: 600; }
        .generated { color: var(--text-secondary); font-size: 0.9rem; }

        .notice { text-align: center; color: var(--text-secondary); }
        .notice-warning, .notice-error { color: var(--accent-red); }
        .notice-note { text-align: left; font-style: italic; }
        .loader { display: inline-block; width: 1em; height: 1em; margin-right: 0.5em;
                  border: 2px solid var(--border-color); border-top-color: var(--text-primary);
                  border-radius: 50%; animation: spin 1s linear infinite; }
        @keyframes spin { to { transform: rotate(360deg); } }

        table.tablesorter { border-collapse: collapse; margin-bottom: 2rem; min-width: 60%; }
        table.tablesorter th, table.tablesorter td { padding: 0.4rem 0.8rem; border-bottom: 1px solid var(--border-color); }
        table.tablesorter tr.odd { background: var(--bg-secondary); }
        table.tablesorter tr.highlight { outline: 1px solid var(--text-secondary); }
        th.headerSortDown::after { content: " \25B2"; }
        th.headerSortUp::after { content: " \25BC"; }
        td.status-red { color: var(--accent-red); }
        td.status-green { color: var(--accent-green); }

        .plot { margin-bottom: 2rem; }
        .plot canvas { width: 100%; height: 100%; }
        .miniplot { display: inline-block; width: 300px; height: 200px; margin: 0.5rem; }
        .aborted { margin-bottom: 2rem; }
        .controls span { margin-right: 1rem; color: var(--text-secondary); }
        .controls .disabled { text-decoration: line-through; }
    </style>
</head>
<body>
    <header>
        <h1>{{ title }}</h1>
        <p class="generated">Generated {{ generated }}</p>
    </header>

    {% macro notice_div(notice) %}
    <div id="{{ notice.target }}" class="notice notice-{{ notice.kind }}"{% if notice.line_height %} style="line-height: {{ notice.line_height }}px"{% endif %}>
        {% if notice.loader %}<span class="loader"></span>{% endif %}{{ notice.text }}
    </div>
    {% endmacro %}

    {% macro plot_div(chart, class) %}
    <div id="{{ chart.id }}" class="{{ class }}" style="{% if chart.geometry.width %}width: {{ chart.geometry.width }}px; {% endif %}{% if chart.geometry.height %}height: {{ chart.geometry.height }}px;{% endif %}"><canvas></canvas></div>
    {% endmacro %}

    {% if placeholder %}
        {{ notice_div(placeholder) }}
    {% elif kind == "changes" %}
    <div id="contentwrap">
        {% if view.table.message %}
        <p class="notice">{{ view.table.message }}</p>
        {% endif %}
        {% for table in view.table.tables %}
        <table class="tablesorter" data-lessisbetter="{{ table.lessisbetter }}">
            <thead>
                <tr>
                    {% for header in table.headers %}
                    <th{% if table.sort and table.sort.column == loop.index0 %} class="{% if table.sort.ascending %}headerSortDown{% else %}headerSortUp{% endif %}"{% endif %}>{{ header }}</th>
                    {% endfor %}
                </tr>
            </thead>
            <tbody>
                {% for row in table.rows %}
                <tr class="{{ row.stripe }}{% if row.highlight %} highlight{% endif %}">
                    {% for cell in row.cells %}
                    <td class="{{ cell.status | status_class }}">{{ cell.html | safe }}</td>
                    {% endfor %}
                </tr>
                {% endfor %}
            </tbody>
        </table>
        {% endfor %}
    </div>
    {% elif kind == "comparison" %}
    <div id="plotwrapper">
        {% if view.note %}{{ notice_div(view.note) }}{% endif %}
        {% for outcome in view.plots %}
            {% if outcome.status == "chart" %}
            {{ plot_div(outcome.plot, "plot") }}
            {% else %}
            <div id="{{ outcome.plot.id }}" class="aborted" style="border: {{ outcome.plot.border }}; padding: {{ outcome.plot.padding }}; width: {{ outcome.plot.width }}">
                <p><b>{{ outcome.plot.title }}</b></p>
                <p>{{ outcome.plot.message }}</p>
            </div>
            {% endif %}
        {% endfor %}
    </div>
    {% elif kind == "timeline" %}
    <div class="controls">
        <span{% if not view.controls.revisions_enabled %} class="disabled"{% endif %}>Revisions</span>
        <span{% if not view.controls.equidistant_enabled %} class="disabled"{% endif %}>Equidistant</span>
        {% if view.controls.median_options_visible %}<span>Quartiles</span><span>Extrema</span>{% endif %}
    </div>
    <div id="plotgrid">
        {% if view.content.kind == "message" %}
            {{ notice_div(view.content.content) }}
        {% elif view.content.kind == "grid" %}
            {% for chart in view.content.content %}{{ plot_div(chart, "miniplot") }}{% endfor %}
        {% else %}
            {{ plot_div(view.content.content, "plot") }}
        {% endif %}
    </div>
    {% endif %}

    <script>
        window.BENCHVIEW_CHARTS = {{ charts_json | safe }};

        const colors = ['#58a6ff', '#3fb950', '#f85149', '#a371f7', '#d29922', '#79c0ff'];

        function datasetFor(chart, data, index) {
            const series = chart.series[index] || {};
            const color = series.color || colors[index % colors.length];
            const horizontal = chart.bars && chart.bars.direction === 'horizontal';
            let points;
            if (chart.xAxis.renderer === 'date') {
                points = data.map(row => ({ x: row[0], y: row[1], row: row }));
            } else if (horizontal) {
                points = data.map(pair => pair[0]);
            } else {
                points = data;
            }
            return {
                label: series.label || '',
                data: points,
                borderColor: color,
                backgroundColor: color,
                borderWidth: series.lineWidth === undefined ? 2 : series.lineWidth,
                pointRadius: series.showMarker === false ? 0 : 3,
                stack: chart.stackSeries ? 'stack' : undefined
            };
        }

        document.addEventListener('DOMContentLoaded', function() {
            window.BENCHVIEW_CHARTS.forEach(chart => {
                const element = document.getElementById(chart.id);
                if (!element) return;
                const canvas = element.querySelector('canvas');
                const isDate = chart.xAxis.renderer === 'date';
                const horizontal = chart.bars && chart.bars.direction === 'horizontal';
                const labels = horizontal ? chart.yAxis.ticks : chart.xAxis.ticks;

                new Chart(canvas, {
                    type: chart.bars ? 'bar' : 'line',
                    data: {
                        labels: isDate ? undefined : labels,
                        datasets: chart.data.map((data, index) => datasetFor(chart, data, index))
                    },
                    options: {
                        indexAxis: horizontal ? 'y' : 'x',
                        responsive: true,
                        maintainAspectRatio: false,
                        plugins: {
                            title: { display: chart.title !== '', text: chart.title, color: '#c9d1d9' },
                            legend: { display: !!(chart.legend && chart.legend.show), labels: { color: '#c9d1d9' } }
                        },
                        scales: {
                            x: {
                                type: isDate ? 'time' : 'category',
                                stacked: chart.stackSeries,
                                ticks: { color: '#8b949e', display: chart.xAxis.showTicks }
                            },
                            y: {
                                stacked: chart.stackSeries,
                                min: typeof chart.yAxis.min === 'number' ? chart.yAxis.min : undefined,
                                ticks: { color: '#8b949e', display: chart.yAxis.showTicks },
                                title: { display: !!chart.yAxis.label, text: chart.yAxis.label, color: '#8b949e' }
                            }
                        }
                    }
                });
            });
        });
    </script>
</body>
</html>
"#;

/// A controller view that can be rendered into a page
pub trait PageView: Serialize {
    /// Section of the template that draws this view
    const KIND: &'static str;

    fn title(&self) -> String;

    /// Charts the page script has to draw
    fn charts(&self) -> Vec<&ChartConfig>;
}

impl PageView for ChangeView {
    const KIND: &'static str = "changes";

    fn title(&self) -> String {
        format!("Changes at revision {}", self.selection.revision)
    }

    fn charts(&self) -> Vec<&ChartConfig> {
        Vec::new()
    }
}

impl PageView for ComparisonView {
    const KIND: &'static str = "comparison";

    fn title(&self) -> String {
        "Comparison".to_string()
    }

    fn charts(&self) -> Vec<&ChartConfig> {
        self.plots
            .iter()
            .filter_map(|outcome| match outcome {
                PlotOutcome::Chart(chart) => Some(chart),
                PlotOutcome::Aborted(_) => None,
            })
            .collect()
    }
}

impl PageView for TimelineView {
    const KIND: &'static str = "timeline";

    fn title(&self) -> String {
        match &self.content {
            TimelineContent::Single(chart) => format!("Timeline: {}", chart.title),
            _ => "Timeline".to_string(),
        }
    }

    fn charts(&self) -> Vec<&ChartConfig> {
        match &self.content {
            TimelineContent::Message(_) => Vec::new(),
            TimelineContent::Grid(charts) => charts.iter().collect(),
            TimelineContent::Single(chart) => vec![chart],
        }
    }
}

/// CSS class of a colored table cell
fn status_class(status: Option<Status>) -> &'static str {
    status.map(Status::css_class).unwrap_or("")
}

/// Generate the HTML page for a finished session
pub fn render_page<V: PageView>(page: &Page<V>) -> Result<String> {
    let mut env = Environment::new();
    env.add_filter("status_class", |status: Option<String>| {
        let status = match status.as_deref() {
            Some("regression") => Some(Status::Regression),
            Some("improvement") => Some(Status::Improvement),
            Some("neutral") => Some(Status::Neutral),
            _ => None,
        };
        status_class(status).to_string()
    });
    // The .html name turns on auto-escaping
    env.add_template("page.html", PAGE_TEMPLATE)?;

    let template = env.get_template("page.html")?;

    // Without a view, the last notice stands in for the content
    let placeholder = match page.view {
        Some(_) => None,
        None => page.last_notice(),
    };
    let title = page
        .view
        .as_ref()
        .map(PageView::title)
        .unwrap_or_else(|| "benchview".to_string());
    let charts = page.view.as_ref().map(PageView::charts).unwrap_or_default();
    let charts_json = serde_json::to_string(&charts)?;

    let html = template.render(context! {
        title => title,
        kind => V::KIND,
        generated => Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        view => &page.view,
        placeholder => placeholder,
        charts_json => charts_json,
    })?;

    Ok(html)
}

/// Write a rendered page, creating parent directories as needed
pub fn write_page(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::FileWriteError {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    std::fs::write(path, content).map_err(|e| Error::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}
