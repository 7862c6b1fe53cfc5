use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use plotly::common::{Mode, Title};
use plotly::layout::Axis;
use plotly::{Layout, Plot, Scatter};
use tracing::debug;

use crate::data::names::NameTable;
use crate::data::store::{DataStore, Metric, MetricSeries};

/// Chart output boundary. The interactive loop only talks to this trait so
/// tests can substitute a recording stub for the real plotly renderer.
pub trait ChartRenderer {
    fn render_single(&mut self, series: &MetricSeries, label: &str) -> Result<()>;

    fn render_overlay(
        &mut self,
        store: &DataStore,
        metric: Metric,
        names: &NameTable,
        exclude: &HashSet<String>,
    ) -> Result<()>;
}

/// One series per included hotkey, ordered by resolved name, hotkeys without
/// any rows dropped. This is the data the overlay chart draws.
pub fn overlay_series(
    store: &DataStore,
    metric: Metric,
    names: &NameTable,
    exclude: &HashSet<String>,
) -> Vec<MetricSeries> {
    let mut hotkeys = store.distinct_hotkeys();
    hotkeys.sort_by(|a, b| names.sort_name(a).cmp(names.sort_name(b)));
    hotkeys
        .iter()
        .filter(|h| !exclude.contains(*h))
        .map(|h| store.series(h, metric))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Renders charts as self-contained html files under `out_dir`.
pub struct HtmlChartRenderer {
    out_dir: PathBuf,
}

impl HtmlChartRenderer {
    pub fn new(out_dir: PathBuf) -> Self {
        HtmlChartRenderer { out_dir }
    }

    fn write_chart(&self, plot: &Plot, title: &str, file_name: &str) -> Result<PathBuf> {
        let html = format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="https://cdn.plot.ly/plotly-latest.min.js"></script>
</head>
<body>
{plot}
</body>
</html>
"#,
            title = title,
            plot = plot.to_inline_html(None)
        );
        fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("failed to create {}", self.out_dir.display()))?;
        let path = self.out_dir.join(file_name);
        fs::write(&path, html).with_context(|| format!("failed to write {}", path.display()))?;
        debug!(path = %path.display(), "wrote chart");
        Ok(path)
    }
}

impl ChartRenderer for HtmlChartRenderer {
    fn render_single(&mut self, series: &MetricSeries, label: &str) -> Result<()> {
        let metric = series.metric;
        let title = format!("{} over time for {}", metric.label(), label);
        let mut plot = Plot::new();
        let scatter = Scatter::new(timestamp_labels(series), series.values.clone())
            .mode(Mode::LinesMarkers)
            .name(label);
        plot.add_trace(scatter);
        plot.set_layout(time_axis_layout(&title, metric.label()));

        let file_name = format!("{}_{}.html", metric.column(), file_stem(&series.hotkey));
        let path = self.write_chart(&plot, &title, &file_name)?;
        println!("Wrote chart to {}", path.display());
        Ok(())
    }

    fn render_overlay(
        &mut self,
        store: &DataStore,
        metric: Metric,
        names: &NameTable,
        exclude: &HashSet<String>,
    ) -> Result<()> {
        let title = format!("{} over time for all hotkeys", metric.label());
        let mut plot = Plot::new();
        for series in overlay_series(store, metric, names, exclude) {
            let scatter = Scatter::new(timestamp_labels(&series), series.values.clone())
                .mode(Mode::LinesMarkers)
                .name(names.sort_name(&series.hotkey));
            plot.add_trace(scatter);
        }
        plot.set_layout(time_axis_layout(&title, metric.label()));

        let file_name = format!("{}_all_hotkeys.html", metric.column());
        let path = self.write_chart(&plot, &title, &file_name)?;
        println!("Wrote chart to {}", path.display());
        Ok(())
    }
}

// Datetime strings on the x axis; plotly treats them as a time axis.
fn timestamp_labels(series: &MetricSeries) -> Vec<String> {
    series
        .timestamps
        .iter()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .collect()
}

fn time_axis_layout(title: &str, y_label: &str) -> Layout {
    Layout::new()
        .title(Title::new(title))
        .x_axis(
            Axis::new()
                .title(Title::new("Time"))
                .tick_angle(45.0)
                .show_grid(true),
        )
        .y_axis(Axis::new().title(Title::new(y_label)).show_grid(true))
}

fn file_stem(hotkey: &str) -> String {
    hotkey
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
