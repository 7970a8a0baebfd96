//! Chart rendering using Plotters

use crate::chart::{ChartKind, ChartSpec};
use anyhow::Context;
use plotters::element::Pie;
use plotters::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Color palette for series and pie slices
const PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

fn palette(index: usize) -> RGBColor {
    PALETTE[index % PALETTE.len()]
}

/// Render a chart to `<out_dir>/<slug>.png`, creating `out_dir` if needed
///
/// # Returns
/// * Path of the written image
pub fn render(spec: &ChartSpec, out_dir: &Path) -> crate::Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create chart directory {}", out_dir.display()))?;
    let path = chart_path(spec, out_dir);

    match spec.kind {
        ChartKind::Bar | ChartKind::GroupedBar => draw_bars(spec, &path),
        ChartKind::Line => draw_line(spec, &path),
        ChartKind::Pie => draw_pie(spec, &path),
    }
    .with_context(|| format!("failed to render chart '{}'", spec.title))?;

    info!(path = %path.display(), "chart saved");
    Ok(path)
}

/// Output file for a chart
pub fn chart_path(spec: &ChartSpec, out_dir: &Path) -> PathBuf {
    out_dir.join(format!("{}.png", spec.slug))
}

/// Label for an x position: the category whose bar is centred there
fn category_at(categories: &[String], x: f64) -> String {
    let index = x.round();
    if (x - index).abs() > 1e-6 || index < 0.0 {
        return String::new();
    }
    categories.get(index as usize).cloned().unwrap_or_default()
}

fn draw_bars(spec: &ChartSpec, path: &Path) -> crate::Result<()> {
    let n = spec.categories.len().max(1);
    let y_max = spec.max_value().max(1.0) * 1.1;

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)?;

    let label_for = |x: &f64| category_at(&spec.categories, *x);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&label_for)
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    let groups = spec.series.len().max(1);
    let width = 0.8 / groups as f64;
    for (s, series) in spec.series.iter().enumerate() {
        let color = palette(s);
        let offset = -0.4 + s as f64 * width;
        let bars = series.values.iter().enumerate().map(move |(i, &value)| {
            let left = i as f64 + offset;
            Rectangle::new([(left, 0.0), (left + width, value)], color.filled())
        });

        let drawn = chart.draw_series(bars)?;
        if spec.series.len() > 1 {
            drawn
                .label(series.name.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
    }

    if spec.series.len() > 1 {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    root.present()?;
    Ok(())
}

fn draw_line(spec: &ChartSpec, path: &Path) -> crate::Result<()> {
    let n = spec.categories.len().max(1);
    let y_max = spec.max_value().max(1.0) * 1.1;

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)?;

    let label_for = |x: &f64| category_at(&spec.categories, *x);
    chart
        .configure_mesh()
        .x_labels(n)
        .x_label_formatter(&label_for)
        .x_desc(spec.x_label.as_str())
        .y_desc(spec.y_label.as_str())
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (s, series) in spec.series.iter().enumerate() {
        let color = palette(s);
        let points: Vec<(f64, f64)> = series
            .values
            .iter()
            .enumerate()
            .map(|(i, &value)| (i as f64, value))
            .collect();

        chart.draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))?;
        chart.draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))?;
    }

    root.present()?;
    Ok(())
}

fn draw_pie(spec: &ChartSpec, path: &Path) -> crate::Result<()> {
    let sizes: Vec<f64> = spec
        .series
        .first()
        .map(|s| s.values.clone())
        .unwrap_or_default();
    if sizes.len() != spec.categories.len() || sizes.iter().sum::<f64>() <= 0.0 {
        anyhow::bail!("pie chart needs one positive value per category");
    }

    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(&spec.title, ("sans-serif", 30))?;

    let (width, height) = root.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.35;
    let colors: Vec<RGBColor> = (0..sizes.len()).map(palette).collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &spec.categories);
    pie.label_style(("sans-serif", 18).into_font());
    pie.percentages(("sans-serif", 14).into_font().color(&WHITE));
    root.draw(&pie)?;

    root.present()?;
    debug!(slices = sizes.len(), "pie drawn");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::DataSeries;
    use tempfile::tempdir;

    fn categories(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_category_at() {
        let labels = categories(&["Spring", "Summer"]);
        assert_eq!(category_at(&labels, 0.0), "Spring");
        assert_eq!(category_at(&labels, 1.0), "Summer");
        assert_eq!(category_at(&labels, 0.5), "");
        assert_eq!(category_at(&labels, 2.0), "");
        assert_eq!(category_at(&labels, -1.0), "");
    }

    #[test]
    fn test_chart_path_uses_slug() {
        let spec = ChartSpec::bar("age_loyalty", "Loyalty", Vec::new(), Vec::new());
        let path = chart_path(&spec, Path::new("charts"));
        assert_eq!(path, Path::new("charts").join("age_loyalty.png"));
    }

    #[test]
    fn test_pie_rejects_empty_values() {
        let temp_dir = tempdir().unwrap();
        let spec = ChartSpec::pie("seasons", "Seasons", categories(&["Spring"]), vec![0.0]);
        assert!(render(&spec, temp_dir.path()).is_err());
    }

    #[test]
    #[ignore = "needs system fonts"]
    fn test_render_every_kind() {
        let temp_dir = tempdir().unwrap();
        let labels = categories(&["Spring", "Summer", "Autumn", "Winter"]);
        let specs = [
            ChartSpec::bar("bar", "Bar", labels.clone(), vec![1.0, 2.0, 3.0, 4.0]),
            ChartSpec::grouped_bar("grouped", "Grouped", labels.clone())
                .with_series(DataSeries::new("Female", vec![1.0, 2.0, 3.0, 4.0]))
                .with_series(DataSeries::new("Male", vec![4.0, 3.0, 2.0, 1.0])),
            ChartSpec::line("line", "Line", labels.clone(), vec![3.0, 1.0, 4.0, 1.0]),
            ChartSpec::pie("pie", "Pie", labels, vec![10.0, 20.0, 30.0, 40.0]),
        ];

        for spec in &specs {
            let path = render(spec, temp_dir.path()).unwrap();
            assert!(path.exists());
        }
    }
}
