//! Declarative chart descriptions handed from the analyses to the renderer

/// Shape of the chart to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// One bar per category
    Bar,
    /// One bar per category and series, side by side
    GroupedBar,
    /// Points joined in category order
    Line,
    /// Share of each category in the total
    Pie,
}

/// A named sequence of values, one per category
#[derive(Debug, Clone, PartialEq)]
pub struct DataSeries {
    pub name: String,
    pub values: Vec<f64>,
}

impl DataSeries {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Everything the renderer needs to draw one chart
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    /// File stem of the rendered chart
    pub slug: String,
    pub title: String,
    pub kind: ChartKind,
    pub x_label: String,
    pub y_label: String,
    pub categories: Vec<String>,
    pub series: Vec<DataSeries>,
}

impl ChartSpec {
    fn new(kind: ChartKind, slug: &str, title: impl Into<String>, categories: Vec<String>) -> Self {
        Self {
            slug: slug.to_string(),
            title: title.into(),
            kind,
            x_label: String::new(),
            y_label: String::new(),
            categories,
            series: Vec::new(),
        }
    }

    pub fn bar(slug: &str, title: impl Into<String>, categories: Vec<String>, values: Vec<f64>) -> Self {
        Self::new(ChartKind::Bar, slug, title, categories).with_series(DataSeries::new("", values))
    }

    pub fn grouped_bar(slug: &str, title: impl Into<String>, categories: Vec<String>) -> Self {
        Self::new(ChartKind::GroupedBar, slug, title, categories)
    }

    pub fn line(slug: &str, title: impl Into<String>, categories: Vec<String>, values: Vec<f64>) -> Self {
        Self::new(ChartKind::Line, slug, title, categories).with_series(DataSeries::new("", values))
    }

    pub fn pie(slug: &str, title: impl Into<String>, categories: Vec<String>, values: Vec<f64>) -> Self {
        Self::new(ChartKind::Pie, slug, title, categories).with_series(DataSeries::new("", values))
    }

    pub fn with_series(mut self, series: DataSeries) -> Self {
        self.series.push(series);
        self
    }

    pub fn with_axes(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.x_label = x_label.into();
        self.y_label = y_label.into();
        self
    }

    /// Largest value across all series, 0 for an empty chart
    pub fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let chart = ChartSpec::grouped_bar("mix", "Mix", vec!["a".into(), "b".into()])
            .with_series(DataSeries::new("one", vec![1.0, 4.0]))
            .with_series(DataSeries::new("two", vec![3.0, 2.0]))
            .with_axes("Product", "Percent");

        assert_eq!(chart.kind, ChartKind::GroupedBar);
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.x_label, "Product");
        assert_eq!(chart.max_value(), 4.0);
    }

    #[test]
    fn test_empty_chart_max_value() {
        let chart = ChartSpec::bar("empty", "Empty", Vec::new(), Vec::new());
        assert_eq!(chart.max_value(), 0.0);
    }
}
