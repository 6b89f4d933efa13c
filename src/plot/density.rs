use std::collections::HashSet;
use std::ops::Range;
use std::path::PathBuf;

use crate::color::{color_list, gray, Palette, Rgb};
use crate::config::StyleConfig;
use crate::error::{PlotError, Result};
use crate::figure::{check_range, padded_range, Figure, GuideLine, LineDash, Series};
use crate::stats::{finite_range, gaussian_kde};

use super::{check_alpha, finish, Highlight, HighlightSelection, DENSITY_COLOR};

pub const DEFAULT_CUT: f64 = 3.0;

#[derive(Debug, Clone)]
pub struct DensityOptions {
    /// Plot the cumulative distribution instead of the density.
    pub cumulative: bool,
    /// Extend the curve this many bandwidths past the data.
    pub cut: f64,
    pub color: Rgb,
    pub alpha: f32,
    /// Explicit points contribute their effect-size values.
    pub highlights: Vec<Highlight>,
    pub highlight_palette: Palette,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_range: Option<Range<f64>>,
    pub y_range: Option<Range<f64>>,
    pub style: StyleConfig,
    pub output: Option<PathBuf>,
}

impl Default for DensityOptions {
    fn default() -> Self {
        Self {
            cumulative: false,
            cut: DEFAULT_CUT,
            color: DENSITY_COLOR,
            alpha: 1.0,
            highlights: Vec::new(),
            highlight_palette: Palette::Set1,
            title: None,
            x_label: None,
            y_label: None,
            x_range: None,
            y_range: None,
            style: StyleConfig::default(),
            output: None,
        }
    }
}

impl DensityOptions {
    pub fn validate(&self) -> Result<()> {
        self.style.validate()?;
        check_alpha(self.alpha)?;
        if !self.cut.is_finite() || self.cut < 0.0 {
            return Err(PlotError::invalid(format!(
                "cut must be a finite non-negative number, got {}",
                self.cut
            )));
        }
        if let Some(r) = &self.x_range {
            check_range("x", r)?;
        }
        if let Some(r) = &self.y_range {
            check_range("y", r)?;
        }
        Ok(())
    }
}

/// Kernel density (or cumulative distribution) of `values`.
///
/// `labels`, when given, are matched by id highlights.
pub fn density_plot(
    values: &[f64],
    labels: Option<&[String]>,
    options: &DensityOptions,
) -> Result<Figure> {
    options.validate()?;
    if values.is_empty() {
        return Err(PlotError::invalid("no values to estimate a density from"));
    }
    if let Some(i) = values.iter().position(|v| !v.is_finite()) {
        return Err(PlotError::invalid(format!(
            "values[{i}] is not a finite number ({})",
            values[i]
        )));
    }
    if let Some(labels) = labels {
        if labels.len() != values.len() {
            return Err(PlotError::invalid(format!(
                "{} labels given for {} values",
                labels.len(),
                values.len()
            )));
        }
    }

    let curve = gaussian_kde(values, options.cut, options.cumulative).ok_or_else(|| {
        PlotError::invalid("density needs at least two distinct values")
    })?;

    let (x_lo, x_hi) = finite_range(values).unwrap_or((0.0, 0.0));
    let x_range = options.x_range.clone().unwrap_or_else(|| padded_range(x_lo, x_hi));
    let peak = curve.iter().map(|p| p.1).fold(0.0, f64::max);
    let y_range = options
        .y_range
        .clone()
        .unwrap_or_else(|| -0.05..(peak * 1.05).max(1.05));

    let title = options.title.clone().unwrap_or_else(|| "Density Plot".to_string());
    let default_y = if options.cumulative {
        "cumulative density"
    } else {
        "density"
    };
    let mut figure = Figure::new(title, x_range, y_range)?
        .with_labels(
            options.x_label.as_deref().unwrap_or("value"),
            options.y_label.as_deref().unwrap_or(default_y),
        )
        .with_style(options.style.clone());

    let width = options.style.line_width;
    figure.push_series(
        Series::line(format!("All  n={}", values.len()), options.color, curve)
            .with_alpha(options.alpha)
            .with_width(width),
    );

    let colors = color_list(options.highlights.len(), 1.0, options.highlight_palette);
    for (i, h) in options.highlights.iter().enumerate() {
        let subset: Vec<f64> = match &h.selection {
            HighlightSelection::Ids(ids) => {
                let labels = labels.ok_or_else(|| {
                    PlotError::invalid("highlighting by id needs labelled values")
                })?;
                let wanted: HashSet<&str> = ids.iter().map(|s| s.as_str()).collect();
                labels
                    .iter()
                    .zip(values)
                    .filter(|(l, _)| wanted.contains(l.as_str()))
                    .map(|(_, &v)| v)
                    .collect()
            }
            HighlightSelection::Points(ds) => ds.effect().to_vec(),
        };
        let Some(curve) = gaussian_kde(&subset, options.cut, options.cumulative) else {
            log::warn!(
                "Highlight series #{i} has {} values, too few for a density; skipping",
                subset.len()
            );
            continue;
        };
        let alpha = h.alpha.unwrap_or(options.alpha);
        check_alpha(alpha)?;
        let name = h.label.clone().unwrap_or_else(|| format!("Series #{i}"));
        figure.push_series(
            Series::line(format!("{name}  n={}", subset.len()), h.color.unwrap_or(colors[i]), curve)
                .with_alpha(alpha)
                .with_width(width),
        );
    }

    if options.cumulative {
        figure.push_guide(GuideLine::horizontal(0.5, gray(0.6), LineDash::Dotted));
        figure.push_guide(GuideLine::vertical(0.0, gray(0.6), LineDash::Dotted));
    }

    figure.clip_to_ranges();
    finish(figure, options.output.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::Dataset;
    use approx::assert_relative_eq;

    const VALUES: [f64; 8] = [0.5, 1.2, 1.9, 2.4, 3.1, 3.3, 4.8, 6.0];

    #[test]
    fn test_density_curve() {
        let fig = density_plot(&VALUES, None, &DensityOptions::default()).unwrap();
        assert_eq!(fig.title, "Density Plot");
        assert_eq!(fig.y_label, "density");
        let all = fig.series_named("All  n=8").unwrap();
        assert!(all.points.len() > 100);
        assert!(fig.guides.is_empty());
        assert_relative_eq!(fig.x_range.start, -0.5);
        assert_relative_eq!(fig.y_range.start, -0.05);
    }

    #[test]
    fn test_cumulative_adds_guides() {
        let options = DensityOptions {
            cumulative: true,
            ..Default::default()
        };
        let fig = density_plot(&VALUES, None, &options).unwrap();
        assert_eq!(fig.guides.len(), 2);
        let all = &fig.series[0];
        assert!(all.points.windows(2).all(|w| w[1].1 >= w[0].1));
    }

    #[test]
    fn test_degenerate_input() {
        let opts = DensityOptions::default();
        assert!(density_plot(&[], None, &opts).unwrap_err().is_invalid_input());
        assert!(density_plot(&[1.0, 1.0], None, &opts).is_err());
        assert!(density_plot(&[1.0, f64::NAN], None, &opts).is_err());
        let labels = vec!["a".to_string()];
        assert!(density_plot(&VALUES, Some(&labels), &opts).is_err());
    }

    #[test]
    fn test_highlights() {
        let labels: Vec<String> = (0..8).map(|i| format!("g{i}")).collect();
        let options = DensityOptions {
            highlights: vec![
                Highlight::ids(["g0", "g1", "g2"]).with_label("early"),
                Highlight::ids(["g7"]),
                Highlight::points(Dataset::new(vec![1.0, 2.0, 4.0], vec![0.1, 0.1, 0.1]).unwrap()),
            ],
            ..Default::default()
        };
        let fig = density_plot(&VALUES, Some(&labels), &options).unwrap();
        // the single-value group is skipped
        assert_eq!(fig.series.len(), 3);
        assert!(fig.series_named("early  n=3").is_some());
        assert!(fig.series_named("Series #2  n=3").is_some());
    }
}
