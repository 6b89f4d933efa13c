use crate::classify::classify_all;
use crate::color::gray;
use crate::data::dataset::Dataset;
use crate::error::{PlotError, Result};
use crate::figure::{padded_range, Figure, GuideLine, LineDash, Series};
use crate::stats::finite_range;

use super::{finish, push_category_layers, resolve_highlights, PlotOptions};

/// MA plot: mean expression against effect size, coloured by significance.
///
/// The dataset (and any explicit highlight points) must carry mean
/// expression values.
pub fn ma_plot(dataset: &Dataset, options: &PlotOptions) -> Result<Figure> {
    options.validate()?;
    let thresholds = &options.thresholds;
    let xs = dataset
        .mean()
        .ok_or_else(|| PlotError::invalid("MA plot needs mean expression values"))?;
    let ys = dataset.effect();
    let categories = classify_all(dataset, thresholds);

    let (x_lo, x_hi) = finite_range(xs).unwrap_or((0.0, 0.0));
    let (y_lo, y_hi) = finite_range(ys).unwrap_or((0.0, 0.0));
    let x_range = options.x_range.clone().unwrap_or_else(|| padded_range(x_lo, x_hi));
    let y_range = options.y_range.clone().unwrap_or_else(|| padded_range(y_lo, y_hi));

    let title = options
        .title
        .clone()
        .unwrap_or_else(|| format!("MA Plot  FDR={}", thresholds.significance));
    let mut figure = Figure::new(title, x_range, y_range)?
        .with_labels(
            options.x_label.as_deref().unwrap_or("mean expression"),
            options.y_label.as_deref().unwrap_or("log2 fold change"),
        )
        .with_style(options.style.clone());

    push_category_layers(&mut figure, xs, ys, &categories, options);

    for h in resolve_highlights(
        &options.highlights,
        dataset,
        options.highlight_palette,
        options.alpha,
        options.marker,
    )? {
        let mean = h.dataset.mean().ok_or_else(|| {
            PlotError::invalid(format!("highlight '{}' has no mean expression values", h.label))
        })?;
        let points = mean
            .iter()
            .copied()
            .zip(h.dataset.effect().iter().copied())
            .collect();
        figure.push_series(
            Series::scatter(h.label, h.color, points)
                .with_alpha(h.alpha)
                .with_marker(h.marker, options.style.marker_size),
        );
    }

    figure.push_guide(GuideLine::horizontal(0.0, gray(0.4), LineDash::Dashed));
    if thresholds.effect > 0.0 {
        for y in [-thresholds.effect, thresholds.effect] {
            figure.push_guide(GuideLine::horizontal(y, gray(0.6), LineDash::Dotted));
        }
    }

    figure.clip_to_ranges();
    finish(figure, options.output.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::Highlight;
    use approx::assert_relative_eq;

    fn dataset() -> Dataset {
        Dataset::new(vec![2.0, -3.0, 0.1, -1.5], vec![0.001, 0.01, 0.5, 0.05])
            .unwrap()
            .with_mean(vec![10.0, 250.0, 40.0, 5.0])
            .unwrap()
            .with_labels(vec!["a".into(), "b".into(), "c".into(), "d".into()])
            .unwrap()
    }

    #[test]
    fn test_requires_mean() {
        let ds = Dataset::new(vec![1.0], vec![0.1]).unwrap();
        assert!(ma_plot(&ds, &PlotOptions::default()).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_axes_and_layers() {
        let fig = ma_plot(&dataset(), &PlotOptions::default()).unwrap();
        assert_eq!(fig.title, "MA Plot  FDR=0.05");
        assert_eq!(fig.x_label, "mean expression");
        assert_relative_eq!(fig.x_range.start, 4.0);
        assert_relative_eq!(fig.x_range.end, 251.0);
        assert_relative_eq!(fig.y_range.start, -4.0);
        let down = fig.series_named("Downregulated  n=1").unwrap();
        assert_eq!(down.points, vec![(250.0, -3.0)]);
        // p exactly at the cutoff stays not significant
        assert!(fig.series_named("Not significant  n=2").is_some());
    }

    #[test]
    fn test_highlight_by_id() {
        let options = PlotOptions {
            highlights: vec![Highlight::ids(["c"])],
            ..Default::default()
        };
        let fig = ma_plot(&dataset(), &options).unwrap();
        assert_eq!(fig.series.last().unwrap().points, vec![(40.0, 0.1)]);
    }

    #[test]
    fn test_explicit_points_need_mean() {
        let pts = Dataset::new(vec![1.0], vec![0.1]).unwrap();
        let options = PlotOptions {
            highlights: vec![Highlight::points(pts)],
            ..Default::default()
        };
        assert!(ma_plot(&dataset(), &options).is_err());
    }
}
