use crate::classify::classify_all;
use crate::color::gray;
use crate::data::dataset::Dataset;
use crate::error::Result;
use crate::figure::{padded_range, Figure, GuideLine, LineDash, Series};
use crate::stats::{finite_range, min_positive, neg_log10, MIN_SIGNIFICANCE};

use super::{finish, push_category_layers, resolve_highlights, PlotOptions};

/// Volcano plot: effect size against `-log10(significance)`.
///
/// Zero significance values are drawn at the top of the plot, at the height
/// of the smallest positive value.
pub fn volcano_plot(dataset: &Dataset, options: &PlotOptions) -> Result<Figure> {
    options.validate()?;
    let thresholds = &options.thresholds;

    let floor = min_positive(dataset.significance()).unwrap_or(MIN_SIGNIFICANCE);
    let to_y = |p: f64| neg_log10(p, floor);

    let xs = dataset.effect();
    let ys: Vec<f64> = dataset.significance().iter().map(|&p| to_y(p)).collect();
    let categories = classify_all(dataset, thresholds);

    // Data ranges are never empty for a validated dataset.
    let (x_lo, x_hi) = finite_range(xs).unwrap_or((0.0, 0.0));
    let (y_lo, y_hi) = finite_range(&ys).unwrap_or((0.0, 0.0));
    let x_range = options.x_range.clone().unwrap_or_else(|| padded_range(x_lo, x_hi));
    let y_range = options.y_range.clone().unwrap_or_else(|| padded_range(y_lo, y_hi));

    let title = options
        .title
        .clone()
        .unwrap_or_else(|| format!("Volcano Plot  FDR={}", thresholds.significance));
    let mut figure = Figure::new(title, x_range, y_range)?
        .with_labels(
            options.x_label.as_deref().unwrap_or("log2 fold change"),
            options.y_label.as_deref().unwrap_or("-log10 p-value"),
        )
        .with_style(options.style.clone());

    push_category_layers(&mut figure, xs, &ys, &categories, options);

    for h in resolve_highlights(
        &options.highlights,
        dataset,
        options.highlight_palette,
        options.alpha,
        options.marker,
    )? {
        let points = h
            .dataset
            .effect()
            .iter()
            .zip(h.dataset.significance())
            .map(|(&x, &p)| (x, to_y(p)))
            .collect();
        figure.push_series(
            Series::scatter(h.label, h.color, points)
                .with_alpha(h.alpha)
                .with_marker(h.marker, options.style.marker_size),
        );
    }

    figure.push_guide(GuideLine::horizontal(0.0, gray(0.4), LineDash::Dashed));
    figure.push_guide(GuideLine::vertical(0.0, gray(0.4), LineDash::Dashed));
    if thresholds.significance > 0.0 {
        figure.push_guide(GuideLine::horizontal(
            neg_log10(thresholds.significance, MIN_SIGNIFICANCE),
            gray(0.6),
            LineDash::Dotted,
        ));
    }
    if thresholds.effect > 0.0 {
        for x in [-thresholds.effect, thresholds.effect] {
            figure.push_guide(GuideLine::vertical(x, gray(0.6), LineDash::Dotted));
        }
    }

    figure.clip_to_ranges();
    finish(figure, options.output.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Thresholds;
    use crate::figure::GuideAxis;
    use crate::plot::Highlight;
    use approx::assert_relative_eq;

    fn dataset() -> Dataset {
        Dataset::new(vec![2.0, -3.0, 0.1], vec![0.001, 0.2, 0.5])
            .unwrap()
            .with_labels(vec!["BRCA1".into(), "TP53".into(), "GAPDH".into()])
            .unwrap()
    }

    #[test]
    fn test_layers_and_counts() {
        let fig = volcano_plot(&dataset(), &PlotOptions::default()).unwrap();
        assert_eq!(fig.title, "Volcano Plot  FDR=0.05");
        let up = fig.series_named("Upregulated  n=1").unwrap();
        assert_eq!(up.points.len(), 1);
        assert_relative_eq!(up.points[0].1, 3.0);
        assert!(fig.series_named("Downregulated  n=0").is_some());
        assert!(fig.series_named("Not significant  n=2").is_some());
    }

    #[test]
    fn test_default_ranges() {
        let fig = volcano_plot(&dataset(), &PlotOptions::default()).unwrap();
        assert_relative_eq!(fig.x_range.start, -4.0);
        assert_relative_eq!(fig.x_range.end, 3.0);
        assert_relative_eq!(fig.y_range.start, -0.5f64.log10() - 1.0);
        assert_relative_eq!(fig.y_range.end, 4.0);
    }

    #[test]
    fn test_threshold_guides() {
        let options = PlotOptions {
            thresholds: Thresholds::new(1.0, 0.01).unwrap(),
            ..Default::default()
        };
        let fig = volcano_plot(&dataset(), &options).unwrap();
        let horizontals: Vec<f64> = fig
            .guides
            .iter()
            .filter_map(|g| match g.at {
                GuideAxis::Horizontal(y) => Some(y),
                _ => None,
            })
            .collect();
        assert_eq!(horizontals.len(), 2);
        assert_relative_eq!(horizontals[1], 2.0);
        assert_eq!(fig.guides.len(), 5);
    }

    #[test]
    fn test_zero_pvalue_drawn_at_top() {
        let ds = Dataset::new(vec![4.0, 1.5], vec![0.0, 1e-4]).unwrap();
        let fig = volcano_plot(&ds, &PlotOptions::default()).unwrap();
        let up = fig.series_named("Upregulated  n=2").unwrap();
        assert_relative_eq!(up.points[0].1, 4.0);
        assert_relative_eq!(up.points[1].1, 4.0);
    }

    #[test]
    fn test_highlight_series_appended() {
        let options = PlotOptions {
            highlights: vec![Highlight::ids(["TP53", "GAPDH"]).with_label("tumour")],
            ..Default::default()
        };
        let fig = volcano_plot(&dataset(), &options).unwrap();
        let last = fig.series.last().unwrap();
        assert_eq!(last.label.as_deref(), Some("tumour  n=2"));
        assert_eq!(last.points.len(), 2);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = PlotOptions {
            thresholds: Thresholds {
                effect: f64::INFINITY,
                significance: 0.05,
            },
            ..Default::default()
        };
        assert!(volcano_plot(&dataset(), &options).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_output_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volcano.svg");
        let options = PlotOptions {
            output: Some(path.clone()),
            ..Default::default()
        };
        volcano_plot(&dataset(), &options).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
    }

    #[test]
    fn test_large_effects_render() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v.svg");
        let options = PlotOptions {
            output: Some(path.clone()),
            ..Default::default()
        };
        let ds = Dataset::new(vec![1e16, 1e16 + 4.0], vec![0.5, 0.01]).unwrap();
        let fig = volcano_plot(&ds, &options).unwrap();
        assert!(fig.x_range.start < 1e16 && fig.x_range.end > 1e16 + 4.0);
        assert!(path.exists());

        let ds = Dataset::new(vec![1e17, 1e17], vec![0.2, 0.3]).unwrap();
        let fig = volcano_plot(&ds, &PlotOptions::default()).unwrap();
        assert!(fig.x_range.start < fig.x_range.end);
    }

    #[test]
    fn test_unwritable_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("volcano.png");
        let options = PlotOptions {
            output: Some(path.clone()),
            ..Default::default()
        };
        assert!(volcano_plot(&dataset(), &options).unwrap_err().is_render());
        assert!(!path.exists());
    }
}
