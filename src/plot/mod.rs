//! Plot builders.
//!
//! Each builder is a pure function from input arrays plus options to a
//! [`Figure`]. When `output` is set the figure is also written to disk
//! before it is returned.

use std::collections::HashSet;
use std::ops::Range;
use std::path::PathBuf;

use crate::classify::{indices_of, Category, CategoryCounts, Thresholds};
use crate::color::{color_list, gray, Palette, Rgb, BLACK};
use crate::config::StyleConfig;
use crate::data::dataset::Dataset;
use crate::error::{PlotError, Result};
use crate::figure::{check_range, Figure, Marker, Series};

pub mod density;
pub mod ma;
pub mod swatch;
pub mod volcano;

pub use density::{density_plot, DensityOptions};
pub use ma::ma_plot;
pub use swatch::palette_swatch;
pub use volcano::volcano_plot;

// ---------------------------------------------------------------------------
// Highlights
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum HighlightSelection {
    /// Records whose label is in the list.
    Ids(Vec<String>),
    /// Explicit records, independent of the plotted dataset.
    Points(Dataset),
}

/// A named group of records drawn on top of the category layers.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub selection: HighlightSelection,
    /// Legend label; defaults to `Series #<index>`.
    pub label: Option<String>,
    /// Defaults to the next colour of the highlight palette.
    pub color: Option<Rgb>,
    pub alpha: Option<f32>,
    pub marker: Option<Marker>,
}

impl Highlight {
    pub fn ids<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> Self {
        Self::new(HighlightSelection::Ids(ids.into_iter().map(Into::into).collect()))
    }

    pub fn points(dataset: Dataset) -> Self {
        Self::new(HighlightSelection::Points(dataset))
    }

    fn new(selection: HighlightSelection) -> Self {
        Self {
            selection,
            label: None,
            color: None,
            alpha: None,
            marker: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = Some(alpha);
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }
}

/// A highlight with every default filled in.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedHighlight {
    pub label: String,
    pub color: Rgb,
    pub alpha: f32,
    pub marker: Marker,
    pub dataset: Dataset,
}

/// Fill in defaults and select records; empty groups are skipped.
pub(crate) fn resolve_highlights(
    highlights: &[Highlight],
    dataset: &Dataset,
    palette: Palette,
    default_alpha: f32,
    default_marker: Marker,
) -> Result<Vec<ResolvedHighlight>> {
    let colors = color_list(highlights.len(), 1.0, palette);
    let mut resolved = Vec::with_capacity(highlights.len());

    for (i, h) in highlights.iter().enumerate() {
        let subset = match &h.selection {
            HighlightSelection::Ids(ids) => {
                let labels = dataset.labels().ok_or_else(|| {
                    PlotError::invalid("highlighting by id needs labelled records")
                })?;
                let wanted: HashSet<&str> = ids.iter().map(|s| s.as_str()).collect();
                let indices: Vec<usize> = labels
                    .iter()
                    .enumerate()
                    .filter(|(_, l)| wanted.contains(l.as_str()))
                    .map(|(i, _)| i)
                    .collect();
                dataset.subset(&indices)
            }
            HighlightSelection::Points(points) => Some(points.clone()),
        };
        let Some(subset) = subset else {
            log::warn!("Highlight series #{i} is empty, skipping");
            continue;
        };

        let name = h.label.clone().unwrap_or_else(|| format!("Series #{i}"));
        let alpha = h.alpha.unwrap_or(default_alpha);
        check_alpha(alpha)?;
        resolved.push(ResolvedHighlight {
            label: format!("{name}  n={}", subset.len()),
            color: h.color.unwrap_or(colors[i]),
            alpha,
            marker: h.marker.unwrap_or(default_marker),
            dataset: subset,
        });
    }
    Ok(resolved)
}

// ---------------------------------------------------------------------------
// Scatter plot options (volcano and MA)
// ---------------------------------------------------------------------------

/// Options shared by the volcano and MA plots.
#[derive(Debug, Clone)]
pub struct PlotOptions {
    pub thresholds: Thresholds,
    pub up_color: Rgb,
    pub down_color: Rgb,
    pub not_significant_color: Rgb,
    pub marker: Marker,
    pub alpha: f32,
    pub highlights: Vec<Highlight>,
    pub highlight_palette: Palette,
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_range: Option<Range<f64>>,
    pub y_range: Option<Range<f64>>,
    pub style: StyleConfig,
    /// Write the figure here (`.png` or `.svg`).
    pub output: Option<PathBuf>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            up_color: gray(0.5),
            down_color: gray(0.7),
            not_significant_color: gray(0.9),
            marker: Marker::Circle,
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

impl PlotOptions {
    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        self.style.validate()?;
        check_alpha(self.alpha)?;
        if let Some(r) = &self.x_range {
            check_range("x", r)?;
        }
        if let Some(r) = &self.y_range {
            check_range("y", r)?;
        }
        Ok(())
    }

    pub fn category_color(&self, category: Category) -> Rgb {
        match category {
            Category::Upregulated => self.up_color,
            Category::Downregulated => self.down_color,
            Category::NotSignificant => self.not_significant_color,
        }
    }
}

pub(crate) fn check_alpha(alpha: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&alpha) {
        return Err(PlotError::invalid(format!("alpha must be within 0..1, got {alpha}")));
    }
    Ok(())
}

/// Category layers, drawn not significant first so significant points stay
/// on top.
pub(crate) fn push_category_layers(
    figure: &mut Figure,
    xs: &[f64],
    ys: &[f64],
    categories: &[Category],
    options: &PlotOptions,
) {
    let counts = CategoryCounts::tally(categories);
    for category in [
        Category::NotSignificant,
        Category::Downregulated,
        Category::Upregulated,
    ] {
        let points = indices_of(categories, category)
            .into_iter()
            .map(|i| (xs[i], ys[i]))
            .collect();
        let label = format!("{}  n={}", category.title(), counts.get(category));
        figure.push_series(
            Series::scatter(label, options.category_color(category), points)
                .with_alpha(options.alpha)
                .with_marker(options.marker, options.style.marker_size),
        );
    }
    log::debug!(
        "{}: {} up, {} down, {} not significant",
        figure.title,
        counts.up,
        counts.down,
        counts.not_significant
    );
}

/// Write the figure when an output path is configured.
pub(crate) fn finish(figure: Figure, output: Option<&PathBuf>) -> Result<Figure> {
    if let Some(path) = output {
        figure.save(path)?;
    }
    Ok(figure)
}

/// Colour for the main density curve.
pub(crate) const DENSITY_COLOR: Rgb = BLACK;

#[cfg(test)]
mod tests {
    use super::*;

    fn labelled() -> Dataset {
        Dataset::new(vec![1.0, 2.0, 3.0], vec![0.1, 0.2, 0.3])
            .unwrap()
            .with_labels(vec!["a".into(), "b".into(), "c".into()])
            .unwrap()
    }

    #[test]
    fn test_resolve_by_ids_with_defaults() {
        let hl = vec![Highlight::ids(["a", "c"]), Highlight::ids(["b"]).with_label("mine")];
        let resolved = resolve_highlights(&hl, &labelled(), Palette::Set1, 1.0, Marker::Circle).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].label, "Series #0  n=2");
        assert_eq!(resolved[1].label, "mine  n=1");
        assert_ne!(resolved[0].color, resolved[1].color);
        assert_eq!(resolved[0].dataset.effect(), &[1.0, 3.0]);
    }

    #[test]
    fn test_empty_highlight_skipped() {
        let hl = vec![Highlight::ids(["zzz"]), Highlight::ids(["a"])];
        let resolved = resolve_highlights(&hl, &labelled(), Palette::Set1, 1.0, Marker::Circle).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].label, "Series #1  n=1");
    }

    #[test]
    fn test_ids_need_labels() {
        let ds = Dataset::new(vec![1.0], vec![0.1]).unwrap();
        let err = resolve_highlights(&[Highlight::ids(["a"])], &ds, Palette::Set1, 1.0, Marker::Circle)
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_explicit_color_and_points() {
        let pts = Dataset::new(vec![9.0], vec![0.5]).unwrap();
        let hl = vec![Highlight::points(pts)
            .with_color(BLACK)
            .with_alpha(0.5)
            .with_marker(Marker::Triangle)];
        let resolved = resolve_highlights(&hl, &labelled(), Palette::Brg, 1.0, Marker::Circle).unwrap();
        assert_eq!(resolved[0].color, BLACK);
        assert_eq!(resolved[0].alpha, 0.5);
        assert_eq!(resolved[0].marker, Marker::Triangle);
        assert_eq!(resolved[0].dataset.effect(), &[9.0]);
    }

    #[test]
    fn test_options_validate() {
        assert!(PlotOptions::default().validate().is_ok());
        let bad = PlotOptions {
            alpha: 1.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = PlotOptions {
            x_range: Some(2.0..1.0),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
