use std::fmt;
use std::ops::Range;
use std::path::Path;
use std::str::FromStr;

use crate::color::Rgb;
use crate::config::StyleConfig;
use crate::error::{PlotError, Result};

// ---------------------------------------------------------------------------
// Figure – backend-agnostic plot description
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Marker {
    #[default]
    Circle,
    Square,
    Triangle,
    Cross,
}

impl FromStr for Marker {
    type Err = PlotError;

    /// Accepts the names as well as the matplotlib symbols `o s ^ x`.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "circle" | "o" => Ok(Marker::Circle),
            "square" | "s" => Ok(Marker::Square),
            "triangle" | "^" => Ok(Marker::Triangle),
            "cross" | "x" => Ok(Marker::Cross),
            other => Err(PlotError::invalid(format!("unknown marker '{other}'"))),
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Marker::Circle => "circle",
            Marker::Square => "square",
            Marker::Triangle => "triangle",
            Marker::Cross => "cross",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineDash {
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeriesKind {
    Scatter { marker: Marker, size: u32 },
    Line { width: u32 },
}

/// One drawable layer. Points are in data coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Legend entry; `None` keeps the series out of the legend.
    pub label: Option<String>,
    pub color: Rgb,
    pub alpha: f32,
    pub kind: SeriesKind,
    pub points: Vec<(f64, f64)>,
}

impl Series {
    pub fn scatter(label: impl Into<String>, color: Rgb, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: Some(label.into()),
            color,
            alpha: 1.0,
            kind: SeriesKind::Scatter {
                marker: Marker::Circle,
                size: 3,
            },
            points,
        }
    }

    pub fn line(label: impl Into<String>, color: Rgb, points: Vec<(f64, f64)>) -> Self {
        Self {
            label: Some(label.into()),
            color,
            alpha: 1.0,
            kind: SeriesKind::Line { width: 2 },
            points,
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_marker(mut self, marker: Marker, size: u32) -> Self {
        self.kind = SeriesKind::Scatter { marker, size };
        self
    }

    pub fn with_width(mut self, width: u32) -> Self {
        self.kind = SeriesKind::Line { width };
        self
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GuideAxis {
    /// Horizontal line at this y.
    Horizontal(f64),
    /// Vertical line at this x.
    Vertical(f64),
}

/// Reference line spanning the whole plot area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuideLine {
    pub at: GuideAxis,
    pub color: Rgb,
    pub alpha: f32,
    pub width: u32,
    pub dash: LineDash,
}

impl GuideLine {
    pub fn horizontal(y: f64, color: Rgb, dash: LineDash) -> Self {
        Self {
            at: GuideAxis::Horizontal(y),
            color,
            alpha: 0.5,
            width: 2,
            dash,
        }
    }

    pub fn vertical(x: f64, color: Rgb, dash: LineDash) -> Self {
        Self {
            at: GuideAxis::Vertical(x),
            color,
            alpha: 0.5,
            width: 2,
            dash,
        }
    }

    /// Split the line into drawable segments across the given ranges.
    ///
    /// Backends without native dash patterns draw these segments directly.
    pub fn segments(&self, x: &Range<f64>, y: &Range<f64>) -> Vec<[(f64, f64); 2]> {
        let (span, fixed) = match self.at {
            GuideAxis::Horizontal(v) => (y.contains(&v).then_some(x), v),
            GuideAxis::Vertical(v) => (x.contains(&v).then_some(y), v),
        };
        let Some(span) = span else {
            return Vec::new();
        };

        let length = span.end - span.start;
        let (on, off) = match self.dash {
            LineDash::Solid => (length, 0.0),
            LineDash::Dashed => (length / 50.0, length / 100.0),
            LineDash::Dotted => (length / 300.0, length / 150.0),
        };

        let segment = |from: f64, to: f64| match self.at {
            GuideAxis::Horizontal(_) => [(from, fixed), (to, fixed)],
            GuideAxis::Vertical(_) => [(fixed, from), (fixed, to)],
        };

        // Dashes too small to resolve at this magnitude collapse to one line.
        let period = on + off;
        if !(on > 0.0 && period > 0.0) || span.start + on == span.start {
            return vec![segment(span.start, span.end)];
        }

        let count = (length / period).ceil() as usize;
        (0..count)
            .map(|k| span.start + k as f64 * period)
            .filter(|&from| from < span.end)
            .map(|from| segment(from, (from + on).min(span.end)))
            .collect()
    }
}

/// The plot artifact returned by every plotting function.
#[derive(Debug, Clone)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
    /// Drawn in order; later series sit on top.
    pub series: Vec<Series>,
    pub guides: Vec<GuideLine>,
    pub style: StyleConfig,
}

impl Figure {
    pub fn new(title: impl Into<String>, x_range: Range<f64>, y_range: Range<f64>) -> Result<Self> {
        check_range("x", &x_range)?;
        check_range("y", &y_range)?;
        Ok(Self {
            title: title.into(),
            x_label: String::new(),
            y_label: String::new(),
            x_range,
            y_range,
            series: Vec::new(),
            guides: Vec::new(),
            style: StyleConfig::default(),
        })
    }

    pub fn with_labels(mut self, x: impl Into<String>, y: impl Into<String>) -> Self {
        self.x_label = x.into();
        self.y_label = y.into();
        self
    }

    pub fn with_style(mut self, style: StyleConfig) -> Self {
        self.style = style;
        self
    }

    pub fn push_series(&mut self, series: Series) {
        self.series.push(series);
    }

    pub fn push_guide(&mut self, guide: GuideLine) {
        self.guides.push(guide);
    }

    /// Drop points that fall outside the axis ranges.
    pub fn clip_to_ranges(&mut self) {
        let x = self.x_range.start..=self.x_range.end;
        let y = self.y_range.start..=self.y_range.end;
        for series in &mut self.series {
            series
                .points
                .retain(|(px, py)| x.contains(px) && y.contains(py));
        }
    }

    /// Find a series by its legend label.
    pub fn series_named(&self, label: &str) -> Option<&Series> {
        self.series
            .iter()
            .find(|s| s.label.as_deref() == Some(label))
    }

    /// Render and write the figure; format follows the file extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        crate::render::save(self, path)
    }
}

pub(crate) fn check_range(axis: &str, range: &Range<f64>) -> Result<()> {
    if !range.start.is_finite() || !range.end.is_finite() || range.start >= range.end {
        return Err(PlotError::invalid(format!(
            "{axis} range {}..{} is not a finite increasing interval",
            range.start, range.end
        )));
    }
    Ok(())
}

/// Data extent padded by one unit on each side.
///
/// At large magnitudes the padding grows with the values so that the range
/// stays a proper interval.
pub(crate) fn padded_range(lo: f64, hi: f64) -> Range<f64> {
    let pad = |v: f64| (v.abs() * 1e-9).max(1.0);
    let start = (lo - pad(lo)).max(f64::MIN);
    let end = (hi + pad(hi)).min(f64::MAX);
    start..end
}
