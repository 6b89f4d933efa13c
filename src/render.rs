use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::OnceLock;

use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{register_font, FontStyle};

use crate::color::Rgb;
use crate::error::{PlotError, Result};
use crate::figure::{Figure, Marker, SeriesKind};

// ---------------------------------------------------------------------------
// Output formats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Svg,
}

impl OutputFormat {
    /// Pick the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "png" => Ok(OutputFormat::Png),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(PlotError::render(format!(
                "unsupported output extension: .{other} (expected .png or .svg)"
            ))),
        }
    }
}

/// Render `figure` and write it to `path`.
///
/// The image is built in memory and moved into place with a rename, so on
/// any failure `path` is left untouched.
pub fn save(figure: &Figure, path: &Path) -> Result<()> {
    let bytes = match OutputFormat::from_path(path)? {
        OutputFormat::Png => to_png(figure)?,
        OutputFormat::Svg => to_svg(figure)?.into_bytes(),
    };
    write_atomic(path, &bytes)?;
    log::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Encode the figure as PNG.
pub fn to_png(figure: &Figure) -> Result<Vec<u8>> {
    figure.style.validate()?;
    let (w, h) = (figure.style.width, figure.style.height);
    let len = (w as usize)
        .checked_mul(h as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| PlotError::invalid(format!("canvas {w}x{h} is too large")))?;
    let mut buffer = vec![0u8; len];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (w, h)).into_drawing_area();
        draw(&root, figure)?;
        root.present().map_err(backend_error)?;
    }
    let image = RgbImage::from_raw(w, h, buffer)
        .ok_or_else(|| PlotError::render("bitmap buffer does not match canvas size"))?;
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| PlotError::render(format!("encoding PNG: {e}")))?;
    Ok(out.into_inner())
}

/// Encode the figure as an SVG document.
pub fn to_svg(figure: &Figure) -> Result<String> {
    let (w, h) = (figure.style.width, figure.style.height);
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (w, h)).into_drawing_area();
        draw(&root, figure)?;
        root.present().map_err(backend_error)?;
    }
    Ok(svg)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::Builder::new()
        .prefix(".rusty-bioplot-")
        .tempfile_in(dir)
        .map_err(|e| {
            PlotError::render(format!("cannot write into {}: {e}", dir.display()))
        })?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.as_file().sync_all())
        .map_err(|e| PlotError::render(format!("writing image data: {e}")))?;
    tmp.persist(path)
        .map_err(|e| PlotError::render(format!("writing {}: {}", path.display(), e.error)))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

fn backend_error<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::render(e.to_string())
}

fn to_plotters(c: Rgb) -> RGBColor {
    RGBColor(c.red, c.green, c.blue)
}

/// Register the bundled Ubuntu font as `sans-serif`; chart text uses no
/// system fonts.
fn register_chart_font() -> Result<()> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED.get_or_init(|| {
        register_font(
            "sans-serif",
            FontStyle::Normal,
            epaint_default_fonts::UBUNTU_LIGHT,
        )
        .is_ok()
    });
    if ok {
        Ok(())
    } else {
        Err(PlotError::render("bundled chart font could not be loaded"))
    }
}

fn draw<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, figure: &Figure) -> Result<()> {
    figure.style.validate()?;
    register_chart_font()?;
    let background = to_plotters(figure.style.background_rgb()?);
    let grid = to_plotters(figure.style.grid_rgb()?);

    root.fill(&background).map_err(backend_error)?;

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .caption(&figure.title, ("sans-serif", 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(figure.x_range.clone(), figure.y_range.clone())
        .map_err(backend_error)?;

    chart
        .configure_mesh()
        .x_desc(figure.x_label.as_str())
        .y_desc(figure.y_label.as_str())
        .light_line_style(grid.mix(0.25).stroke_width(1))
        .bold_line_style(grid.mix(0.6).stroke_width(1))
        .draw()
        .map_err(backend_error)?;

    let mut has_legend = false;
    for series in &figure.series {
        let color = to_plotters(series.color).mix(series.alpha as f64);
        let points = series.points.iter().copied();
        let anno = match series.kind {
            SeriesKind::Scatter { marker, size } => {
                let s = size as i32;
                match marker {
                    Marker::Circle => {
                        chart.draw_series(points.map(|p| Circle::new(p, s, color.filled())))
                    }
                    Marker::Square => chart.draw_series(points.map(|p| {
                        EmptyElement::at(p) + Rectangle::new([(-s, -s), (s, s)], color.filled())
                    })),
                    Marker::Triangle => chart
                        .draw_series(points.map(|p| TriangleMarker::new(p, s, color.filled()))),
                    Marker::Cross => chart
                        .draw_series(points.map(|p| Cross::new(p, s, color.stroke_width(2)))),
                }
            }
            SeriesKind::Line { width } => {
                chart.draw_series(LineSeries::new(points, color.stroke_width(width)))
            }
        }
        .map_err(backend_error)?;

        if let Some(label) = &series.label {
            anno.label(label.as_str())
                .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
            has_legend = true;
        }
    }

    for guide in &figure.guides {
        let style = to_plotters(guide.color)
            .mix(guide.alpha as f64)
            .stroke_width(guide.width);
        let segments = guide.segments(&figure.x_range, &figure.y_range);
        chart
            .draw_series(
                segments
                    .into_iter()
                    .map(|[a, b]| PathElement::new(vec![a, b], style)),
            )
            .map_err(backend_error)?;
    }

    if has_legend {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(background.mix(0.8).filled())
            .border_style(BLACK.stroke_width(1))
            .draw()
            .map_err(backend_error)?;
    }

    log::debug!(
        "Drew '{}' with {} series and {} guides",
        figure.title,
        figure.series.len(),
        figure.guides.len()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::gray;
    use crate::figure::{GuideLine, LineDash, Series};

    fn sample_figure() -> Figure {
        let mut fig = Figure::new("Test", -3.0..3.0, 0.0..4.0)
            .unwrap()
            .with_labels("x", "y");
        fig.push_series(Series::scatter(
            "points",
            gray(0.5),
            vec![(-1.0, 1.0), (0.5, 2.0), (2.0, 3.5)],
        ));
        fig.push_series(
            Series::scatter("squares", gray(0.2), vec![(1.0, 1.0)]).with_marker(Marker::Square, 4),
        );
        fig.push_series(Series::line("curve", gray(0.1), vec![(-3.0, 0.0), (3.0, 4.0)]));
        fig.push_guide(GuideLine::horizontal(1.3, gray(0.6), LineDash::Dotted));
        fig
    }

    #[test]
    fn test_output_format_from_path() {
        assert_eq!(OutputFormat::from_path(Path::new("a/b.PNG")).unwrap(), OutputFormat::Png);
        assert_eq!(OutputFormat::from_path(Path::new("b.svg")).unwrap(), OutputFormat::Svg);
        assert!(OutputFormat::from_path(Path::new("b.pdf")).unwrap_err().is_render());
        assert!(OutputFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_svg_contains_document() {
        let svg = to_svg(&sample_figure()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("</svg>"));
    }

    #[test]
    fn test_png_has_signature() {
        let png = to_png(&sample_figure()).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["plot.png", "plot.svg"] {
            let path = dir.path().join(name);
            sample_figure().save(&path).unwrap();
            assert!(path.metadata().unwrap().len() > 0);
        }
    }

    #[test]
    fn test_unwritable_path_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("plot.png");
        let err = sample_figure().save(&path).unwrap_err();
        assert!(err.is_render());
        assert!(!path.exists());
        assert!(!dir.path().join("missing").exists());
    }

    #[test]
    fn test_directory_target_leaves_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("taken.svg");
        std::fs::create_dir(&target).unwrap();
        let err = sample_figure().save(&target).unwrap_err();
        assert!(err.is_render());
        assert!(target.is_dir());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_unsupported_extension_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plot.gif");
        assert!(sample_figure().save(&path).unwrap_err().is_render());
        assert!(!path.exists());
    }

    #[test]
    fn test_oversized_canvas_is_invalid() {
        let mut fig = sample_figure();
        fig.style.width = u32::MAX;
        fig.style.height = u32::MAX;
        assert!(to_png(&fig).unwrap_err().is_invalid_input());
        assert!(to_svg(&fig).unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_legend_text_is_measured() {
        register_chart_font().unwrap();
        let label = "Not significant  n=12345";
        let (w, h) = ("sans-serif", 14).into_font().box_size(label).unwrap();
        assert!(w as usize > label.len() * 4);
        assert!(h > 0);
    }

    #[test]
    fn test_svg_carries_labels() {
        let svg = to_svg(&sample_figure()).unwrap();
        for text in ["Test", "points", "squares", "curve"] {
            assert!(svg.contains(&format!(">{text}<")), "missing {text}");
        }
    }

    #[test]
    fn test_png_draws_text() {
        let titled = to_png(&sample_figure()).unwrap();
        let mut plain = sample_figure();
        plain.title = "A different title".to_string();
        assert_ne!(titled, to_png(&plain).unwrap());
    }
}
