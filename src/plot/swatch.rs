use crate::color::{color_cycle, Palette};
use crate::config::{StyleConfig, MAX_CANVAS_SIDE};
use crate::error::{PlotError, Result};
use crate::figure::{Figure, Marker, Series, SeriesKind};

/// Preview of a colour cycle: `n_values` dots coloured from a cycle of
/// `n_colors` palette colours.
pub fn palette_swatch(
    n_colors: usize,
    n_values: usize,
    gamma: f32,
    palette: Palette,
) -> Result<Figure> {
    if n_colors == 0 || n_values == 0 {
        return Err(PlotError::invalid("swatch needs at least one colour and one value"));
    }
    if !gamma.is_finite() || gamma <= 0.0 {
        return Err(PlotError::invalid(format!("gamma must be positive, got {gamma}")));
    }

    let width = u32::try_from(n_values)
        .ok()
        .and_then(|n| n.checked_mul(60))
        .and_then(|w| w.checked_add(120))
        .filter(|&w| w <= MAX_CANVAS_SIDE)
        .ok_or_else(|| {
            PlotError::invalid(format!("{n_values} values do not fit on one swatch"))
        })?;

    let title = format!("{palette}  n={n_colors}  gamma={gamma}");
    let style = StyleConfig {
        width,
        height: 160,
        marker_size: 12,
        ..StyleConfig::default()
    };
    let mut figure = Figure::new(title, -1.0..n_values as f64, -1.0..1.0)?.with_style(style);

    for (i, color) in color_cycle(n_colors, gamma, palette).take(n_values).enumerate() {
        figure.push_series(Series {
            label: None,
            color,
            alpha: 1.0,
            kind: SeriesKind::Scatter {
                marker: Marker::Circle,
                size: 12,
            },
            points: vec![(i as f64, 0.0)],
        });
    }
    Ok(figure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swatch_cycles() {
        let fig = palette_swatch(3, 7, 1.0, Palette::Brg).unwrap();
        assert_eq!(fig.series.len(), 7);
        assert_eq!(fig.series[0].color, fig.series[3].color);
        assert!(fig.series.iter().all(|s| s.label.is_none()));
        assert_eq!(fig.style.width, 60 * 7 + 120);
    }

    #[test]
    fn test_swatch_rejects_bad_input() {
        assert!(palette_swatch(0, 3, 1.0, Palette::Set1).is_err());
        assert!(palette_swatch(3, 3, 0.0, Palette::Set1).is_err());
    }

    #[test]
    fn test_swatch_too_wide_rejected() {
        let err = palette_swatch(5, 80_000_000, 1.0, Palette::Set1).unwrap_err();
        assert!(err.is_invalid_input());
        assert!(palette_swatch(5, usize::MAX, 1.0, Palette::Set1).is_err());
        let widest = (MAX_CANVAS_SIDE as usize - 120) / 60;
        assert!(palette_swatch(5, widest, 1.0, Palette::Set1).is_ok());
        assert!(palette_swatch(5, widest + 1, 1.0, Palette::Set1).is_err());
    }
}
