use eframe::egui::{Color32, Ui};
use egui_plot::{HLine, Legend, Line, LineStyle, MarkerShape, Plot, PlotPoints, Points, VLine};

use rusty_bioplot::color::Rgb;
use rusty_bioplot::figure::{GuideAxis, GuideLine, LineDash, Marker, SeriesKind};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Figure plot (central panel)
// ---------------------------------------------------------------------------

pub fn color32(color: Rgb, alpha: f32) -> Color32 {
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgba_unmultiplied(color.red, color.green, color.blue, a)
}

fn marker_shape(marker: Marker) -> MarkerShape {
    match marker {
        Marker::Circle => MarkerShape::Circle,
        Marker::Square => MarkerShape::Square,
        Marker::Triangle => MarkerShape::Up,
        Marker::Cross => MarkerShape::Cross,
    }
}

fn line_style(dash: LineDash) -> LineStyle {
    match dash {
        LineDash::Solid => LineStyle::Solid,
        LineDash::Dashed => LineStyle::Dashed { length: 10.0 },
        LineDash::Dotted => LineStyle::Dotted { spacing: 6.0 },
    }
}

fn guide_color(guide: &GuideLine) -> Color32 {
    color32(guide.color, guide.alpha)
}

/// Render the current figure in the central panel.
pub fn figure_plot(ui: &mut Ui, state: &AppState) {
    let figure = match &state.figure {
        Some(fig) => fig,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                let text = match &state.table {
                    Some(_) => "Choose columns to draw a plot",
                    None => "Open a results table to start  (File → Open…)",
                };
                ui.heading(text);
            });
            return;
        }
    };

    ui.vertical_centered(|ui: &mut Ui| {
        ui.strong(&figure.title);
    });

    Plot::new("figure_plot")
        .legend(Legend::default())
        .x_axis_label(figure.x_label.clone())
        .y_axis_label(figure.y_label.clone())
        .include_x(figure.x_range.start)
        .include_x(figure.x_range.end)
        .include_y(figure.y_range.start)
        .include_y(figure.y_range.end)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for series in &figure.series {
                let points: PlotPoints = series.points.iter().map(|&(x, y)| [x, y]).collect();
                let color = color32(series.color, series.alpha);
                let name = series.label.clone().unwrap_or_default();

                match series.kind {
                    SeriesKind::Scatter { marker, size } => {
                        plot_ui.points(
                            Points::new(points)
                                .name(name)
                                .color(color)
                                .shape(marker_shape(marker))
                                .filled(true)
                                .radius(size as f32),
                        );
                    }
                    SeriesKind::Line { width } => {
                        plot_ui.line(Line::new(points).name(name).color(color).width(width as f32));
                    }
                }
            }

            for guide in &figure.guides {
                let style = line_style(guide.dash);
                let width = guide.width as f32;
                match guide.at {
                    GuideAxis::Horizontal(y) => plot_ui.hline(
                        HLine::new(y)
                            .color(guide_color(guide))
                            .width(width)
                            .style(style),
                    ),
                    GuideAxis::Vertical(x) => plot_ui.vline(
                        VLine::new(x)
                            .color(guide_color(guide))
                            .width(width)
                            .style(style),
                    ),
                }
            }
        });
}
