//! Volcano, MA and density plots for differential-expression results.
//!
//! Every plotting function is a pure transformation from input arrays and
//! options to a [`Figure`]; the figure can be written as PNG or SVG, or
//! shown in the interactive viewer of the `rusty-bioplot` binary.
//!
//! ```no_run
//! use rusty_bioplot::{volcano_plot, Dataset, PlotOptions};
//!
//! let dataset = Dataset::new(vec![2.0, -3.0, 0.1], vec![0.001, 0.2, 0.5])?;
//! let options = PlotOptions {
//!     output: Some("volcano.svg".into()),
//!     ..Default::default()
//! };
//! let figure = volcano_plot(&dataset, &options)?;
//! # Ok::<(), rusty_bioplot::PlotError>(())
//! ```

pub mod classify;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod figure;
pub mod plot;
pub mod render;
pub mod stats;

pub use classify::{classify, classify_all, Category, CategoryCounts, Thresholds};
pub use color::{Palette, Rgb};
pub use config::StyleConfig;
pub use data::dataset::Dataset;
pub use error::{PlotError, Result};
pub use figure::{Figure, Marker};
pub use plot::{
    density_plot, ma_plot, palette_swatch, volcano_plot, DensityOptions, Highlight,
    HighlightSelection, PlotOptions,
};
