use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use rusty_bioplot::classify::{classify_all, Category};
use rusty_bioplot::color::ColorMap;
use rusty_bioplot::config::{load_style, StyleConfig};
use rusty_bioplot::data::loader::load_file;
use rusty_bioplot::data::model::{DatasetColumns, MetadataValue, ResultTable};
use rusty_bioplot::data::select::{matching_ids, Selection};
use rusty_bioplot::{
    density_plot, ma_plot, volcano_plot, Dataset, DensityOptions, Figure, Highlight, Palette,
    PlotOptions, Thresholds,
};

// ---------------------------------------------------------------------------
// Plot kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlotKind {
    #[default]
    Volcano,
    Ma,
    Density,
}

impl PlotKind {
    pub const ALL: [PlotKind; 3] = [PlotKind::Volcano, PlotKind::Ma, PlotKind::Density];
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlotKind::Volcano => "Volcano",
            PlotKind::Ma => "MA",
            PlotKind::Density => "Density",
        })
    }
}

/// A row of the significant-features table.
#[derive(Debug, Clone, PartialEq)]
pub struct SignificantRow {
    pub id: String,
    pub effect: f64,
    pub significance: f64,
    pub category: Category,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded table (None until user loads a file).
    pub table: Option<ResultTable>,
    pub source: Option<PathBuf>,

    pub plot_kind: PlotKind,
    pub effect_column: Option<String>,
    pub significance_column: Option<String>,
    /// Mean expression for MA plots, and the density column.
    pub mean_column: Option<String>,
    pub id_column: Option<String>,
    pub thresholds: Thresholds,
    pub cumulative: bool,

    /// Metadata column whose values can be highlighted.
    pub highlight_column: Option<String>,
    /// Selected values per highlight column.
    pub selection: Selection,
    /// Colours of the highlight column's values.
    pub color_map: Option<ColorMap>,

    pub style: StyleConfig,

    /// Figure for the current inputs (cached).
    pub figure: Option<Figure>,
    /// Significant records of the current figure, most significant first.
    pub significant: Vec<SignificantRow>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        let style = load_style(None).unwrap_or_else(|e| {
            log::warn!("Using the default style: {e}");
            StyleConfig::default()
        });
        Self {
            table: None,
            source: None,
            plot_kind: PlotKind::default(),
            effect_column: None,
            significance_column: None,
            mean_column: None,
            id_column: None,
            thresholds: Thresholds::default(),
            cumulative: false,
            highlight_column: None,
            selection: Selection::new(),
            color_map: None,
            style,
            figure: None,
            significant: Vec::new(),
            status_message: None,
        }
    }
}

/// First of `preferred` present in `columns`, else the first column.
fn pick_column(columns: &[&str], preferred: &[&str]) -> Option<String> {
    preferred
        .iter()
        .find(|p| columns.contains(*p))
        .or(columns.first())
        .map(|s| s.to_string())
}

impl AppState {
    /// Load a table from disk, reporting failures in the status line.
    pub fn open(&mut self, path: &Path) {
        match load_file(path) {
            Ok(table) => {
                log::info!(
                    "Loaded {} rows with columns {:?}",
                    table.len(),
                    table.column_names
                );
                self.source = Some(path.to_path_buf());
                self.set_table(table);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded table, guess columns and rebuild the figure.
    pub fn set_table(&mut self, table: ResultTable) {
        let numeric = table.numeric_columns();
        self.effect_column = pick_column(&numeric, &["log2_fold_change", "log2FoldChange", "logFC", "b"]);
        self.significance_column = pick_column(&numeric, &["padj", "qval", "pvalue", "pval"]);
        self.mean_column = pick_column(&numeric, &["base_mean", "baseMean", "mean_obs", "AveExpr"]);
        self.id_column = table.default_id_column().map(str::to_string);

        // Default highlight column: first text column other than the id.
        self.highlight_column = table
            .text_columns()
            .into_iter()
            .find(|c| Some(*c) != self.id_column.as_deref())
            .map(str::to_string);
        self.selection = Selection::new();
        self.rebuild_color_map(&table);

        self.table = Some(table);
        self.status_message = None;
        self.rebuild();
    }

    /// Rebuild the colour map from the current `highlight_column`.
    pub fn rebuild_color_map(&mut self, table: &ResultTable) {
        self.color_map = self.highlight_column.as_ref().and_then(|col| {
            table
                .unique_values
                .get(col)
                .map(|vals| ColorMap::new(col, vals, Palette::Set1))
        });
    }

    /// Set highlight column and rebuild the map.
    pub fn set_highlight_column(&mut self, col: String) {
        self.highlight_column = Some(col);
        if let Some(table) = self.table.take() {
            self.rebuild_color_map(&table);
            self.table = Some(table);
        }
        self.rebuild();
    }

    /// Toggle a single metadata value of the highlight column.
    pub fn toggle_highlight_value(&mut self, column: &str, value: &MetadataValue) {
        let selected = self.selection.entry(column.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
        self.rebuild();
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.selection.insert(column.to_string(), BTreeSet::new());
        self.rebuild();
    }

    /// Recompute the figure and the significant-features table.
    pub fn rebuild(&mut self) {
        let Some(table) = &self.table else {
            self.figure = None;
            self.significant.clear();
            return;
        };
        match self.build(table) {
            Ok((figure, significant)) => {
                self.figure = Some(figure);
                self.significant = significant;
                self.status_message = None;
            }
            Err(e) => {
                log::warn!("Cannot draw {} plot: {e:#}", self.plot_kind);
                self.figure = None;
                self.significant.clear();
                self.status_message = Some(format!("{e:#}"));
            }
        }
    }

    /// One highlight per selected value of the highlight column.
    fn highlights(&self, table: &ResultTable) -> Result<Vec<Highlight>> {
        let (Some(column), Some(color_map)) = (&self.highlight_column, &self.color_map) else {
            return Ok(Vec::new());
        };
        let Some(selected) = self.selection.get(column) else {
            return Ok(Vec::new());
        };
        selected
            .iter()
            .map(|value| {
                let one = BTreeSet::from([value.clone()]);
                let ids = matching_ids(table, self.id_column.as_deref(), column, &one)?;
                Ok(Highlight::ids(ids)
                    .with_label(value.to_string())
                    .with_color(color_map.color_for(value)))
            })
            .collect()
    }

    fn build(&self, table: &ResultTable) -> Result<(Figure, Vec<SignificantRow>)> {
        let highlights = self.highlights(table)?;

        if self.plot_kind == PlotKind::Density {
            let column = self.mean_column.as_deref().context("choose a column")?;
            let (values, labels) = table.labelled_values(column, self.id_column.as_deref())?;
            let options = DensityOptions {
                cumulative: self.cumulative,
                highlights,
                x_label: Some(column.to_string()),
                style: self.style.clone(),
                ..Default::default()
            };
            return Ok((density_plot(&values, Some(&labels), &options)?, Vec::new()));
        }

        let columns = DatasetColumns {
            effect: self.effect_column.clone().context("choose an effect-size column")?,
            significance: self
                .significance_column
                .clone()
                .context("choose a significance column")?,
            mean: match self.plot_kind {
                PlotKind::Ma => Some(self.mean_column.clone().context("choose a mean column")?),
                _ => None,
            },
            id: self.id_column.clone(),
        };
        let dataset = table.dataset(&columns)?;
        let options = PlotOptions {
            thresholds: self.thresholds,
            highlights,
            style: self.style.clone(),
            ..Default::default()
        };
        let figure = match self.plot_kind {
            PlotKind::Ma => ma_plot(&dataset, &options)?,
            _ => volcano_plot(&dataset, &options)?,
        };
        Ok((figure, significant_rows(&dataset, &self.thresholds)))
    }
}

fn significant_rows(dataset: &Dataset, thresholds: &Thresholds) -> Vec<SignificantRow> {
    let labels = dataset.labels().unwrap_or_default();
    let mut rows: Vec<SignificantRow> = classify_all(dataset, thresholds)
        .into_iter()
        .enumerate()
        .filter(|(_, c)| c.is_significant())
        .map(|(i, category)| SignificantRow {
            id: labels.get(i).cloned().unwrap_or_else(|| i.to_string()),
            effect: dataset.effect()[i],
            significance: dataset.significance()[i],
            category,
        })
        .collect();
    rows.sort_by(|a, b| a.significance.total_cmp(&b.significance));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> MetadataValue {
        MetadataValue::String(v.to_string())
    }

    fn table() -> ResultTable {
        ResultTable::from_columns(vec![
            ("target_id".into(), vec![s("g1"), s("g2"), s("g3"), s("g4")]),
            (
                "base_mean".into(),
                vec![
                    MetadataValue::Float(10.0),
                    MetadataValue::Float(200.0),
                    MetadataValue::Float(35.0),
                    MetadataValue::Float(4.0),
                ],
            ),
            (
                "log2_fold_change".into(),
                vec![
                    MetadataValue::Float(2.0),
                    MetadataValue::Float(-3.0),
                    MetadataValue::Float(0.1),
                    MetadataValue::Float(-1.5),
                ],
            ),
            (
                "pvalue".into(),
                vec![
                    MetadataValue::Float(0.001),
                    MetadataValue::Float(0.2),
                    MetadataValue::Float(0.5),
                    MetadataValue::Float(0.0001),
                ],
            ),
            ("biotype".into(), vec![s("pc"), s("lnc"), s("pc"), s("lnc")]),
        ])
        .unwrap()
    }

    #[test]
    fn test_set_table_guesses_columns() {
        let mut state = AppState::default();
        state.set_table(table());
        assert_eq!(state.effect_column.as_deref(), Some("log2_fold_change"));
        assert_eq!(state.significance_column.as_deref(), Some("pvalue"));
        assert_eq!(state.mean_column.as_deref(), Some("base_mean"));
        assert_eq!(state.highlight_column.as_deref(), Some("biotype"));
        assert!(state.figure.is_some());
    }

    #[test]
    fn test_significant_rows_sorted() {
        let mut state = AppState::default();
        state.set_table(table());
        let ids: Vec<&str> = state.significant.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["g4", "g1"]);
        assert_eq!(state.significant[0].category, Category::Downregulated);
    }

    #[test]
    fn test_highlight_toggle() {
        let mut state = AppState::default();
        state.set_table(table());
        state.toggle_highlight_value("biotype", &s("lnc"));
        let fig = state.figure.as_ref().unwrap();
        assert!(fig.series_named("lnc  n=2").is_some());

        state.toggle_highlight_value("biotype", &s("lnc"));
        assert!(state.figure.as_ref().unwrap().series_named("lnc  n=2").is_none());
    }

    #[test]
    fn test_plot_kinds() {
        let mut state = AppState::default();
        state.set_table(table());
        for kind in PlotKind::ALL {
            state.plot_kind = kind;
            state.rebuild();
            assert!(state.figure.is_some(), "{kind} failed: {:?}", state.status_message);
        }
        assert!(state.significant.is_empty());
    }

    #[test]
    fn test_bad_column_reported() {
        let mut state = AppState::default();
        state.set_table(table());
        state.effect_column = Some("biotype".into());
        state.rebuild();
        assert!(state.figure.is_none());
        assert!(state.status_message.is_some());
    }
}
