use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use rusty_bioplot::config::load_style;
use rusty_bioplot::data::loader::load_file;
use rusty_bioplot::data::model::{DatasetColumns, ResultTable};
use rusty_bioplot::data::select::{matching_ids, parse_highlight_spec, resolve_values};
use rusty_bioplot::{
    density_plot, ma_plot, palette_swatch, volcano_plot, DensityOptions, Highlight, Marker,
    Palette, PlotOptions, Thresholds,
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "rusty-bioplot",
    version,
    about = "Volcano, MA and density plots for differential-expression results"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Effect size against -log10 significance
    Volcano(ScatterArgs),
    /// Mean expression against effect size
    Ma(ScatterArgs),
    /// Kernel density of one numeric column
    Density(DensityArgs),
    /// Preview a colour cycle
    Swatch(SwatchArgs),
    /// Open the interactive viewer
    View {
        /// Table to open on start-up
        table: Option<PathBuf>,
    },
}

/// Input table, highlight groups and output shared by the plot commands.
#[derive(Args, Debug)]
pub struct TableArgs {
    /// Results table (.csv, .tsv, .txt, .json, .parquet, .pq)
    pub table: PathBuf,

    /// Identifier column [default: target_id when present, else row number]
    #[arg(long)]
    pub id: Option<String>,

    /// Highlight rows whose COL is one of the values; repeatable
    #[arg(long = "highlight", value_name = "COL=VALUE[,VALUE]")]
    pub highlights: Vec<String>,

    /// Palette for highlight colours (set1, brg, hues)
    #[arg(long, default_value = "set1")]
    pub palette: Palette,

    /// YAML style file [default: $RUSTY_BIOPLOT_STYLE]
    #[arg(long)]
    pub style: Option<PathBuf>,

    /// Output image (.png or .svg)
    #[arg(short, long)]
    pub output: PathBuf,
}

#[derive(Args, Debug)]
pub struct ScatterArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Effect-size column
    #[arg(long, default_value = "log2_fold_change")]
    pub effect: String,

    /// Significance column
    #[arg(long, default_value = "pvalue")]
    pub significance: String,

    /// Mean expression column (MA plot only)
    #[arg(long, default_value = "base_mean")]
    pub mean: String,

    /// Minimum absolute effect size of a significant record
    #[arg(long, default_value_t = 1.0)]
    pub fc_cutoff: f64,

    /// Significance cutoff
    #[arg(long, default_value_t = 0.05)]
    pub fdr: f64,

    /// Marker for all points (circle, square, triangle, cross)
    #[arg(long, default_value = "circle")]
    pub marker: Marker,

    #[arg(long, default_value_t = 1.0)]
    pub alpha: f32,
}

#[derive(Args, Debug)]
pub struct DensityArgs {
    #[command(flatten)]
    pub table: TableArgs,

    /// Column to estimate the density of
    #[arg(long, default_value = "base_mean")]
    pub column: String,

    /// Plot the cumulative distribution
    #[arg(long)]
    pub cumulative: bool,

    /// Extend the curve this many bandwidths past the data
    #[arg(long, default_value_t = 3.0)]
    pub cut: f64,
}

#[derive(Args, Debug)]
pub struct SwatchArgs {
    /// Number of distinct colours in the cycle
    #[arg(long, default_value_t = 5)]
    pub colors: usize,

    /// Number of dots to draw
    #[arg(long, default_value_t = 10)]
    pub values: usize,

    #[arg(long, default_value_t = 1.0)]
    pub gamma: f32,

    #[arg(long, default_value = "set1")]
    pub palette: Palette,

    /// Output image (.png or .svg)
    #[arg(short, long)]
    pub output: PathBuf,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScatterKind {
    Volcano,
    Ma,
}

pub fn run_scatter(kind: ScatterKind, args: &ScatterArgs) -> Result<()> {
    let table = load_table(&args.table.table)?;
    let id = id_column(&table, args.table.id.as_deref());
    let columns = DatasetColumns {
        effect: args.effect.clone(),
        significance: args.significance.clone(),
        mean: (kind == ScatterKind::Ma).then(|| args.mean.clone()),
        id: id.clone(),
    };
    let dataset = table.dataset(&columns)?;

    let options = PlotOptions {
        thresholds: Thresholds::new(args.fc_cutoff, args.fdr)?,
        marker: args.marker,
        alpha: args.alpha,
        highlights: highlights(&table, id.as_deref(), &args.table.highlights)?,
        highlight_palette: args.table.palette,
        style: load_style(args.table.style.as_deref())?,
        output: Some(args.table.output.clone()),
        ..Default::default()
    };
    match kind {
        ScatterKind::Volcano => volcano_plot(&dataset, &options),
        ScatterKind::Ma => ma_plot(&dataset, &options),
    }
    .with_context(|| format!("Failed to plot {}", args.table.table.display()))?;
    Ok(())
}

pub fn run_density(args: &DensityArgs) -> Result<()> {
    let table = load_table(&args.table.table)?;
    let id = id_column(&table, args.table.id.as_deref());
    let (values, labels) = table.labelled_values(&args.column, id.as_deref())?;

    let options = DensityOptions {
        cumulative: args.cumulative,
        cut: args.cut,
        highlights: highlights(&table, id.as_deref(), &args.table.highlights)?,
        highlight_palette: args.table.palette,
        x_label: Some(args.column.clone()),
        style: load_style(args.table.style.as_deref())?,
        output: Some(args.table.output.clone()),
        ..Default::default()
    };
    density_plot(&values, Some(&labels), &options)
        .with_context(|| format!("Failed to plot {}", args.table.table.display()))?;
    Ok(())
}

pub fn run_swatch(args: &SwatchArgs) -> Result<()> {
    let figure = palette_swatch(args.colors, args.values, args.gamma, args.palette)?;
    figure.save(&args.output)?;
    Ok(())
}

fn load_table(path: &Path) -> Result<ResultTable> {
    let table = load_file(path)?;
    log::info!(
        "Loaded {} rows with columns {:?} from {}",
        table.len(),
        table.column_names,
        path.display()
    );
    Ok(table)
}

fn id_column(table: &ResultTable, explicit: Option<&str>) -> Option<String> {
    explicit
        .or_else(|| table.default_id_column())
        .map(str::to_string)
}

/// One highlight group per `COL=VALUE[,VALUE]` argument.
fn highlights(table: &ResultTable, id: Option<&str>, specs: &[String]) -> Result<Vec<Highlight>> {
    specs
        .iter()
        .map(|spec| {
            let (column, raw) = parse_highlight_spec(spec)?;
            let selected = resolve_values(table, &column, &raw)?;
            let ids = matching_ids(table, id, &column, &selected)?;
            Ok(Highlight::ids(ids).with_label(format!("{column}={}", raw.join(","))))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    #[test]
    fn test_parse_volcano_command() {
        let cli = Cli::try_parse_from([
            "rusty-bioplot",
            "volcano",
            "results.tsv",
            "--fdr",
            "0.01",
            "--highlight",
            "biotype=lncRNA,miRNA",
            "-o",
            "out.svg",
        ])
        .unwrap();
        let Command::Volcano(args) = cli.command else {
            panic!("expected volcano");
        };
        assert_eq!(args.fdr, 0.01);
        assert_eq!(args.fc_cutoff, 1.0);
        assert_eq!(args.effect, "log2_fold_change");
        assert_eq!(args.table.highlights, vec!["biotype=lncRNA,miRNA"]);
        assert_eq!(args.table.palette, Palette::Set1);
    }

    #[test]
    fn test_output_is_required() {
        assert!(Cli::try_parse_from(["rusty-bioplot", "ma", "results.csv"]).is_err());
    }

    #[test]
    fn test_unknown_palette_rejected() {
        let res = Cli::try_parse_from([
            "rusty-bioplot",
            "swatch",
            "--palette",
            "viridis",
            "-o",
            "s.svg",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn test_volcano_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("results.csv");
        std::fs::write(
            &input,
            "target_id,log2_fold_change,pvalue,biotype\n\
             g1,2.0,0.001,lncRNA\n\
             g2,-3.0,0.2,protein_coding\n\
             g3,0.1,0.5,lncRNA\n\
             g4,NA,0.01,protein_coding\n",
        )
        .unwrap();
        let output = dir.path().join("volcano.svg");
        let argv: Vec<OsString> = vec![
            "rusty-bioplot".into(),
            "volcano".into(),
            input.into_os_string(),
            "--highlight".into(),
            "biotype=lncRNA".into(),
            "-o".into(),
            output.clone().into_os_string(),
        ];
        let cli = Cli::try_parse_from(argv).unwrap();
        let Command::Volcano(args) = cli.command else {
            panic!("expected volcano");
        };
        run_scatter(ScatterKind::Volcano, &args).unwrap();
        let svg = std::fs::read_to_string(&output).unwrap();
        assert!(svg.contains("biotype=lncRNA"));
    }

    #[test]
    fn test_unknown_highlight_value() {
        let table = ResultTable::from_columns(vec![(
            "biotype".into(),
            vec![rusty_bioplot::data::model::MetadataValue::String("lncRNA".into())],
        )])
        .unwrap();
        assert!(highlights(&table, None, &["biotype=snoRNA".to_string()]).is_err());
    }
}
