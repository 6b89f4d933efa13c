use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use anyhow::{bail, Context, Result};

use super::dataset::Dataset;

// ---------------------------------------------------------------------------
// MetadataValue – a single cell of a result table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring common data frame dtypes.
/// Using `BTreeMap` / `BTreeSet` downstream so `MetadataValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put MetadataValue in BTreeSet --

impl Eq for MetadataValue {}

impl PartialOrd for MetadataValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetadataValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use MetadataValue::*;
        fn discriminant(v: &MetadataValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for MetadataValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            MetadataValue::String(s) => s.hash(state),
            MetadataValue::Integer(i) => i.hash(state),
            MetadataValue::Float(f) => f.to_bits().hash(state),
            MetadataValue::Bool(b) => b.hash(state),
            MetadataValue::Null => {}
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

/// Spellings of a missing value in R and pandas exports.
const MISSING: [&str; 6] = ["", "NA", "NaN", "nan", "null", "None"];

impl MetadataValue {
    /// Interpret a text cell, guessing its type.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if MISSING.contains(&s) {
            return MetadataValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return MetadataValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return MetadataValue::Float(f);
        }
        if s == "true" || s == "false" {
            return MetadataValue::Bool(s == "true");
        }
        MetadataValue::String(s.to_string())
    }

    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetadataValue::Float(v) => Some(*v),
            MetadataValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, MetadataValue::Null)
    }
}

// ---------------------------------------------------------------------------
// ResultTable – one loaded results file
// ---------------------------------------------------------------------------

/// Column used for feature identifiers when present.
pub const DEFAULT_ID_COLUMN: &str = "target_id";

/// A results table with pre-computed column indices.
#[derive(Debug, Clone)]
pub struct ResultTable {
    /// Column names in file order.
    pub column_names: Vec<String>,
    columns: BTreeMap<String, Vec<MetadataValue>>,
    /// For each column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<MetadataValue>>,
    n_rows: usize,
}

/// Which table columns feed a plot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetColumns {
    pub effect: String,
    pub significance: String,
    pub mean: Option<String>,
    /// Identifier column; row numbers are used when `None`.
    pub id: Option<String>,
}

impl ResultTable {
    /// Build column indices from named columns of equal length.
    pub fn from_columns(columns: Vec<(String, Vec<MetadataValue>)>) -> Result<Self> {
        let n_rows = columns.first().map_or(0, |(_, v)| v.len());
        let mut column_names = Vec::with_capacity(columns.len());
        let mut by_name = BTreeMap::new();
        let mut unique_values: BTreeMap<String, BTreeSet<MetadataValue>> = BTreeMap::new();

        for (name, values) in columns {
            if values.len() != n_rows {
                bail!(
                    "column '{name}' has {} rows, expected {n_rows}",
                    values.len()
                );
            }
            if by_name.contains_key(&name) {
                bail!("duplicate column '{name}'");
            }
            unique_values.insert(name.clone(), values.iter().cloned().collect());
            column_names.push(name.clone());
            by_name.insert(name, values);
        }

        Ok(ResultTable {
            column_names,
            columns: by_name,
            unique_values,
            n_rows,
        })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn column(&self, name: &str) -> Option<&[MetadataValue]> {
        self.columns.get(name).map(|v| v.as_slice())
    }

    fn require(&self, name: &str) -> Result<&[MetadataValue]> {
        self.column(name).with_context(|| {
            format!(
                "no column '{name}' (available: {})",
                self.column_names.join(", ")
            )
        })
    }

    /// Columns whose non-null cells are all numbers.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.column_names
            .iter()
            .filter(|name| {
                let values = &self.columns[name.as_str()];
                values.iter().any(|v| v.as_f64().is_some())
                    && values.iter().all(|v| v.is_null() || v.as_f64().is_some())
            })
            .map(|s| s.as_str())
            .collect()
    }

    /// Columns holding at least one non-numeric, non-null cell.
    pub fn text_columns(&self) -> Vec<&str> {
        let numeric = self.numeric_columns();
        self.column_names
            .iter()
            .map(|s| s.as_str())
            .filter(|name| !numeric.contains(name))
            .collect()
    }

    /// `target_id` if the table has it.
    pub fn default_id_column(&self) -> Option<&str> {
        self.column(DEFAULT_ID_COLUMN).map(|_| DEFAULT_ID_COLUMN)
    }

    /// One identifier per row: the id column's text, or the row number.
    pub fn row_ids(&self, id_column: Option<&str>) -> Result<Vec<String>> {
        match id_column {
            Some(name) => Ok(self.require(name)?.iter().map(|v| v.to_string()).collect()),
            None => Ok((0..self.n_rows).map(|i| i.to_string()).collect()),
        }
    }

    /// Numeric view of a column; missing or non-finite cells become `None`.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<Option<f64>>> {
        self.require(name)?
            .iter()
            .enumerate()
            .map(|(row, v)| match v {
                MetadataValue::Null => Ok(None),
                other => match other.as_f64() {
                    Some(f) => Ok(f.is_finite().then_some(f)),
                    None => bail!("column '{name}', row {row}: '{other}' is not a number"),
                },
            })
            .collect()
    }

    /// Build a validated dataset from the chosen columns.
    ///
    /// Rows with a missing value in any used column are dropped.
    pub fn dataset(&self, columns: &DatasetColumns) -> Result<Dataset> {
        let effect = self.numeric_column(&columns.effect)?;
        let significance = self.numeric_column(&columns.significance)?;
        let mean = columns
            .mean
            .as_deref()
            .map(|m| self.numeric_column(m))
            .transpose()?;
        let ids = self.row_ids(columns.id.as_deref())?;

        let keep: Vec<usize> = (0..self.n_rows)
            .filter(|&i| {
                effect[i].is_some()
                    && significance[i].is_some()
                    && mean.as_ref().map_or(true, |m| m[i].is_some())
            })
            .collect();

        let dropped = self.n_rows - keep.len();
        if dropped > 0 {
            log::info!("Dropped {dropped} of {} rows with missing values", self.n_rows);
        }
        if keep.is_empty() {
            bail!("no complete rows in columns '{}' and '{}'", columns.effect, columns.significance);
        }

        let pick = |col: &[Option<f64>]| keep.iter().filter_map(|&i| col[i]).collect::<Vec<_>>();
        let mut dataset = Dataset::new(pick(&effect), pick(&significance))?
            .with_labels(keep.iter().map(|&i| ids[i].clone()).collect())?;
        if let Some(mean) = &mean {
            dataset = dataset.with_mean(pick(mean))?;
        }
        Ok(dataset)
    }

    /// Non-missing values of one numeric column with their row identifiers.
    pub fn labelled_values(
        &self,
        column: &str,
        id_column: Option<&str>,
    ) -> Result<(Vec<f64>, Vec<String>)> {
        let values = self.numeric_column(column)?;
        let ids = self.row_ids(id_column)?;
        let (values, ids): (Vec<f64>, Vec<String>) = values
            .into_iter()
            .zip(ids)
            .filter_map(|(v, id)| v.map(|v| (v, id)))
            .unzip();
        if values.is_empty() {
            bail!("column '{column}' has no numeric values");
        }
        Ok((values, ids))
    }
}
