use std::collections::{BTreeMap, BTreeSet};

use anyhow::{bail, Context, Result};

use super::model::{MetadataValue, ResultTable};

// ---------------------------------------------------------------------------
// Selection: which unique values are picked per column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
pub type Selection = BTreeMap<String, BTreeSet<MetadataValue>>;

/// Return indices of rows whose value in `column` is one of `selected`.
///
/// A row missing the column entirely counts as `Null`.
pub fn matching_indices(
    table: &ResultTable,
    column: &str,
    selected: &BTreeSet<MetadataValue>,
) -> Vec<usize> {
    let Some(values) = table.column(column) else {
        return Vec::new();
    };
    values
        .iter()
        .enumerate()
        .filter(|(_, v)| selected.contains(v))
        .map(|(i, _)| i)
        .collect()
}

/// Identifiers of the rows selected by `column` / `selected`.
pub fn matching_ids(
    table: &ResultTable,
    id_column: Option<&str>,
    column: &str,
    selected: &BTreeSet<MetadataValue>,
) -> Result<Vec<String>> {
    let ids = table.row_ids(id_column)?;
    Ok(matching_indices(table, column, selected)
        .into_iter()
        .map(|i| ids[i].clone())
        .collect())
}

/// Resolve user-typed values against the unique values of `column`.
pub fn resolve_values(
    table: &ResultTable,
    column: &str,
    raw: &[String],
) -> Result<BTreeSet<MetadataValue>> {
    let known = table.unique_values.get(column).with_context(|| {
        format!(
            "no column '{column}' (available: {})",
            table.column_names.join(", ")
        )
    })?;
    raw.iter()
        .map(|r| {
            let value = MetadataValue::parse(r);
            if known.contains(&value) {
                return Ok(value);
            }
            // "1" typed against a float column still names Float(1.0).
            let numeric = value
                .as_f64()
                .and_then(|x| known.iter().find(|k| k.as_f64() == Some(x)));
            match numeric {
                Some(k) => Ok(k.clone()),
                None => bail!("value '{r}' does not occur in column '{column}'"),
            }
        })
        .collect()
}

/// Parse `COLUMN=VALUE[,VALUE...]`.
pub fn parse_highlight_spec(spec: &str) -> Result<(String, Vec<String>)> {
    let (column, values) = spec
        .split_once('=')
        .with_context(|| format!("highlight '{spec}' is not of the form COLUMN=VALUE[,VALUE]"))?;
    let column = column.trim();
    let values: Vec<String> = values
        .split(',')
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if column.is_empty() || values.is_empty() {
        bail!("highlight '{spec}' needs a column and at least one value");
    }
    Ok((column.to_string(), values))
}
