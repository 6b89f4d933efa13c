use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{MetadataValue, ResultTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Extensions accepted by [`load_file`], for file dialogs.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["csv", "tsv", "txt", "json", "parquet", "pq"];

/// Load a results table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`            – comma-separated with a header row
/// * `.tsv` / `.txt`   – tab-separated with a header row (DESeq2, edgeR, sleuth)
/// * `.json`           – `[{ "target_id": "...", "log2FoldChange": 1.2, ... }, ...]`
/// * `.parquet`        – one scalar column per statistic
pub fn load_file(path: &Path) -> Result<ResultTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_delimited(path, b','),
        "tsv" | "txt" => load_delimited(path, b'\t'),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::debug!(
        "Loaded {} rows, columns {:?} from {}",
        table.len(),
        table.column_names,
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV / TSV loader
// ---------------------------------------------------------------------------

/// Header row with column names, one feature per record. Cell types are
/// guessed; `NA`, `NaN` and empty cells are missing values.
fn load_delimited(path: &Path, delimiter: u8) -> Result<ResultTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .context("opening delimited file")?;
    read_delimited(&mut reader)
}

fn read_delimited<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<ResultTable> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut columns: Vec<Vec<MetadataValue>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "row {row_no} has {} fields but the header has {}",
                record.len(),
                headers.len()
            );
        }
        for (col, value) in columns.iter_mut().zip(record.iter()) {
            col.push(MetadataValue::parse(value));
        }
    }

    ResultTable::from_columns(headers.into_iter().zip(columns).collect())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "target_id": "BRCA1", "log2FoldChange": 1.5, "pvalue": 0.001 },
///   ...
/// ]
/// ```
///
/// Keys missing from a record are missing values.
fn load_json(path: &Path) -> Result<ResultTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

fn parse_json(text: &str) -> Result<ResultTable> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut names: Vec<String> = Vec::new();
    let mut rows: Vec<&serde_json::Map<String, JsonValue>> = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
        rows.push(obj);
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let values = rows
                .iter()
                .map(|obj| obj.get(&name).map_or(MetadataValue::Null, json_to_metadata))
                .collect();
            (name, values)
        })
        .collect();
    ResultTable::from_columns(columns)
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::parse(s),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of scalar columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<ResultTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let names: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: BTreeMap<usize, Vec<MetadataValue>> = BTreeMap::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for col_idx in 0..batch.num_columns() {
            let array = batch.column(col_idx);
            let values = columns.entry(col_idx).or_default();
            for row in 0..batch.num_rows() {
                values.push(extract_metadata_value(array, row));
            }
        }
    }

    let columns = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| (name, columns.remove(&i).unwrap_or_default()))
        .collect();
    ResultTable::from_columns(columns)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_metadata_value(col: &Arc<dyn Array>, row: usize) -> MetadataValue {
    if col.is_null(row) {
        return MetadataValue::Null;
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|s| MetadataValue::String(s.value(row).to_string())),
        DataType::LargeUtf8 => Some(MetadataValue::String(
            col.as_string::<i64>().value(row).to_string(),
        )),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| MetadataValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| MetadataValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| MetadataValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| MetadataValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| MetadataValue::Bool(a.value(row))),
        _ => None,
    };
    let value = value.unwrap_or_else(|| MetadataValue::String(format!("{:?}", col.data_type())));
    // pandas writes missing floats as NaN rather than null
    match value {
        MetadataValue::Float(f) if f.is_nan() => MetadataValue::Null,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    #[test]
    fn test_tsv_with_missing_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("res.tsv");
        std::fs::write(
            &path,
            "target_id\tlog2FoldChange\tpadj\nA\t1.5\t0.01\nB\t-2\tNA\nC\t0.1\t0.9\n",
        )
        .unwrap();
        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column_names, vec!["target_id", "log2FoldChange", "padj"]);
        assert_eq!(table.column("padj").unwrap()[1], MetadataValue::Null);
        assert_eq!(table.column("log2FoldChange").unwrap()[1], MetadataValue::Integer(-2));
    }

    #[test]
    fn test_csv_ragged_row_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("res.csv");
        std::fs::write(&path, "a,b\n1,2\n3\n").unwrap();
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn test_json_records() {
        let table = parse_json(
            r#"[{"target_id": "A", "lfc": 1.0, "p": 0.01},
                {"target_id": "B", "lfc": -2.5}]"#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("p").unwrap()[1], MetadataValue::Null);
        assert_eq!(table.column("lfc").unwrap()[1], MetadataValue::Float(-2.5));
    }

    #[test]
    fn test_json_requires_array() {
        assert!(parse_json(r#"{"a": 1}"#).is_err());
        assert!(parse_json(r#"[1, 2]"#).is_err());
    }

    #[test]
    fn test_parquet_roundtrip_with_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("res.parquet");
        let schema = Arc::new(Schema::new(vec![
            Field::new("target_id", DataType::Utf8, false),
            Field::new("pvalue", DataType::Float64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["A", "B"])),
                Arc::new(Float64Array::from(vec![Some(0.5), Some(f64::NAN)])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.column_names, vec!["target_id", "pvalue"]);
        assert_eq!(table.column("pvalue").unwrap()[0], MetadataValue::Float(0.5));
        assert_eq!(table.column("pvalue").unwrap()[1], MetadataValue::Null);
    }

    #[test]
    fn test_unknown_extension() {
        let err = load_file(Path::new("results.xlsx")).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension"));
    }
}
