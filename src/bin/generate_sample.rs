use std::fs::File;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const N_GENES: usize = 5000;
const DE_FRACTION: f64 = 0.08;
const BIOTYPES: [(&str, f64); 4] = [
    ("protein_coding", 0.70),
    ("lncRNA", 0.18),
    ("pseudogene", 0.08),
    ("miRNA", 0.04),
];

/// Box-Muller transform for normal distribution
fn gauss(rng: &mut ChaCha8Rng, mean: f64, std_dev: f64) -> f64 {
    let u1 = rng.gen::<f64>().max(1e-15);
    let u2 = rng.gen::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

fn biotype(rng: &mut ChaCha8Rng) -> &'static str {
    let mut u = rng.gen::<f64>();
    for (name, weight) in BIOTYPES {
        if u < weight {
            return name;
        }
        u -= weight;
    }
    BIOTYPES[0].0
}

struct Row {
    target_id: String,
    base_mean: f64,
    log2_fold_change: Option<f64>,
    pvalue: Option<f64>,
    biotype: &'static str,
}

fn generate(rng: &mut ChaCha8Rng) -> Vec<Row> {
    (0..N_GENES)
        .map(|i| {
            let base_mean = gauss(rng, 4.0, 1.8).exp();
            let (lfc, pvalue) = if rng.gen_bool(DE_FRACTION) {
                let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
                let lfc = sign * gauss(rng, 2.5, 0.8).abs();
                (lfc, 10f64.powf(-rng.gen_range(2.0f64..15.0)))
            } else {
                (gauss(rng, 0.0, 0.35), rng.gen::<f64>())
            };
            // Low-count genes are not tested.
            let tested = base_mean >= 1.0;
            Row {
                target_id: format!("ENSG{:011}", 100_000 + i),
                base_mean,
                log2_fold_change: tested.then_some(lfc),
                pvalue: tested.then_some(pvalue),
                biotype: biotype(rng),
            }
        })
        .collect()
}

fn write_parquet(rows: &[Row], path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("target_id", DataType::Utf8, false),
        Field::new("base_mean", DataType::Float64, false),
        Field::new("log2_fold_change", DataType::Float64, true),
        Field::new("pvalue", DataType::Float64, true),
        Field::new("biotype", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.target_id.as_str()))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.base_mean))),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.log2_fold_change).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(rows.iter().map(|r| r.pvalue).collect::<Vec<_>>())),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.biotype))),
        ],
    )
    .context("Failed to create RecordBatch")?;

    let file = File::create(path).with_context(|| format!("Failed to create {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("Failed to create writer")?;
    writer.write(&batch).context("Failed to write batch")?;
    writer.close().context("Failed to close writer")?;
    Ok(())
}

fn write_csv(rows: &[Row], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("Failed to create {path}"))?;
    writer.write_record(["target_id", "base_mean", "log2_fold_change", "pvalue", "biotype"])?;
    let na = |v: Option<f64>| v.map_or_else(|| "NA".to_string(), |v| v.to_string());
    for r in rows {
        writer.write_record([
            r.target_id.clone(),
            r.base_mean.to_string(),
            na(r.log2_fold_change),
            na(r.pvalue),
            r.biotype.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let rows = generate(&mut rng);

    write_parquet(&rows, "sample_results.parquet")?;
    write_csv(&rows, "sample_results.csv")?;

    let untested = rows.iter().filter(|r| r.pvalue.is_none()).count();
    log::info!("{untested} low-count genes have no estimate");
    println!(
        "Wrote {} genes to sample_results.parquet and sample_results.csv",
        rows.len()
    );
    Ok(())
}
