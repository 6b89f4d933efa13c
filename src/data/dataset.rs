use crate::error::{PlotError, Result};

// ---------------------------------------------------------------------------
// Dataset – validated, index-aligned plotting input
// ---------------------------------------------------------------------------

/// Parallel sequences of per-feature statistics.
///
/// Every present sequence has the same, non-zero length and all values are
/// finite. Significance values are additionally non-negative.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    effect: Vec<f64>,
    significance: Vec<f64>,
    labels: Option<Vec<String>>,
    mean: Option<Vec<f64>>,
}

impl Dataset {
    /// Validate effect sizes (usually log2 fold change) against their
    /// significance values (usually p-values).
    pub fn new(effect: Vec<f64>, significance: Vec<f64>) -> Result<Self> {
        if effect.is_empty() {
            return Err(PlotError::invalid("effect-size sequence is empty"));
        }
        if effect.len() != significance.len() {
            return Err(PlotError::invalid(format!(
                "effect-size has {} values but significance has {}",
                effect.len(),
                significance.len()
            )));
        }
        check_finite("effect-size", &effect)?;
        check_finite("significance", &significance)?;
        if let Some(i) = significance.iter().position(|&p| p < 0.0) {
            return Err(PlotError::invalid(format!(
                "significance[{i}] is negative ({})",
                significance[i]
            )));
        }
        Ok(Self {
            effect,
            significance,
            labels: None,
            mean: None,
        })
    }

    /// Attach one identifier per record.
    pub fn with_labels(mut self, labels: Vec<String>) -> Result<Self> {
        if labels.len() != self.len() {
            return Err(PlotError::invalid(format!(
                "{} labels given for {} records",
                labels.len(),
                self.len()
            )));
        }
        self.labels = Some(labels);
        Ok(self)
    }

    /// Attach mean expression values, required by the MA plot.
    pub fn with_mean(mut self, mean: Vec<f64>) -> Result<Self> {
        if mean.len() != self.len() {
            return Err(PlotError::invalid(format!(
                "mean expression has {} values but the dataset has {} records",
                mean.len(),
                self.len()
            )));
        }
        check_finite("mean expression", &mean)?;
        self.mean = Some(mean);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.effect.len()
    }

    /// Always false for a constructed dataset; kept for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.effect.is_empty()
    }

    pub fn effect(&self) -> &[f64] {
        &self.effect
    }

    pub fn significance(&self) -> &[f64] {
        &self.significance
    }

    pub fn labels(&self) -> Option<&[String]> {
        self.labels.as_deref()
    }

    pub fn mean(&self) -> Option<&[f64]> {
        self.mean.as_deref()
    }

    /// A new dataset made of the records at `indices`, in that order.
    ///
    /// Returns `None` when `indices` is empty.
    pub fn subset(&self, indices: &[usize]) -> Option<Self> {
        if indices.is_empty() {
            return None;
        }
        let pick = |v: &[f64]| indices.iter().map(|&i| v[i]).collect::<Vec<_>>();
        Some(Self {
            effect: pick(&self.effect),
            significance: pick(&self.significance),
            labels: self
                .labels
                .as_ref()
                .map(|l| indices.iter().map(|&i| l[i].clone()).collect()),
            mean: self.mean.as_deref().map(pick),
        })
    }
}

fn check_finite(name: &str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(i) => Err(PlotError::invalid(format!(
            "{name}[{i}] is not a finite number ({})",
            values[i]
        ))),
        None => Ok(()),
    }
}
