use std::fmt;

use crate::data::dataset::Dataset;
use crate::error::{PlotError, Result};

pub const DEFAULT_EFFECT_CUTOFF: f64 = 1.0;
pub const DEFAULT_SIGNIFICANCE_CUTOFF: f64 = 0.05;

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Cutoffs used to bucket records into display categories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    /// Minimum absolute effect size (exclusive).
    pub effect: f64,
    /// Maximum significance value (exclusive).
    pub significance: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            effect: DEFAULT_EFFECT_CUTOFF,
            significance: DEFAULT_SIGNIFICANCE_CUTOFF,
        }
    }
}

impl Thresholds {
    pub fn new(effect: f64, significance: f64) -> Result<Self> {
        let t = Self {
            effect,
            significance,
        };
        t.validate()?;
        Ok(t)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, v) in [("effect", self.effect), ("significance", self.significance)] {
            if !v.is_finite() || v < 0.0 {
                return Err(PlotError::invalid(format!(
                    "{name} cutoff must be a finite non-negative number, got {v}"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Upregulated,
    Downregulated,
    NotSignificant,
}

impl Category {
    pub fn is_significant(self) -> bool {
        self != Category::NotSignificant
    }

    /// Capitalised form used in legends.
    pub fn title(self) -> &'static str {
        match self {
            Category::Upregulated => "Upregulated",
            Category::Downregulated => "Downregulated",
            Category::NotSignificant => "Not significant",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Upregulated => "upregulated",
            Category::Downregulated => "downregulated",
            Category::NotSignificant => "not significant",
        };
        f.write_str(s)
    }
}

/// Classify a single record.
///
/// Values exactly at either cutoff are not significant.
pub fn classify(effect: f64, significance: f64, thresholds: &Thresholds) -> Category {
    if significance < thresholds.significance && effect.abs() > thresholds.effect {
        if effect > 0.0 {
            Category::Upregulated
        } else {
            Category::Downregulated
        }
    } else {
        Category::NotSignificant
    }
}

/// Classify every record of a dataset, preserving order.
pub fn classify_all(dataset: &Dataset, thresholds: &Thresholds) -> Vec<Category> {
    dataset
        .effect()
        .iter()
        .zip(dataset.significance())
        .map(|(&e, &p)| classify(e, p, thresholds))
        .collect()
}

/// Per-category record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub up: usize,
    pub down: usize,
    pub not_significant: usize,
}

impl CategoryCounts {
    pub fn tally(categories: &[Category]) -> Self {
        categories.iter().fold(Self::default(), |mut c, cat| {
            match cat {
                Category::Upregulated => c.up += 1,
                Category::Downregulated => c.down += 1,
                Category::NotSignificant => c.not_significant += 1,
            }
            c
        })
    }

    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Upregulated => self.up,
            Category::Downregulated => self.down,
            Category::NotSignificant => self.not_significant,
        }
    }
}

/// Indices of the records belonging to `category`.
pub fn indices_of(categories: &[Category], category: Category) -> Vec<usize> {
    categories
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == category)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_example() {
        let ds = Dataset::new(vec![2.0, -3.0, 0.1], vec![0.001, 0.2, 0.5]).unwrap();
        let t = Thresholds::new(1.0, 0.05).unwrap();
        let labels: Vec<String> = classify_all(&ds, &t).iter().map(|c| c.to_string()).collect();
        assert_eq!(labels, vec!["upregulated", "not significant", "not significant"]);
    }

    #[test]
    fn test_significance_tie_is_not_significant() {
        let t = Thresholds::default();
        assert_eq!(classify(5.0, 0.05, &t), Category::NotSignificant);
        assert_eq!(classify(5.0, 0.0499, &t), Category::Upregulated);
    }

    #[test]
    fn test_effect_tie_is_not_significant() {
        let t = Thresholds::default();
        assert_eq!(classify(1.0, 0.001, &t), Category::NotSignificant);
        assert_eq!(classify(-1.0, 0.001, &t), Category::NotSignificant);
        assert_eq!(classify(-1.01, 0.001, &t), Category::Downregulated);
    }

    #[test]
    fn test_deterministic() {
        let ds = Dataset::new(
            vec![0.3, -4.0, 2.2, -1.5, 8.0],
            vec![0.5, 0.0001, 0.01, 0.03, 0.2],
        )
        .unwrap();
        let t = Thresholds::default();
        assert_eq!(classify_all(&ds, &t), classify_all(&ds, &t));
    }

    #[test]
    fn test_counts_and_indices() {
        use Category::*;
        let cats = vec![Upregulated, NotSignificant, Downregulated, Upregulated];
        let counts = CategoryCounts::tally(&cats);
        assert_eq!((counts.up, counts.down, counts.not_significant), (2, 1, 1));
        assert_eq!(indices_of(&cats, Upregulated), vec![0, 3]);
    }

    #[test]
    fn test_invalid_thresholds() {
        assert!(Thresholds::new(f64::NAN, 0.05).is_err());
        assert!(Thresholds::new(1.0, -0.1).is_err());
        assert!(Thresholds::new(0.0, 0.0).is_ok());
    }
}
