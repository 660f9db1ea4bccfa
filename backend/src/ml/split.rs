//! Stratified train/validation split

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SplitError {
    #[error("Validation fraction must be in (0, 1), got {0}")]
    InvalidFraction(f64),

    #[error("Class {label:?} has only {count} row(s); at least 2 are needed to stratify")]
    ClassTooSmall { label: String, count: usize },

    #[error("{side} split would hold {size} row(s), fewer than the {classes} classes")]
    SplitTooSmall {
        side: &'static str,
        size: usize,
        classes: usize,
    },
}

/// Row indices of the two halves of a split
#[derive(Debug, Clone, PartialEq)]
pub struct StratifiedSplit {
    pub train: Vec<usize>,
    pub validation: Vec<usize>,
}

/// Split row indices so both halves keep the class proportions of `labels`.
///
/// The validation half holds `ceil(fraction * n)` rows. Per-class shares are
/// floored, and leftover slots go to the classes with the largest remainders.
pub fn stratified_split(
    labels: &[String],
    fraction: f64,
    seed: u64,
) -> Result<StratifiedSplit, SplitError> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(SplitError::InvalidFraction(fraction));
    }

    let mut by_class: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, label) in labels.iter().enumerate() {
        by_class.entry(label.as_str()).or_default().push(index);
    }

    if let Some((label, rows)) = by_class.iter().find(|(_, rows)| rows.len() < 2) {
        return Err(SplitError::ClassTooSmall {
            label: label.to_string(),
            count: rows.len(),
        });
    }

    let n = labels.len();
    let n_classes = by_class.len();
    let n_validation = (fraction * n as f64).ceil() as usize;
    let n_train = n - n_validation;
    if n_validation < n_classes {
        return Err(SplitError::SplitTooSmall {
            side: "validation",
            size: n_validation,
            classes: n_classes,
        });
    }
    if n_train < n_classes {
        return Err(SplitError::SplitTooSmall {
            side: "train",
            size: n_train,
            classes: n_classes,
        });
    }

    // Floor of each class's share, then hand out the remainder
    let mut quotas: Vec<(usize, f64)> = by_class
        .values()
        .map(|rows| {
            let exact = rows.len() as f64 * n_validation as f64 / n as f64;
            (exact.floor() as usize, exact - exact.floor())
        })
        .collect();
    // Fractional parts sum to an integer below the class count, so one pass suffices
    let remaining = n_validation - quotas.iter().map(|(q, _)| q).sum::<usize>();
    let mut order: Vec<usize> = (0..quotas.len()).collect();
    order.sort_by(|&a, &b| quotas[b].1.total_cmp(&quotas[a].1));
    for &class in order.iter().take(remaining) {
        quotas[class].0 += 1;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = StratifiedSplit {
        train: Vec::with_capacity(n_train),
        validation: Vec::with_capacity(n_validation),
    };
    for (mut rows, (quota, _)) in by_class.into_values().zip(quotas) {
        rows.shuffle(&mut rng);
        let (validation, train) = rows.split_at(quota.min(rows.len()));
        split.validation.extend_from_slice(validation);
        split.train.extend_from_slice(train);
    }
    split.train.sort_unstable();
    split.validation.sort_unstable();

    Ok(split)
}
