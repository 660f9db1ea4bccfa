//! Random forest classifier
//!
//! Bagged CART trees split on Gini impurity with a random feature subset per
//! split. Class probabilities are the mean of the per-tree leaf
//! distributions.

use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Expected {expected} features, got {found}")]
    FeatureCount { expected: usize, found: usize },

    #[error("Feature {index} is not a finite number")]
    NonFiniteFeature { index: usize },

    #[error("Cannot fit a forest on an empty training set")]
    EmptyTrainingSet,

    #[error("Training set has {rows} rows but {labels} labels")]
    LabelCount { rows: usize, labels: usize },

    #[error("Model holds no trees")]
    NoTrees,

    #[error("Split on feature {index} but the model has {n_features} features")]
    FeatureOutOfRange { index: usize, n_features: usize },

    #[error("Leaf holds {found} class probabilities, expected {expected}")]
    DistributionLength { expected: usize, found: usize },
}

/// Fixed hyperparameters of the forest
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: 8,
            min_samples_split: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf {
        /// Class probabilities, indexed like the forest's classes
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    fn leaf_distribution(&self, row: &[f64]) -> &[f64] {
        let mut node = self;
        loop {
            match node {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold { &**left } else { &**right };
                }
            }
        }
    }
}

/// A most-likely class with its probability
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForest {
    classes: Vec<String>,
    n_features: usize,
    trees: Vec<Node>,
}

struct TreeBuilder<'a> {
    rows: &'a [Vec<f64>],
    targets: &'a [usize],
    n_classes: usize,
    max_features: usize,
    params: &'a ForestParams,
}

impl RandomForest {
    /// Assemble a forest from prebuilt trees
    pub fn from_trees(classes: Vec<String>, n_features: usize, trees: Vec<Node>) -> Self {
        Self {
            classes,
            n_features,
            trees,
        }
    }

    /// Fit a forest on feature rows and string labels
    pub fn fit(rows: &[Vec<f64>], labels: &[String], params: &ForestParams) -> Result<Self, ModelError> {
        if rows.is_empty() {
            return Err(ModelError::EmptyTrainingSet);
        }
        if rows.len() != labels.len() {
            return Err(ModelError::LabelCount {
                rows: rows.len(),
                labels: labels.len(),
            });
        }
        let n_features = rows[0].len();
        for row in rows {
            check_row(row, n_features)?;
        }

        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();
        let targets: Vec<usize> = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or(0))
            .collect();

        let max_features = ((n_features as f64).sqrt() as usize).max(1);
        let builder = TreeBuilder {
            rows,
            targets: &targets,
            n_classes: classes.len(),
            max_features,
            params,
        };

        let mut rng = StdRng::seed_from_u64(params.seed);
        let n = rows.len();
        let trees = (0..params.n_estimators.max(1))
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                builder.grow(bootstrap, 0, &mut rng)
            })
            .collect();

        Ok(Self {
            classes,
            n_features,
            trees,
        })
    }

    /// Class labels, sorted ascending
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Check that every split and leaf fits the forest's shape.
    ///
    /// Fitted forests always pass; a deserialized one may not.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.trees.is_empty() || self.classes.is_empty() {
            return Err(ModelError::NoTrees);
        }

        let mut pending: Vec<&Node> = self.trees.iter().collect();
        while let Some(node) = pending.pop() {
            match node {
                Node::Leaf { distribution } => {
                    if distribution.len() != self.classes.len() {
                        return Err(ModelError::DistributionLength {
                            expected: self.classes.len(),
                            found: distribution.len(),
                        });
                    }
                }
                Node::Split {
                    feature,
                    left,
                    right,
                    ..
                } => {
                    if *feature >= self.n_features {
                        return Err(ModelError::FeatureOutOfRange {
                            index: *feature,
                            n_features: self.n_features,
                        });
                    }
                    pending.push(left);
                    pending.push(right);
                }
            }
        }
        Ok(())
    }

    /// Mean class probabilities over all trees
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        check_row(row, self.n_features)?;
        if self.trees.is_empty() || self.classes.is_empty() {
            return Err(ModelError::NoTrees);
        }

        let mut probabilities = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (total, p) in probabilities.iter_mut().zip(tree.leaf_distribution(row)) {
                *total += p;
            }
        }
        let n_trees = self.trees.len() as f64;
        probabilities.iter_mut().for_each(|p| *p /= n_trees);
        Ok(probabilities)
    }

    /// Most likely class; ties go to the first class
    pub fn predict(&self, row: &[f64]) -> Result<Prediction, ModelError> {
        let probabilities = self.predict_proba(row)?;
        let (best, confidence) = probabilities
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |(best, max), (i, &p)| if p > max { (i, p) } else { (best, max) });

        Ok(Prediction {
            label: self.classes[best].clone(),
            confidence,
        })
    }

    /// Fraction of rows whose predicted label matches
    pub fn accuracy(&self, rows: &[Vec<f64>], labels: &[String]) -> Result<f64, ModelError> {
        if rows.is_empty() {
            return Ok(0.0);
        }
        let mut correct = 0usize;
        for (row, label) in rows.iter().zip(labels) {
            if self.predict(row)?.label == *label {
                correct += 1;
            }
        }
        Ok(correct as f64 / rows.len() as f64)
    }
}

fn check_row(row: &[f64], n_features: usize) -> Result<(), ModelError> {
    if row.len() != n_features {
        return Err(ModelError::FeatureCount {
            expected: n_features,
            found: row.len(),
        });
    }
    if let Some(index) = row.iter().position(|v| !v.is_finite()) {
        return Err(ModelError::NonFiniteFeature { index });
    }
    Ok(())
}

fn gini(counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

impl TreeBuilder<'_> {
    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0usize; self.n_classes];
        for &i in samples {
            counts[self.targets[i]] += 1;
        }
        counts
    }

    fn leaf(&self, counts: &[usize], total: usize) -> Node {
        let distribution = counts
            .iter()
            .map(|&c| c as f64 / total.max(1) as f64)
            .collect();
        Node::Leaf { distribution }
    }

    fn grow(&self, samples: Vec<usize>, depth: usize, rng: &mut StdRng) -> Node {
        let counts = self.class_counts(&samples);
        let total = samples.len();
        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        if pure || depth >= self.params.max_depth || total < self.params.min_samples_split.max(2) {
            return self.leaf(&counts, total);
        }

        let Some((feature, threshold)) = self.best_split(&samples, &counts, rng) else {
            return self.leaf(&counts, total);
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.rows[i][feature] <= threshold);

        Node::Split {
            feature,
            threshold,
            left: Box::new(self.grow(left, depth + 1, rng)),
            right: Box::new(self.grow(right, depth + 1, rng)),
        }
    }

    /// Lowest weighted Gini split over a random feature subset
    fn best_split(
        &self,
        samples: &[usize],
        parent_counts: &[usize],
        rng: &mut StdRng,
    ) -> Option<(usize, f64)> {
        let n_features = self.rows[samples[0]].len();
        let total = samples.len();
        let parent_impurity = gini(parent_counts, total);

        let mut best: Option<(usize, f64)> = None;
        let mut best_impurity = parent_impurity;

        for feature in sample(rng, n_features, self.max_features.min(n_features)).into_iter() {
            let mut ordered: Vec<(f64, usize)> = samples
                .iter()
                .map(|&i| (self.rows[i][feature], self.targets[i]))
                .collect();
            ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut left_counts = vec![0usize; self.n_classes];
            let mut right_counts = parent_counts.to_vec();

            for split in 1..total {
                let (value, class) = ordered[split - 1];
                left_counts[class] += 1;
                right_counts[class] -= 1;

                let next = ordered[split].0;
                if value == next {
                    continue;
                }

                let impurity = (split as f64 * gini(&left_counts, split)
                    + (total - split) as f64 * gini(&right_counts, total - split))
                    / total as f64;
                if impurity < best_impurity {
                    best_impurity = impurity;
                    best = Some((feature, value + (next - value) / 2.0));
                }
            }
        }

        best
    }
}
