//! Train/Test Split
//!
//! Holds the partitioned feature matrices. `shuffle` recombines both halves,
//! permutes and repartitions, so later trials reuse the matrices without
//! re-reading the corpus.

use ndarray::{concatenate, s, Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{SamplerError, SamplerResult};
use crate::logic::features::LabeledExample;

#[derive(Debug)]
pub struct TrainTestSplit {
    pub x_train: Array2<f32>,
    pub y_train: Array1<usize>,
    pub x_test: Array2<f32>,
    pub y_test: Array1<usize>,
    split: f64,
    rng: StdRng,
}

/// Number of training rows for `n` examples
fn split_index(split: f64, n: usize) -> usize {
    ((split * n as f64) as usize).min(n)
}

fn check_split(split: f64) -> SamplerResult<()> {
    if split > 0.0 && split <= 1.0 {
        Ok(())
    } else {
        Err(SamplerError::Configuration(format!("split must be in (0, 1], got {}", split)))
    }
}

impl TrainTestSplit {
    /// Shuffle `examples` and partition by `split`
    pub fn new(
        examples: &[LabeledExample],
        nfeatures: usize,
        split: f64,
        seed: Option<u64>,
    ) -> SamplerResult<Self> {
        check_split(split)?;

        let mut flat = Vec::with_capacity(examples.len() * nfeatures);
        let mut labels = Vec::with_capacity(examples.len());
        for example in examples {
            if example.features.len() != nfeatures {
                return Err(SamplerError::FeatureMismatch {
                    expected: nfeatures,
                    actual: example.features.len(),
                });
            }
            flat.extend_from_slice(example.features.as_slice());
            labels.push(example.class_id);
        }

        let x = Array2::from_shape_vec((examples.len(), nfeatures), flat)
            .map_err(|e| SamplerError::Training(format!("feature matrix: {}", e)))?;
        let y = Array1::from_vec(labels);

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut this = Self {
            x_train: x,
            y_train: y,
            x_test: Array2::zeros((0, nfeatures)),
            y_test: Array1::zeros(0),
            split,
            rng,
        };
        this.repartition(split);
        Ok(this)
    }

    /// Recombine, permute and repartition. `None` uses the ratio given at
    /// construction; an explicit ratio applies to this call only.
    pub fn shuffle(&mut self, split: Option<f64>) -> SamplerResult<()> {
        let split = split.unwrap_or(self.split);
        check_split(split)?;
        self.repartition(split);
        Ok(())
    }

    fn repartition(&mut self, split: f64) {
        let x = concatenate(Axis(0), &[self.x_train.view(), self.x_test.view()])
            .unwrap_or_else(|_| self.x_train.clone());
        let y = concatenate(Axis(0), &[self.y_train.view(), self.y_test.view()])
            .unwrap_or_else(|_| self.y_train.clone());

        let mut perm: Vec<usize> = (0..y.len()).collect();
        perm.shuffle(&mut self.rng);
        let x = x.select(Axis(0), &perm);
        let y = y.select(Axis(0), &perm);

        let k = split_index(split, y.len());
        self.x_train = x.slice(s![..k, ..]).to_owned();
        self.y_train = y.slice(s![..k]).to_owned();
        self.x_test = x.slice(s![k.., ..]).to_owned();
        self.y_test = y.slice(s![k..]).to_owned();
    }

    pub fn split(&self) -> f64 {
        self.split
    }

    pub fn len(&self) -> usize {
        self.y_train.len() + self.y_test.len()
    }

    pub fn train_len(&self) -> usize {
        self.y_train.len()
    }

    pub fn test_len(&self) -> usize {
        self.y_test.len()
    }
}
