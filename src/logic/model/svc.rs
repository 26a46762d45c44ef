//! Linear Support Vector Classifier
//!
//! One-vs-rest hinge-loss machines trained with Pegasos-style stochastic
//! sub-gradient steps. The bias rides along as a constant extra feature.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{SamplerError, SamplerResult};
use super::classifier::{argmax, check_fit_input, check_predict_input, Classifier, BYTE_SCALE};

const EPOCHS: usize = 50;
const LAMBDA: f32 = 1e-3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvc {
    /// n_classes x (n_features + 1); last column is the bias
    weights: Array2<f32>,
    #[serde(default)]
    seed: Option<u64>,
}

impl LinearSvc {
    pub fn new(seed: Option<u64>) -> Self {
        Self { weights: Array2::zeros((0, 0)), seed }
    }

    pub fn n_features(&self) -> usize {
        self.weights.ncols().saturating_sub(1)
    }

    fn margin(w: ArrayView1<f32>, x: ArrayView1<f32>) -> f32 {
        let d = x.len();
        w.slice(ndarray::s![..d]).dot(&x) * BYTE_SCALE + w[d]
    }
}

impl Classifier for LinearSvc {
    fn fit(&mut self, x: &Array2<f32>, y: &Array1<usize>, n_classes: usize) -> SamplerResult<()> {
        check_fit_input(x, y, n_classes)?;
        let (n, d) = x.dim();
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut weights = Array2::<f32>::zeros((n_classes, d + 1));
        let mut order: Vec<usize> = (0..n).collect();

        for (class, mut w) in weights.rows_mut().into_iter().enumerate() {
            let mut t = 1usize;
            for _ in 0..EPOCHS {
                order.shuffle(&mut rng);
                for &i in &order {
                    let eta = 1.0 / (LAMBDA * t as f32);
                    let target = if y[i] == class { 1.0 } else { -1.0 };
                    let row = x.row(i);
                    let violated = target * Self::margin(w.view(), row) < 1.0;

                    w.mapv_inplace(|v| v * (1.0 - eta * LAMBDA));
                    if violated {
                        for (wj, &xj) in w.iter_mut().zip(row.iter()) {
                            *wj += eta * target * xj * BYTE_SCALE;
                        }
                        w[d] += eta * target;
                    }
                    t += 1;
                }
            }
        }

        if weights.iter().any(|v| !v.is_finite()) {
            return Err(SamplerError::Training("svc weights diverged".into()));
        }
        self.weights = weights;
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f32>) -> SamplerResult<Vec<usize>> {
        check_predict_input(&x, self.n_features())?;
        Ok(x
            .rows()
            .into_iter()
            .map(|row| argmax(self.weights.rows().into_iter().map(|w| Self::margin(w, row))))
            .collect())
    }
}
