//! Logistic Regression - multinomial (softmax), batch gradient descent

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{SamplerError, SamplerResult};
use super::classifier::{argmax, check_fit_input, check_predict_input, Classifier, BYTE_SCALE};

const EPOCHS: usize = 300;
const LEARNING_RATE: f32 = 0.5;
const L2: f32 = 1e-4;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// n_classes x n_features
    weights: Array2<f32>,
    bias: Array1<f32>,
}

impl LogisticRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn n_features(&self) -> usize {
        self.weights.ncols()
    }

    /// Class probabilities, one row per sample
    fn probabilities(&self, x: &Array2<f32>) -> Array2<f32> {
        let mut logits = x.dot(&self.weights.t()) + &self.bias;
        for mut row in logits.rows_mut() {
            let max = row.fold(f32::NEG_INFINITY, |m, &v| m.max(v));
            row.mapv_inplace(|v| (v - max).exp());
            let sum = row.sum();
            row /= sum;
        }
        logits
    }
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: &Array2<f32>, y: &Array1<usize>, n_classes: usize) -> SamplerResult<()> {
        check_fit_input(x, y, n_classes)?;
        let (n, d) = x.dim();
        let x = x * BYTE_SCALE;

        let mut onehot = Array2::<f32>::zeros((n, n_classes));
        for (i, &c) in y.iter().enumerate() {
            onehot[[i, c]] = 1.0;
        }

        self.weights = Array2::zeros((n_classes, d));
        self.bias = Array1::zeros(n_classes);

        for _ in 0..EPOCHS {
            let residual = self.probabilities(&x) - &onehot;
            let grad_w = residual.t().dot(&x) / n as f32 + &self.weights * L2;
            let grad_b = residual.sum_axis(Axis(0)) / n as f32;
            self.weights.scaled_add(-LEARNING_RATE, &grad_w);
            self.bias.scaled_add(-LEARNING_RATE, &grad_b);
        }

        if self.weights.iter().any(|w| !w.is_finite()) {
            return Err(SamplerError::Training("logistic regression diverged".into()));
        }
        Ok(())
    }

    fn predict(&self, x: ArrayView2<f32>) -> SamplerResult<Vec<usize>> {
        check_predict_input(&x, self.n_features())?;
        let probs = self.probabilities(&(&x * BYTE_SCALE));
        Ok(probs.rows().into_iter().map(|row| argmax(row.iter().copied())).collect())
    }
}
