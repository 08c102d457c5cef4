use gradnet_core::{GradNetError, Matrix, Real, Var};

/// Probabilities are clamped this far away from zero before taking the
/// log, so a confidently wrong prediction cannot produce an infinite
/// cross-entropy.
pub const PROB_CLIP: f64 = 1e-12;

/// The training criterion, fixed at classifier construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loss {
    SquaredError,
    MeanSquaredError,
    CrossEntropy,
}

impl Loss {
    pub fn from_str(s: &str) -> Result<Self, GradNetError> {
        match s {
            "squared_error" => Ok(Loss::SquaredError),
            "mean_squared_error" => Ok(Loss::MeanSquaredError),
            "cross_entropy" => Ok(Loss::CrossEntropy),
            other => Err(GradNetError::UnknownLoss(other.to_string())),
        }
    }

    /// Builds the loss node for a batch of targets and predictions of
    /// identical shape. Returns a single scalar node ready for
    /// `backward()`.
    pub fn compute<T: Real>(
        &self,
        target: &Matrix<T>,
        prediction: &Matrix<T>,
    ) -> Result<Var<T>, GradNetError> {
        if target.shape() != prediction.shape() {
            return Err(GradNetError::ShapeMismatch {
                expected: vec![target.rows(), target.cols()],
                actual: vec![prediction.rows(), prediction.cols()],
                operation: "Loss::compute".to_string(),
            });
        }
        if target.rows() == 0 {
            return Err(GradNetError::EmptyInput {
                operation: "Loss::compute".to_string(),
            });
        }
        Ok(match self {
            Loss::SquaredError => squared_error(target, prediction),
            Loss::MeanSquaredError => {
                let count = T::from_usize(target.rows() * target.cols())
                    .expect("entry count must be representable in T");
                &squared_error(target, prediction) / count
            }
            Loss::CrossEntropy => cross_entropy(target, prediction),
        })
    }
}

/// Σ (t − p)² over every entry of the batch.
fn squared_error<T: Real>(target: &Matrix<T>, prediction: &Matrix<T>) -> Var<T> {
    let two = T::from_f64(2.0).expect("2 must be representable in T");
    let mut total = target.tape().var(T::zero());
    for (t, p) in target.iter().zip(prediction.iter()) {
        total = &total + &(t - p).powf(two);
    }
    total
}

/// −Σ t · ln(clamp(p)) over classes, averaged over the batch rows.
///
/// Callers must feed softmax output: rows that are valid probability
/// distributions. The clamp only guards against log(0).
fn cross_entropy<T: Real>(target: &Matrix<T>, prediction: &Matrix<T>) -> Var<T> {
    let clip = T::from_f64(PROB_CLIP).expect("clip must be representable in T");
    let n = T::from_usize(target.rows()).expect("row count must be representable in T");
    let mut total = target.tape().var(T::zero());
    for (t, p) in target.iter().zip(prediction.iter()) {
        total = &total + &(t * &p.clamp_min(clip).ln());
    }
    -(&total / n)
}

#[cfg(test)]
#[path = "loss_test.rs"]
mod tests;
