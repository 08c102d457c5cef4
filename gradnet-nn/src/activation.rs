use gradnet_core::{Matrix, Real, Var};

/// Activation applied by a dense layer after the affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Identity,
    Relu,
    /// Row-wise softmax. Differentiable through the whole row: each
    /// output depends on every input in its row via the shared
    /// normalizer.
    Softmax,
}

impl Activation {
    pub fn apply<T: Real>(&self, input: &Matrix<T>) -> Matrix<T> {
        match self {
            Activation::Identity => input.clone(),
            Activation::Relu => input.map(|v| v.relu()),
            Activation::Softmax => input.map_rows(softmax_row),
        }
    }
}

/// Numerically stable softmax over one row of nodes.
///
/// The row maximum is subtracted (as a plain constant) before
/// exponentiation, so large logits cannot overflow `exp`. Subtracting
/// a constant shifts every exponent equally and cancels in the
/// normalizer, leaving values and gradients unchanged.
pub fn softmax_row<T: Real>(row: &[Var<T>]) -> Vec<Var<T>> {
    if row.is_empty() {
        return Vec::new();
    }
    let max = row
        .iter()
        .map(|v| v.value())
        .fold(T::neg_infinity(), T::max);
    let exps: Vec<Var<T>> = row.iter().map(|v| (v - max).exp()).collect();
    let mut denom = exps[0].clone();
    for e in &exps[1..] {
        denom = &denom + e;
    }
    exps.iter().map(|e| e / &denom).collect()
}
