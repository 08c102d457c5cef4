use crate::activation::Activation;
use gradnet_core::{GradNetError, Matrix, Real, Tape, Var};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::fmt;

/// A fully-connected layer: `X · W + b` followed by an activation.
///
/// Weights (`input_dim × output_dim`) and biases (`output_dim`) are
/// true leaf nodes on the tape: no producing operation is recorded for
/// them, their count is fixed at construction, and they persist across
/// epochs while the optimizer mutates their values in place.
#[derive(Debug, Clone)]
pub struct DenseLayer<T: Real> {
    weights: Matrix<T>,
    bias: Vec<Var<T>>,
    activation: Activation,
    name: String,
    in_features: usize,
    out_features: usize,
}

impl<T: Real> DenseLayer<T> {
    /// Creates a layer with weights drawn from a standard normal
    /// scaled by `1/sqrt(in_features)` and zero biases.
    pub fn new(
        tape: &Tape<T>,
        in_features: usize,
        out_features: usize,
        activation: Activation,
        name: &str,
    ) -> Result<Self, GradNetError> {
        Self::new_with_rng(
            tape,
            in_features,
            out_features,
            activation,
            name,
            &mut rand::thread_rng(),
        )
    }

    /// As [`DenseLayer::new`], but drawing initial weights from the
    /// given generator. Used when reproducible initialization matters.
    pub fn new_with_rng<R: Rng + ?Sized>(
        tape: &Tape<T>,
        in_features: usize,
        out_features: usize,
        activation: Activation,
        name: &str,
        rng: &mut R,
    ) -> Result<Self, GradNetError> {
        if in_features == 0 || out_features == 0 {
            return Err(GradNetError::EmptyInput {
                operation: format!("DenseLayer::new ({name})"),
            });
        }
        let scale = 1.0 / (in_features as f64).sqrt();
        let mut data = Vec::with_capacity(in_features * out_features);
        for _ in 0..in_features * out_features {
            let sample: f64 = StandardNormal.sample(rng);
            let value =
                T::from_f64(sample * scale).expect("weight init must be representable in T");
            data.push(tape.var(value));
        }
        let weights = Matrix::from_vars(data, in_features, out_features)?;
        let bias = (0..out_features).map(|_| tape.var(T::zero())).collect();
        Ok(DenseLayer {
            weights,
            bias,
            activation,
            name: name.to_string(),
            in_features,
            out_features,
        })
    }

    /// Creates a layer from explicit weights (`input_dim` rows of
    /// `output_dim` entries) and biases. Handy in tests and when
    /// loading known parameters.
    pub fn from_weights(
        tape: &Tape<T>,
        weights: &[Vec<T>],
        bias: &[T],
        activation: Activation,
        name: &str,
    ) -> Result<Self, GradNetError> {
        let weights = Matrix::from_rows(tape, weights)?;
        if bias.len() != weights.cols() {
            return Err(GradNetError::ShapeMismatch {
                expected: vec![weights.cols()],
                actual: vec![bias.len()],
                operation: "DenseLayer::from_weights".to_string(),
            });
        }
        let (in_features, out_features) = weights.shape();
        let bias = bias.iter().map(|&b| tape.var(b)).collect();
        Ok(DenseLayer {
            weights,
            bias,
            activation,
            name: name.to_string(),
            in_features,
            out_features,
        })
    }

    /// Forward pass over a batch: affine transform row-wise, then the
    /// configured activation. Builds graph nodes; mutates no layer
    /// state.
    pub fn forward(&self, input: &Matrix<T>) -> Result<Matrix<T>, GradNetError> {
        let product = input.matmul(&self.weights)?;
        let mut data = Vec::with_capacity(product.rows() * product.cols());
        for row in product.row_iter() {
            for (j, entry) in row.iter().enumerate() {
                data.push(entry + &self.bias[j]);
            }
        }
        let affine = Matrix::from_vars(data, product.rows(), product.cols())?;
        Ok(self.activation.apply(&affine))
    }

    /// All trainable nodes in a fixed deterministic order: row-major
    /// weights, then biases. The classifier relies on this ordering
    /// being identical on every call.
    pub fn parameters(&self) -> Vec<Var<T>> {
        self.weights
            .iter()
            .cloned()
            .chain(self.bias.iter().cloned())
            .collect()
    }

    /// Output width; sizes the auto-appended output layer.
    pub fn neurons(&self) -> usize {
        self.out_features
    }

    pub fn in_features(&self) -> usize {
        self.in_features
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_parameters(&self) -> usize {
        self.in_features * self.out_features + self.out_features
    }
}

impl<T: Real> fmt::Display for DenseLayer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t\t({}, {})\t({},)\t\t{}",
            self.name,
            self.in_features,
            self.out_features,
            self.out_features,
            self.num_parameters()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn creation_fixes_parameter_count() {
        let tape = Tape::<f64>::new();
        let layer = DenseLayer::new(&tape, 3, 5, Activation::Relu, "Hidden").unwrap();
        assert_eq!(layer.neurons(), 5);
        assert_eq!(layer.in_features(), 3);
        assert_eq!(layer.num_parameters(), 3 * 5 + 5);
        assert_eq!(layer.parameters().len(), 20);
        assert_eq!(tape.len(), 20);
    }

    #[test]
    fn zero_width_layer_is_rejected() {
        let tape = Tape::<f64>::new();
        assert!(matches!(
            DenseLayer::new(&tape, 0, 5, Activation::Identity, "Bad"),
            Err(GradNetError::EmptyInput { .. })
        ));
    }

    #[test]
    fn forward_applies_affine_transform() {
        let tape = Tape::new();
        let layer = DenseLayer::from_weights(
            &tape,
            &[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
            &[0.5, -0.5],
            Activation::Identity,
            "Hidden",
        )
        .unwrap();
        let input = Matrix::from_rows(&tape, &[vec![1.0, 2.0, 3.0]]).unwrap();
        let output = layer.forward(&input).unwrap();
        // [1, 2, 3] · W = [22, 28], plus bias.
        assert_eq!(output.values(), vec![vec![22.5, 27.5]]);
    }

    #[test]
    fn forward_batch_broadcasts_bias_per_row() {
        let tape = Tape::new();
        let layer = DenseLayer::from_weights(
            &tape,
            &[vec![1.0, 0.0], vec![0.0, 1.0]],
            &[0.1, 0.2],
            Activation::Identity,
            "Eye",
        )
        .unwrap();
        let input = Matrix::from_rows(&tape, &[vec![10.0, 20.0], vec![-1.0, -2.0]]).unwrap();
        let output = layer.forward(&input).unwrap();
        assert_eq!(
            output.values(),
            vec![vec![10.1, 20.2], vec![-0.9, -1.8]]
        );
    }

    #[test]
    fn softmax_layer_normalizes_rows() {
        let tape = Tape::new();
        let layer = DenseLayer::from_weights(
            &tape,
            &[vec![1.0, 0.0], vec![0.0, 1.0]],
            &[0.0, 0.0],
            Activation::Softmax,
            "Output",
        )
        .unwrap();
        let input = Matrix::from_rows(&tape, &[vec![2.0, 1.0]]).unwrap();
        let output = layer.forward(&input).unwrap();
        let row = &output.values()[0];
        assert_relative_eq!(row[0] + row[1], 1.0, epsilon = 1e-12);
        assert!(row[0] > row[1]);
    }

    #[test]
    fn parameters_order_is_stable() {
        let tape = Tape::new();
        let layer = DenseLayer::from_weights(
            &tape,
            &[vec![1.0, 2.0], vec![3.0, 4.0]],
            &[9.0, 8.0],
            Activation::Identity,
            "Hidden",
        )
        .unwrap();
        let values: Vec<f64> = layer.parameters().iter().map(|p| p.value()).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 9.0, 8.0]);
        let again: Vec<f64> = layer.parameters().iter().map(|p| p.value()).collect();
        assert_eq!(values, again);
    }

    #[test]
    fn mismatched_bias_is_rejected() {
        let tape = Tape::new();
        let err = DenseLayer::from_weights(
            &tape,
            &[vec![1.0, 2.0]],
            &[0.0],
            Activation::Identity,
            "Bad",
        )
        .unwrap_err();
        assert!(matches!(err, GradNetError::ShapeMismatch { .. }));
    }
}
