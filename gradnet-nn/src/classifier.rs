use crate::activation::Activation;
use crate::encode::LabelCodec;
use crate::layer::DenseLayer;
use crate::loss::Loss;
use crate::sampler::BatchSampler;
use gradnet_core::{GradNetError, Matrix, Real, Tape, Var};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt::Debug;

/// Hyperparameters for one [`NeuralNetClassifier::fit`] call.
///
/// `batch_size` is a fraction of the sample count (`1.0` = full
/// batch). `verbose = 0` disables progress logging; any other value
/// logs the loss every `verbose` epochs.
#[derive(Debug, Clone, Copy)]
pub struct FitConfig<T: Real> {
    pub batch_size: f64,
    pub epochs: usize,
    pub lr: T,
    pub verbose: usize,
}

impl<T: Real> Default for FitConfig<T> {
    fn default() -> Self {
        FitConfig {
            batch_size: 1.0,
            epochs: 1000,
            lr: <T as num_traits::FromPrimitive>::from_f64(0.01)
                .expect("default learning rate must be representable in T"),
            verbose: 0,
        }
    }
}

/// A feed-forward classifier trained by mini-batch gradient descent.
///
/// Owns the tape every layer's parameters live on: construct layers on
/// [`NeuralNetClassifier::tape`] and [`add`](Self::add) them before
/// fitting. `fit` appends a softmax output layer sized to the number
/// of distinct labels it observes, then runs the
/// forward / loss / zero-grad / backward / update loop. The graph
/// built during each epoch is transient; parameters persist and are
/// updated in place.
#[derive(Debug)]
pub struct NeuralNetClassifier<T: Real, L: Ord + Clone + Debug> {
    name: String,
    tape: Tape<T>,
    layers: Vec<DenseLayer<T>>,
    loss: Loss,
    codec: Option<LabelCodec<L>>,
    parameters: Vec<Var<T>>,
    training_history: Vec<T>,
    fitted: bool,
    rng: StdRng,
}

impl<T: Real, L: Ord + Clone + Debug> NeuralNetClassifier<T, L> {
    /// Creates an unfitted classifier. `loss` is one of
    /// `"squared_error"`, `"mean_squared_error"`, `"cross_entropy"`;
    /// anything else fails immediately with
    /// [`GradNetError::UnknownLoss`].
    pub fn new(loss: &str) -> Result<Self, GradNetError> {
        Ok(NeuralNetClassifier {
            name: "NeuralNetworkClassifier".to_string(),
            tape: Tape::new(),
            layers: Vec::new(),
            loss: Loss::from_str(loss)?,
            codec: None,
            parameters: Vec::new(),
            training_history: Vec::new(),
            fitted: false,
            rng: StdRng::from_entropy(),
        })
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Seeds the generator used for output-layer initialization and
    /// batch sampling, making training runs reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// The tape all layers of this classifier must be constructed on.
    pub fn tape(&self) -> &Tape<T> {
        &self.tape
    }

    /// Appends a layer to the network. Call before fitting.
    pub fn add(&mut self, layer: DenseLayer<T>) {
        self.layers.push(layer);
    }

    pub fn layers(&self) -> &[DenseLayer<T>] {
        &self.layers
    }

    /// The label ↔ code mapping built during `fit`; `None` before.
    pub fn codec(&self) -> Option<&LabelCodec<L>> {
        self.codec.as_ref()
    }

    /// Per-epoch loss values recorded by the last `fit` call.
    pub fn training_history(&self) -> &[T] {
        &self.training_history
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Flattened parameter nodes across all layers, in layer order
    /// (row-major weights then bias per layer). Populated inside
    /// `fit`, after the output layer is appended.
    pub fn parameters(&self) -> &[Var<T>] {
        &self.parameters
    }

    pub fn total_parameters(&self) -> usize {
        self.layers.iter().map(DenseLayer::num_parameters).sum()
    }

    /// Trains in place.
    ///
    /// Appends a softmax output layer sized to the distinct labels of
    /// `y`, one-hot encodes the targets, then runs `config.epochs`
    /// iterations of: draw batch → forward → loss → zero parameter
    /// grads → backward → gradient-descent step. Validation failures
    /// surface before any training state is mutated.
    pub fn fit(&mut self, x: &[Vec<T>], y: &[L], config: &FitConfig<T>) -> Result<(), GradNetError> {
        let n = x.len();
        if n == 0 {
            return Err(GradNetError::EmptyInput {
                operation: "fit".to_string(),
            });
        }
        if y.len() != n {
            return Err(GradNetError::TargetLengthMismatch {
                expected: n,
                actual: y.len(),
            });
        }
        let hidden_width = match self.layers.last() {
            Some(layer) => layer.neurons(),
            None => return Err(GradNetError::NoLayers),
        };
        let sampler = BatchSampler::new(config.batch_size);
        if sampler.resolve(n) == 0 {
            return Err(GradNetError::EmptyInput {
                operation: "fit: resolved batch size is zero".to_string(),
            });
        }

        let mark = self.tape.checkpoint();
        let features = match Matrix::from_rows(&self.tape, x) {
            Ok(features) => features,
            Err(e) => {
                // Roll back the leaves already pushed for earlier rows.
                self.tape.truncate(mark);
                return Err(e);
            }
        };

        let codec = LabelCodec::fit(y);
        let k = codec.num_classes();
        let output = DenseLayer::new_with_rng(
            &self.tape,
            hidden_width,
            k,
            Activation::Softmax,
            "Output",
            &mut self.rng,
        )?;
        self.add(output);
        self.refresh_parameters();

        let targets = codec.one_hot(&self.tape, y)?;
        self.codec = Some(codec);

        // Everything below this mark is rebuilt every epoch.
        let checkpoint = self.tape.checkpoint();
        self.training_history.clear();
        debug!(
            "fitting {}: n={}, k={}, batch={}, epochs={}, lr={}",
            self.name,
            n,
            k,
            sampler.resolve(n).min(n),
            config.epochs,
            config.lr
        );

        for epoch in 0..config.epochs {
            self.tape.truncate(checkpoint);
            let (batch_x, batch_y) = match sampler.draw(&mut self.rng, n) {
                Some(indices) => (features.select_rows(&indices), targets.select_rows(&indices)),
                None => (features.clone(), targets.clone()),
            };

            let probs = self.forward(&batch_x)?;
            // Softmax output must be non-negative; anything else is an
            // internal numerical bug, not bad input data.
            assert!(
                probs.iter().all(|p| *p >= T::zero()),
                "probabilities must be non-negative after softmax"
            );

            let loss = self.loss.compute(&batch_y, &probs)?;
            self.training_history.push(loss.value());

            for param in &self.parameters {
                param.zero_grad();
            }
            loss.backward();
            for param in &self.parameters {
                param.set_value(param.value() - config.lr * param.grad());
            }

            if config.verbose > 0 && epoch % config.verbose == 0 {
                info!("epoch {}: loss = {}", epoch, loss.value());
            }
        }

        // Drop the last epoch's transient graph too: leftover interior
        // nodes still carry gradients, and a later backward pass would
        // sweep them again.
        self.tape.truncate(checkpoint);

        self.fitted = true;
        Ok(())
    }

    /// Soft class probabilities, one row per input row, rows summing
    /// to one. The prediction graph is discarded after the values are
    /// extracted.
    pub fn predict_proba(&self, x: &[Vec<T>]) -> Result<Vec<Vec<T>>, GradNetError> {
        if !self.fitted {
            return Err(GradNetError::NotFitted {
                operation: "predict_proba".to_string(),
            });
        }
        let mark = self.tape.checkpoint();
        let result = Matrix::from_rows(&self.tape, x)
            .and_then(|features| self.forward(&features))
            .map(|probs| probs.values());
        self.tape.truncate(mark);
        result
    }

    /// Hard class predictions as integer codes (the argmax column per
    /// row). Map codes back through [`codec`](Self::codec) for
    /// user-facing labels.
    pub fn predict(&self, x: &[Vec<T>]) -> Result<Vec<usize>, GradNetError> {
        if !self.fitted {
            return Err(GradNetError::NotFitted {
                operation: "predict".to_string(),
            });
        }
        let probs = self.predict_proba(x)?;
        Ok(probs.iter().map(|row| argmax(row)).collect())
    }

    /// Formatted per-layer dimensions and the total parameter count.
    pub fn summary(&self) -> String {
        let header = "Layer\t\tWeight Dim\tBias Dim\tTotal Parameters\n";
        let rule = "=".repeat(header.len() + 20);
        let mut s = format!("Name: {}\n\n", self.name);
        s.push_str(header);
        s.push_str(&rule);
        s.push('\n');
        for layer in &self.layers {
            s.push_str(&format!("{layer}\n"));
        }
        if !self.fitted {
            s.push_str("Output Layer\tNot yet fitted\n");
        }
        s.push_str(&rule);
        s.push('\n');
        s.push_str(&format!("\t\t\t\t\t\t{}", self.total_parameters()));
        s
    }

    fn forward(&self, input: &Matrix<T>) -> Result<Matrix<T>, GradNetError> {
        let mut current = input.clone();
        for layer in &self.layers {
            current = layer.forward(&current)?;
        }
        Ok(current)
    }

    fn refresh_parameters(&mut self) {
        self.parameters = self
            .layers
            .iter()
            .flat_map(DenseLayer::parameters)
            .collect();
    }
}

fn argmax<T: Real>(row: &[T]) -> usize {
    let mut best = 0;
    for (i, v) in row.iter().enumerate() {
        if *v > row[best] {
            best = i;
        }
    }
    best
}

#[cfg(test)]
#[path = "classifier_test.rs"]
mod tests;
