//! Dense layers, losses and a feed-forward classifier trained by
//! mini-batch gradient descent over the `gradnet-core` scalar tape.
//!
//! The classifier builds a fresh computation graph each epoch: the
//! batch is pushed through every [`DenseLayer`], the configured
//! [`Loss`] produces a single scalar node, one `backward()` call
//! populates parameter gradients and a plain gradient-descent step
//! updates the weights in place.
//!
//! ```
//! use gradnet_nn::{Activation, DenseLayer, FitConfig, NeuralNetClassifier};
//!
//! let mut clf = NeuralNetClassifier::new("cross_entropy").unwrap().with_seed(0);
//! let hidden = DenseLayer::new(clf.tape(), 2, 4, Activation::Relu, "Hidden").unwrap();
//! clf.add(hidden);
//!
//! let x = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
//! let y = vec!["a", "b"];
//! let config = FitConfig { epochs: 50, ..FitConfig::default() };
//! clf.fit(&x, &y, &config).unwrap();
//!
//! let codes = clf.predict(&x).unwrap();
//! assert_eq!(codes.len(), 2);
//! ```

pub mod activation;
pub mod classifier;
pub mod encode;
pub mod layer;
pub mod loss;
pub mod sampler;

pub use activation::Activation;
pub use classifier::{FitConfig, NeuralNetClassifier};
pub use encode::LabelCodec;
pub use layer::DenseLayer;
pub use loss::Loss;
pub use sampler::BatchSampler;

// Re-export the core surface so downstream code needs one import root.
pub use gradnet_core::{GradNetError, Matrix, Real, Tape, Var};
