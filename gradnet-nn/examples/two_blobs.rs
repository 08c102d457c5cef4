//! # Training a small classifier on two Gaussian blobs
//!
//! Demonstrates the full workflow:
//! 1. Generate a synthetic two-class dataset.
//! 2. Build a classifier with one ReLU hidden layer.
//! 3. Fit with mini-batch gradient descent and cross-entropy loss.
//! 4. Inspect the summary, training history, and predictions.
//!
//! Run with:
//! `cargo run --example two_blobs`

use gradnet_core::GradNetError;
use gradnet_nn::{Activation, DenseLayer, FitConfig, NeuralNetClassifier};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

fn main() -> Result<(), GradNetError> {
    let mut rng = StdRng::seed_from_u64(42);
    let noise = Normal::new(0.0, 0.5).map_err(|e| GradNetError::InternalError(e.to_string()))?;

    // 50 points around (2, 2) labeled "orange", 50 around (-2, -2)
    // labeled "blue".
    let mut x: Vec<Vec<f64>> = Vec::new();
    let mut y: Vec<&str> = Vec::new();
    for _ in 0..50 {
        x.push(vec![2.0 + noise.sample(&mut rng), 2.0 + noise.sample(&mut rng)]);
        y.push("orange");
        x.push(vec![-2.0 + noise.sample(&mut rng), -2.0 + noise.sample(&mut rng)]);
        y.push("blue");
    }

    let mut clf: NeuralNetClassifier<f64, &str> =
        NeuralNetClassifier::new("cross_entropy")?.with_seed(7);
    let hidden = DenseLayer::new(clf.tape(), 2, 8, Activation::Relu, "Hidden")?;
    clf.add(hidden);

    println!("{}\n", clf.summary());

    let config = FitConfig {
        batch_size: 0.5,
        epochs: 300,
        lr: 0.1,
        ..FitConfig::default()
    };
    clf.fit(&x, &y, &config)?;

    let history = clf.training_history();
    println!(
        "Trained for {} epochs: loss {:.4} -> {:.4}\n",
        history.len(),
        history[0],
        history[history.len() - 1]
    );
    println!("{}\n", clf.summary());

    let codec = clf.codec().ok_or_else(|| {
        GradNetError::InternalError("codec missing after fit".to_string())
    })?;
    let probe = vec![vec![2.0, 2.0], vec![-2.0, -2.0], vec![0.5, 0.5]];
    let probs = clf.predict_proba(&probe)?;
    let codes = clf.predict(&probe)?;
    for ((point, row), code) in probe.iter().zip(&probs).zip(&codes) {
        let label = codec.label(*code).map_or("?", |l| *l);
        println!(
            "point {:?}: p = [{:.3}, {:.3}] -> {}",
            point, row[0], row[1], label
        );
    }

    let codes = clf.predict(&x)?;
    let correct = codes
        .iter()
        .zip(&y)
        .filter(|(code, label)| codec.label(**code) == Some(label))
        .count();
    println!("\ntraining accuracy: {}/{}", correct, x.len());

    Ok(())
}
